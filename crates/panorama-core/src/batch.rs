use std::any::Any;
use std::ops::Range;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{PanoramaError, Result};

/// A work item that was dropped from a batch, with the reason.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedItem {
    /// Position of the item in the batch input.
    pub index: usize,
    pub source_id: String,
    pub reason: String,
}

/// Per-item result of a batch stage.
#[derive(Debug)]
pub enum ItemOutcome<T> {
    Done(T),
    Skipped(SkippedItem),
}

/// Collected results of a batch stage, in input order.
#[derive(Debug)]
pub struct BatchResult<T> {
    pub items: Vec<T>,
    pub skipped: Vec<SkippedItem>,
}

impl<T> BatchResult<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Split `len` items into `workers` contiguous ranges whose sizes differ by
/// at most one. Ranges are in order and cover `0..len` exactly; when there
/// are more workers than items the trailing ranges are empty.
pub fn assign_work(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let base = len / workers;
    let extra = len % workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for i in 0..workers {
        let size = base + usize::from(i < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// Run `process` over every item on a pool of exactly `workers` threads.
///
/// Items are partitioned with [`assign_work`]; each worker owns one
/// contiguous batch and writes only the matching slice of an indexed slot
/// arena, so the output order is the input order no matter which worker
/// finishes first. A failing or panicking item becomes a [`SkippedItem`]
/// and never disturbs its siblings.
pub fn run_batch<T, U, F, I, P>(
    items: Vec<T>,
    workers: usize,
    source_id: I,
    process: F,
    on_progress: P,
) -> Result<BatchResult<U>>
where
    T: Send,
    U: Send,
    F: Fn(T) -> Result<U> + Sync,
    I: Fn(&T) -> String + Sync,
    P: Fn(usize) + Sync,
{
    if workers == 0 {
        return Err(PanoramaError::Config("worker count must be at least 1".into()));
    }

    let total = items.len();
    let ranges = assign_work(total, workers);

    let mut batches: Vec<Vec<(usize, T)>> = ranges.iter().map(|r| Vec::with_capacity(r.len())).collect();
    let mut range_idx = 0;
    for (i, item) in items.into_iter().enumerate() {
        while !ranges[range_idx].contains(&i) {
            range_idx += 1;
        }
        batches[range_idx].push((i, item));
    }

    let mut slots: Vec<Option<ItemOutcome<U>>> = (0..total).map(|_| None).collect();
    let mut slot_slices = Vec::with_capacity(ranges.len());
    let mut rest: &mut [Option<ItemOutcome<U>>] = &mut slots;
    for range in &ranges {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
        slot_slices.push(head);
        rest = tail;
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| PanoramaError::Pipeline(format!("cannot build worker pool: {e}")))?;

    debug!(items = total, workers, "Dispatching batch");
    let done = AtomicUsize::new(0);

    pool.install(|| {
        batches
            .into_par_iter()
            .zip(slot_slices.into_par_iter())
            .for_each(|(batch, slots)| {
                for ((index, item), slot) in batch.into_iter().zip(slots.iter_mut()) {
                    let id = source_id(&item);
                    let outcome = match catch_unwind(AssertUnwindSafe(|| process(item))) {
                        Ok(Ok(value)) => ItemOutcome::Done(value),
                        Ok(Err(e)) => {
                            warn!(source_id = %id, error = %e, "Item failed, skipping");
                            ItemOutcome::Skipped(SkippedItem {
                                index,
                                source_id: id,
                                reason: e.to_string(),
                            })
                        }
                        Err(payload) => {
                            let reason = format!("worker panicked: {}", panic_message(&payload));
                            warn!(source_id = %id, %reason, "Item aborted, skipping");
                            ItemOutcome::Skipped(SkippedItem {
                                index,
                                source_id: id,
                                reason,
                            })
                        }
                    };
                    *slot = Some(outcome);
                    on_progress(done.fetch_add(1, Ordering::Relaxed) + 1);
                }
            });
    });

    let mut result = BatchResult {
        items: Vec::with_capacity(total),
        skipped: Vec::new(),
    };
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(ItemOutcome::Done(value)) => result.items.push(value),
            Some(ItemOutcome::Skipped(skipped)) => result.skipped.push(skipped),
            None => result.skipped.push(SkippedItem {
                index,
                source_id: format!("#{index}"),
                reason: "item was never processed".into(),
            }),
        }
    }
    Ok(result)
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}
