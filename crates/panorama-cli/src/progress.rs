use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use panorama_core::pipeline::{PipelineStage, ProgressReporter};

/// Drives a single indicatif bar: a counting bar for stages with a known
/// item count, a spinner otherwise.
pub struct BarReporter {
    bar: ProgressBar,
    counting: AtomicBool,
}

impl BarReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            counting: AtomicBool::new(false),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg:28} [{bar:40}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.bar.reset();
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        match total_items {
            Some(total) => {
                self.bar.disable_steady_tick();
                self.bar.set_style(bar_style());
                self.bar.set_length(total as u64);
                self.counting.store(true, Ordering::Relaxed);
            }
            None => {
                self.bar.set_style(spinner_style());
                self.bar.enable_steady_tick(Duration::from_millis(100));
                self.counting.store(false, Ordering::Relaxed);
            }
        }
        self.bar.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        if self.counting.load(Ordering::Relaxed) {
            self.bar.set_position(items_done as u64);
        }
    }

    fn finish_stage(&self) {
        self.bar.disable_steady_tick();
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
}
