use std::ops::Range;

use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::consts::{DEFAULT_FALLBACK_MIN_ITEMS, DEFAULT_GROUP_SIZE, MIN_STITCH_IMAGES};
use crate::error::{PanoramaError, Result};

use super::{StitchEngine, StitchParams, StitchResult, StitchStatus};

/// Grouped fallback tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Frames per group; consecutive groups share one frame.
    pub group_size: usize,
    /// Grouping is only tried when more than this many items failed.
    pub min_items: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            min_items: DEFAULT_FALLBACK_MIN_ITEMS,
        }
    }
}

/// A contiguous slice of the item list used by the grouped fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Group {
    pub start: usize,
    pub size: usize,
}

impl Group {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.size
    }
}

/// Overlapping groups over `len` items: starts advance by `group_size - 1`
/// so neighbours share exactly one boundary item, the tail group is clipped
/// to the list, and groups with fewer than 2 items are dropped.
///
/// For `group_size >= 2` this always yields fewer groups than items.
pub fn plan_groups(len: usize, group_size: usize) -> Vec<Group> {
    if group_size < MIN_STITCH_IMAGES {
        return Vec::new();
    }
    (0..len)
        .step_by(group_size - 1)
        .map(|start| Group {
            start,
            size: group_size.min(len - start),
        })
        .filter(|g| g.size >= MIN_STITCH_IMAGES)
        .collect()
}

/// Which stitch a record refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptScope {
    /// All items at one recursion level (level 0 is the input frames).
    Full { level: usize },
    /// One fallback group at a recursion level.
    Group { level: usize, group: Group },
}

impl std::fmt::Display for AttemptScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full { level: 0 } => write!(f, "full set"),
            Self::Full { level } => write!(f, "regroup level {level}"),
            Self::Group { level, group } => write!(
                f,
                "group [{}:{}] at level {level}",
                group.start,
                group.start + group.size
            ),
        }
    }
}

/// One engine invocation and its outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptRecord {
    pub scope: AttemptScope,
    pub items: usize,
    pub status: StitchStatus,
}

/// A successful stitch and the attempts that led to it.
#[derive(Clone, Debug)]
pub struct StitchOutcome {
    pub composite: RgbImage,
    pub attempts: Vec<AttemptRecord>,
    pub used_fallback: bool,
}

/// Drives a [`StitchEngine`] with a full attempt first and, on failure, a
/// recursive grouped fallback.
pub struct PanoramaStitcher<'a> {
    engine: &'a dyn StitchEngine,
    params: StitchParams,
    fallback: FallbackConfig,
}

impl<'a> PanoramaStitcher<'a> {
    pub fn new(engine: &'a dyn StitchEngine, params: StitchParams, fallback: FallbackConfig) -> Self {
        Self {
            engine,
            params,
            fallback,
        }
    }

    /// Stitch `images` (in capture order) into one composite.
    ///
    /// Fewer than 2 images is rejected before the engine is touched. When no
    /// composite can be produced the error carries the attempt count and the
    /// last failure reason.
    pub fn stitch(&self, images: &[RgbImage]) -> Result<StitchOutcome> {
        if images.len() < MIN_STITCH_IMAGES {
            return Err(PanoramaError::InsufficientInput {
                available: images.len(),
                required: MIN_STITCH_IMAGES,
            });
        }

        info!(
            images = images.len(),
            engine = self.engine.name(),
            "Attempting to stitch"
        );
        let mut attempts = Vec::new();
        match self.stitch_level(images, 0, &mut attempts) {
            Some(composite) => {
                let used_fallback = attempts.len() > 1;
                info!(
                    width = composite.width(),
                    height = composite.height(),
                    attempts = attempts.len(),
                    used_fallback,
                    "Stitching succeeded"
                );
                Ok(StitchOutcome {
                    composite,
                    attempts,
                    used_fallback,
                })
            }
            None => {
                let last_status = attempts
                    .iter()
                    .rev()
                    .map(|a| a.status)
                    .find(|s| !s.is_success())
                    .unwrap_or(StitchStatus::InsufficientFeatures);
                warn!(
                    images = images.len(),
                    attempts = attempts.len(),
                    %last_status,
                    "Stitching failed"
                );
                Err(PanoramaError::TotalStitchFailure {
                    frames: images.len(),
                    attempts: attempts.len(),
                    last_status,
                })
            }
        }
    }

    /// Full attempt on `items`, falling back to groups when it fails and
    /// there are enough items.
    fn stitch_level(
        &self,
        items: &[RgbImage],
        level: usize,
        attempts: &mut Vec<AttemptRecord>,
    ) -> Option<RgbImage> {
        let (record, result) = self.attempt(items, AttemptScope::Full { level });
        attempts.push(record);
        if let Some(composite) = result.composite {
            return Some(composite);
        }

        if items.len() <= self.fallback.min_items {
            return None;
        }
        info!(items = items.len(), level, "Trying to stitch in smaller groups");
        self.stitch_grouped(items, level, attempts)
    }

    fn stitch_grouped(
        &self,
        items: &[RgbImage],
        level: usize,
        attempts: &mut Vec<AttemptRecord>,
    ) -> Option<RgbImage> {
        let groups = plan_groups(items.len(), self.fallback.group_size);
        // Recursion measure: every regroup must strictly shrink the list.
        if groups.len() >= items.len() {
            warn!(
                items = items.len(),
                groups = groups.len(),
                "Grouping would not reduce the item count"
            );
            return None;
        }

        // Groups only read their own slice and produce their own composite.
        let results: Vec<(AttemptRecord, StitchResult)> = groups
            .par_iter()
            .map(|&group| self.attempt(&items[group.range()], AttemptScope::Group { level, group }))
            .collect();

        let mut composites = Vec::with_capacity(results.len());
        for (record, result) in results {
            attempts.push(record);
            if let Some(composite) = result.composite {
                composites.push(composite);
            }
        }

        info!(
            level,
            groups = groups.len(),
            succeeded = composites.len(),
            "Group stitching finished"
        );
        match composites.len() {
            0 => None,
            1 => composites.pop(),
            _ => self.stitch_level(&composites, level + 1, attempts),
        }
    }

    fn attempt(&self, items: &[RgbImage], scope: AttemptScope) -> (AttemptRecord, StitchResult) {
        let mut result = self.engine.stitch(items, &self.params);
        // A success without a composite is not a success.
        if result.status.is_success() && result.composite.is_none() {
            result.status = StitchStatus::HomographyFailed;
        }
        if !result.status.is_success() {
            result.composite = None;
            warn!(%scope, items = items.len(), status = %result.status, "Stitch attempt failed");
        }
        (
            AttemptRecord {
                scope,
                items: items.len(),
                status: result.status,
            },
            result,
        )
    }
}
