//! Cross-shard page assembly.
//!
//! Every shard returns its records ordered by identifier. A page of the
//! combined dataset is built by fetching a window from each shard and
//! merging the windows.

use crate::backend::AppointmentRecord;
use crate::config::MergeMode;

/// What to fetch from each shard, and what to keep after merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Offset passed to each shard.
    pub offset: usize,
    /// Limit passed to each shard.
    pub limit: usize,
    /// Merged records dropped before the page starts.
    pub skip: usize,
    /// Page length.
    pub take: usize,
}

impl PageWindow {
    pub fn new(mode: MergeMode, page_size: usize, page_index: usize) -> Self {
        let start = page_index.saturating_mul(page_size);
        match mode {
            // Each shard contributes its own slice; pages past the first are
            // only approximately ordered across shards.
            MergeMode::Independent => Self {
                offset: start,
                limit: page_size,
                skip: 0,
                take: page_size,
            },
            MergeMode::Exact => Self {
                offset: 0,
                limit: start.saturating_add(page_size),
                skip: start,
                take: page_size,
            },
        }
    }
}

/// Merge per-shard windows into one page ordered by identifier.
pub fn merge_pages<I>(shards: I, window: &PageWindow) -> Vec<AppointmentRecord>
where
    I: IntoIterator<Item = Vec<AppointmentRecord>>,
{
    let mut merged: Vec<AppointmentRecord> = shards.into_iter().flatten().collect();
    merged.sort_by(|a, b| a.apptid.cmp(&b.apptid));
    merged.into_iter().skip(window.skip).take(window.take).collect()
}
