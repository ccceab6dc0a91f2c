//! Percent computation with duplicate suppression.

/// `floor(downloaded * 100 / total)`, clamped to 100. Zero total reports 0.
pub fn percent(downloaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let p = u128::from(downloaded.min(total)) * 100 / u128::from(total);
    p as u8
}

/// Tracks the last emitted percentage so notifications only move forward.
#[derive(Debug, Clone, Copy)]
pub struct ProgressTracker {
    total: u64,
    last_reported: u8,
}

impl ProgressTracker {
    pub fn new(total: u64, last_reported: u8) -> Self {
        Self {
            total,
            last_reported,
        }
    }

    /// New percentage to report for `downloaded` bytes, or `None` if it would
    /// repeat or go backwards.
    pub fn observe(&mut self, downloaded: u64) -> Option<u8> {
        let p = percent(downloaded, self.total);
        if p > self.last_reported {
            self.last_reported = p;
            Some(p)
        } else {
            None
        }
    }
}
