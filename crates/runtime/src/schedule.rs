//! Daily run gate for the summarization pipeline.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Once-per-day scheduling state.
///
/// `last_run_day` lives in memory only: a process restart forgets it and can
/// summarize the same day twice.  Known limitation, kept as-is.
#[derive(Debug, Clone)]
pub struct DailySchedule {
    run_at: NaiveTime,
    last_run_day: Option<NaiveDate>,
}

impl DailySchedule {
    pub fn new(run_at: NaiveTime) -> Self {
        Self {
            run_at,
            last_run_day: None,
        }
    }

    /// Due when the time-of-day gate has passed and today has not already
    /// produced a report.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        if now.time() < self.run_at {
            return false;
        }
        match self.last_run_day {
            Some(last) => now.date() > last,
            None => true,
        }
    }

    /// Record a successful run.  Failed or empty runs must not call this so
    /// the next tick retries.
    pub fn mark_ran(&mut self, day: NaiveDate) {
        self.last_run_day = Some(day);
    }

    pub fn last_run_day(&self) -> Option<NaiveDate> {
        self.last_run_day
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
