use std::time::Duration;

use log::debug;

use crate::fib::FibTable;

/// Sweep scheduling parameters.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// How often Active entries are checked for idleness.
    pub demote_interval: Duration,
    /// Idle time after which an Active entry is demoted to Inactive.
    pub inactive_threshold: Duration,
    /// How often Inactive entries are purged.
    pub cleanup_interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            demote_interval: Duration::from_secs(300),
            inactive_threshold: Duration::from_secs(30 * 60),
            cleanup_interval: Duration::from_secs(3600),
        }
    }
}

/// What a sweep tick did. `None` means that stage was not due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub demoted: Option<usize>,
    pub removed: Option<usize>,
}

/// Periodic liveness sweep over one FIB table.
///
/// Owns its own schedule state; the caller drives [`Sweeper::tick`] from a
/// periodic task and passes the current monotonic time in. Demotion runs
/// on a finer period than cleanup, so a freshly demoted entry survives at
/// least one grace cycle before deletion. Both stages start counting from
/// sweeper construction, so nothing is demoted or purged in the first
/// interval after startup.
#[derive(Debug)]
pub struct Sweeper {
    config: SweepConfig,
    last_demote: u64,
    last_cleanup: u64,
}

impl Sweeper {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            last_demote: 0,
            last_cleanup: 0,
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Run whichever sweep stages are due at `now_us`.
    pub fn tick(&mut self, table: &mut FibTable, now_us: u64) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();

        let demote_interval = self.config.demote_interval.as_micros() as u64;
        if now_us.saturating_sub(self.last_demote) >= demote_interval {
            let threshold = self.config.inactive_threshold.as_micros() as u64;
            outcome.demoted = Some(table.auto_demote(now_us, threshold));
            self.last_demote = now_us;
        }

        let cleanup_interval = self.config.cleanup_interval.as_micros() as u64;
        if now_us.saturating_sub(self.last_cleanup) >= cleanup_interval {
            outcome.removed = Some(table.cleanup_inactive());
            self.last_cleanup = now_us;
        }

        if outcome != SweepOutcome::default() {
            debug!(
                "Sweep at {}us: demoted={:?} removed={:?}",
                now_us, outcome.demoted, outcome.removed
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndngate_core::{EntryStatus, Name};

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    fn config(demote_s: u64, threshold_s: u64, cleanup_s: u64) -> SweepConfig {
        SweepConfig {
            demote_interval: Duration::from_secs(demote_s),
            inactive_threshold: Duration::from_secs(threshold_s),
            cleanup_interval: Duration::from_secs(cleanup_s),
        }
    }

    const US: u64 = 1_000_000;

    #[test]
    fn test_stages_fire_on_their_own_periods() {
        let mut table = FibTable::new();
        let mut sweeper = Sweeper::new(config(10, 5, 40));

        let outcome = sweeper.tick(&mut table, 5 * US);
        assert_eq!(outcome, SweepOutcome::default());

        let outcome = sweeper.tick(&mut table, 10 * US);
        assert_eq!(outcome.demoted, Some(0));
        assert_eq!(outcome.removed, None);

        let outcome = sweeper.tick(&mut table, 40 * US);
        assert_eq!(outcome.demoted, Some(0));
        assert_eq!(outcome.removed, Some(0));
    }

    #[test]
    fn test_demoted_entry_survives_one_grace_cycle() {
        let mut table = FibTable::new();
        let mut sweeper = Sweeper::new(config(10, 5, 40));

        table.insert(name("/stale"), 0, 0);

        // demote pass at t=20s marks the idle entry Inactive
        let outcome = sweeper.tick(&mut table, 20 * US);
        assert_eq!(outcome.demoted, Some(1));
        assert_eq!(table.get_status(&name("/stale")), EntryStatus::Inactive);
        assert_eq!(table.len(), 1);

        // still present until the cleanup period elapses
        let outcome = sweeper.tick(&mut table, 30 * US);
        assert_eq!(outcome.removed, None);
        assert_eq!(table.len(), 1);

        let outcome = sweeper.tick(&mut table, 40 * US);
        assert_eq!(outcome.removed, Some(1));
        assert!(table.is_empty());
    }

    #[test]
    fn test_recently_used_entry_not_demoted() {
        let mut table = FibTable::new();
        let mut sweeper = Sweeper::new(config(10, 30, 40));

        table.insert(name("/fresh"), 0, 0);
        table.search_active(&name("/fresh"), 18 * US).unwrap();

        let outcome = sweeper.tick(&mut table, 20 * US);
        assert_eq!(outcome.demoted, Some(0));
        assert_eq!(table.get_status(&name("/fresh")), EntryStatus::Active);
    }
}
