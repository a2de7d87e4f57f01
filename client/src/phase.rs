//! PhaseTracker: gates commit and reveal on the contract's schedule.
//!
//! The phase is a pure function of the three contract timestamps and the current time.
//! The tracker re-reads the schedule on every observation and never caches a phase.

use ballot_contract::VotingContract;
use ballot_types::{Clock, Timestamp, VotingPhase, VotingSchedule};
use serde::Serialize;
use tracing::debug;

use crate::error::{ClientError, PreconditionFailure};

/// The phase at one instant, with the inputs it was derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PhaseSnapshot {
    pub phase: VotingPhase,
    pub schedule: VotingSchedule,
    pub now: Timestamp,
}

impl PhaseSnapshot {
    pub fn at(schedule: VotingSchedule, now: Timestamp) -> Self {
        Self {
            phase: schedule.phase_at(now),
            schedule,
            now,
        }
    }

    /// Seconds until the phase next changes, if it will.
    pub fn secs_to_next_transition(&self) -> Option<u64> {
        self.schedule
            .next_transition(self.now)
            .map(|t| t.secs_until(self.now))
    }

    /// Fail unless the phase is `expected`.
    pub fn require(&self, expected: VotingPhase) -> Result<(), PreconditionFailure> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(PreconditionFailure::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Fail unless reveals are accepted.
    pub fn require_reveal_window(&self) -> Result<(), PreconditionFailure> {
        if self.phase.accepts_reveals() {
            Ok(())
        } else {
            Err(PreconditionFailure::OutsideRevealWindow { actual: self.phase })
        }
    }
}

pub struct PhaseTracker<K> {
    clock: K,
}

impl<K: Clock> PhaseTracker<K> {
    pub fn new(clock: K) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// The phase of `schedule` right now.
    pub fn phase_of(&self, schedule: &VotingSchedule) -> VotingPhase {
        schedule.phase_at(self.clock.now())
    }

    /// Read the schedule from the contract and derive the current phase.
    pub async fn observe<C: VotingContract>(
        &self,
        contract: &C,
    ) -> Result<PhaseSnapshot, ClientError> {
        let schedule = contract.schedule().await?;
        let snapshot = PhaseSnapshot::at(schedule, self.clock.now());
        debug!(
            phase = %snapshot.phase,
            start = schedule.start.as_secs(),
            end = schedule.end.as_secs(),
            reveal = schedule.reveal.map(|r| r.as_secs()),
            "observed voting phase"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_types::SystemClock;

    fn snapshot(now: u64) -> PhaseSnapshot {
        PhaseSnapshot::at(VotingSchedule::from_raw(100, 200, 300), Timestamp::new(now))
    }

    #[test]
    fn reference_schedule() {
        assert_eq!(snapshot(50).phase, VotingPhase::NotStarted);
        assert_eq!(snapshot(150).phase, VotingPhase::Open);
        assert_eq!(snapshot(250).phase, VotingPhase::AwaitingReveal);
        assert_eq!(snapshot(350).phase, VotingPhase::Revealed);
    }

    #[test]
    fn require_reports_actual_phase() {
        assert!(snapshot(150).require(VotingPhase::Open).is_ok());
        assert_eq!(
            snapshot(50).require(VotingPhase::Open),
            Err(PreconditionFailure::WrongPhase {
                expected: VotingPhase::Open,
                actual: VotingPhase::NotStarted,
            })
        );
        assert_eq!(
            snapshot(150).require_reveal_window(),
            Err(PreconditionFailure::OutsideRevealWindow {
                actual: VotingPhase::Open
            })
        );
    }

    #[test]
    fn countdown_to_next_boundary() {
        assert_eq!(snapshot(150).secs_to_next_transition(), Some(50));
        assert_eq!(snapshot(350).secs_to_next_transition(), None);
    }

    #[test]
    fn system_clock_phase() {
        let tracker = PhaseTracker::new(SystemClock);
        let past = VotingSchedule::from_raw(1, 2, 0);
        assert_eq!(tracker.phase_of(&past), VotingPhase::Closed);
    }
}
