//! The voting schedule and the phase derived from it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::Timestamp;

/// The stage of the contract's commit/reveal timeline at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingPhase {
    /// `now < start`.
    NotStarted,
    /// `start <= now < end`: commits are accepted.
    Open,
    /// `end <= now < reveal`: reveals are accepted. Only when a reveal time is set.
    AwaitingReveal,
    /// The reveal deadline has passed.
    Revealed,
    /// Voting ended and no reveal window was scheduled.
    Closed,
}

impl VotingPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Open => "open",
            Self::AwaitingReveal => "awaiting-reveal",
            Self::Revealed => "revealed",
            Self::Closed => "closed",
        }
    }

    pub fn accepts_commits(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn accepts_reveals(&self) -> bool {
        matches!(self, Self::AwaitingReveal)
    }
}

impl fmt::Display for VotingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three timestamps the contract publishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingSchedule {
    pub start: Timestamp,
    pub end: Timestamp,
    /// Reveal deadline. `None` when the contract reports zero.
    pub reveal: Option<Timestamp>,
}

impl VotingSchedule {
    pub fn new(start: Timestamp, end: Timestamp, reveal: Option<Timestamp>) -> Self {
        Self { start, end, reveal }
    }

    /// Build from the raw contract values, where a reveal time of zero means unset.
    pub fn from_raw(start: u64, end: u64, reveal: u64) -> Self {
        Self {
            start: Timestamp::new(start),
            end: Timestamp::new(end),
            reveal: (reveal != 0).then(|| Timestamp::new(reveal)),
        }
    }

    /// The phase at `now`. Pure; callers recompute it on every check.
    pub fn phase_at(&self, now: Timestamp) -> VotingPhase {
        if now < self.start {
            VotingPhase::NotStarted
        } else if now < self.end {
            VotingPhase::Open
        } else {
            match self.reveal {
                Some(reveal) if now < reveal => VotingPhase::AwaitingReveal,
                Some(_) => VotingPhase::Revealed,
                None => VotingPhase::Closed,
            }
        }
    }

    /// The next boundary strictly after `now`, if any.
    pub fn next_transition(&self, now: Timestamp) -> Option<Timestamp> {
        [Some(self.start), Some(self.end), self.reveal]
            .into_iter()
            .flatten()
            .filter(|t| *t > now)
            .min()
    }

    /// `start < end`, and `end < reveal` when a reveal time is set.
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end && self.reveal.map_or(true, |r| self.end < r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> VotingSchedule {
        VotingSchedule::from_raw(100, 200, 300)
    }

    #[test]
    fn phases_at_reference_points() {
        let s = schedule();
        assert_eq!(s.phase_at(Timestamp::new(50)), VotingPhase::NotStarted);
        assert_eq!(s.phase_at(Timestamp::new(150)), VotingPhase::Open);
        assert_eq!(s.phase_at(Timestamp::new(250)), VotingPhase::AwaitingReveal);
        assert_eq!(s.phase_at(Timestamp::new(350)), VotingPhase::Revealed);
    }

    #[test]
    fn boundaries_are_half_open() {
        let s = schedule();
        assert_eq!(s.phase_at(Timestamp::new(100)), VotingPhase::Open);
        assert_eq!(s.phase_at(Timestamp::new(200)), VotingPhase::AwaitingReveal);
        assert_eq!(s.phase_at(Timestamp::new(300)), VotingPhase::Revealed);
    }

    #[test]
    fn zero_reveal_time_means_closed_after_end() {
        let s = VotingSchedule::from_raw(100, 200, 0);
        assert_eq!(s.reveal, None);
        assert_eq!(s.phase_at(Timestamp::new(250)), VotingPhase::Closed);
    }

    #[test]
    fn next_transition() {
        let s = schedule();
        assert_eq!(s.next_transition(Timestamp::new(50)), Some(Timestamp::new(100)));
        assert_eq!(s.next_transition(Timestamp::new(200)), Some(Timestamp::new(300)));
        assert_eq!(s.next_transition(Timestamp::new(300)), None);
    }

    #[test]
    fn well_formed() {
        assert!(schedule().is_well_formed());
        assert!(VotingSchedule::from_raw(100, 200, 0).is_well_formed());
        assert!(!VotingSchedule::from_raw(200, 100, 0).is_well_formed());
        assert!(!VotingSchedule::from_raw(100, 200, 150).is_well_formed());
    }

    #[test]
    fn phase_gates() {
        assert!(VotingPhase::Open.accepts_commits());
        assert!(!VotingPhase::AwaitingReveal.accepts_commits());
        assert!(VotingPhase::AwaitingReveal.accepts_reveals());
        assert_eq!(VotingPhase::AwaitingReveal.to_string(), "awaiting-reveal");
    }
}
