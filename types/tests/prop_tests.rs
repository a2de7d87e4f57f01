use proptest::prelude::*;

use ballot_types::{Address, Candidate, Commitment, Timestamp, VotingPhase, VotingSchedule};

proptest! {
    /// Address display/parse roundtrip.
    #[test]
    fn address_string_roundtrip(bytes in prop::array::uniform20(0u8..)) {
        let address = Address::new(bytes);
        let parsed: Address = address.to_string().parse().unwrap();
        prop_assert_eq!(parsed, address);
    }

    /// Address survives ABI word padding.
    #[test]
    fn address_word_roundtrip(bytes in prop::array::uniform20(0u8..)) {
        let address = Address::new(bytes);
        prop_assert_eq!(Address::from_word(&address.to_word()).unwrap(), address);
    }

    /// Commitment::is_empty is true only for all-zero bytes.
    #[test]
    fn commitment_empty_correct(bytes in prop::array::uniform32(0u8..)) {
        prop_assert_eq!(Commitment::new(bytes).is_empty(), bytes == [0u8; 32]);
    }

    /// Exactly one phase holds, and it agrees with manual comparison.
    #[test]
    fn phase_matches_manual_comparison(
        start in 0u64..1_000,
        open_len in 1u64..1_000,
        reveal_len in 0u64..1_000,
        now in 0u64..4_000,
    ) {
        let end = start + open_len;
        let reveal = if reveal_len == 0 { 0 } else { end + reveal_len };
        let schedule = VotingSchedule::from_raw(start, end, reveal);
        let phase = schedule.phase_at(Timestamp::new(now));

        let expected = if now < start {
            VotingPhase::NotStarted
        } else if now < end {
            VotingPhase::Open
        } else if reveal != 0 && now < reveal {
            VotingPhase::AwaitingReveal
        } else if reveal != 0 {
            VotingPhase::Revealed
        } else {
            VotingPhase::Closed
        };
        prop_assert_eq!(phase, expected);
    }

    /// Phase never moves backwards as time advances.
    #[test]
    fn phase_is_monotonic(start in 0u64..1_000, len in 1u64..1_000, a in 0u64..3_000, b in 0u64..3_000) {
        let schedule = VotingSchedule::from_raw(start, start + len, start + 2 * len);
        let rank = |p: VotingPhase| match p {
            VotingPhase::NotStarted => 0,
            VotingPhase::Open => 1,
            VotingPhase::AwaitingReveal => 2,
            VotingPhase::Revealed | VotingPhase::Closed => 3,
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(rank(schedule.phase_at(Timestamp::new(lo))) <= rank(schedule.phase_at(Timestamp::new(hi))));
    }

    /// Names of 1..=31 printable ASCII bytes survive bytes32 encoding.
    #[test]
    fn candidate_name_roundtrip(name in "[A-Za-z0-9][A-Za-z0-9 ]{0,29}[A-Za-z0-9]") {
        let slot = Candidate::encode_name(&name).unwrap();
        prop_assert_eq!(Candidate::decode_name(&slot), Some(name));
    }
}
