#![no_main]

use libfuzzer_sys::fuzz_target;

use ballot_types::Candidate;

// Proposal names are arbitrary bytes32 values set by the chairperson.
fuzz_target!(|data: &[u8]| {
    for chunk in data.chunks(32) {
        let mut raw = [0u8; 32];
        raw[..chunk.len()].copy_from_slice(chunk);
        if let Some(name) = Candidate::decode_name(&raw) {
            assert!(!name.is_empty());
            assert_eq!(name.trim(), name);
            // Names that fit re-encode and decode to themselves.
            if let Ok(encoded) = Candidate::encode_name(&name) {
                assert_eq!(Candidate::decode_name(&encoded).as_deref(), Some(name.as_str()));
            }
        }
    }
});
