#![no_main]

use libfuzzer_sys::fuzz_target;

use ballot_contract::RevertReason;
use ballot_crypto::RecoverableSignature;

// Revert data and signatures both arrive from outside; neither parser may panic.
fuzz_target!(|data: &[u8]| {
    let reason = RevertReason::decode(data);
    let _ = reason.to_string();

    if let Ok(signature) = RecoverableSignature::from_slice(data) {
        let _ = ballot_crypto::recover_address(&[0x11; 32], &signature);
    }
});
