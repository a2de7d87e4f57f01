#![no_main]

use libfuzzer_sys::fuzz_target;

use ballot_contract::abi::AbiDecoder;

// Return data from an untrusted node: every accessor must fail cleanly, never panic,
// whatever offsets and lengths the words claim.
fuzz_target!(|data: &[u8]| {
    let decoder = AbiDecoder::new(data);
    for index in 0..4 {
        let _ = decoder.word(index);
        let _ = decoder.uint64(index);
        let _ = decoder.boolean(index);
        let _ = decoder.address(index);
        let _ = decoder.bytes32(index);
        let _ = decoder.bytes32_array(index);
        let _ = decoder.uint64_array(index);
        let _ = decoder.bytes(index);
        let _ = decoder.string(index);
    }
});
