#![no_main]

use libfuzzer_sys::fuzz_target;

use ballot_contract::rlp::{self, RlpItem};

fn encode(item: &RlpItem, out: &mut Vec<u8>) {
    match item {
        RlpItem::Bytes(bytes) => rlp::encode_bytes(bytes, out),
        RlpItem::List(items) => {
            let mut payload = Vec::new();
            for item in items {
                encode(item, &mut payload);
            }
            rlp::encode_list(&payload, out);
        }
    }
}

// Decoding never panics, and whatever decodes survives a re-encode.
fuzz_target!(|data: &[u8]| {
    if let Ok(item) = rlp::decode(data) {
        let mut encoded = Vec::new();
        encode(&item, &mut encoded);
        assert_eq!(rlp::decode(&encoded).ok(), Some(item));
    }
});
