//! Legacy (type 0) transactions with EIP-155 replay protection.

use ballot_crypto::{keccak256, LocalKey};
use ballot_types::{Address, TxHash};

use crate::error::ContractError;
use crate::rlp::{encode_be_uint, encode_bytes, encode_list, encode_uint};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

/// An encoded, signed transaction ready for `eth_sendRawTransaction`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    pub hash: TxHash,
}

impl LegacyTransaction {
    fn encode_fields(&self, out: &mut Vec<u8>) {
        encode_uint(u128::from(self.nonce), out);
        encode_uint(self.gas_price, out);
        encode_uint(u128::from(self.gas_limit), out);
        encode_bytes(self.to.as_bytes(), out);
        encode_uint(self.value, out);
        encode_bytes(&self.data, out);
    }

    /// RLP of `[nonce, gasPrice, gas, to, value, data, chainId, 0, 0]`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut fields = Vec::new();
        self.encode_fields(&mut fields);
        encode_uint(u128::from(self.chain_id), &mut fields);
        encode_uint(0, &mut fields);
        encode_uint(0, &mut fields);
        let mut out = Vec::with_capacity(fields.len() + 3);
        encode_list(&fields, &mut out);
        out
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    /// Sign with `key`; `v = recovery_id + chain_id * 2 + 35`.
    pub fn sign(&self, key: &LocalKey) -> Result<SignedTransaction, ContractError> {
        let signature = key.sign_hash(&self.signing_hash())?;
        let v = u128::from(signature.recovery_parity()?) + u128::from(self.chain_id) * 2 + 35;

        let mut fields = Vec::new();
        self.encode_fields(&mut fields);
        encode_uint(v, &mut fields);
        encode_be_uint(&signature.r(), &mut fields);
        encode_be_uint(&signature.s(), &mut fields);

        let mut raw = Vec::with_capacity(fields.len() + 3);
        encode_list(&fields, &mut raw);
        let hash = TxHash::new(keccak256(&raw));
        Ok(SignedTransaction { raw, hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rlp::{decode, RlpItem};

    // The worked example from EIP-155.
    fn eip155_example() -> (LegacyTransaction, LocalKey) {
        let tx = LegacyTransaction {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: Address::new([0x35; 20]),
            value: 1_000_000_000_000_000_000,
            data: Vec::new(),
            chain_id: 1,
        };
        (tx, LocalKey::from_bytes(&[0x46; 32]).unwrap())
    }

    #[test]
    fn eip155_signing_payload() {
        let (tx, _) = eip155_example();
        assert_eq!(
            hex::encode(tx.signing_payload()),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            hex::encode(tx.signing_hash()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn eip155_signed_transaction() {
        let (tx, key) = eip155_example();
        let signed = tx.sign(&key).unwrap();
        assert_eq!(
            hex::encode(&signed.raw),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn signed_transaction_decodes_to_nine_fields() {
        let (mut tx, key) = eip155_example();
        tx.chain_id = 11_155_111;
        tx.data = vec![0x3e, 0x85, 0x89, 0x23];
        let signed = tx.sign(&key).unwrap();
        let RlpItem::List(fields) = decode(&signed.raw).unwrap() else {
            panic!("expected list");
        };
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[5], RlpItem::Bytes(tx.data.clone()));
        let RlpItem::Bytes(v) = &fields[6] else {
            panic!("expected bytes");
        };
        let v = v.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        assert!(v == 11_155_111 * 2 + 35 || v == 11_155_111 * 2 + 36);
        assert_eq!(signed.hash, TxHash::new(keccak256(&signed.raw)));
    }
}
