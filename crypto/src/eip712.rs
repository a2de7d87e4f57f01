//! EIP-712 typed-data signing for relayed (meta) commits.
//!
//! The voter signs `MetaCommit(address voter,bytes32 commitment,uint256 nonce)` under the
//! contract's `Ballot`/`1` domain; a relayer then submits `metaCommitVote` and pays the gas.
//! `nonce` here is the contract's per-voter replay counter, not the vote nonce.

use ballot_types::{Address, Commitment};

use crate::error::CryptoError;
use crate::hash::{keccak256, keccak256_multi, uint256_word};
use crate::keys::LocalKey;
use crate::sign::{recover_address, RecoverableSignature};

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
const META_COMMIT_TYPE: &str = "MetaCommit(address voter,bytes32 commitment,uint256 nonce)";

/// The signing domain of one deployed ballot contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Eip712Domain {
    /// The domain the ballot contract declares: name `Ballot`, version `1`.
    pub fn ballot(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: "Ballot".into(),
            version: "1".into(),
            chain_id,
            verifying_contract,
        }
    }

    pub fn separator(&self) -> [u8; 32] {
        keccak256_multi(&[
            &keccak256(DOMAIN_TYPE.as_bytes()),
            &keccak256(self.name.as_bytes()),
            &keccak256(self.version.as_bytes()),
            &uint256_word(self.chain_id),
            &self.verifying_contract.to_word(),
        ])
    }
}

/// The typed message authorising a relayer to commit on the voter's behalf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetaCommit {
    pub voter: Address,
    pub commitment: Commitment,
    pub nonce: u64,
}

impl MetaCommit {
    pub fn struct_hash(&self) -> [u8; 32] {
        keccak256_multi(&[
            &keccak256(META_COMMIT_TYPE.as_bytes()),
            &self.voter.to_word(),
            self.commitment.as_bytes(),
            &uint256_word(self.nonce),
        ])
    }

    /// `keccak256(0x19 0x01 || domainSeparator || structHash)`.
    pub fn digest(&self, domain: &Eip712Domain) -> [u8; 32] {
        keccak256_multi(&[&[0x19, 0x01], &domain.separator(), &self.struct_hash()])
    }

    /// Sign as `key`. The key must belong to the voter named in the message.
    pub fn sign(
        &self,
        domain: &Eip712Domain,
        key: &LocalKey,
    ) -> Result<RecoverableSignature, CryptoError> {
        if key.address() != self.voter {
            return Err(CryptoError::InvalidSignature(format!(
                "key {} cannot sign for voter {}",
                key.address(),
                self.voter
            )));
        }
        key.sign_hash(&self.digest(domain))
    }

    /// Whether `signature` was produced by the voter over this message.
    pub fn verify(&self, domain: &Eip712Domain, signature: &RecoverableSignature) -> bool {
        recover_address(&self.digest(domain), signature).is_ok_and(|a| a == self.voter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Eip712Domain {
        Eip712Domain::ballot(31337, Address::new([0x22; 20]))
    }

    #[test]
    fn type_hashes() {
        assert_eq!(
            hex::encode(keccak256(DOMAIN_TYPE.as_bytes())),
            "8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f"
        );
        assert_eq!(
            hex::encode(keccak256(META_COMMIT_TYPE.as_bytes())),
            "e25d4378a1b63653720b53927a86ecbdd6e33b5f6480af017adf2e4e9183e4ec"
        );
    }

    #[test]
    fn digest_vector() {
        let msg = MetaCommit {
            voter: Address::new([0x11; 20]),
            commitment: Commitment::new([0xab; 32]),
            nonce: 5,
        };
        assert_eq!(
            hex::encode(domain().separator()),
            "4c77214fb471a55678db9380a73b4e78d5c68ffda61780b0c4c43b5f5a331aa5"
        );
        assert_eq!(
            hex::encode(msg.struct_hash()),
            "8384a8d2c0cc417949bbb56aa38a9041ae80dac87a73bd3146ac527ce0165ee3"
        );
        assert_eq!(
            hex::encode(msg.digest(&domain())),
            "cc5bec2091cd2738e6f77a95eb921a62c530ed9fef58ea5e5333cdfea58e6f2d"
        );
    }

    #[test]
    fn sign_and_verify() {
        let key = LocalKey::from_bytes(&[0x42; 32]).unwrap();
        let msg = MetaCommit {
            voter: key.address(),
            commitment: Commitment::new([1; 32]),
            nonce: 0,
        };
        let sig = msg.sign(&domain(), &key).unwrap();
        assert!(msg.verify(&domain(), &sig));

        let replayed = MetaCommit { nonce: 1, ..msg };
        assert!(!replayed.verify(&domain(), &sig));

        let other_chain = Eip712Domain::ballot(1, Address::new([0x22; 20]));
        assert!(!msg.verify(&other_chain, &sig));
    }

    #[test]
    fn foreign_key_refused() {
        let key = LocalKey::from_bytes(&[0x42; 32]).unwrap();
        let msg = MetaCommit {
            voter: Address::new([0x11; 20]),
            commitment: Commitment::new([1; 32]),
            nonce: 0,
        };
        assert!(msg.sign(&domain(), &key).is_err());
    }
}
