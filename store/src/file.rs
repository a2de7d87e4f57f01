//! One JSON document per (contract, voter) under a directory.

use ballot_types::{Address, Commitment};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StoreError;
use crate::record::SecretRecord;
use crate::{upsert, SecretStore};

const FILE_VERSION: u32 = 1;

/// The plaintext document: the records of one voter on one contract.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SecretsDocument {
    pub version: u32,
    pub contract: Address,
    pub voter: Address,
    pub records: Vec<SecretRecord>,
}

impl SecretsDocument {
    pub(crate) fn to_json(
        contract: &Address,
        voter: &Address,
        records: &[SecretRecord],
    ) -> Result<Vec<u8>, StoreError> {
        let doc = SecretsDocument {
            version: FILE_VERSION,
            contract: *contract,
            voter: *voter,
            records: records.to_vec(),
        };
        serde_json::to_vec_pretty(&doc).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub(crate) fn from_json(bytes: &[u8]) -> Result<Vec<SecretRecord>, StoreError> {
        let doc: SecretsDocument =
            serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))?;
        if doc.version != FILE_VERSION {
            return Err(StoreError::UnsupportedVersion(doc.version));
        }
        Ok(doc.records)
    }
}

/// How a backend turns records into file bytes and back.
pub(crate) trait Codec {
    fn encode(
        &self,
        contract: &Address,
        voter: &Address,
        records: &[SecretRecord],
    ) -> Result<Vec<u8>, StoreError>;

    fn decode(&self, bytes: &[u8]) -> Result<Vec<SecretRecord>, StoreError>;
}

/// Directory layout shared by the file-backed stores.
pub(crate) struct RecordDir {
    dir: PathBuf,
    extension: &'static str,
}

impl RecordDir {
    pub(crate) fn open(dir: impl Into<PathBuf>, extension: &'static str) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, extension })
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, contract: &Address, voter: &Address) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.{}",
            hex::encode(contract.as_bytes()),
            hex::encode(voter.as_bytes()),
            self.extension
        ))
    }

    pub(crate) fn read<C: Codec>(
        &self,
        codec: &C,
        contract: &Address,
        voter: &Address,
    ) -> Result<Vec<SecretRecord>, StoreError> {
        let path = self.path_for(contract, voter);
        match fs::read(&path) {
            Ok(bytes) => codec.decode(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write via a synced, owner-only temporary file and rename, so a crash never leaves a
    /// torn document.
    pub(crate) fn write<C: Codec>(
        &self,
        codec: &C,
        contract: &Address,
        voter: &Address,
        records: &[SecretRecord],
    ) -> Result<(), StoreError> {
        let path = self.path_for(contract, voter);
        if records.is_empty() {
            return match fs::remove_file(&path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        let bytes = codec.encode(contract, voter, records)?;
        let tmp = path.with_extension(format!("{}.tmp", self.extension));
        if let Err(e) = write_synced(&tmp, &bytes).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!(path = %path.display(), records = records.len(), "secrets written");
        Ok(())
    }

    pub(crate) fn save<C: Codec>(&self, codec: &C, record: &SecretRecord) -> Result<(), StoreError> {
        let mut records = self.read(codec, &record.contract, &record.voter)?;
        upsert(&mut records, record);
        self.write(codec, &record.contract, &record.voter, &records)
    }

    pub(crate) fn discard<C: Codec>(
        &self,
        codec: &C,
        contract: &Address,
        voter: &Address,
        commitment: &Commitment,
    ) -> Result<bool, StoreError> {
        let mut records = self.read(codec, contract, voter)?;
        let before = records.len();
        records.retain(|r| r.commitment != *commitment);
        if records.len() == before {
            return Ok(false);
        }
        self.write(codec, contract, voter, &records)?;
        Ok(true)
    }

    pub(crate) fn clear(&self, contract: &Address, voter: &Address) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(contract, voter)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Create `path` afresh, readable by the owner only, and flush `bytes` to disk.
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

struct PlainJson;

impl Codec for PlainJson {
    fn encode(
        &self,
        contract: &Address,
        voter: &Address,
        records: &[SecretRecord],
    ) -> Result<Vec<u8>, StoreError> {
        SecretsDocument::to_json(contract, voter, records)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<SecretRecord>, StoreError> {
        SecretsDocument::from_json(bytes)
    }
}

/// Plaintext JSON files, readable by the voter as a receipt of their commit.
pub struct FileSecretStore {
    files: RecordDir,
}

impl FileSecretStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            files: RecordDir::open(dir, "json")?,
        })
    }

    pub fn dir(&self) -> &Path {
        self.files.dir()
    }
}

impl SecretStore for FileSecretStore {
    fn save(&self, record: &SecretRecord) -> Result<(), StoreError> {
        self.files.save(&PlainJson, record)
    }

    fn load(&self, contract: &Address, voter: &Address) -> Result<Vec<SecretRecord>, StoreError> {
        self.files.read(&PlainJson, contract, voter)
    }

    fn discard(
        &self,
        contract: &Address,
        voter: &Address,
        commitment: &Commitment,
    ) -> Result<bool, StoreError> {
        self.files.discard(&PlainJson, contract, voter, commitment)
    }

    fn clear(&self, contract: &Address, voter: &Address) -> Result<(), StoreError> {
        self.files.clear(contract, voter)
    }
}
