use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("decryption failed: wrong passphrase or corrupted data")]
    Decryption,

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("unsupported secrets file version: {0}")]
    UnsupportedVersion(u32),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
