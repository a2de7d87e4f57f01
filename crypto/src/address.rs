//! EIP-55 mixed-case checksummed address rendering.

use ballot_types::Address;

use crate::error::CryptoError;
use crate::hash::keccak256;

/// Render `address` with the EIP-55 checksum casing.
pub fn to_checksum(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse an address, enforcing the checksum when the input is mixed-case.
///
/// All-lowercase and all-uppercase inputs carry no checksum and are accepted as-is.
pub fn parse_checksummed(s: &str) -> Result<Address, CryptoError> {
    let s = s.trim();
    let address: Address = s.parse()?;
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && &to_checksum(&address)[2..] != digits {
        return Err(CryptoError::BadChecksum(s.to_string()));
    }
    Ok(address)
}
