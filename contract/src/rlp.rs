//! Recursive Length Prefix encoding, as used for legacy transactions.

use crate::error::ContractError;

/// A decoded RLP item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

fn length_prefix(len: usize, short_base: u8, out: &mut Vec<u8>) {
    if len < 56 {
        out.push(short_base + len as u8);
    } else {
        let be = (len as u64).to_be_bytes();
        let skip = be.iter().take_while(|b| **b == 0).count();
        out.push(short_base + 55 + (8 - skip) as u8);
        out.extend_from_slice(&be[skip..]);
    }
}

pub fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    if bytes.len() == 1 && bytes[0] < 0x80 {
        out.push(bytes[0]);
    } else {
        length_prefix(bytes.len(), 0x80, out);
        out.extend_from_slice(bytes);
    }
}

/// Encode a big-endian unsigned integer of any width, leading zeros stripped.
pub fn encode_be_uint(be: &[u8], out: &mut Vec<u8>) {
    let skip = be.iter().take_while(|b| **b == 0).count();
    encode_bytes(&be[skip..], out);
}

/// Integers are big-endian with leading zeros stripped; zero is the empty string.
pub fn encode_uint(value: u128, out: &mut Vec<u8>) {
    encode_be_uint(&value.to_be_bytes(), out);
}

/// Wrap already-encoded items in a list header.
pub fn encode_list(payload: &[u8], out: &mut Vec<u8>) {
    length_prefix(payload.len(), 0xc0, out);
    out.extend_from_slice(payload);
}

/// Decode exactly one item spanning the whole input.
pub fn decode(input: &[u8]) -> Result<RlpItem, ContractError> {
    let (item, used) = decode_item(input)?;
    if used != input.len() {
        return Err(ContractError::Decode(format!(
            "{} trailing bytes after rlp item",
            input.len() - used
        )));
    }
    Ok(item)
}

fn read_len(input: &[u8], len_of_len: usize) -> Result<usize, ContractError> {
    if len_of_len > 8 || input.len() < 1 + len_of_len {
        return Err(ContractError::Decode("truncated rlp length".into()));
    }
    let len = input[1..=len_of_len]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    usize::try_from(len).map_err(|_| ContractError::Decode("rlp length overflows usize".into()))
}

fn slice(input: &[u8], start: usize, len: usize) -> Result<&[u8], ContractError> {
    input
        .get(start..start.saturating_add(len))
        .filter(|s| s.len() == len)
        .ok_or_else(|| ContractError::Decode("rlp payload overruns input".into()))
}

fn decode_item(input: &[u8]) -> Result<(RlpItem, usize), ContractError> {
    let prefix = *input
        .first()
        .ok_or_else(|| ContractError::Decode("empty rlp input".into()))?;
    match prefix {
        0x00..=0x7f => Ok((RlpItem::Bytes(vec![prefix]), 1)),
        0x80..=0xb7 => {
            let len = usize::from(prefix - 0x80);
            Ok((RlpItem::Bytes(slice(input, 1, len)?.to_vec()), 1 + len))
        }
        0xb8..=0xbf => {
            let len_of_len = usize::from(prefix - 0xb7);
            let len = read_len(input, len_of_len)?;
            let start = 1 + len_of_len;
            Ok((RlpItem::Bytes(slice(input, start, len)?.to_vec()), start + len))
        }
        0xc0..=0xf7 => {
            let len = usize::from(prefix - 0xc0);
            let items = decode_list_payload(slice(input, 1, len)?)?;
            Ok((RlpItem::List(items), 1 + len))
        }
        0xf8..=0xff => {
            let len_of_len = usize::from(prefix - 0xf7);
            let len = read_len(input, len_of_len)?;
            let start = 1 + len_of_len;
            let items = decode_list_payload(slice(input, start, len)?)?;
            Ok((RlpItem::List(items), start + len))
        }
    }
}

fn decode_list_payload(mut payload: &[u8]) -> Result<Vec<RlpItem>, ContractError> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, used) = decode_item(payload)?;
        items.push(item);
        payload = &payload[used..];
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc_bytes(b: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        encode_bytes(b, &mut out);
        out
    }

    fn enc_uint(v: u128) -> Vec<u8> {
        let mut out = Vec::new();
        encode_uint(v, &mut out);
        out
    }

    #[test]
    fn canonical_vectors() {
        assert_eq!(enc_bytes(b"dog"), vec![0x83, b'd', b'o', b'g']);
        assert_eq!(enc_bytes(b""), vec![0x80]);
        assert_eq!(enc_bytes(&[0x0f]), vec![0x0f]);
        assert_eq!(enc_bytes(&[0x80]), vec![0x81, 0x80]);
        assert_eq!(enc_uint(0), vec![0x80]);
        assert_eq!(enc_uint(15), vec![0x0f]);
        assert_eq!(enc_uint(1024), vec![0x82, 0x04, 0x00]);

        let mut payload = enc_bytes(b"cat");
        payload.extend(enc_bytes(b"dog"));
        let mut list = Vec::new();
        encode_list(&payload, &mut list);
        assert_eq!(list, vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']);
    }

    #[test]
    fn long_string_prefix() {
        let s = vec![b'a'; 56];
        let out = enc_bytes(&s);
        assert_eq!(&out[..2], &[0xb8, 56]);
        assert_eq!(decode(&out).unwrap(), RlpItem::Bytes(s));
    }

    #[test]
    fn decode_nested_list() {
        // [ [], [[]], [ [], [[]] ] ]
        let input = [0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0];
        let empty = RlpItem::List(vec![]);
        let one = RlpItem::List(vec![empty.clone()]);
        assert_eq!(
            decode(&input).unwrap(),
            RlpItem::List(vec![
                empty.clone(),
                one.clone(),
                RlpItem::List(vec![empty, one])
            ])
        );
    }

    #[test]
    fn decode_rejects_malformed() {
        assert!(decode(&[]).is_err());
        assert!(decode(&[0x83, b'd', b'o']).is_err());
        assert!(decode(&[0x0f, 0x0f]).is_err());
        assert!(decode(&[0xbf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).is_err());
    }
}
