use crate::utils::error::{ExportError, Result};
use sp_crypto_hashing::blake2_512;
use std::sync::atomic::{AtomicU16, Ordering};

/// Generic Substrate network prefix.
pub const DEFAULT_PREFIX: u16 = 42;
pub const MAX_PREFIX: u16 = 16_383;

const CHECKSUM_PREAMBLE: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;

static ADDRESS_PREFIX: AtomicU16 = AtomicU16::new(DEFAULT_PREFIX);

/// 設定序列化帳戶地址時使用的網路前綴
pub fn set_address_prefix(prefix: u16) {
    ADDRESS_PREFIX.store(prefix & MAX_PREFIX, Ordering::Relaxed);
}

pub fn address_prefix() -> u16 {
    ADDRESS_PREFIX.load(Ordering::Relaxed)
}

pub fn encode(public: &[u8; 32], prefix: u16) -> String {
    let ident = prefix & MAX_PREFIX;
    let mut payload = match ident {
        0..=63 => vec![ident as u8],
        _ => {
            let first = ((ident & 0b0000_0000_1111_1100) as u8) >> 2;
            let second = ((ident >> 8) as u8) | (((ident & 0b0000_0000_0000_0011) as u8) << 6);
            vec![first | 0b0100_0000, second]
        }
    };
    payload.extend_from_slice(public);

    let hash = checksum(&payload);
    payload.extend_from_slice(&hash[..CHECKSUM_LEN]);
    bs58::encode(payload).into_string()
}

pub fn decode(address: &str) -> Result<([u8; 32], u16)> {
    let invalid = |reason: &str| ExportError::AddressError {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let data = bs58::decode(address)
        .into_vec()
        .map_err(|_| invalid("not valid base58"))?;
    if data.len() < 2 {
        return Err(invalid("too short"));
    }

    let (prefix_len, ident) = match data[0] {
        0..=63 => (1, data[0] as u16),
        64..=127 => {
            let lower = (data[0] << 2) | (data[1] >> 6);
            let upper = data[1] & 0b0011_1111;
            (2, (lower as u16) | ((upper as u16) << 8))
        }
        _ => return Err(invalid("reserved prefix")),
    };

    if data.len() != prefix_len + 32 + CHECKSUM_LEN {
        return Err(invalid("unexpected length"));
    }

    let body_len = data.len() - CHECKSUM_LEN;
    let hash = checksum(&data[..body_len]);
    if hash[..CHECKSUM_LEN] != data[body_len..] {
        return Err(invalid("checksum mismatch"));
    }

    let mut public = [0u8; 32];
    public.copy_from_slice(&data[prefix_len..body_len]);
    Ok((public, ident))
}

fn checksum(payload: &[u8]) -> [u8; 64] {
    let mut preimage = Vec::with_capacity(CHECKSUM_PREAMBLE.len() + payload.len());
    preimage.extend_from_slice(CHECKSUM_PREAMBLE);
    preimage.extend_from_slice(payload);
    blake2_512(&preimage)
}
