//! BLAKE2b-256 hashing and base64url encoding
//!
//! Request keys are the unpadded base64url encoding of the BLAKE2b-256 digest
//! of a command's canonical JSON.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use crate::error::TypesResult;

type Blake2b256 = Blake2b<U32>;

/// Compute the BLAKE2b-256 digest of the input data
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash the input and encode the digest as unpadded base64url
pub fn hash_encoded(data: &[u8]) -> String {
    base64url_encode(&blake2b_256(data))
}

/// Encode bytes as unpadded base64url
pub fn base64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode base64url, accepting input with or without padding
pub fn base64url_decode(encoded: &str) -> TypesResult<Vec<u8>> {
    Ok(URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('='))?)
}

/// Hash a seed and keep only the ASCII letters of the encoded digest.
///
/// Used for nonces and throwaway module names. The result is unique enough
/// to bust caches but carries no cryptographic guarantee.
pub fn letters_only_hash(seed: &str) -> String {
    hash_encoded(seed.as_bytes())
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake2b_empty() {
        let digest = blake2b_256(&[]);
        assert_eq!(
            digest[..4],
            [0x0e, 0x57, 0x51, 0xc0],
        );
    }

    #[test]
    fn test_hash_encoded_empty() {
        // Well-known request key of the empty string
        assert_eq!(hash_encoded(b""), "DldRwCblQ7Loqy6wYJnaodHl30d3j3eH-qtFzfEv46g");
    }

    #[test]
    fn test_hash_encoded_vectors() {
        assert_eq!(hash_encoded(b"hello"), "Mk3PAn3UowqTLEQfNlol6GsXPe-kuOWJSCU0cbgbcs8");
        assert_eq!(hash_encoded(b"abc"), "vd2BPGNCOXIxce8_7phXm5SWTjuxyz5CcmLIwGjVIxk");
    }

    #[test]
    fn test_hash_encoded_is_url_safe() {
        let encoded = hash_encoded(b"abc");
        assert_eq!(encoded.len(), 43);
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('='));
    }

    #[test]
    fn test_base64url_decode_padded_and_unpadded() {
        let raw = b"{\"a\":1}";
        let unpadded = base64url_encode(raw);
        let padded = format!("{}==", unpadded);
        assert_eq!(base64url_decode(&unpadded).unwrap(), raw);
        assert_eq!(base64url_decode(&padded).unwrap(), raw);
    }

    #[test]
    fn test_base64url_decode_invalid() {
        assert!(base64url_decode("not*base64").is_err());
    }

    #[test]
    fn test_letters_only_hash() {
        let nonce = letters_only_hash("2024-01-01T00:00:00Z");
        assert!(!nonce.is_empty());
        assert!(nonce.chars().all(|c| c.is_ascii_alphabetic()));
        assert_eq!(nonce, letters_only_hash("2024-01-01T00:00:00Z"));
        assert_ne!(nonce, letters_only_hash("2024-01-01T00:00:01Z"));
    }
}
