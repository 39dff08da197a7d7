//! Canonical payload encoding, digests and signatures.

use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::Result;

type HmacSha256 = Hmac<Sha256>;

/// JSON encoding with object keys sorted at every depth.
pub fn canonical_bytes(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&sorted(value))?)
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::with_capacity(map.len());
            for key in keys {
                out.insert(key.clone(), sorted(&map[key.as_str()]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

pub fn sha256_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(bytes.as_ref()))
}

/// Hex SHA-256 of the canonical encoding of `metadata`.
pub fn payload_hash(metadata: &Value) -> Result<String> {
    Ok(sha256_hex(canonical_bytes(metadata)?))
}

fn keyed_mac(secret_seed: &str, temporal_anchor: u64, hash: &str) -> HmacSha256 {
    let key = format!("{secret_seed}-{temporal_anchor}");
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(hash.as_bytes());
    mac
}

/// HMAC-SHA256 over `hash` keyed with `"{seed}-{anchor}"`, hex encoded and
/// truncated to `hex_len` characters.
pub fn sign(secret_seed: &str, temporal_anchor: u64, hash: &str, hex_len: usize) -> String {
    let tag = hex::encode(keyed_mac(secret_seed, temporal_anchor, hash).finalize().into_bytes());
    tag[..hex_len.min(tag.len())].to_owned()
}

/// Constant-time check that `signature` is exactly what [`sign`] would emit.
pub fn signature_matches(
    secret_seed: &str,
    temporal_anchor: u64,
    hash: &str,
    signature: &str,
    hex_len: usize,
) -> bool {
    if signature.len() != hex_len || !signature.bytes().all(is_lower_hex) {
        return false;
    }
    let Ok(tag) = hex::decode(signature) else {
        return false;
    };
    keyed_mac(secret_seed, temporal_anchor, hash)
        .verify_truncated_left(&tag)
        .is_ok()
}

fn is_lower_hex(byte: u8) -> bool {
    matches!(byte, b'0'..=b'9' | b'a'..=b'f')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_hash() {
        let a = json!({"b": 1, "a": {"y": [1, {"d": 0, "c": 1}], "x": "s"}});
        let mut b = Map::new();
        b.insert("a".into(), json!({"x": "s", "y": [1, {"c": 1, "d": 0}]}));
        b.insert("b".into(), json!(1));
        assert_eq!(payload_hash(&a).unwrap(), payload_hash(&Value::Object(b)).unwrap());
        assert_eq!(
            String::from_utf8(canonical_bytes(&a).unwrap()).unwrap(),
            r#"{"a":{"x":"s","y":[1,{"c":1,"d":0}]},"b":1}"#
        );
    }

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn signature_depends_on_seed_and_anchor() {
        let hash = sha256_hex(b"payload");
        let base = sign("seed", 1, &hash, 32);
        assert_eq!(base.len(), 32);
        assert_ne!(base, sign("seed", 2, &hash, 32));
        assert_ne!(base, sign("other", 1, &hash, 32));
        assert!(signature_matches("seed", 1, &hash, &base, 32));
        assert!(!signature_matches("seed", 2, &hash, &base, 32));
    }

    #[test]
    fn truncated_or_uppercase_signatures_are_rejected() {
        let hash = sha256_hex(b"payload");
        let full = sign("seed", 7, &hash, 32);
        assert!(!signature_matches("seed", 7, &hash, &full[..16], 32));
        assert!(!signature_matches("seed", 7, &hash, &full.to_uppercase(), 32));
        assert!(!signature_matches("seed", 7, &hash, "zz", 32));
    }
}
