//! Canonical hashing and seed derivation.
//!
//! This module implements the determinism policy for Blocktape:
//! - JSON canonicalization (sorted keys, no whitespace) for parameter hashes
//! - BLAKE3 hashing for content hashes, ids, and provenance
//! - Stable numeric hashes used for catalogue selection and RNG seeding

use serde::Serialize;

use crate::error::SpecError;

/// Computes the canonical BLAKE3 hash of any serializable value.
///
/// ```text
/// value_hash = hex(BLAKE3(canonical_json(value)))
/// ```
///
/// # Example
/// ```
/// use blocktape_spec::hash::canonical_hash;
///
/// let a = canonical_hash(&serde_json::json!({"b": 1, "a": 2})).unwrap();
/// let b = canonical_hash(&serde_json::json!({"a": 2, "b": 1})).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, SpecError> {
    let value = serde_json::to_value(value)?;
    Ok(blake3_hash_str(&canonicalize_json(&value)))
}

/// Canonicalizes a JSON value.
///
/// Produces a deterministic string where object keys are sorted
/// lexicographically, there is no insignificant whitespace, and numbers
/// use their shortest round-trip form.
pub fn canonicalize_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => format_number(n),
        serde_json::Value::String(s) => format_string(s),
        serde_json::Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(canonicalize_json).collect();
            format!("[{}]", items.join(","))
        }
        serde_json::Value::Object(obj) => {
            let mut pairs: Vec<(&String, &serde_json::Value)> = obj.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));

            let pairs: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("{}:{}", format_string(k), canonicalize_json(v)))
                .collect();
            format!("{{{}}}", pairs.join(","))
        }
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if !f.is_finite() => "null".to_string(),
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => format!("{}", f),
        None => "null".to_string(),
    }
}

fn format_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c < '\x20' => result.push_str(&format!("\\u{:04x}", c as u32)),
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

/// Computes a BLAKE3 hash of arbitrary data as 64 lowercase hex characters.
pub fn blake3_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Computes a BLAKE3 hash of a string.
pub fn blake3_hash_str(s: &str) -> String {
    blake3_hash(s.as_bytes())
}

/// Hashes a string to a stable u64 (first 8 bytes of BLAKE3, little-endian).
///
/// Used wherever a string identifier must select an entry from a table.
pub fn stable_hash_u64(s: &str) -> u64 {
    let hash = blake3::hash(s.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Selects an index into a table of `len` entries.
///
/// ```text
/// index = (stable_hash_u64(key || ":" || salt) + offset) mod len
/// ```
///
/// `salt` keeps selections for different tables independent when they
/// share a key. Returns 0 for an empty table.
pub fn select_index(key: &str, salt: &str, offset: u64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let hash = stable_hash_u64(&format!("{}:{}", key, salt));
    (hash.wrapping_add(offset) % len as u64) as usize
}

/// Derives a u32 seed for a named component from a seed string.
///
/// ```text
/// component_seed = truncate_u32(BLAKE3(seed || component))
/// ```
///
/// # Example
/// ```
/// use blocktape_spec::hash::derive_component_seed;
///
/// let kick = derive_component_seed("lofi_abcd1234_7_x9", "vinyl");
/// let hat = derive_component_seed("lofi_abcd1234_7_x9", "hihat");
/// assert_ne!(kick, hat);
/// ```
pub fn derive_component_seed(seed: &str, component: &str) -> u32 {
    let mut input = Vec::with_capacity(seed.len() + component.len());
    input.extend_from_slice(seed.as_bytes());
    input.extend_from_slice(component.as_bytes());

    let hash = blake3::hash(&input);
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&hash.as_bytes()[0..4]);
    u32::from_le_bytes(bytes)
}

/// Returns the first `n` characters of a hex hash (or the whole string if shorter).
pub fn short_hash(hash: &str, n: usize) -> &str {
    let hash = hash.strip_prefix("0x").unwrap_or(hash);
    match hash.char_indices().nth(n) {
        Some((idx, _)) => &hash[..idx],
        None => hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_json_object_ordering() {
        let json1: serde_json::Value = serde_json::from_str(r#"{"b": 1, "a": 2}"#).unwrap();
        let json2: serde_json::Value = serde_json::from_str(r#"{"a": 2, "b": 1}"#).unwrap();

        assert_eq!(canonicalize_json(&json1), canonicalize_json(&json2));
        assert_eq!(canonicalize_json(&json1), r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn test_canonicalize_json_nested() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"z": [1, 2.5, 3], "a": {"c": true, "b": null}}"#).unwrap();

        assert_eq!(
            canonicalize_json(&json),
            r#"{"a":{"b":null,"c":true},"z":[1,2.5,3]}"#
        );
    }

    #[test]
    fn test_canonicalize_json_strings() {
        let json: serde_json::Value = serde_json::from_str(r#"{"text": "hi\n\"x\""}"#).unwrap();
        assert_eq!(canonicalize_json(&json), r#"{"text":"hi\n\"x\""}"#);
    }

    #[test]
    fn test_blake3_hash_known_value() {
        // echo -n "hello world" | b3sum
        assert_eq!(
            blake3_hash_str("hello world"),
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
    }

    #[test]
    fn test_select_index_bounds_and_offset() {
        for offset in 0..50 {
            let idx = select_index("0xabc", "chords", offset, 7);
            assert!(idx < 7);
        }
        let a = select_index("0xabc", "chords", 0, 7);
        let b = select_index("0xabc", "chords", 1, 7);
        assert_eq!((a + 1) % 7, b);
        assert_eq!(select_index("0xabc", "chords", 3, 0), 0);
    }

    #[test]
    fn test_select_index_salt_independence() {
        let picks: Vec<usize> = ["chords", "melody", "kick", "snare", "hihat", "bass"]
            .iter()
            .map(|salt| select_index("0xfeedbeef", salt, 0, 1000))
            .collect();
        let mut unique = picks.clone();
        unique.sort_unstable();
        unique.dedup();
        assert!(unique.len() > 1, "salts should decorrelate picks: {:?}", picks);
    }

    #[test]
    fn test_derive_component_seed_determinism() {
        let a = derive_component_seed("seed", "vinyl");
        assert_eq!(a, derive_component_seed("seed", "vinyl"));
        assert_ne!(a, derive_component_seed("seed2", "vinyl"));
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0xdeadbeefcafe", 8), "deadbeef");
        assert_eq!(short_hash("abc", 8), "abc");
    }
}
