//! Reversible credential obscuring
//!
//! Stored passwords and salts are kept in a reversible but non-plaintext
//! encoding so that config files and API responses never show raw
//! credentials. Obscured values carry a marker prefix; obscuring an
//! already-obscured value is a no-op, which makes driver initialization
//! idempotent across restarts.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{Error, Result};

/// Marker prepended to every obscured value.
pub const OBSCURED_PREFIX: &str = "___Obscured___";

// Fixed keystream for the reversible encoding. This is obfuscation of
// at-rest config values, not encryption; the cipher capability handles
// all actual cryptography.
const OBSCURE_KEY: &[u8] = &[
    0x9c, 0x93, 0x5b, 0x48, 0x73, 0x0a, 0x55, 0x4d, 0x6b, 0xfd, 0x7c, 0x63, 0xc8, 0x86, 0xa9,
    0x2b, 0xd3, 0x90, 0x19, 0x8e, 0xb8, 0x12, 0x8a, 0xfb, 0xf4, 0xde, 0x16, 0x2b, 0x8b, 0x95,
    0xf6, 0x38,
];

fn xor_keystream(data: &[u8]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, b)| b ^ OBSCURE_KEY[i % OBSCURE_KEY.len()])
        .collect()
}

/// Encode a plaintext value into its obscured form (with marker prefix).
pub fn obscure(value: &str) -> String {
    let encoded = URL_SAFE_NO_PAD.encode(xor_keystream(value.as_bytes()));
    format!("{}{}", OBSCURED_PREFIX, encoded)
}

/// Obscure a stored value in place unless it is already obscured.
pub fn obscure_in_place(value: &mut String) {
    if !value.starts_with(OBSCURED_PREFIX) {
        *value = obscure(value);
    }
}

/// Decode an obscured value back to plaintext. Values without the marker
/// prefix are returned unchanged (never-obscured legacy configs).
pub fn reveal(value: &str) -> Result<String> {
    let Some(encoded) = value.strip_prefix(OBSCURED_PREFIX) else {
        return Ok(value.to_string());
    };
    let raw = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| Error::Config(format!("malformed obscured credential: {}", e)))?;
    String::from_utf8(xor_keystream(&raw))
        .map_err(|e| Error::Config(format!("malformed obscured credential: {}", e)))
}
