//! Deterministic seed and latent-code string.
//!
//! The seed string concatenates `<KEY><value:.9>` for every key in
//! [`crate::features::FeatureKey::ORDER`]. Its SHA-256 digest is kept in
//! full (hex) and its first four bytes, read big-endian, form the `u32` seed. The reduction to
//! 32 bits is lossy: distinct feature sets can collide, the 256-bit digest
//! cannot in practice.
//!
//! The code string is
//! `IRIS/I?SEED=<seed>GHO=<int>GDH=<int>GRO=<.3>GRING=<.3>GTEX=<.3>G/1=<.3>`
//! with no separators; key names delimit the values.

use std::fmt::Write as _;

use sha2::{Digest, Sha256};

use crate::features::FeatureSet;

/// Fixed code prefix.
pub const CODE_PREFIX: &str = "IRIS/I?SEED=";

/// Output of the seed digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedDigest {
    /// First four digest bytes, big-endian.
    pub seed: u32,
    /// Full SHA-256 digest, lowercase hex.
    pub digest: String,
}

/// Encoded identity of one safe-zone image.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LatentCode {
    pub seed: u32,
    pub code: String,
    pub features: FeatureSet,
    /// Hex SHA-256 digest the seed was reduced from.
    pub digest: String,
}

impl LatentCode {
    /// Encode `features` into seed, digest and code string.
    pub fn encode(features: &FeatureSet) -> Self {
        let SeedDigest { seed, digest } = derive_seed(&seed_string(features));
        let code = encode_code_string(seed, features);
        Self {
            seed,
            code,
            features: *features,
            digest,
        }
    }
}

impl std::fmt::Display for LatentCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}

/// Concatenate `<KEY><value:.9>` in key order.
pub fn seed_string(features: &FeatureSet) -> String {
    let mut s = String::with_capacity(96);
    for (key, value) in features.iter() {
        let _ = write!(s, "{key}{value:.9}");
    }
    s
}

/// SHA-256 of `input`, reduced to `u32` from the first four bytes.
pub fn derive_seed(input: &str) -> SeedDigest {
    let hash = Sha256::digest(input.as_bytes());
    let seed = u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]]);
    SeedDigest {
        seed,
        digest: hex::encode(hash),
    }
}

/// Render the code string for `seed` and `features`.
///
/// `GHO` and `GDH` are truncated toward zero; the others use three decimals.
pub fn encode_code_string(seed: u32, features: &FeatureSet) -> String {
    let mut code = format!("{CODE_PREFIX}{seed}");
    for (key, value) in features.iter() {
        let _ = if key.is_integer() {
            write!(code, "{key}={}", value.trunc() as i64)
        } else {
            write!(code, "{key}={value:.3}")
        };
    }
    code
}
