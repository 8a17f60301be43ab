//! Identity redaction.
//!
//! Phone numbers and channel ids are replaced by a hex digest before they are
//! handed to the AI platform. The digest is unsalted so the same identifier
//! always maps to the same value; this keeps session lookups stable but means
//! a small identifier space (phone numbers) can be enumerated by anyone who
//! knows the algorithm.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};

use crate::config::RedactionConfig;
use crate::error::{BridgeError, Result};

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha512_224 => "sha512_224",
            HashAlgorithm::Sha512_256 => "sha512_256",
        }
    }

    /// Hex-encoded digest of `value`.
    pub fn digest_hex(&self, value: &str) -> String {
        let bytes = value.as_bytes();
        match self {
            HashAlgorithm::Sha224 => hex::encode(Sha224::digest(bytes)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
            HashAlgorithm::Sha384 => hex::encode(Sha384::digest(bytes)),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(bytes)),
            HashAlgorithm::Sha512_224 => hex::encode(Sha512_224::digest(bytes)),
            HashAlgorithm::Sha512_256 => hex::encode(Sha512_256::digest(bytes)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = BridgeError;

    /// Accepts `sha256`, `SHA-256`, `sha512/256` and similar spellings.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '/' { '_' } else { c })
            .filter(|c| *c != '-')
            .collect();
        match normalized.as_str() {
            "sha224" => Ok(HashAlgorithm::Sha224),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "sha512_224" => Ok(HashAlgorithm::Sha512_224),
            "sha512_256" => Ok(HashAlgorithm::Sha512_256),
            _ => Err(BridgeError::Config(format!(
                "unsupported hash algorithm '{}'",
                s
            ))),
        }
    }
}

/// Applies the configured redaction to user and session identifiers.
#[derive(Debug, Clone)]
pub struct Redactor {
    algorithm: HashAlgorithm,
    hide_user_id: bool,
    hide_session_id: bool,
}

impl Redactor {
    pub fn new(algorithm: HashAlgorithm, hide_user_id: bool, hide_session_id: bool) -> Self {
        Self {
            algorithm,
            hide_user_id,
            hide_session_id,
        }
    }

    /// Builds a redactor from config, failing on an unknown algorithm name.
    pub fn from_config(config: &RedactionConfig) -> Result<Self> {
        Ok(Self::new(
            config.hash_algorithm.parse()?,
            config.hide_user_id,
            config.hide_session_id,
        ))
    }

    /// Unconditional one-way digest of `value`.
    pub fn redact(&self, value: &str) -> String {
        self.algorithm.digest_hex(value)
    }

    /// Working user id: hashed when `hide_user_id` is set, else unchanged.
    pub fn user_id(&self, clear: &str) -> String {
        if self.hide_user_id {
            self.redact(clear)
        } else {
            clear.to_string()
        }
    }

    /// Working session id: hashed when `hide_session_id` is set, else unchanged.
    pub fn session_id(&self, clear: &str) -> String {
        if self.hide_session_id {
            self.redact(clear)
        } else {
            clear.to_string()
        }
    }

    pub fn hides_user_id(&self) -> bool {
        self.hide_user_id
    }

    pub fn hides_session_id(&self) -> bool {
        self.hide_session_id
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(HashAlgorithm::Sha256, true, true)
    }
}
