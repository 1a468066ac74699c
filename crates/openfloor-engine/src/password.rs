//! Salted SHA-256 password hasher.
//!
//! Storage format is `hex(salt)$hex(sha256(salt || password))`.
//! Production deployments should put a memory-hard KDF behind the same
//! trait; the format here is intentionally self-describing so hashes
//! can be migrated.

use openfloor_types::PasswordHasher;
use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

/// Reference password hasher used by the bundled binary and the tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256PasswordHasher;

impl Sha256PasswordHasher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn digest(salt: &[u8], password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        format!("{}${}", hex::encode(salt), Self::digest(&salt, password))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Some((salt_hex, digest_hex)) = hash.split_once('$') else {
            return false;
        };
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        Self::digest(&salt, password) == digest_hex
    }
}
