//! Password digests.
//!
//! Stored credentials come in two formats. Legacy rows hold an unsalted
//! SHA-256 hex digest; new rows hold an Argon2 PHC string (`$argon2id$...`)
//! with a per-user salt. Verification accepts either, hashing uses the
//! configured scheme.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{HmsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    /// Unsalted single-round digest, kept for compatibility with existing rows.
    Sha256,
    Argon2,
}

pub fn hash_password(scheme: PasswordScheme, password: &str) -> Result<String> {
    match scheme {
        PasswordScheme::Sha256 => Ok(legacy_digest(password)),
        PasswordScheme::Argon2 => {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| HmsError::Validation(format!("password hashing failed: {e}")))
        }
    }
}

pub fn verify_password(stored: &str, password: &str) -> bool {
    if is_legacy(stored) {
        return stored.trim().eq_ignore_ascii_case(&legacy_digest(password));
    }
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// True for stored values that are not PHC strings.
pub fn is_legacy(stored: &str) -> bool {
    !stored.starts_with('$')
}

fn legacy_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Random password for the bootstrap administrator.
pub fn generate_password() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";
    let mut bytes = [0u8; 20];
    rand::rng().fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
        .collect()
}
