//! Credential derivation for onboarded accounts.
//!
//! The encryption subsystem proper lives behind this seam: callers only ever
//! see an opaque password digest and a public key string. Key material is a
//! freshly generated ed25519 key; the private half is never retained here.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub password_hash: String,
    pub public_key: String,
}

/// Derives the stored credential for a new account from its plaintext
/// password.
pub fn derive_credential(password: &str) -> Credential {
    let signing_key = SigningKey::generate(&mut OsRng);
    Credential {
        password_hash: hash_password(password),
        public_key: hex::encode(signing_key.verifying_key().to_bytes()),
    }
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    hash_password(password) == password_hash
}
