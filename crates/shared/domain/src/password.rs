//! Password value object - Domain layer password handling.
//!
//! Encodes a credential as a single opaque blob: base64(salt || SHA-256(salt || password)).
//! The salt is 16 random bytes, regenerated for every hash. Verification extracts
//! the salt, recomputes the digest and compares in constant time.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Salt length in bytes, fixed so verification can split the blob.
const SALT_LENGTH: usize = 16;

/// SHA-256 digest length in bytes.
const DIGEST_LENGTH: usize = 32;

/// Password value object that handles hashing and verification.
///
/// Immutable, compared by value. Holds only the encoded blob, never the
/// plain text.
#[derive(Clone)]
pub struct Password {
    encoded: String,
}

// Don't expose the blob in debug output (security)
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("encoded", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Create a new password by hashing the plain text.
    ///
    /// # Errors
    /// Returns a validation error if the password length is outside the
    /// accepted policy range.
    pub fn new(plain_text: &str) -> DomainResult<Self> {
        if !Self::is_valid(plain_text) {
            return Err(DomainError::validation(format!(
                "Password must be between {} and {} characters",
                MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
            )));
        }

        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);

        let digest = Self::digest(&salt, plain_text);

        let mut combined = Vec::with_capacity(SALT_LENGTH + DIGEST_LENGTH);
        combined.extend_from_slice(&salt);
        combined.extend_from_slice(&digest);

        Ok(Self {
            encoded: BASE64.encode(combined),
        })
    }

    /// Create a Password from an existing encoded blob (from storage).
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self {
            encoded: encoded.into(),
        }
    }

    /// Check a plain text password against the length policy.
    pub fn is_valid(plain_text: &str) -> bool {
        let len = plain_text.chars().count();
        (MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len)
    }

    /// Get the encoded blob for storage.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// Consume and return the encoded blob.
    pub fn into_string(self) -> String {
        self.encoded
    }

    /// Verify a plain text password against this blob.
    ///
    /// A malformed blob (bad base64, wrong length) fails verification
    /// rather than erroring.
    pub fn verify(&self, plain_text: &str) -> bool {
        let combined = match BASE64.decode(&self.encoded) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        if combined.len() != SALT_LENGTH + DIGEST_LENGTH {
            return false;
        }

        let (salt, stored_digest) = combined.split_at(SALT_LENGTH);
        let computed = Self::digest(salt, plain_text);

        // Constant-time comparison to resist timing side channels
        bool::from(computed.ct_eq(stored_digest))
    }

    fn digest(salt: &[u8], plain_text: &str) -> [u8; DIGEST_LENGTH] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(plain_text.as_bytes());
        hasher.finalize().into()
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.encoded
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for Password {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let plain = "secret1";
        let password = Password::new(plain).unwrap();

        assert!(password.verify(plain));
        assert!(!password.verify("wrong-password"));
    }

    #[test]
    fn test_password_from_encoded() {
        let plain = "TestPassword123";
        let password = Password::new(plain).unwrap();
        let blob = password.as_str().to_string();

        let restored = Password::from_encoded(blob);
        assert!(restored.verify(plain));
    }

    #[test]
    fn test_same_password_different_salts() {
        let plain = "SamePassword123";
        let pass1 = Password::new(plain).unwrap();
        let pass2 = Password::new(plain).unwrap();

        // Different salts produce different blobs
        assert_ne!(pass1.as_str(), pass2.as_str());
        // But both verify correctly
        assert!(pass1.verify(plain));
        assert!(pass2.verify(plain));
    }

    #[test]
    fn test_malformed_blob_fails_verification() {
        assert!(!Password::from_encoded("not-base64!!!").verify("anything"));
        assert!(!Password::from_encoded("").verify("anything"));
        // Valid base64 but wrong length
        assert!(!Password::from_encoded(BASE64.encode(b"short")).verify("anything"));
    }

    #[test]
    fn test_length_policy() {
        assert!(Password::new("12345").is_err());
        assert!(Password::new("123456").is_ok());
        assert!(Password::new(&"x".repeat(50)).is_ok());
        assert!(Password::new(&"x".repeat(51)).is_err());
    }
}
