use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("stored credential digest is corrupt: {0}")]
    Corrupt(password_hash::Error),

    #[error("failed to hash credential: {0}")]
    Hashing(password_hash::Error),
}

/// Hashes a password with Argon2id. A fresh salt is generated per call and
/// embedded in the returned PHC string.
pub fn hash(plaintext: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(CredentialError::Hashing)?;

    Ok(digest.to_string())
}

/// Checks a password against a stored digest. A mismatch is `Ok(false)`; only a
/// digest that cannot be parsed is an error.
pub fn verify(plaintext: &str, digest: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(digest).map_err(CredentialError::Corrupt)?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CredentialError::Corrupt(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_matching_password() {
        let digest = hash("pw1").unwrap();
        assert!(verify("pw1", &digest).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_password_without_error() {
        let digest = hash("pw1").unwrap();
        assert!(!verify("pw2", &digest).unwrap());
    }

    #[test]
    fn digest_never_contains_plaintext_and_salts_differ() {
        let first = hash("correct horse").unwrap();
        let second = hash("correct horse").unwrap();
        assert!(!first.contains("correct horse"));
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_digest_is_corrupt() {
        let result = verify("pw1", "not-a-phc-string");
        assert!(matches!(result, Err(CredentialError::Corrupt(_))));
    }
}
