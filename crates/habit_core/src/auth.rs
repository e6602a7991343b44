use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Credential handling seam. Session logic only ever sees opaque hash
/// strings; swapping the scheme never changes the login state machine.
pub trait CredentialScheme: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String>;
    fn verify(&self, plain: &str, hash: &str) -> Result<bool>;
}

/// Salted argon2 hashing; stored values are PHC strings.
#[derive(Debug, Default)]
pub struct ArgonScheme;

impl CredentialScheme for ArgonScheme {
    fn hash(&self, plain: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|err| anyhow!("unable to hash password: {err}"))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|err| anyhow!("stored password hash is malformed: {err}"))?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let scheme = ArgonScheme;
        let hash = scheme.hash("correct-horse").expect("hash");
        assert_ne!(hash, "correct-horse");
        assert!(scheme.verify("correct-horse", &hash).expect("verify"));
    }

    #[test]
    fn verify_rejects_a_wrong_password() {
        let scheme = ArgonScheme;
        let hash = scheme.hash("correct-horse").expect("hash");
        assert!(!scheme.verify("battery-staple", &hash).expect("verify"));
    }

    #[test]
    fn verify_errors_on_a_malformed_hash() {
        let scheme = ArgonScheme;
        assert!(scheme.verify("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn salting_makes_hashes_unique() {
        let scheme = ArgonScheme;
        let first = scheme.hash("same-password").expect("hash");
        let second = scheme.hash("same-password").expect("hash");
        assert_ne!(first, second);
    }
}
