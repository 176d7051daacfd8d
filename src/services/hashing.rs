use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::modules::auth::interface::PasswordEncoder;

#[derive(Debug, thiserror::Error)]
#[error("Password hashing failed: {0}")]
pub struct HashingError(String);

impl From<argon2::password_hash::Error> for HashingError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self(err.to_string())
    }
}

/// Argon2id encoder producing PHC strings.
/// m=8MB, t=2 iterations, p=1 parallelism
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordEncoder;

impl Argon2PasswordEncoder {
    fn argon2() -> Result<Argon2<'static>, HashingError> {
        let params = Params::new(8192, 2, 1, None).map_err(|e| HashingError(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl PasswordEncoder for Argon2PasswordEncoder {
    fn encode(&self, raw: &str) -> Result<String, HashingError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()?.hash_password(raw.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    fn matches(&self, raw: &str, encoded: &str) -> Result<bool, HashingError> {
        let parsed = PasswordHash::new(encoded)?;
        Ok(Self::argon2()?.verify_password(raw.as_bytes(), &parsed).is_ok())
    }
}
