use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash as Phc, PasswordHasher, SaltString};
use argon2::{Argon2, Params};
use subtle::ConstantTimeEq;

use crate::error::PortalError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Well-formed hash under the default Argon2id parameters that no password
/// matches. Unknown logins verify against it so they cost the same as a
/// wrong password.
const DECOY_PHC: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2luYWctZGVjb3ktc2FsdA$\
                         AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(#[from] argon2::password_hash::Error);

/// Argon2id hash in PHC string form; salt and parameters travel inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    phc: String,
}

impl PasswordHash {
    pub fn new(password: &str) -> Result<Self, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string();
        Ok(Self { phc })
    }

    /// Wraps a PHC string read back from storage.
    pub fn from_phc(phc: String) -> Self {
        Self { phc }
    }

    pub fn decoy() -> Self {
        Self::from_phc(DECOY_PHC.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.phc
    }

    /// Recomputes the hash with the stored salt and parameters. A stored
    /// value that does not parse never verifies.
    pub fn verify(&self, candidate: &str) -> bool {
        let Ok(stored) = Phc::new(&self.phc) else {
            return false;
        };
        let (Some(salt), Some(expected)) = (stored.salt, stored.hash) else {
            return false;
        };
        let Ok(params) = Params::try_from(&stored) else {
            return false;
        };
        let Ok(computed) = Argon2::default().hash_password_customized(
            candidate.as_bytes(),
            Some(stored.algorithm),
            stored.version,
            params,
            salt,
        ) else {
            return false;
        };
        computed
            .hash
            .is_some_and(|output| bool::from(output.as_bytes().ct_eq(expected.as_bytes())))
    }
}

pub fn validate_password(password: &str) -> Result<(), PortalError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(PortalError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(PortalError::validation(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// One-time password handed out when an account is provisioned.
pub fn generate_initial_password() -> String {
    nanoid::nanoid!(12)
}
