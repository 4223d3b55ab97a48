//! Annotator authentication primitives.

use anyhow::{bail, Result};
use rand::Rng;
use rand_distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::SystemTime;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct AuthTokenValue(pub String);

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AuthToken {
    pub user_id: usize,
    pub created: SystemTime,
    pub last_used: Option<SystemTime>,
    pub value: AuthTokenValue,
}

impl AuthTokenValue {
    pub fn generate() -> AuthTokenValue {
        let rng = rand::rng();
        let random_string: String = rng
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();
        AuthTokenValue(random_string)
    }
}

mod argon2_hashing {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash<T: AsRef<str>>(plain: &[u8], b64_salt: T) -> Result<String> {
        let argon2 = Argon2::default();
        let salt = SaltString::from_b64(b64_salt.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(argon2
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string())
    }

    pub fn verify<T: AsRef<str>>(plain_pw: &[u8], target_hash: T) -> Result<bool> {
        let argon2 = Argon2::default();
        let password_hash =
            PasswordHash::new(target_hash.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(argon2.verify_password(plain_pw, &password_hash).is_ok())
    }
}

/// Password hashing scheme, stored next to the hash so that schemes can be
/// rotated later.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub enum CredentialHasher {
    Argon2,
}

impl FromStr for CredentialHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(CredentialHasher::Argon2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl std::fmt::Display for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialHasher::Argon2 => write!(f, "argon2"),
        }
    }
}

impl CredentialHasher {
    pub fn generate_b64_salt(&self) -> String {
        match self {
            CredentialHasher::Argon2 => argon2_hashing::generate_b64_salt(),
        }
    }

    pub fn hash<T: AsRef<str>>(&self, plain: &[u8], b64_salt: T) -> Result<String> {
        match self {
            CredentialHasher::Argon2 => argon2_hashing::hash(plain, b64_salt),
        }
    }

    pub fn verify<T: AsRef<str>>(&self, plain_pw: T, target_hash: T) -> Result<bool> {
        match self {
            CredentialHasher::Argon2 => {
                argon2_hashing::verify(plain_pw.as_ref().as_bytes(), target_hash)
            }
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct UserAuthCredentials {
    pub user_id: usize,
    pub salt: String,
    pub hash: String,
    pub hasher: CredentialHasher,
    pub created: SystemTime,
    pub last_used: Option<SystemTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argon2_hash_and_verify() {
        let pw = "123mypw";
        let b64_salt = CredentialHasher::Argon2.generate_b64_salt();

        let hash1 = CredentialHasher::Argon2
            .hash(pw.as_bytes(), &b64_salt)
            .unwrap();
        let hash2 = CredentialHasher::Argon2
            .hash(b"123mypw", &b64_salt)
            .unwrap();
        assert_eq!(hash1, hash2);

        assert!(CredentialHasher::Argon2.verify("123mypw", &hash1).unwrap());
        assert!(!CredentialHasher::Argon2
            .verify("not the pw", &hash1)
            .unwrap());
    }

    #[test]
    fn token_values_are_long_and_distinct() {
        let a = AuthTokenValue::generate();
        let b = AuthTokenValue::generate();
        assert_eq!(a.0.len(), 64);
        assert_ne!(a, b);
    }
}
