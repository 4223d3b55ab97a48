use super::auth::{AuthToken, AuthTokenValue, CredentialHasher, UserAuthCredentials};
use super::user_store::UserStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

#[derive(Debug, PartialEq, Eq)]
pub enum RegisterError {
    HandleTaken,
}

/// Registration, login and token resolution on top of a [`UserStore`].
pub struct UserManager {
    user_store: Arc<dyn UserStore>,
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>) -> UserManager {
        UserManager { user_store }
    }

    /// Creates an account with password credentials and an initial auth
    /// token. Returns Err(HandleTaken) inside Ok when the handle exists.
    pub fn register(
        &self,
        handle: &str,
        password: &str,
    ) -> Result<std::result::Result<(usize, AuthToken), RegisterError>> {
        if self.user_store.get_user_id(handle)?.is_some() {
            return Ok(Err(RegisterError::HandleTaken));
        }
        let user_id = self.user_store.create_user(handle)?;

        let hasher = CredentialHasher::Argon2;
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(password.as_bytes(), &salt)?;
        self.user_store
            .update_user_auth_credentials(UserAuthCredentials {
                user_id,
                salt,
                hash,
                hasher,
                created: SystemTime::now(),
                last_used: None,
            })?;

        let token = self.generate_auth_token(user_id)?;
        Ok(Ok((user_id, token)))
    }

    /// Verifies the password and issues a fresh auth token.
    /// Returns Ok(None) on unknown handle or wrong password.
    pub fn login(&self, handle: &str, password: &str) -> Result<Option<AuthToken>> {
        let credentials = match self.user_store.get_user_auth_credentials(handle)? {
            None => {
                debug!("Login attempt for unknown handle {}", handle);
                return Ok(None);
            }
            Some(x) => x,
        };
        if !credentials
            .hasher
            .verify(password, credentials.hash.as_str())?
        {
            return Ok(None);
        }
        Ok(Some(self.generate_auth_token(credentials.user_id)?))
    }

    pub fn generate_auth_token(&self, user_id: usize) -> Result<AuthToken> {
        let token = AuthToken {
            user_id,
            created: SystemTime::now(),
            last_used: None,
            value: AuthTokenValue::generate(),
        };
        self.user_store.add_user_auth_token(token.clone())?;
        Ok(token)
    }

    pub fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.user_store.get_user_auth_token(value)
    }

    pub fn update_auth_token_last_used(&self, value: &AuthTokenValue) -> Result<()> {
        self.user_store
            .update_user_auth_token_last_used_timestamp(value)
    }

    pub fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.user_store.delete_user_auth_token(value)
    }

    pub fn get_user_handle(&self, user_id: usize) -> Result<Option<String>> {
        self.user_store.get_user_handle(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::SqliteUserStore;
    use tempfile::TempDir;

    fn test_manager() -> (TempDir, UserManager) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteUserStore::new(dir.path().join("users.db")).unwrap());
        (dir, UserManager::new(store))
    }

    #[test]
    fn register_then_login() {
        let (_dir, manager) = test_manager();

        let (user_id, token) = manager.register("marta", "pw123").unwrap().unwrap();
        assert_eq!(
            manager
                .get_auth_token(&token.value)
                .unwrap()
                .unwrap()
                .user_id,
            user_id
        );

        assert!(matches!(
            manager.register("marta", "other").unwrap(),
            Err(RegisterError::HandleTaken)
        ));

        assert!(manager.login("marta", "wrong").unwrap().is_none());
        assert!(manager.login("nobody", "pw123").unwrap().is_none());
        let login_token = manager.login("marta", "pw123").unwrap().unwrap();
        assert_eq!(login_token.user_id, user_id);
        assert_ne!(login_token.value, token.value);
    }

    #[test]
    fn logout_invalidates_token() {
        let (_dir, manager) = test_manager();
        let (_, token) = manager.register("marta", "pw123").unwrap().unwrap();

        assert!(manager.delete_auth_token(&token.value).unwrap().is_some());
        assert!(manager.get_auth_token(&token.value).unwrap().is_none());
    }
}
