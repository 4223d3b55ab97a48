use super::auth::{AuthToken, AuthTokenValue, UserAuthCredentials};
use anyhow::Result;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the user's authentication credentials given the user handle.
    /// Returns Ok(None) if the user has no password credentials.
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>>;

    /// Inserts or replaces the user's password credentials.
    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns Ok(None) if the token does not exist.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes a token, returning it, or Ok(None) if it did not exist.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates a new user and returns the user id.
    fn create_user(&self, user_handle: &str) -> Result<usize>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>>;

    fn get_all_user_handles(&self) -> Result<Vec<String>>;
}
