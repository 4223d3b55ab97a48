use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned_db, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use crate::user::auth::{AuthToken, AuthTokenValue, CredentialHasher, UserAuthCredentials};
use crate::user::user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_handle", "handle")],
};

const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[("idx_auth_token_value", "value")],
};

const USER_PASSWORD_CREDENTIALS_TABLE_V_0: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE_V_0,
        AUTH_TOKEN_TABLE_V_0,
        USER_PASSWORD_CREDENTIALS_TABLE_V_0,
    ],
    migration: None,
}];

fn to_unix_seconds(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}

fn from_unix_seconds(secs: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs.max(0) as u64)
}

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), VERSIONED_SCHEMAS)
            .context("Failed to open user database")?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user_handle: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!("INSERT INTO {} (handle) VALUES (?1)", USER_TABLE_V_0.name),
            params![user_handle],
        )
        .with_context(|| format!("Failed to create user {}", user_handle))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let handle = conn
            .query_row(
                &format!("SELECT handle FROM {} WHERE id = ?1", USER_TABLE_V_0.name),
                params![user_id as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(handle)
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        let id: Option<i64> = conn
            .query_row(
                &format!("SELECT id FROM {} WHERE handle = ?1", USER_TABLE_V_0.name),
                params![user_handle],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(|id| id as usize))
    }

    fn get_all_user_handles(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("SELECT handle FROM {}", USER_TABLE_V_0.name))?;
        let handles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(handles)
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>> {
        let conn = self.conn.lock().unwrap();
        let credentials = conn
            .query_row(
                &format!(
                    "SELECT c.user_id, c.salt, c.hash, c.hasher, c.created, c.last_used \
                     FROM {credentials} c JOIN {users} u ON u.id = c.user_id \
                     WHERE u.handle = ?1",
                    credentials = USER_PASSWORD_CREDENTIALS_TABLE_V_0.name,
                    users = USER_TABLE_V_0.name,
                ),
                params![user_handle],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, Option<i64>>(5)?,
                    ))
                },
            )
            .optional()?;

        match credentials {
            None => Ok(None),
            Some((user_id, salt, hash, hasher, created, last_used)) => {
                Ok(Some(UserAuthCredentials {
                    user_id: user_id as usize,
                    salt,
                    hash,
                    hasher: CredentialHasher::from_str(&hasher)?,
                    created: from_unix_seconds(created),
                    last_used: last_used.map(from_unix_seconds),
                }))
            }
        }
    }

    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (user_id, salt, hash, hasher, created, last_used) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                USER_PASSWORD_CREDENTIALS_TABLE_V_0.name
            ),
            params![
                credentials.user_id as i64,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string(),
                to_unix_seconds(credentials.created),
                credentials.last_used.map(to_unix_seconds),
            ],
        )?;
        Ok(())
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT user_id, value, created, last_used FROM {} WHERE value = ?1",
                    AUTH_TOKEN_TABLE_V_0.name
                ),
                params![token.0],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                    ))
                },
            )
            .optional()?;
        Ok(row.map(|(user_id, value, created, last_used)| AuthToken {
            user_id: user_id as usize,
            created: from_unix_seconds(created),
            last_used: last_used.map(from_unix_seconds),
            value: AuthTokenValue(value),
        }))
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let existing = self.get_user_auth_token(token)?;
        if existing.is_some() {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                &format!(
                    "DELETE FROM {} WHERE value = ?1",
                    AUTH_TOKEN_TABLE_V_0.name
                ),
                params![token.0],
            )?;
        }
        Ok(existing)
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "UPDATE {} SET last_used = ?1 WHERE value = ?2",
                AUTH_TOKEN_TABLE_V_0.name
            ),
            params![to_unix_seconds(SystemTime::now()), token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (user_id, value, created, last_used) VALUES (?1, ?2, ?3, ?4)",
                AUTH_TOKEN_TABLE_V_0.name
            ),
            params![
                token.user_id as i64,
                token.value.0,
                to_unix_seconds(token.created),
                token.last_used.map(to_unix_seconds),
            ],
        )?;
        Ok(())
    }
}
