//! Session provider for syncmarks.
//!
//! Persists the signed-in identity in the single-row `auth_session` table,
//! with the access token sealed at rest. Supplies the current identity (or
//! none) to everything that needs owner scoping.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::params;

use crate::auth::crypto::{SessionCipher, SessionCipherTrait};
use crate::database::connection::Database;
use crate::types::errors::{AuthError, CryptoError};
use crate::types::identity::{Identity, SealedData};

const SESSION_KEY_PASSPHRASE: &str = "syncmarks-session-key-v1";
const SESSION_KEY_SALT: &[u8] = b"syncmarks-sess";

/// Trait defining session provider operations.
pub trait SessionProviderTrait {
    /// Records a signed-in identity, sealing the access token at rest.
    fn sign_in(
        &mut self,
        user_id: &str,
        email: Option<&str>,
        access_token: &str,
    ) -> Result<Identity, AuthError>;
    /// Returns the current identity, or `None` when signed out.
    ///
    /// Absence is not an error; only a corrupt row or a failing database is.
    fn current_identity(&self) -> Result<Option<Identity>, AuthError>;
    /// Like [`SessionProviderTrait::current_identity`], but absence is
    /// `AuthError::NotAuthenticated`.
    fn require_identity(&self) -> Result<Identity, AuthError>;
    /// Opens and returns the stored access token, or `None` when signed out.
    fn access_token(&self) -> Result<Option<String>, AuthError>;
    /// Clears the stored session.
    fn sign_out(&mut self) -> Result<(), AuthError>;
    fn is_authenticated(&self) -> bool;
}

/// Session provider backed by SQLite, with the token sealed by
/// [`SessionCipher`].
pub struct SessionProvider {
    db: Arc<Database>,
    cipher: SessionCipher,
    authenticated: bool,
}

impl SessionProvider {
    pub fn new(db: Arc<Database>) -> Result<Self, CryptoError> {
        let cipher = SessionCipher::derive(SESSION_KEY_PASSPHRASE, SESSION_KEY_SALT)?;

        // Seed the flag from whatever session survived the last run
        let authenticated = {
            let conn = db.connection();
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM auth_session", [], |row| row.get(0))
                .unwrap_or(0);
            count > 0
        };

        Ok(Self {
            db,
            cipher,
            authenticated,
        })
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

impl SessionProviderTrait for SessionProvider {
    fn sign_in(
        &mut self,
        user_id: &str,
        email: Option<&str>,
        access_token: &str,
    ) -> Result<Identity, AuthError> {
        let sealed = self
            .cipher
            .seal(access_token.as_bytes())
            .map_err(|e| AuthError::CryptoError(e.to_string()))?;

        self.db
            .connection()
            .execute(
                "INSERT OR REPLACE INTO auth_session (id, user_id, email, token_ciphertext, token_nonce, updated_at) \
                 VALUES ('default', ?1, ?2, ?3, ?4, ?5)",
                params![user_id, email, sealed.ciphertext, sealed.nonce, Self::now()],
            )
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        self.authenticated = true;
        Ok(Identity {
            user_id: user_id.to_string(),
            email: email.map(|e| e.to_string()),
        })
    }

    fn current_identity(&self) -> Result<Option<Identity>, AuthError> {
        let conn = self.db.connection();
        let result = conn.query_row(
            "SELECT user_id, email FROM auth_session WHERE id = 'default'",
            [],
            |row| {
                Ok(Identity {
                    user_id: row.get(0)?,
                    email: row.get(1)?,
                })
            },
        );

        match result {
            Ok(identity) => Ok(Some(identity)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AuthError::DatabaseError(e.to_string())),
        }
    }

    fn require_identity(&self) -> Result<Identity, AuthError> {
        self.current_identity()?.ok_or(AuthError::NotAuthenticated)
    }

    fn access_token(&self) -> Result<Option<String>, AuthError> {
        let conn = self.db.connection();
        let result = conn.query_row(
            "SELECT token_ciphertext, token_nonce FROM auth_session WHERE id = 'default'",
            [],
            |row| {
                Ok(SealedData {
                    ciphertext: row.get(0)?,
                    nonce: row.get(1)?,
                })
            },
        );

        match result {
            Ok(sealed) => {
                let opened = self
                    .cipher
                    .open(&sealed)
                    .map_err(|e| AuthError::SessionCorrupt(e.to_string()))?;
                let token = String::from_utf8(opened)
                    .map_err(|e| AuthError::SessionCorrupt(e.to_string()))?;
                Ok(Some(token))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AuthError::DatabaseError(e.to_string())),
        }
    }

    fn sign_out(&mut self) -> Result<(), AuthError> {
        self.db
            .connection()
            .execute("DELETE FROM auth_session", [])
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        self.authenticated = false;
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
