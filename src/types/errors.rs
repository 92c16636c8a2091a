use std::fmt;

// === AuthError ===

/// Errors related to session and identity handling.
#[derive(Debug)]
pub enum AuthError {
    /// No identity is currently signed in.
    NotAuthenticated,
    /// A stored session exists but could not be decoded.
    SessionCorrupt(String),
    /// Database operation failed.
    DatabaseError(String),
    /// Sealing or opening the session token failed.
    CryptoError(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NotAuthenticated => write!(f, "Not authenticated"),
            AuthError::SessionCorrupt(msg) => write!(f, "Stored session corrupt: {}", msg),
            AuthError::DatabaseError(msg) => write!(f, "Auth database error: {}", msg),
            AuthError::CryptoError(msg) => write!(f, "Auth crypto error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

// === StoreError ===

/// Errors returned by the remote bookmark store.
#[derive(Debug)]
pub enum StoreError {
    /// Bookmark with the given ID was not found.
    NotFound(String),
    /// The bookmark exists but belongs to a different owner.
    NotOwner(String),
    /// The backend rejected the record (missing fields, bad shape).
    InvalidRecord(String),
    /// Transport failure talking to the backend.
    Transport(String),
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Bookmark not found: {}", id),
            StoreError::NotOwner(id) => write!(f, "Bookmark owned by another user: {}", id),
            StoreError::InvalidRecord(msg) => write!(f, "Invalid bookmark record: {}", msg),
            StoreError::Transport(msg) => write!(f, "Store transport error: {}", msg),
            StoreError::DatabaseError(msg) => write!(f, "Store database error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

// === SubscriptionError ===

/// Errors delivered on a change feed.
#[derive(Debug)]
pub enum SubscriptionError {
    /// The feed ended; the backend closed it or the source went away.
    Closed,
    /// Transport failure on the feed.
    Transport(String),
    /// The subscriber fell behind and missed events.
    Lagged(u64),
}

impl fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionError::Closed => write!(f, "Change feed closed"),
            SubscriptionError::Transport(msg) => {
                write!(f, "Change feed transport error: {}", msg)
            }
            SubscriptionError::Lagged(missed) => {
                write!(f, "Change feed lagged: missed {} events", missed)
            }
        }
    }
}

impl std::error::Error for SubscriptionError {}

// === CryptoError ===

/// Errors related to cryptographic operations.
#[derive(Debug)]
pub enum CryptoError {
    /// Failed to derive encryption key from password.
    KeyDerivation(String),
    /// Encryption operation failed.
    Encryption(String),
    /// Decryption operation failed.
    Decryption(String),
    /// Failed to generate random bytes.
    RandomGeneration(String),
    /// The provided key is invalid.
    InvalidKey(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::KeyDerivation(msg) => write!(f, "Key derivation failed: {}", msg),
            CryptoError::Encryption(msg) => write!(f, "Encryption failed: {}", msg),
            CryptoError::Decryption(msg) => write!(f, "Decryption failed: {}", msg),
            CryptoError::RandomGeneration(msg) => {
                write!(f, "Random generation failed: {}", msg)
            }
            CryptoError::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
        }
    }
}

impl std::error::Error for CryptoError {}

// === ConfigError ===

/// Errors raised while loading runtime configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required setting is missing.
    Missing(String),
    /// A setting has a value that cannot be used.
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Missing config value: {}", key),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
