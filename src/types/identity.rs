use serde::{Deserialize, Serialize};

/// The signed-in user, as resolved from the stored session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

/// AES-256-GCM sealed bytes.
///
/// The authentication tag stays appended to the ciphertext; the nonce is
/// stored alongside.
#[derive(Debug, Clone)]
pub struct SealedData {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}
