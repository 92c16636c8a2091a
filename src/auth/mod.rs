// Identity and session handling
// The session provider persists the signed-in identity with its access token sealed at rest.

pub mod crypto;
pub mod session;

pub use session::SessionProvider;
