//! Client side of the MandantCrypt identity directory.
//!
//! The directory lists the active identities ("mandants") and hands out the
//! current decrypted password of one identity.

pub mod api_client;
pub mod config;
pub mod error;
pub mod types;

pub use api_client::DirectoryApiClient;
pub use config::DirectoryConfig;
pub use error::{DirectoryError, DirectoryResult};
pub use types::{Identity, PasswordRecord};

use async_trait::async_trait;
use zeroize::Zeroizing;

/// The two read operations the packaging front end needs from the directory.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn list_active_identities(&self) -> DirectoryResult<Vec<Identity>>;

    /// The current password of `identity_id`. An identity without a
    /// retrievable password is an error, never an empty password.
    async fn decrypted_password(&self, identity_id: i64) -> DirectoryResult<Zeroizing<String>>;
}
