//! Session negotiation for the Google Play store protocol
//!
//! This crate impersonates a store client running on a virtual device and
//! negotiates the device identity and tokens needed for store requests.
//!
//! # Authentication Flow
//!
//! 1. Credential encryption under the server's RSA key
//! 2. AC2DM token request
//! 3. Device checkin (twice) to obtain a device id
//! 4. Master token request
//! 5. Auth sub-token exchange
//! 6. Device configuration upload
//!
//! A device id and sub-token from an earlier handshake can also be restored
//! directly, which skips the network entirely.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gp_auth::{DeviceContext, GpAuthClient, ProfileStore, ProtocolConfig, TomlProfileStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let profiles = TomlProfileStore::bundled()?;
//!     let device = DeviceContext::new(profiles.resolve("default")?, "en_US", None)?;
//!     let mut client = GpAuthClient::new(Arc::new(ProtocolConfig::new()?), device)?;
//!
//!     let credentials = client.login("user@example.com", "app-password").await?;
//!     println!("Device id: {}", credentials.device_id_hex());
//!
//!     // In a later process
//!     client.restore(credentials);
//!     Ok(())
//! }
//! ```
//!
//! # Important Notes
//!
//! - A [`GpAuthError::SecurityCheck`] needs a human: the account must be
//!   unlocked in a browser or an app-specific password used
//! - The sub-token is a bearer credential and is never logged

pub mod checkin;
pub mod client;
pub mod config;
pub mod crypto;
pub mod device;
pub mod errors;
pub mod file_store;
pub mod form;
pub mod headers;
pub mod profile_store;
pub mod session;
pub mod store;

// Re-export main types
pub use client::{GpAuthClient, LoginRequest, ensure_success};
pub use config::{Endpoints, HttpTimeouts, ProtocolConfig, TlsOptions};
pub use crypto::{EncryptedCredential, ServerPublicKey, encrypt_credentials};
pub use device::{BuildInfo, DeviceContext, DeviceProfile, ScreenInfo};
pub use errors::{GpAuthError, Result};
pub use file_store::FileCredentialStore;
pub use headers::HeaderPurpose;
pub use profile_store::{MemoryProfileStore, ProfileStore, TomlProfileStore};
pub use session::{SessionCredentials, SessionPhase, SessionState};
pub use store::{CredentialStore, MemoryCredentialStore, StoredSession};
