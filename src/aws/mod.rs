//! AWS interaction module
//!
//! Everything that touches AWS or local credential storage lives here:
//! enumerating accounts, binding each one to a region as a session, and
//! issuing the single read-only lookup a session is used for.
//!
//! # Module Structure
//!
//! - [`credentials`] - account enumeration from the shared credentials file
//!   or the OS keychain store
//! - [`session`] - per-account SDK configuration (the Account Session)
//! - [`query`] - action dispatch and payload shaping for each lookup kind

pub mod credentials;
pub mod query;
pub mod session;
