//! Credential lookup.
//!
//! The session consults a [`CredentialStore`] for USER/PASS validation; the
//! concrete store is injected at server construction.

pub mod store;

pub use store::{CredentialStore, MemoryCredentials};
