//! Session authentication: credential shapes and cookie persistence.
//!
//! This module provides:
//! - `ApiKeyCredentials` / `PasswordCredentials`: the two login strategies
//! - `SessionJar`: the in-memory cookie jar shared by the transport
//! - `CookieFile`: the serialized jar persisted across invocations

pub mod cookies;
pub mod credentials;

pub use cookies::{CookieFile, SessionJar};
pub use credentials::{ApiKeyCredentials, CredentialOverrides, PasswordCredentials};
