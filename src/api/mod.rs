//! HTTP client for the tracker.
//!
//! This module provides the [`Api`] controller for establishing a session
//! and running queries, the blocking [`SiteClient`] transport beneath it,
//! and the [`ApiError`] taxonomy both expose.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{Api, LoginOutcome};
pub use error::ApiError;
pub use transport::{PageResponse, ProbeOutcome, SiteClient};
