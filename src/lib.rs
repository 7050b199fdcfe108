//! Client library for a private movie tracker's semi-official HTTP API and
//! HTML-scraped pages.
//!
//! The entry point is [`Api`]: it authenticates with either static API-key
//! headers or an interactive username/password/passkey login, persists the
//! resulting session cookies across invocations, and serves queries over
//! the authenticated transport.
//!
//! ```no_run
//! use marquee::{Api, Config, CredentialOverrides};
//!
//! # fn main() -> Result<(), marquee::ApiError> {
//! let mut config = Config::load()?;
//! config.base_url = Some("https://tracker.example".to_string());
//!
//! let mut api = Api::new(config)?;
//! api.establish_session(&CredentialOverrides::default())?;
//!
//! for movie in api.search(&[("name", "the conversation")])? {
//!     println!("{} ({})", movie.title, movie.year.as_deref().unwrap_or("?"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod scrape;

pub use api::{Api, ApiError, LoginOutcome};
pub use auth::CredentialOverrides;
pub use config::Config;
