//! Session cookie jar and its on-disk persistence.
//!
//! The jar is a plain name-to-value map: the client only ever talks to one
//! site, so domain and path scoping are not modeled. The persisted form is
//! the same map serialized as JSON, which round-trips losslessly through
//! [`CookieFile::save`] and [`CookieFile::load_into`].

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::Url;
use tracing::debug;

use crate::api::ApiError;

/// In-memory session cookie jar shared by the transport clients.
///
/// `Set-Cookie` response headers accumulate here; every request carries the
/// current contents as a single `Cookie` header.
#[derive(Default)]
pub struct SessionJar {
    cookies: Mutex<BTreeMap<String, String>>,
}

impl SessionJar {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // The library is single-threaded; a poisoned lock can only come from
        // a panic mid-update, in which case the map is still a valid map.
        self.cookies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every cookie, returning the jar to its initial state.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Copy of the current name-to-value map.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    /// Replaces the jar contents wholesale.
    pub fn restore(&self, cookies: BTreeMap<String, String>) {
        *self.lock() = cookies;
    }
}

// Cookie values are session secrets; keep them out of Debug output.
impl fmt::Debug for SessionJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.lock().keys().cloned().collect();
        f.debug_struct("SessionJar").field("cookies", &names).finish()
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, _url: &Url) {
        let mut cookies = self.lock();
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else { continue };
            if let Some((name, value)) = parse_set_cookie(raw) {
                debug!(name = %name, "storing session cookie");
                cookies.insert(name, value);
            }
        }
    }

    fn cookies(&self, _url: &Url) -> Option<HeaderValue> {
        let cookies = self.lock();
        if cookies.is_empty() {
            return None;
        }
        let header = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&header).ok()
    }
}

/// Parses the name/value pair off a `Set-Cookie` header, discarding
/// attributes.
fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// The serialized cookie jar at a configured filesystem path.
///
/// Written after any successful interactive login, read back at session
/// establishment, deleted when the session is detected stale or on logout.
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Writes the jar contents, overwriting any previous file.
    pub fn save(&self, jar: &SessionJar) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(&jar.snapshot())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, bytes)?;
        debug!(path = %self.path.display(), "persisted session cookies");
        Ok(())
    }

    /// Restores a previously saved jar. A missing or corrupt file is an
    /// error, never a silently empty jar.
    pub fn load_into(&self, jar: &SessionJar) -> Result<(), ApiError> {
        let bytes = fs::read(&self.path)?;
        let cookies: BTreeMap<String, String> = serde_json::from_slice(&bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        debug!(path = %self.path.display(), count = cookies.len(), "restored session cookies");
        jar.restore(cookies);
        Ok(())
    }

    /// Removes the file. Idempotent: an absent file is not an error.
    pub fn delete(&self) -> Result<(), ApiError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "deleted session cookies");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
