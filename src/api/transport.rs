//! Blocking HTTP transport for the tracker.
//!
//! Two clients share one cookie jar: the normal client follows up to three
//! redirects, the probe client caps redirects at one so a login bounce is
//! detectable. Static credential headers are kept in a mutable map and
//! attached to every request.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking;
use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::redirect;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::api::ApiError;
use crate::auth::SessionJar;

/// Redirect cap for everything except the probe.
const DEFAULT_MAX_REDIRECTS: usize = 3;

/// Redirect cap while probing whether a stored session is still accepted.
const PROBE_MAX_REDIRECTS: usize = 1;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// The narrow view of a response the rest of the crate consumes.
pub struct PageResponse {
    pub status: StatusCode,
    /// Final URL after redirects.
    pub url: Url,
    pub body: String,
}

impl PageResponse {
    fn read(response: blocking::Response) -> Result<Self, ApiError> {
        let status = response.status();
        let url = response.url().clone();
        let body = response.text()?;
        Ok(Self { status, url, body })
    }

    /// Parses the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    pub fn ensure_success(&self) -> Result<(), ApiError> {
        if self.status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Http { status: self.status })
        }
    }
}

/// Result of the session probe.
pub enum ProbeOutcome {
    /// The request completed within the redirect cap.
    Alive(PageResponse),
    /// The redirect cap was exceeded: the stored session is stale.
    StaleRedirect,
}

/// Blocking client pair bound to one site.
pub struct SiteClient {
    http: blocking::Client,
    probe_http: blocking::Client,
    jar: Arc<SessionJar>,
    headers: HeaderMap,
    base: Url,
}

impl SiteClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)
            .map_err(|e| ApiError::Config(format!("invalid base_url {base_url:?}: {e}")))?;

        let jar = Arc::new(SessionJar::default());
        let http = build_client(DEFAULT_MAX_REDIRECTS, &jar)?;
        let probe_http = build_client(PROBE_MAX_REDIRECTS, &jar)?;

        Ok(Self {
            http,
            probe_http,
            jar,
            headers: HeaderMap::new(),
            base,
        })
    }

    /// The shared session cookie jar.
    pub fn jar(&self) -> &SessionJar {
        &self.jar
    }

    /// Sets a default header sent with every request. Values are marked
    /// sensitive: only credentials travel this way.
    pub fn insert_header<N: IntoHeaderName>(&mut self, name: N, value: &str) -> Result<(), ApiError> {
        let mut value = HeaderValue::from_str(value)
            .map_err(|_| ApiError::Config("header value contains invalid characters".into()))?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(())
    }

    /// Resolves a scraped href against the site root.
    pub fn absolute(&self, href: &str) -> Result<String, ApiError> {
        let url = self
            .base
            .join(href)
            .map_err(|e| ApiError::Protocol(format!("unresolvable link {href:?}: {e}")))?;
        Ok(url.into())
    }

    pub fn get<Q>(&self, path: &str, query: &Q) -> Result<PageResponse, ApiError>
    where
        Q: Serialize + ?Sized,
    {
        let url = self.url_for(path)?;
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .headers(self.headers.clone())
            .query(query)
            .send()?;
        PageResponse::read(response)
    }

    pub fn post_form<F>(&self, path: &str, form: &F) -> Result<PageResponse, ApiError>
    where
        F: Serialize + ?Sized,
    {
        let url = self.url_for(path)?;
        debug!(%url, "POST");
        let response = self
            .http
            .post(url)
            .headers(self.headers.clone())
            .form(form)
            .send()?;
        PageResponse::read(response)
    }

    /// One GET through the probe client. A redirect-cap overrun is reported
    /// as [`ProbeOutcome::StaleRedirect`] instead of an error; the normal
    /// client's redirect cap is unaffected.
    pub fn probe(&self, path: &str) -> Result<ProbeOutcome, ApiError> {
        let url = self.url_for(path)?;
        debug!(%url, "probing stored session");
        match self.probe_http.get(url).headers(self.headers.clone()).send() {
            Ok(response) => Ok(ProbeOutcome::Alive(PageResponse::read(response)?)),
            Err(e) if e.is_redirect() => Ok(ProbeOutcome::StaleRedirect),
            Err(e) => Err(e.into()),
        }
    }

    fn url_for(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::Config(format!("invalid request path {path:?}: {e}")))
    }
}

fn build_client(max_redirects: usize, jar: &Arc<SessionJar>) -> Result<blocking::Client, ApiError> {
    Ok(blocking::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .redirect(redirect::Policy::limited(max_redirects))
        .cookie_provider(Arc::clone(jar))
        .build()?)
}
