//! The API controller: session establishment, logout, and the query
//! operations built on the authenticated transport.

use std::cell::OnceCell;

use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::api::transport::{PageResponse, ProbeOutcome, SiteClient};
use crate::api::ApiError;
use crate::auth::{ApiKeyCredentials, CookieFile, CredentialOverrides, PasswordCredentials};
use crate::config::Config;
use crate::models::{
    ContestLeader, CoverViewMovie, CoverViewPage, LogEntry, Movie, SearchResponse, SeedRequest,
};
use crate::scrape;

// ============================================================================
// Constants
// ============================================================================

/// Authenticated-only endpoint used to probe a stored session.
const PROBE_PATH: &str = "torrents.php";

/// Interactive login endpoint.
const LOGIN_PATH: &str = "ajax.php?action=login";

/// Landing page; carries the profile link and the logout auth token.
const LANDING_PATH: &str = "index.php";

const LOGOUT_PATH: &str = "logout.php";

const NO_PARAMS: &[(&str, &str)] = &[];

/// How a session came to be established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// API-key headers were attached, or a stored cookie session was still
    /// accepted. No interactive login took place.
    AlreadyAuthenticated,
    /// An interactive login ran and its cookies were persisted.
    AuthenticatedFresh,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(rename = "Result")]
    result: String,
}

/// Client for the tracker's semi-official API and scraped pages.
///
/// One instance owns the session state for its lifetime: the cookie jar,
/// the credential headers and the cookie file on disk. It is not safe to
/// share across threads; `establish_session` takes `&mut self` so the
/// compiler enforces a single caller.
pub struct Api {
    client: SiteClient,
    cookie_file: CookieFile,
    config: Config,
    current_user_id: OnceCell<u64>,
}

impl Api {
    /// Builds the transport from configuration. No network traffic happens
    /// until [`Api::establish_session`] or a query method is called.
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| ApiError::Config("base_url is not configured".into()))?;
        let client = SiteClient::new(&base_url)?;
        let cookie_file = CookieFile::new(config.cookies_path()?);
        Ok(Self {
            client,
            cookie_file,
            config,
            current_user_id: OnceCell::new(),
        })
    }

    /// Convenience constructor: build and establish a session in one call.
    pub fn login(config: Config, overrides: &CredentialOverrides) -> Result<Self, ApiError> {
        let mut api = Self::new(config)?;
        api.establish_session(overrides)?;
        Ok(api)
    }

    /// Whether the configuration selects the API-key strategy.
    pub fn is_api_key_mode(&self) -> bool {
        ApiKeyCredentials::from_config(&self.config).is_some()
    }

    /// Establishes an authenticated session.
    ///
    /// API-key credentials short-circuit everything else, including a valid
    /// cookie file. Otherwise a stored cookie session is probed and reused,
    /// with a stale session discarded once and repaired through interactive
    /// login. Transient upstream failures (`RateLimited`, `Challenge`) are
    /// never retried here; the caller decides whether to retry the whole
    /// call.
    pub fn establish_session(
        &mut self,
        overrides: &CredentialOverrides,
    ) -> Result<LoginOutcome, ApiError> {
        info!("initiating login sequence");

        if let Some(keys) = ApiKeyCredentials::from_config(&self.config) {
            debug!(user = %keys.user, "attaching api key headers");
            self.client.insert_header("ApiUser", &keys.user)?;
            self.client.insert_header("ApiKey", &keys.key)?;
            info!("login successful");
            return Ok(LoginOutcome::AlreadyAuthenticated);
        }

        if self.cookie_file.exists() {
            self.cookie_file.load_into(self.client.jar())?;
            // Crude test of whether the stored session is still accepted:
            // one authenticated-only GET with the redirect cap at 1.
            match self.client.probe(PROBE_PATH)? {
                ProbeOutcome::Alive(page) => {
                    ensure_no_challenge(&page)?;
                    info!("login successful");
                    return Ok(LoginOutcome::AlreadyAuthenticated);
                }
                ProbeOutcome::StaleRedirect => {
                    debug!(
                        path = %self.cookie_file.path().display(),
                        "stored session is stale, discarding cookies"
                    );
                    self.cookie_file.delete()?;
                    self.client.jar().clear();
                }
            }
        }

        let credentials = PasswordCredentials::resolve(&self.config, overrides)?;
        let page = self.client.post_form(
            LOGIN_PATH,
            &[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("passkey", credentials.passkey.as_str()),
            ],
        )?;

        if !page.status.is_success() {
            if page.status == StatusCode::TOO_MANY_REQUESTS {
                error!(body = page.body.trim(), "login rate limited");
                return Err(ApiError::RateLimited);
            }
            return Err(ApiError::Http { status: page.status });
        }

        let login: LoginResponse = page
            .json()
            .map_err(|_| ApiError::Protocol("could not parse login response".into()))?;
        if login.result != "Ok" {
            return Err(ApiError::Auth { detail: page.body });
        }

        self.cookie_file.save(self.client.jar())?;

        // Refresh transport state off the landing page and make sure the
        // session did not land behind a challenge.
        let landing = self.client.get(LANDING_PATH, NO_PARAMS)?;
        ensure_no_challenge(&landing)?;

        info!("login successful");
        Ok(LoginOutcome::AuthenticatedFresh)
    }

    /// The authenticated user's numeric id, scraped from the landing page
    /// on first call and memoized for the lifetime of this instance.
    pub fn current_user_id(&self) -> Result<u64, ApiError> {
        if let Some(id) = self.current_user_id.get() {
            return Ok(*id);
        }
        let page = self.fetch(LANDING_PATH, NO_PARAMS)?;
        let id = scrape::user_id(&page.body)
            .ok_or_else(|| ApiError::Protocol("no user id link on landing page".into()))?;
        let _ = self.current_user_id.set(id);
        Ok(id)
    }

    /// Invalidates the session remotely and deletes the cookie file.
    ///
    /// Works in both modes; in API-key mode the cookie delete is a no-op
    /// and the call merely spends two request tokens.
    pub fn logout(&self) -> Result<(), ApiError> {
        let page = self.fetch(LANDING_PATH, NO_PARAMS)?;
        let token = scrape::auth_token(&page.body)
            .ok_or_else(|| ApiError::Protocol("no auth token on landing page".into()))?
            .to_string();
        self.cookie_file.delete()?;
        self.fetch(LOGOUT_PATH, &[("auth", token.as_str())])?;
        info!("logged out");
        Ok(())
    }

    // ===== Query operations =====

    /// Movie search. A `name` filter is mirrored into `searchstr`; the
    /// JSON view is always requested.
    pub fn search(&self, filters: &[(&str, &str)]) -> Result<Vec<Movie>, ApiError> {
        let page = self.fetch(PROBE_PATH, &search_params(filters))?;
        let mut response: SearchResponse = page
            .json()
            .map_err(|e| ApiError::Protocol(format!("malformed search response: {e}")))?;
        for movie in &mut response.movies {
            movie.title = scrape::decode_entities(&movie.title);
        }
        Ok(response.movies)
    }

    /// Search expected to match exactly one group: the site then redirects
    /// to the group page, and the group id is read off the final URL.
    pub fn search_single(&self, filters: &[(&str, &str)]) -> Result<Option<u64>, ApiError> {
        let page = self.fetch(PROBE_PATH, &search_params(filters))?;
        Ok(scrape::id_param(page.url.as_str()))
    }

    /// Torrents the site wants seeded.
    pub fn need_for_seed(&self, filters: &[(&str, &str)]) -> Result<Vec<SeedRequest>, ApiError> {
        let page = self.fetch("needforseed.php", filters)?;
        let mut requests = Vec::new();
        for movie in cover_view_movies(&page.body)? {
            let Some(torrent) = movie
                .grouping_qualities
                .first()
                .and_then(|group| group.torrents.first())
            else {
                continue;
            };
            let Some(href) = scrape::first_href(&torrent.title) else {
                continue;
            };
            requests.push(SeedRequest {
                title: scrape::decode_entities(&scrape::strip_tags(&torrent.title))
                    .trim()
                    .to_string(),
                link: self.client.absolute(href)?,
            });
        }
        Ok(requests)
    }

    /// Contest leaderboard standings.
    pub fn contest_leaders(&self) -> Result<Vec<ContestLeader>, ApiError> {
        debug!("fetching contest leaderboard");
        let page = self.fetch("contestleaders.php", NO_PARAMS)?;
        let table = scrape::element_with_class(&page.body, "table", "table--panel-like")
            .ok_or_else(|| ApiError::Protocol("no leaderboard table on page".into()))?;
        let body = scrape::element_with_class(table, "tbody", "")
            .ok_or_else(|| ApiError::Protocol("leaderboard table has no body".into()))?;

        let mut leaders = Vec::new();
        for row in scrape::elements(body, "tr") {
            let cells = scrape::cell_texts(row);
            if cells.len() >= 3 {
                leaders.push(ContestLeader {
                    user: cells[1].clone(),
                    points: cells[2].clone(),
                });
            }
        }
        Ok(leaders)
    }

    /// Movies in a collage, with torrents grouped by quality.
    pub fn collage(
        &self,
        collage_id: u64,
        filters: &[(&str, &str)],
    ) -> Result<Vec<CoverViewMovie>, ApiError> {
        let mut params: Vec<(String, String)> = filters
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.push(("id".to_string(), collage_id.to_string()));
        let page = self.fetch("collages.php", &params)?;
        cover_view_movies(&page.body)
    }

    /// The public site log, newest first as served.
    pub fn site_log(&self) -> Result<Vec<LogEntry>, ApiError> {
        let page = self.fetch("log.php", NO_PARAMS)?;
        let table = scrape::element_with_class(&page.body, "table", "")
            .ok_or_else(|| ApiError::Protocol("no log table on page".into()))?;
        let body = scrape::element_with_class(table, "tbody", "")
            .ok_or_else(|| ApiError::Protocol("log table has no body".into()))?;

        let mut entries = Vec::new();
        for row in scrape::elements(body, "tr") {
            let Some(time) = scrape::attr_of_element_with_class(row, "span", "time", "title")
            else {
                continue;
            };
            let Some(message) = scrape::element_with_class(row, "span", "log__message") else {
                continue;
            };
            entries.push(LogEntry {
                time: time.to_string(),
                message: scrape::decode_entities(&scrape::strip_tags(message))
                    .trim_start()
                    .to_string(),
            });
        }
        Ok(entries)
    }

    fn fetch<Q>(&self, path: &str, query: &Q) -> Result<PageResponse, ApiError>
    where
        Q: Serialize + ?Sized,
    {
        let page = self.client.get(path, query)?;
        page.ensure_success()?;
        Ok(page)
    }
}

fn ensure_no_challenge(page: &PageResponse) -> Result<(), ApiError> {
    if let Some(marker) = scrape::challenge_marker(&page.body) {
        error!(marker, url = %page.url, "request intercepted by anti-bot challenge");
        return Err(ApiError::Challenge);
    }
    Ok(())
}

fn cover_view_movies(body: &str) -> Result<Vec<CoverViewMovie>, ApiError> {
    let mut movies = Vec::new();
    for payload in scrape::cover_view_payloads(body) {
        let page: CoverViewPage = serde_json::from_str(payload)
            .map_err(|e| ApiError::Protocol(format!("malformed cover view data: {e}")))?;
        movies.extend(page.movies);
    }
    Ok(movies)
}

fn search_params(filters: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = filters
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    if let Some((_, name)) = filters.iter().find(|(k, _)| *k == "name") {
        params.push(("searchstr".to_string(), name.to_string()));
    }
    params.push(("json".to_string(), "noredirect".to_string()));
    params
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// Wiremock needs an async runtime; the client under test is blocking,
    /// so the runtime only drives the mock server. Field order matters:
    /// the server must drop before its runtime.
    struct TestSite {
        server: MockServer,
        dir: TempDir,
        rt: tokio::runtime::Runtime,
    }

    impl TestSite {
        fn start() -> Self {
            let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
            let server = rt.block_on(MockServer::start());
            let dir = TempDir::new().expect("temp dir");
            Self { server, dir, rt }
        }

        fn mount(&self, mock: Mock) {
            self.rt.block_on(mock.mount(&self.server));
        }

        fn request_count(&self) -> usize {
            self.rt
                .block_on(self.server.received_requests())
                .expect("request recording enabled")
                .len()
        }

        fn cookies_path(&self) -> PathBuf {
            self.dir.path().join("cookies.json")
        }

        fn config(&self) -> Config {
            Config {
                base_url: Some(self.server.uri()),
                cookies_file: Some(self.cookies_path()),
                ..Config::default()
            }
        }

        fn password_config(&self) -> Config {
            Config {
                username: Some("a".into()),
                password: Some("b".into()),
                passkey: Some("c".into()),
                ..self.config()
            }
        }

        fn seed_cookie_file(&self) {
            fs::write(self.cookies_path(), r#"{"session":"stale"}"#).unwrap();
        }
    }

    fn login_ok() -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("set-cookie", "session=abc123; Path=/; HttpOnly")
            .set_body_string(r#"{"Result":"Ok"}"#)
    }

    fn page(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_string(body)
    }

    fn saved_cookies(site: &TestSite) -> BTreeMap<String, String> {
        serde_json::from_slice(&fs::read(site.cookies_path()).unwrap()).unwrap()
    }

    // ===== establish_session =====

    #[test]
    fn api_keys_short_circuit_without_network_or_cookie_file() {
        let site = TestSite::start();
        let config = Config {
            api_user: Some("u".into()),
            api_key: Some("k".into()),
            ..site.password_config()
        };

        let mut api = Api::new(config).unwrap();
        let outcome = api.establish_session(&CredentialOverrides::default()).unwrap();

        assert_eq!(outcome, LoginOutcome::AlreadyAuthenticated);
        assert!(api.is_api_key_mode());
        assert!(!site.cookies_path().exists());
        assert_eq!(site.request_count(), 0);
    }

    #[test]
    fn password_login_persists_cookies() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("POST"))
                .and(path("/ajax.php"))
                .and(query_param("action", "login"))
                .and(body_string_contains("username=a"))
                .and(body_string_contains("password=b"))
                .and(body_string_contains("passkey=c"))
                .respond_with(login_ok())
                .expect(1),
        );
        site.mount(
            Mock::given(method("GET"))
                .and(path("/index.php"))
                .respond_with(page("<html>welcome</html>"))
                .expect(1),
        );

        let mut api = Api::new(site.password_config()).unwrap();
        let outcome = api.establish_session(&CredentialOverrides::default()).unwrap();

        assert_eq!(outcome, LoginOutcome::AuthenticatedFresh);
        assert_eq!(
            saved_cookies(&site).get("session").map(String::as_str),
            Some("abc123")
        );
    }

    #[test]
    fn overrides_layer_over_config_defaults() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("POST"))
                .and(path("/ajax.php"))
                .and(body_string_contains("username=a"))
                .and(body_string_contains("password=override"))
                .respond_with(login_ok())
                .expect(1),
        );
        site.mount(
            Mock::given(method("GET"))
                .and(path("/index.php"))
                .respond_with(page("ok")),
        );

        let mut config = site.password_config();
        config.password = None;
        let overrides = CredentialOverrides {
            password: Some("override".into()),
            ..CredentialOverrides::default()
        };

        let mut api = Api::new(config).unwrap();
        let outcome = api.establish_session(&overrides).unwrap();
        assert_eq!(outcome, LoginOutcome::AuthenticatedFresh);
    }

    #[test]
    fn rejected_credentials_fail_without_cookie_file() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("POST"))
                .and(path("/ajax.php"))
                .respond_with(page(r#"{"Result":"Error","Message":"bad credentials"}"#))
                .expect(1),
        );

        let mut api = Api::new(site.password_config()).unwrap();
        let err = api
            .establish_session(&CredentialOverrides::default())
            .unwrap_err();

        match err {
            ApiError::Auth { detail } => assert!(detail.contains("bad credentials")),
            other => panic!("expected Auth error, got {other:?}"),
        }
        assert!(!site.cookies_path().exists());
    }

    #[test]
    fn rate_limited_login_is_transient() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("POST"))
                .and(path("/ajax.php"))
                .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests")),
        );

        let mut api = Api::new(site.password_config()).unwrap();
        let err = api
            .establish_session(&CredentialOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));
        assert!(err.is_transient());
        assert!(!site.cookies_path().exists());
    }

    #[test]
    fn unexpected_status_carries_the_code() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("POST"))
                .and(path("/ajax.php"))
                .respond_with(ResponseTemplate::new(500).set_body_string("oops")),
        );

        let mut api = Api::new(site.password_config()).unwrap();
        let err = api
            .establish_session(&CredentialOverrides::default())
            .unwrap_err();
        match err {
            ApiError::Http { status } => assert_eq!(status.as_u16(), 500),
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn non_json_login_body_is_protocol_error() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("POST"))
                .and(path("/ajax.php"))
                .respond_with(page("<html>maintenance</html>")),
        );

        let mut api = Api::new(site.password_config()).unwrap();
        let err = api
            .establish_session(&CredentialOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::Protocol(_)));
    }

    #[test]
    fn missing_credentials_are_a_config_error() {
        let site = TestSite::start();
        let mut api = Api::new(site.config()).unwrap();
        let err = api
            .establish_session(&CredentialOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
        assert_eq!(site.request_count(), 0);
    }

    #[test]
    fn valid_cookie_session_probes_without_posting() {
        let site = TestSite::start();
        site.seed_cookie_file();
        let before = fs::read(site.cookies_path()).unwrap();

        site.mount(
            Mock::given(method("GET"))
                .and(path("/torrents.php"))
                .and(header("cookie", "session=stale"))
                .respond_with(page("<html>torrents</html>"))
                .expect(1),
        );

        let mut api = Api::new(site.password_config()).unwrap();
        let outcome = api.establish_session(&CredentialOverrides::default()).unwrap();

        assert_eq!(outcome, LoginOutcome::AlreadyAuthenticated);
        assert_eq!(fs::read(site.cookies_path()).unwrap(), before);
        assert_eq!(site.request_count(), 1);
    }

    #[test]
    fn stale_cookie_falls_through_to_interactive_login() {
        let site = TestSite::start();
        site.seed_cookie_file();

        // The probe follows one redirect, then trips the cap on the second.
        site.mount(
            Mock::given(method("GET"))
                .and(path("/torrents.php"))
                .respond_with(ResponseTemplate::new(302).insert_header("Location", "/login.php"))
                .expect(1),
        );
        site.mount(
            Mock::given(method("GET"))
                .and(path("/login.php"))
                .respond_with(ResponseTemplate::new(302).insert_header("Location", "/torrents.php"))
                .expect(1),
        );
        site.mount(
            Mock::given(method("POST"))
                .and(path("/ajax.php"))
                .respond_with(login_ok())
                .expect(1),
        );
        site.mount(
            Mock::given(method("GET"))
                .and(path("/index.php"))
                .respond_with(page("ok"))
                .expect(1),
        );

        let mut api = Api::new(site.password_config()).unwrap();
        let outcome = api.establish_session(&CredentialOverrides::default()).unwrap();

        assert_eq!(outcome, LoginOutcome::AuthenticatedFresh);
        // The stale jar was discarded before the fresh cookies were saved.
        let saved = saved_cookies(&site);
        assert_eq!(saved.get("session").map(String::as_str), Some("abc123"));
        assert_eq!(saved.len(), 1);
    }

    #[test]
    fn challenge_on_probe_keeps_cookie_file() {
        let site = TestSite::start();
        site.seed_cookie_file();
        site.mount(
            Mock::given(method("GET"))
                .and(path("/torrents.php"))
                .respond_with(page("Checking your browser before accessing tracker.test")),
        );

        let mut api = Api::new(site.password_config()).unwrap();
        let err = api
            .establish_session(&CredentialOverrides::default())
            .unwrap_err();

        assert!(matches!(err, ApiError::Challenge));
        assert!(site.cookies_path().exists());
    }

    #[test]
    fn challenge_after_login_still_persists_cookies() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("POST"))
                .and(path("/ajax.php"))
                .respond_with(login_ok()),
        );
        site.mount(
            Mock::given(method("GET"))
                .and(path("/index.php"))
                .respond_with(page("Attention Required! | Cloudflare")),
        );

        let mut api = Api::new(site.password_config()).unwrap();
        let err = api
            .establish_session(&CredentialOverrides::default())
            .unwrap_err();

        assert!(matches!(err, ApiError::Challenge));
        // The jar was saved before the landing refresh detected the block.
        assert!(site.cookies_path().exists());
    }

    // ===== current user and logout =====

    #[test]
    fn current_user_id_is_memoized() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("GET"))
                .and(path("/index.php"))
                .respond_with(page(r#"<a href="user.php?id=1234">profile</a>"#))
                .expect(1),
        );

        let api = Api::new(site.config()).unwrap();
        assert_eq!(api.current_user_id().unwrap(), 1234);
        assert_eq!(api.current_user_id().unwrap(), 1234);
        assert_eq!(site.request_count(), 1);
    }

    #[test]
    fn current_user_id_without_profile_link_is_protocol_error() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("GET"))
                .and(path("/index.php"))
                .respond_with(page("<html>not logged in</html>")),
        );

        let api = Api::new(site.config()).unwrap();
        assert!(matches!(api.current_user_id(), Err(ApiError::Protocol(_))));
    }

    #[test]
    fn logout_deletes_cookie_file_and_spends_the_token() {
        let site = TestSite::start();
        site.seed_cookie_file();
        let token = "0123456789abcdef0123456789abcdef";
        site.mount(
            Mock::given(method("GET"))
                .and(path("/index.php"))
                .respond_with(page(&format!(
                    r#"<a href="logout.php?auth={token}">Log out</a>"#
                ))),
        );
        site.mount(
            Mock::given(method("GET"))
                .and(path("/logout.php"))
                .and(query_param("auth", token))
                .respond_with(page("bye"))
                .expect(1),
        );

        let api = Api::new(site.password_config()).unwrap();
        api.logout().unwrap();
        assert!(!site.cookies_path().exists());
    }

    #[test]
    fn logout_without_token_is_protocol_error() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("GET"))
                .and(path("/index.php"))
                .respond_with(page("<html>no token here</html>")),
        );

        let api = Api::new(site.config()).unwrap();
        assert!(matches!(api.logout(), Err(ApiError::Protocol(_))));
    }

    // ===== queries =====

    #[test]
    fn search_normalizes_filters_and_titles() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("GET"))
                .and(path("/torrents.php"))
                .and(query_param("name", "dune"))
                .and(query_param("searchstr", "dune"))
                .and(query_param("json", "noredirect"))
                .respond_with(page(
                    r#"{"Movies":[{"GroupId":"7","Title":"Dune &amp; Dust","Year":"2021"}]}"#,
                )),
        );

        let api = Api::new(site.config()).unwrap();
        let movies = api.search(&[("name", "dune")]).unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Dune & Dust");
        assert_eq!(movies[0].imdb_id, "0");
        assert!(movies[0].directors.is_empty());
    }

    #[test]
    fn search_single_reads_group_id_off_the_redirect() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("GET"))
                .and(path("/torrents.php"))
                .and(query_param("searchstr", "the conversation"))
                .respond_with(
                    ResponseTemplate::new(302).insert_header("Location", "/torrents.php?id=55"),
                ),
        );
        site.mount(
            Mock::given(method("GET"))
                .and(path("/torrents.php"))
                .and(query_param("id", "55"))
                .respond_with(page("<html>group page</html>")),
        );

        let api = Api::new(site.config()).unwrap();
        let group = api.search_single(&[("name", "the conversation")]).unwrap();
        assert_eq!(group, Some(55));
    }

    #[test]
    fn search_single_without_redirect_finds_nothing() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("GET"))
                .and(path("/torrents.php"))
                .respond_with(page(r#"{"Movies":[]}"#)),
        );

        let api = Api::new(site.config()).unwrap();
        assert_eq!(api.search_single(&[("name", "nothing")]).unwrap(), None);
    }

    #[test]
    fn need_for_seed_resolves_links() {
        let site = TestSite::start();
        let body = concat!(
            "<script>coverViewJsonData[ 0 ] = ",
            r#"{"Movies":[{"Title":"M","GroupingQualities":[{"Torrents":[{"TorrentId":9,"#,
            r#""Title":"<a href=\"torrents.php?id=3&torrentid=9\">Great &amp; Small / x264</a>"}]}]}]}"#,
            ";</script>"
        );
        site.mount(
            Mock::given(method("GET"))
                .and(path("/needforseed.php"))
                .respond_with(page(body)),
        );

        let api = Api::new(site.config()).unwrap();
        let requests = api.need_for_seed(&[]).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].title, "Great & Small / x264");
        assert_eq!(
            requests[0].link,
            format!("{}/torrents.php?id=3&torrentid=9", site.server.uri())
        );
    }

    #[test]
    fn collage_flattens_grouping_qualities() {
        let site = TestSite::start();
        let body = concat!(
            "<script>coverViewJsonData[0] = ",
            r#"{"Movies":[{"Title":"The Conversation","GroupingQualities":["#,
            r#"{"Quality":"SD","Torrents":[{"TorrentId":1,"Title":"<a href=\"t\">SD</a>"}]},"#,
            r#"{"Quality":"HD","Torrents":[{"TorrentId":2,"Title":"<a href=\"t\">HD</a>"}]}]}]}"#,
            ";</script>"
        );
        site.mount(
            Mock::given(method("GET"))
                .and(path("/collages.php"))
                .and(query_param("id", "42"))
                .respond_with(page(body)),
        );

        let api = Api::new(site.config()).unwrap();
        let movies = api.collage(42, &[]).unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].torrents().count(), 2);
    }

    #[test]
    fn contest_leaders_parse_table_rows() {
        let site = TestSite::start();
        let body = r#"
            <table class="table--panel-like">
              <tbody>
                <tr><td>1</td><td>alice &amp; co</td><td>300</td></tr>
                <tr><td>2</td><td>bob</td><td>250</td></tr>
                <tr><td>decorative</td></tr>
              </tbody>
            </table>"#;
        site.mount(
            Mock::given(method("GET"))
                .and(path("/contestleaders.php"))
                .respond_with(page(body)),
        );

        let api = Api::new(site.config()).unwrap();
        let leaders = api.contest_leaders().unwrap();
        assert_eq!(
            leaders,
            vec![
                ContestLeader { user: "alice & co".into(), points: "300".into() },
                ContestLeader { user: "bob".into(), points: "250".into() },
            ]
        );
    }

    #[test]
    fn site_log_extracts_time_and_message() {
        let site = TestSite::start();
        let body = r#"
            <table>
              <tbody>
                <tr>
                  <td><span class="time" title="Nov 21 2023, 04:31">5 mins ago</span></td>
                  <td><span class="log__message"> Torrent <a href="torrents.php?id=1">Foo</a> was deleted</span></td>
                </tr>
              </tbody>
            </table>"#;
        site.mount(
            Mock::given(method("GET"))
                .and(path("/log.php"))
                .respond_with(page(body)),
        );

        let api = Api::new(site.config()).unwrap();
        let entries = api.site_log().unwrap();
        assert_eq!(
            entries,
            vec![LogEntry {
                time: "Nov 21 2023, 04:31".into(),
                message: "Torrent Foo was deleted".into(),
            }]
        );
    }

    #[test]
    fn query_errors_carry_the_status() {
        let site = TestSite::start();
        site.mount(
            Mock::given(method("GET"))
                .and(path("/log.php"))
                .respond_with(ResponseTemplate::new(403).set_body_string("forbidden")),
        );

        let api = Api::new(site.config()).unwrap();
        match api.site_log().unwrap_err() {
            ApiError::Http { status } => assert_eq!(status.as_u16(), 403),
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn login_helper_combines_build_and_establish() {
        let site = TestSite::start();
        let config = Config {
            api_user: Some("u".into()),
            api_key: Some("k".into()),
            ..site.config()
        };
        let api = Api::login(config, &CredentialOverrides::default()).unwrap();
        assert!(api.is_api_key_mode());
    }
}
