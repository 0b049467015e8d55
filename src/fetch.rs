//! Source acquisition over HTTP.
//!
//! A [`Fetcher`] turns a URL into the complete response body or a
//! [`FetchError`]. There is no retry: the caller decides whether to try again
//! or fall back to something else. Every request is bounded by the
//! configured timeout and body size cap.

use crate::config::FetchConfig;
use reqwest::Url;
use reqwest::blocking::Client;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("reading body of {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{url} returned an empty body")]
    EmptyBody { url: String },
    #[error("{url} body exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },
    #[error("could not build HTTP client: {0}")]
    Client(reqwest::Error),
}

impl FetchError {
    /// Whether the request ran out of time.
    pub fn is_timeout(&self) -> bool {
        match self {
            FetchError::Http { source, .. } => source.is_timeout(),
            FetchError::Body { source, .. } => {
                source.kind() == std::io::ErrorKind::TimedOut
                    || source
                        .get_ref()
                        .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
                        .is_some_and(reqwest::Error::is_timeout)
            }
            _ => false,
        }
    }
}

/// Blocking HTTP client with a per-request timeout.
///
/// Cheap to share: the underlying client is internally reference counted and
/// holds no per-request state.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_bytes: u64,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }

    /// Fetcher with an explicit timeout, keeping other settings at their defaults.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let config = FetchConfig::default();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }

    /// Fetch the full body of `url`.
    ///
    /// Fails on an unparsable or non-HTTP(S) URL, network errors, timeouts,
    /// non-2xx statuses, empty bodies and bodies over the size cap.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = parse_http_url(url)?;
        tracing::debug!(url = %parsed, "fetching");

        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(parsed).send().map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes)
        {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                limit: self.max_bytes,
            });
        }

        // Read one byte past the cap so an oversized chunked body is detected.
        let mut body = Vec::new();
        response
            .take(self.max_bytes + 1)
            .read_to_end(&mut body)
            .map_err(|source| FetchError::Body {
                url: url.to_string(),
                source,
            })?;

        if body.len() as u64 > self.max_bytes {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                limit: self.max_bytes,
            });
        }
        if body.is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }

        tracing::debug!(url, bytes = body.len(), "fetched");
        Ok(body)
    }
}

/// Parse `url`, accepting only `http` and `https`.
pub fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty".to_string()));
    }
    let parsed = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{serve_once, silent_server};
    use std::time::Instant;

    fn fetcher() -> Fetcher {
        Fetcher::with_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn parse_accepts_http_and_https() {
        assert!(parse_http_url("http://example.com/a.jpg").is_ok());
        assert!(parse_http_url("https://i.imgflip.com/30b1gx.jpg").is_ok());
    }

    #[test]
    fn parse_rejects_empty_and_other_schemes() {
        assert!(matches!(parse_http_url(""), Err(FetchError::InvalidUrl { .. })));
        assert!(matches!(parse_http_url("   "), Err(FetchError::InvalidUrl { .. })));
        assert!(matches!(
            parse_http_url("file:///etc/passwd"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(parse_http_url("not a url"), Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn fetch_returns_full_body() {
        let body: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let url = serve_once(200, "image/jpeg", body.clone());
        assert_eq!(fetcher().fetch(&url).unwrap(), body);
    }

    #[test]
    fn non_success_status_fails() {
        let url = serve_once(404, "text/plain", b"missing".to_vec());
        assert!(matches!(
            fetcher().fetch(&url),
            Err(FetchError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn empty_body_fails() {
        let url = serve_once(200, "image/png", Vec::new());
        assert!(matches!(fetcher().fetch(&url), Err(FetchError::EmptyBody { .. })));
    }

    #[test]
    fn oversized_body_fails() {
        let config = FetchConfig {
            max_bytes: 16,
            ..FetchConfig::default()
        };
        let url = serve_once(200, "image/png", vec![7u8; 64]);
        let err = Fetcher::new(&config).unwrap().fetch(&url).unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { limit: 16, .. }));
    }

    #[test]
    fn refused_connection_fails() {
        // Bind then drop to get a port nobody listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let err = fetcher().fetch(&format!("http://127.0.0.1:{port}/")).unwrap_err();
        assert!(matches!(err, FetchError::Http { .. }));
    }

    #[test]
    fn body_read_timeout_counts_as_timeout() {
        let err = FetchError::Body {
            url: "http://example.com/a.jpg".into(),
            source: std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out"),
        };
        assert!(err.is_timeout());

        let other = FetchError::Body {
            url: "http://example.com/a.jpg".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
        };
        assert!(!other.is_timeout());
    }

    #[test]
    fn hanging_server_times_out() {
        let (_guard, url) = silent_server();
        let fetcher = Fetcher::with_timeout(Duration::from_millis(300)).unwrap();

        let started = Instant::now();
        let err = fetcher.fetch(&url).unwrap_err();
        assert!(err.is_timeout(), "{err}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
