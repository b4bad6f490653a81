use crate::error::ShortenerClientError;
use crate::types::{ProblemDetails, ShortenRequest, ShortenResponse};
use perf_tunnel_instruments::RequestOutcome;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_SHORTEN_PATH: &str = "/api/v1/shorten";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of one create call: the measurement plus whatever body could be parsed from it.
#[derive(Debug, Clone)]
pub struct ShortenExchange {
    pub outcome: RequestOutcome,
    pub created: Option<ShortenResponse>,
    pub problem: Option<ProblemDetails>,
}

/// HTTP client for the shortener's two hot paths.
///
/// Redirects are never followed, so a redirect call measures the 301/302 itself rather than the
/// destination. Every call is timed from send until the body is read.
#[derive(Debug, Clone)]
pub struct ShortenerClient {
    http: reqwest::Client,
    api_base: String,
    shorten_path: String,
    go_base: String,
    redirect_prefix: String,
}

impl ShortenerClient {
    pub fn new(api_base: &str, go_base: &str) -> Result<Self, ShortenerClientError> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ShortenerClientError::Build)?;

        Ok(Self {
            http,
            api_base: normalise_base(api_base)?,
            shorten_path: DEFAULT_SHORTEN_PATH.to_string(),
            go_base: normalise_base(go_base)?,
            redirect_prefix: String::new(),
        })
    }

    pub fn with_shorten_path(mut self, shorten_path: &str) -> Self {
        self.shorten_path = if shorten_path.starts_with('/') {
            shorten_path.to_string()
        } else {
            format!("/{shorten_path}")
        };
        self
    }

    /// Path inserted between the redirect host and the code. Trailing slashes are dropped.
    pub fn with_redirect_prefix(mut self, redirect_prefix: &str) -> Self {
        self.redirect_prefix = redirect_prefix.trim_end_matches('/').to_string();
        self
    }

    pub fn shorten_endpoint(&self, preview: bool) -> String {
        let query = if preview { "?preview=true" } else { "" };
        format!("{}{}{}", self.api_base, self.shorten_path, query)
    }

    pub fn redirect_url(&self, code: &str) -> String {
        format!("{}{}/{}", self.go_base, self.redirect_prefix, code)
    }

    /// Create a short link. Never fails: a connection error is reported through the outcome.
    pub async fn shorten(&self, request: &ShortenRequest) -> ShortenExchange {
        let endpoint = self.shorten_endpoint(request.wants_preview());
        let start = Instant::now();
        let response = match self.http.post(&endpoint).json(request).send().await {
            Ok(response) => response,
            Err(e) => {
                log::trace!("Shorten request to {endpoint} failed: {e}");
                return ShortenExchange {
                    outcome: RequestOutcome::network_failure(start.elapsed(), e),
                    created: None,
                    problem: None,
                };
            }
        };

        let status = response.status();
        let headers = header_map(response.headers());
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                return ShortenExchange {
                    outcome: RequestOutcome::network_failure(start.elapsed(), e),
                    created: None,
                    problem: None,
                }
            }
        };
        let outcome = RequestOutcome::response(status.as_u16(), start.elapsed(), headers);

        if status.is_success() {
            ShortenExchange {
                outcome,
                created: serde_json::from_slice(&body).ok(),
                problem: None,
            }
        } else {
            ShortenExchange {
                outcome,
                created: None,
                problem: ProblemDetails::from_body(&body),
            }
        }
    }

    /// Request the redirect for `code` without following it.
    pub async fn redirect(&self, code: &str) -> RequestOutcome {
        let url = self.redirect_url(code);
        let start = Instant::now();
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::trace!("Redirect request to {url} failed: {e}");
                return RequestOutcome::network_failure(start.elapsed(), e);
            }
        };

        let status = response.status().as_u16();
        let headers = header_map(response.headers());
        match response.bytes().await {
            Ok(_) => RequestOutcome::response(status, start.elapsed(), headers),
            Err(e) => RequestOutcome::network_failure(start.elapsed(), e),
        }
    }

    /// Create a short link and return the parsed body, turning any failure into an error.
    pub async fn shorten_url(
        &self,
        request: &ShortenRequest,
    ) -> Result<ShortenResponse, ShortenerClientError> {
        let exchange = self.shorten(request).await;
        let Some(status) = exchange.outcome.status else {
            return Err(ShortenerClientError::Network(
                exchange.outcome.error.unwrap_or_default(),
            ));
        };

        if !(200..300).contains(&status) {
            return Err(ShortenerClientError::Http {
                status,
                message: ProblemDetails::message(exchange.problem.as_ref(), status),
                problem: exchange.problem,
            });
        }

        exchange
            .created
            .ok_or_else(|| ShortenerClientError::InvalidBody {
                status,
                reason: "missing code, shortUrl or originalUrl".to_string(),
            })
    }
}

fn normalise_base(base: &str) -> Result<String, ShortenerClientError> {
    let trimmed = base.trim().trim_end_matches('/');
    url::Url::parse(trimmed).map_err(|source| ShortenerClientError::InvalidBaseUrl {
        url: base.to_string(),
        source,
    })?;

    Ok(trimmed.to_string())
}

fn header_map(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
