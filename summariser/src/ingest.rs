use perf_tunnel_summary_model::{
    ResultHistory, RunResult, HISTORY_FILE_NAME, LATEST_FILE_NAME,
};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use std::path::PathBuf;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("Invalid results location [{location}]: {source}")]
    InvalidLocation {
        location: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to fetch {location}: {source}")]
    Fetch {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch {location} ({status})")]
    Status { location: String, status: u16 },

    #[error("Failed to read {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Where published run results are read from.
///
/// Both variants serve the two documents written by the result store, `latest.json` and
/// `history.json`, side by side.
#[derive(Debug, Clone)]
pub enum ResultSource {
    /// Fetched over HTTP with caching disabled, so a freshly published run is always seen.
    Http { client: reqwest::Client, base: String },
    /// Read straight from a result store directory.
    Directory(PathBuf),
}

/// Whatever could be loaded from a [ResultSource].
///
/// The two documents are loaded independently. One failing leaves the other usable and the
/// failure is kept in `errors`.
#[derive(Debug, Default)]
pub struct Ingested {
    pub latest: Option<RunResult>,
    pub history: Option<ResultHistory>,
    pub errors: Vec<IngestionError>,
}

impl ResultSource {
    /// An `http://` or `https://` location is fetched, anything else is a directory.
    pub fn parse(location: &str) -> Result<Self, IngestionError> {
        let location = location.trim();
        if !(location.starts_with("http://") || location.starts_with("https://")) {
            return Ok(Self::Directory(PathBuf::from(location)));
        }

        let base = location.trim_end_matches('/');
        url::Url::parse(base).map_err(|source| IngestionError::InvalidLocation {
            location: location.to_string(),
            source,
        })?;

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(IngestionError::Client)?;

        Ok(Self::Http {
            client,
            base: base.to_string(),
        })
    }

    /// Human readable location of the results, as shown on the dashboard.
    pub fn location(&self) -> String {
        match self {
            Self::Http { base, .. } => base.clone(),
            Self::Directory(dir) => dir.display().to_string(),
        }
    }

    pub async fn latest(&self) -> Result<RunResult, IngestionError> {
        let (location, body) = self.fetch_document(LATEST_FILE_NAME).await?;
        serde_json::from_slice(&body).map_err(|source| IngestionError::Parse { location, source })
    }

    /// Load the history, skipping any entry that is not a valid run result.
    pub async fn history(&self) -> Result<ResultHistory, IngestionError> {
        let (location, body) = self.fetch_document(HISTORY_FILE_NAME).await?;
        let entries: Vec<serde_json::Value> =
            serde_json::from_slice(&body).map_err(|source| IngestionError::Parse {
                location: location.clone(),
                source,
            })?;

        let total = entries.len();
        let results = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<RunResult>(entry) {
                Ok(result) => Some(result),
                Err(e) => {
                    log::warn!("Skipping history entry {index} in {location}: {e}");
                    None
                }
            })
            .collect::<Vec<_>>();
        log::debug!("Loaded {} of {total} history entries from {location}", results.len());

        Ok(ResultHistory::from(results))
    }

    /// Load both documents concurrently, keeping whichever succeeded.
    pub async fn ingest(&self) -> Ingested {
        let (latest, history) = tokio::join!(self.latest(), self.history());

        let mut ingested = Ingested::default();
        match latest {
            Ok(latest) => ingested.latest = Some(latest),
            Err(e) => ingested.errors.push(e),
        }
        match history {
            Ok(history) => ingested.history = Some(history),
            Err(e) => ingested.errors.push(e),
        }

        for error in &ingested.errors {
            log::error!("{error}");
        }

        ingested
    }

    async fn fetch_document(&self, name: &str) -> Result<(String, Vec<u8>), IngestionError> {
        match self {
            Self::Http { client, base } => {
                let location = format!("{base}/{name}");
                let response = client
                    .get(&location)
                    .header(CACHE_CONTROL, "no-store")
                    .header(PRAGMA, "no-cache")
                    .send()
                    .await
                    .map_err(|source| IngestionError::Fetch {
                        location: location.clone(),
                        source,
                    })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(IngestionError::Status {
                        location,
                        status: status.as_u16(),
                    });
                }

                let body = response
                    .bytes()
                    .await
                    .map_err(|source| IngestionError::Fetch {
                        location: location.clone(),
                        source,
                    })?;

                Ok((location, body.to_vec()))
            }
            Self::Directory(dir) => {
                let path = dir.join(name);
                let location = path.display().to_string();
                let body = tokio::fs::read(&path)
                    .await
                    .map_err(|source| IngestionError::Read {
                        location: location.clone(),
                        source,
                    })?;

                Ok((location, body))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn locations_are_told_apart() {
        let http = ResultSource::parse("https://perf.example.com/results//").unwrap();
        assert!(matches!(http, ResultSource::Http { .. }));
        assert_eq!("https://perf.example.com/results", http.location());

        let dir = ResultSource::parse("perf/results").unwrap();
        assert!(matches!(dir, ResultSource::Directory(_)));
        assert_eq!("perf/results", dir.location());
    }

    #[test]
    fn malformed_url_is_rejected() {
        let err = ResultSource::parse("http://").unwrap_err();
        assert!(matches!(err, IngestionError::InvalidLocation { .. }));
    }
}
