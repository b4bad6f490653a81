use anyhow::Context;
use perf_tunnel_runner::prelude::ScenarioConfig;
use shortener_client_instrumented::prelude::{ShortenerClient, DEFAULT_SHORTEN_PATH};
use std::str::FromStr;

const DEFAULT_BASE: &str = "http://localhost:8080";
const DEFAULT_CODE: &str = "_MsyRZ";

/// Where the shortener lives and what to send it, read from the environment.
///
/// | Variable | Default |
/// |---|---|
/// | `API_BASE` | `http://localhost:8080` |
/// | `GO_BASE` | `http://localhost:8080` |
/// | `SHORTEN_PATH` | `/api/v1/shorten` |
/// | `CODES` | `KNOWN_CODE`, or `_MsyRZ` |
/// | `REDIRECT_PREFIX` | empty |
/// | `UNIQUE_URL` | off, `1` to enable |
///
/// Unset and empty variables both take the default.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortenerDriverConfig {
    pub api_base: String,
    pub go_base: String,
    pub shorten_path: String,
    /// Codes that redirect invocations pick from. Never empty.
    pub codes: Vec<String>,
    pub redirect_prefix: String,
    /// Send a distinct URL on every create so each one makes a new link.
    pub unique_url: bool,
}

impl ShortenerDriverConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let codes = var("CODES")
            .or_else(|| var("KNOWN_CODE"))
            .unwrap_or_else(|| DEFAULT_CODE.to_string())
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if codes.is_empty() {
            anyhow::bail!("CODES must name at least one short code");
        }

        Ok(Self {
            api_base: trim_base(var("API_BASE").as_deref().unwrap_or(DEFAULT_BASE)),
            go_base: trim_base(var("GO_BASE").as_deref().unwrap_or(DEFAULT_BASE)),
            shorten_path: var("SHORTEN_PATH").unwrap_or_else(|| DEFAULT_SHORTEN_PATH.to_string()),
            codes,
            redirect_prefix: var("REDIRECT_PREFIX")
                .map(|p| p.trim_end_matches('/').to_string())
                .unwrap_or_default(),
            unique_url: var("UNIQUE_URL").as_deref() == Some("1"),
        })
    }

    pub fn client(&self) -> anyhow::Result<ShortenerClient> {
        let client = ShortenerClient::new(&self.api_base, &self.go_base)
            .context("Invalid shortener base URL")?
            .with_shorten_path(&self.shorten_path)
            .with_redirect_prefix(&self.redirect_prefix);

        Ok(client)
    }
}

fn trim_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalRateDefaults {
    pub rate: f64,
    pub preallocated_workers: usize,
    pub max_workers: usize,
}

/// Build a [ScenarioConfig] from `{prefix}RPS`, `{prefix}PRE_VUS` and `{prefix}MAX_VUS`.
pub fn arrival_rate_config(
    name: &str,
    prefix: &str,
    defaults: ArrivalRateDefaults,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ScenarioConfig> {
    let rate = parse_var(&lookup, &format!("{prefix}RPS"), defaults.rate)?;
    let pre = parse_var(
        &lookup,
        &format!("{prefix}PRE_VUS"),
        defaults.preallocated_workers,
    )?;
    let max = parse_var(&lookup, &format!("{prefix}MAX_VUS"), defaults.max_workers)?;

    ScenarioConfig::new(name, rate, pre, max)
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: [{value}]")),
        None => Ok(default),
    }
}
