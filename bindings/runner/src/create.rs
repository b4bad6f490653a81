use crate::config::ShortenerDriverConfig;
use perf_tunnel_runner::prelude::{
    BoxFuture, FutureExt, Invocation, OutcomeCheck, RequestOutcome, TrafficScenario,
};
use shortener_client_instrumented::prelude::{ShortenRequest, ShortenerClient};

const TARGET_URL: &str = "https://example.com";

/// Creates one short link per invocation.
pub struct CreateScenario {
    client: ShortenerClient,
    unique_url: bool,
}

impl CreateScenario {
    pub fn new(client: ShortenerClient, unique_url: bool) -> Self {
        Self { client, unique_url }
    }

    pub fn from_config(config: &ShortenerDriverConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.client()?, config.unique_url))
    }

    /// The URL to shorten. Unique per worker, iteration and millisecond when enabled, so that
    /// the backend cannot answer from an existing link.
    pub fn target_url(&self, invocation: &Invocation) -> String {
        if self.unique_url {
            format!(
                "{TARGET_URL}?v={}-{}-{}",
                invocation.worker_id,
                invocation.iteration,
                chrono::Utc::now().timestamp_millis()
            )
        } else {
            TARGET_URL.to_string()
        }
    }
}

impl TrafficScenario for CreateScenario {
    fn invoke(&self, invocation: Invocation) -> BoxFuture<'_, RequestOutcome> {
        let request = ShortenRequest::new(self.target_url(&invocation));
        async move { self.client.shorten(&request).await.outcome }.boxed()
    }
}

impl OutcomeCheck for CreateScenario {
    fn is_success(&self, outcome: &RequestOutcome) -> bool {
        is_created(outcome)
    }
}

pub(crate) fn is_created(outcome: &RequestOutcome) -> bool {
    outcome.is_status(200) || outcome.is_status(201)
}

/// [is_created] as a standalone check, for behaviours that make create calls themselves.
pub(crate) struct CreatedCheck;

impl OutcomeCheck for CreatedCheck {
    fn is_success(&self, outcome: &RequestOutcome) -> bool {
        is_created(outcome)
    }
}
