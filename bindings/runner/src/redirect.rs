use crate::config::ShortenerDriverConfig;
use perf_tunnel_runner::prelude::{
    BoxFuture, FailureKind, FutureExt, Invocation, OutcomeCheck, RequestOutcome, TrafficScenario,
};
use rand::seq::SliceRandom;
use shortener_client_instrumented::prelude::ShortenerClient;

/// Requests the redirect for a randomly chosen known code on each invocation, without following
/// it.
pub struct RedirectScenario {
    client: ShortenerClient,
    codes: Vec<String>,
}

impl RedirectScenario {
    pub fn new(client: ShortenerClient, codes: Vec<String>) -> anyhow::Result<Self> {
        if codes.is_empty() {
            anyhow::bail!("A redirect scenario needs at least one code");
        }

        Ok(Self { client, codes })
    }

    pub fn from_config(config: &ShortenerDriverConfig) -> anyhow::Result<Self> {
        Self::new(config.client()?, config.codes.clone())
    }

    fn pick_code(&self) -> &str {
        self.codes
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// A redirect succeeded when it is a 301 or 302 with a `Location`.
pub(crate) fn is_redirect(outcome: &RequestOutcome) -> bool {
    is_redirect_status(outcome) && outcome.header("location").is_some()
}

fn is_redirect_status(outcome: &RequestOutcome) -> bool {
    outcome.is_status(301) || outcome.is_status(302)
}

pub(crate) fn redirect_failure(outcome: &RequestOutcome) -> FailureKind {
    if is_redirect_status(outcome) {
        FailureKind::ProtocolViolation
    } else {
        FailureKind::UnexpectedStatus
    }
}

/// [is_redirect] as a standalone check, for behaviours that make redirect calls themselves.
pub(crate) struct RedirectCheck;

impl OutcomeCheck for RedirectCheck {
    fn is_success(&self, outcome: &RequestOutcome) -> bool {
        is_redirect(outcome)
    }

    fn failure_kind(&self, outcome: &RequestOutcome) -> FailureKind {
        redirect_failure(outcome)
    }
}

impl TrafficScenario for RedirectScenario {
    fn invoke(&self, _invocation: Invocation) -> BoxFuture<'_, RequestOutcome> {
        let code = self.pick_code();
        async move { self.client.redirect(code).await }.boxed()
    }
}

impl OutcomeCheck for RedirectScenario {
    fn is_success(&self, outcome: &RequestOutcome) -> bool {
        is_redirect(outcome)
    }

    fn failure_kind(&self, outcome: &RequestOutcome) -> FailureKind {
        redirect_failure(outcome)
    }
}
