use crate::config::ShortenerDriverConfig;
use crate::create::is_created;
use crate::redirect::RedirectCheck;
use perf_tunnel_runner::prelude::{
    BoxFuture, FailureKind, FutureExt, IterationContext, OutcomeCheck, RequestOutcome,
    SequentialBehaviour, Verdict,
};
use shortener_client_instrumented::prelude::{ShortenRequest, ShortenerClient};
use std::time::Duration;

/// Pause between successful iterations.
pub const SMOKE_PAUSE: Duration = Duration::from_millis(200);
/// Pause after a failed create, which also skips the redirect.
pub const FAILED_CREATE_PAUSE: Duration = Duration::from_secs(1);

const SMOKE_URL: &str = "https://example.com";

/// Creates a link and then requests the redirect for the code that came back.
pub struct SmokeBehaviour {
    client: ShortenerClient,
}

impl SmokeBehaviour {
    pub fn new(client: ShortenerClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ShortenerDriverConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.client()?))
    }
}

/// A create only passes when the body carried a usable code.
struct CreatedLinkCheck {
    has_code: bool,
}

impl OutcomeCheck for CreatedLinkCheck {
    fn is_success(&self, outcome: &RequestOutcome) -> bool {
        is_created(outcome) && self.has_code
    }

    fn failure_kind(&self, outcome: &RequestOutcome) -> FailureKind {
        if is_created(outcome) {
            FailureKind::ProtocolViolation
        } else {
            FailureKind::UnexpectedStatus
        }
    }
}

impl SequentialBehaviour for SmokeBehaviour {
    fn iterate<'a>(&'a self, ctx: &'a mut IterationContext) -> BoxFuture<'a, Duration> {
        async move {
            let request = ShortenRequest::new(SMOKE_URL).with_preview(false);
            let exchange = self.client.shorten(&request).await;
            let code = exchange
                .created
                .map(|created| created.code)
                .filter(|code| !code.is_empty());

            let check = CreatedLinkCheck {
                has_code: code.is_some(),
            };
            let verdict = ctx.record(&check, &exchange.outcome);
            let Some(code) = code.filter(|_| verdict == Verdict::Success) else {
                log::debug!(
                    "Smoke create failed on iteration {}, skipping redirect",
                    ctx.iteration()
                );
                return FAILED_CREATE_PAUSE;
            };

            let outcome = self.client.redirect(&code).await;
            ctx.record(&RedirectCheck, &outcome);

            SMOKE_PAUSE
        }
        .boxed()
    }
}
