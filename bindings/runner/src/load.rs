use crate::config::ShortenerDriverConfig;
use crate::create::CreatedCheck;
use crate::redirect::RedirectCheck;
use perf_tunnel_runner::prelude::{
    BoxFuture, FutureExt, IterationContext, SequentialBehaviour, WorkerStage,
};
use rand::seq::SliceRandom;
use rand::Rng;
use shortener_client_instrumented::prelude::{ShortenRequest, ShortenerClient};
use std::time::Duration;

/// Share of iterations that create a link. The rest request a redirect.
pub const LOAD_CREATE_SHARE: f64 = 0.2;
/// Pause after every iteration.
pub const LOAD_PAUSE: Duration = Duration::from_millis(100);

const LOAD_URL: &str = "https://example.com";

/// The ramp of the general load profile: up to 5, 25 and then 50 workers, then back down to none.
pub fn load_stages() -> Vec<WorkerStage> {
    vec![
        WorkerStage::new(Duration::from_secs(30), 5),
        WorkerStage::new(Duration::from_secs(60), 25),
        WorkerStage::new(Duration::from_secs(60), 50),
        WorkerStage::new(Duration::from_secs(30), 0),
    ]
}

/// Production-like mix of traffic. Each iteration makes a single request, either a create or a
/// redirect for one of the known codes.
pub struct LoadBehaviour {
    client: ShortenerClient,
    codes: Vec<String>,
    create_share: f64,
}

impl LoadBehaviour {
    pub fn new(client: ShortenerClient, codes: Vec<String>) -> anyhow::Result<Self> {
        if codes.is_empty() {
            anyhow::bail!("A load behaviour needs at least one code to redirect");
        }

        Ok(Self {
            client,
            codes,
            create_share: LOAD_CREATE_SHARE,
        })
    }

    pub fn from_config(config: &ShortenerDriverConfig) -> anyhow::Result<Self> {
        Self::new(config.client()?, config.codes.clone())
    }

    /// Override the share of iterations that create, clamped to `0.0..=1.0`. A non-finite
    /// share keeps [LOAD_CREATE_SHARE].
    pub fn with_create_share(mut self, create_share: f64) -> Self {
        if create_share.is_finite() {
            self.create_share = create_share.clamp(0.0, 1.0);
        }
        self
    }
}

impl SequentialBehaviour for LoadBehaviour {
    fn iterate<'a>(&'a self, ctx: &'a mut IterationContext) -> BoxFuture<'a, Duration> {
        let mut rng = rand::thread_rng();
        let redirect_code = if rng.gen_bool(self.create_share) {
            None
        } else {
            self.codes.choose(&mut rng).cloned()
        };

        async move {
            match redirect_code {
                Some(code) => {
                    let outcome = self.client.redirect(&code).await;
                    ctx.record(&RedirectCheck, &outcome);
                }
                None => {
                    let request = ShortenRequest::new(LOAD_URL).with_preview(false);
                    let exchange = self.client.shorten(&request).await;
                    ctx.record(&CreatedCheck, &exchange.outcome);
                }
            }

            LOAD_PAUSE
        }
        .boxed()
    }
}
