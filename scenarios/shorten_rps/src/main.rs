use shortener_perf_runner::prelude::*;
use std::sync::Arc;

fn main() -> PerfTunnelResult<()> {
    // Throttling is expected here, so only the number of 429s is limited
    let builder = ScenarioDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME")).with_thresholds(
        Thresholds {
            max_rate_limited_rate: f64::INFINITY,
            max_rate_limited: Some(10),
            ..Default::default()
        },
    );

    let driver = ShortenerDriverConfig::from_env()?;
    // Start low, the create path is rate limited
    let config = arrival_rate_config(
        "shorten",
        "",
        ArrivalRateDefaults {
            rate: 2.0,
            preallocated_workers: 100,
            max_workers: 300,
        },
        |key| std::env::var(key).ok(),
    )?
    .with_rate_limit_aware(true)
    .with_throttle_backoff(true);

    let builder = builder
        .with_default_duration_s(60)
        .use_arrival_rate_scenario(config, Arc::new(CreateScenario::from_config(&driver)?));

    run(builder)?;

    Ok(())
}
