use shortener_perf_runner::prelude::*;
use std::sync::Arc;

fn main() -> PerfTunnelResult<()> {
    let builder = ScenarioDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME"));

    let driver = ShortenerDriverConfig::from_env()?;
    let env = |key: &str| std::env::var(key).ok();

    let redirect = arrival_rate_config(
        "redirect",
        "REDIRECT_",
        ArrivalRateDefaults {
            rate: 1000.0,
            preallocated_workers: 200,
            max_workers: 2000,
        },
        env,
    )?
    .with_rate_limit_aware(true);
    let shorten = arrival_rate_config(
        "shorten",
        "SHORTEN_",
        ArrivalRateDefaults {
            rate: 20.0,
            preallocated_workers: 50,
            max_workers: 500,
        },
        env,
    )?
    .with_rate_limit_aware(true);

    let builder = builder
        .with_default_duration_s(60)
        .use_arrival_rate_scenario(redirect, Arc::new(RedirectScenario::from_config(&driver)?))
        .use_arrival_rate_scenario(shorten, Arc::new(CreateScenario::from_config(&driver)?));

    run(builder)?;

    Ok(())
}
