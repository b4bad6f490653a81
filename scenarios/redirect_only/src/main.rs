use shortener_perf_runner::prelude::*;
use std::sync::Arc;

fn main() -> PerfTunnelResult<()> {
    let builder = ScenarioDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME"));

    let driver = ShortenerDriverConfig::from_env()?;
    let config = arrival_rate_config(
        "redirect",
        "",
        ArrivalRateDefaults {
            rate: 1000.0,
            preallocated_workers: 100,
            max_workers: 1000,
        },
        |key| std::env::var(key).ok(),
    )?;

    let builder = builder
        .with_default_duration_s(60)
        .use_arrival_rate_scenario(config, Arc::new(RedirectScenario::from_config(&driver)?));

    run(builder)?;

    Ok(())
}
