use shortener_perf_runner::prelude::*;
use std::sync::Arc;

fn main() -> PerfTunnelResult<()> {
    // No default duration, the stages decide how long the run takes
    let builder = ScenarioDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME")).with_thresholds(
        Thresholds {
            max_p95_ms: 1200.0,
            max_p99_ms: f64::INFINITY,
            ..Default::default()
        },
    );

    let driver = ShortenerDriverConfig::from_env()?;
    let config = SequentialConfig::new("load", 1)?.with_stages(load_stages())?;

    let builder =
        builder.use_sequential_scenario(config, Arc::new(LoadBehaviour::from_config(&driver)?));

    run(builder)?;

    Ok(())
}
