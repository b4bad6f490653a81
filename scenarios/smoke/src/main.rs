use shortener_perf_runner::prelude::*;
use std::sync::Arc;

fn main() -> PerfTunnelResult<()> {
    let builder = ScenarioDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME"))
        .with_default_duration_s(15)
        .with_thresholds(Thresholds {
            max_p95_ms: 800.0,
            max_p99_ms: f64::INFINITY,
            ..Default::default()
        });

    let driver = ShortenerDriverConfig::from_env()?;
    let builder = builder.use_sequential_scenario(
        SequentialConfig::new("smoke", 1)?,
        Arc::new(SmokeBehaviour::from_config(&driver)?),
    );

    run(builder)?;

    Ok(())
}
