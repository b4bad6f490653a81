mod cli;
mod clock;
mod definition;
mod init;
mod monitor;
mod pool;
mod progress;
mod run;
mod scenario;
mod sequential;
mod shutdown;
mod thresholds;
mod types;

pub mod prelude {
    pub use crate::cli::{parse_duration_secs, PerfTunnelScenarioCli, ReporterOpt};
    pub use crate::clock::{InvocationInstant, ScenarioClock};
    pub use crate::definition::ScenarioDefinitionBuilder;
    pub use crate::init::init;
    pub use crate::pool::{WorkerPool, DEFAULT_GRACE_PERIOD, LATE_ADMISSION_FLOOR};
    pub use crate::run::run;
    pub use crate::scenario::{
        classify, throttle_backoff, Invocation, OutcomeCheck, ScenarioConfig, TrafficScenario,
        DEFAULT_SCENARIO_DURATION, MAX_THROTTLE_BACKOFF, MIN_THROTTLE_BACKOFF,
    };
    pub use crate::sequential::{
        IterationContext, SequentialBehaviour, SequentialConfig, SequentialDriver, WorkerStage,
        STAGE_POLL_INTERVAL,
    };
    pub use crate::thresholds::{ThresholdBreach, Thresholds};
    pub use crate::types::PerfTunnelResult;

    pub use futures::future::BoxFuture;
    pub use futures::FutureExt;
    pub use perf_tunnel_core::prelude::*;
    pub use perf_tunnel_instruments::{RequestOutcome, ScenarioReport, Verdict};
    pub use perf_tunnel_summary_model::{ResultStore, RunMetrics, RunResult};
}
