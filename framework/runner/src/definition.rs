use crate::cli::{PerfTunnelScenarioCli, ReporterOpt};
use crate::scenario::{ScenarioConfig, TrafficScenario};
use crate::sequential::{SequentialBehaviour, SequentialConfig};
use crate::thresholds::Thresholds;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// The builder for a run definition.
///
/// This must be used at the start of a run to define the scenarios that you want to drive. A run
/// can mix any number of arrival-rate and sequential scenarios, which all start together.
pub struct ScenarioDefinitionBuilder {
    /// The name of the run, which should be unique within the suite.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    /// This value is initialised for you and you cannot change it.
    #[doc(hidden)]
    cli: PerfTunnelScenarioCli,
    /// Applied to every scenario when the CLI does not set a duration.
    default_duration_s: Option<u64>,
    arrival_rate: Vec<(ScenarioConfig, Arc<dyn TrafficScenario>)>,
    sequential: Vec<(SequentialConfig, Arc<dyn SequentialBehaviour>)>,
    thresholds: Thresholds,
}

pub(crate) struct ScenarioDefinition {
    pub name: String,
    pub run_id: Option<String>,
    pub no_progress: bool,
    pub reporter: ReporterOpt,
    pub results_dir: Option<PathBuf>,
    pub grace_period: Duration,
    pub fail_on_threshold: bool,
    pub arrival_rate: Vec<(ScenarioConfig, Arc<dyn TrafficScenario>)>,
    pub sequential: Vec<(SequentialConfig, Arc<dyn SequentialBehaviour>)>,
    pub thresholds: Thresholds,
}

impl ScenarioDefinition {
    /// The longest scenario duration, which is how long the run takes before grace periods.
    pub fn planned_runtime(&self) -> Duration {
        self.arrival_rate
            .iter()
            .map(|(c, _)| c.duration())
            .chain(self.sequential.iter().map(|(c, _)| c.duration()))
            .max()
            .unwrap_or_default()
    }
}

impl ScenarioDefinitionBuilder {
    /// Initialise a new run definition from its name and command line arguments.
    /// See the [ScenarioDefinitionBuilder::name] for more information about the name.
    pub fn new(name: &str, cli: PerfTunnelScenarioCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            default_duration_s: None,
            arrival_rate: Vec::new(),
            sequential: Vec::new(),
            thresholds: Thresholds::default(),
        }
    }

    /// Initialise logging, parse the command line and create a new run definition.
    pub fn new_with_init(name: &str) -> Self {
        Self::new(name, crate::init::init())
    }

    /// Set a duration for every scenario, used unless `--duration` is given.
    pub fn with_default_duration_s(mut self, duration_s: u64) -> Self {
        self.default_duration_s = Some(duration_s);
        self
    }

    /// Add a scenario driven at a constant arrival rate.
    pub fn use_arrival_rate_scenario(
        mut self,
        config: ScenarioConfig,
        scenario: Arc<dyn TrafficScenario>,
    ) -> Self {
        self.arrival_rate.push((config, scenario));
        self
    }

    /// Add a closed-loop scenario whose workers run iterations back to back.
    pub fn use_sequential_scenario(
        mut self,
        config: SequentialConfig,
        behaviour: Arc<dyn SequentialBehaviour>,
    ) -> Self {
        self.sequential.push((config, behaviour));
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub(crate) fn build(self) -> anyhow::Result<ScenarioDefinition> {
        if self.arrival_rate.is_empty() && self.sequential.is_empty() {
            anyhow::bail!("Run [{}] does not define any scenarios", self.name);
        }

        let mut names = HashSet::new();
        for name in self
            .arrival_rate
            .iter()
            .map(|(c, _)| c.name())
            .chain(self.sequential.iter().map(|(c, _)| c.name()))
        {
            if !names.insert(name) {
                anyhow::bail!("Scenario [{name}] is defined more than once");
            }
        }

        let duration = self
            .cli
            .duration
            .or(self.default_duration_s.map(Duration::from_secs));

        let arrival_rate = self
            .arrival_rate
            .into_iter()
            .map(|(config, scenario)| match duration {
                Some(duration) => Ok((config.with_duration(duration)?, scenario)),
                None => Ok((config, scenario)),
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let sequential = self
            .sequential
            .into_iter()
            .map(|(config, behaviour)| match duration {
                Some(duration) => Ok((config.with_duration(duration)?, behaviour)),
                None => Ok((config, behaviour)),
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(ScenarioDefinition {
            name: self.name,
            run_id: self.cli.run_id,
            no_progress: self.cli.no_progress,
            reporter: self.cli.reporter,
            results_dir: self.cli.results_dir,
            grace_period: self.cli.grace_period,
            fail_on_threshold: self.cli.fail_on_threshold,
            arrival_rate,
            sequential,
            thresholds: self.thresholds,
        })
    }
}
