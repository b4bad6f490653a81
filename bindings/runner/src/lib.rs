mod config;
mod create;
mod load;
mod redirect;
mod smoke;

pub mod prelude {
    pub use crate::config::{arrival_rate_config, ArrivalRateDefaults, ShortenerDriverConfig};
    pub use crate::create::CreateScenario;
    pub use crate::load::{load_stages, LoadBehaviour, LOAD_CREATE_SHARE, LOAD_PAUSE};
    pub use crate::redirect::RedirectScenario;
    pub use crate::smoke::{SmokeBehaviour, FAILED_CREATE_PAUSE, SMOKE_PAUSE};

    /// Re-export of the `perf_tunnel_runner` prelude.
    ///
    /// This is for convenience so that you can depend on a single crate for the runner in your scenarios.
    pub use perf_tunnel_runner::prelude::*;

    /// Re-export of the instrumented client for convenience.
    pub use shortener_client_instrumented::prelude::*;
}
