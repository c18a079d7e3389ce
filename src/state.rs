//! Process-scoped state shared by every request.

use crate::config::Config;
use crate::explain::Explainer;
use crate::sandbox::SandboxRunner;

/// Built once at startup and only read afterwards.
pub struct AppState {
    pub config: Config,
    pub sandbox: SandboxRunner,
    pub explainer: Explainer,
}

impl AppState {
    pub fn new(config: Config, explainer: Explainer) -> Self {
        let sandbox = SandboxRunner::from_config(&config);
        Self {
            config,
            sandbox,
            explainer,
        }
    }

    pub fn from_config(config: Config) -> Self {
        let explainer = Explainer::from_config(&config);
        Self::new(config, explainer)
    }
}
