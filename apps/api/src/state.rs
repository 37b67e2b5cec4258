use std::sync::Arc;

use tokio::sync::Mutex;

use crate::analysis::contract::AnalysisProvider;
use crate::config::Config;
use crate::wizard::Wizard;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single wizard session. Mutated only through `Wizard` transitions.
    pub wizard: Arc<Mutex<Wizard>>,
    /// Pluggable analysis backend. Default: GeminiAnalyzer.
    pub analyzer: Arc<dyn AnalysisProvider>,
    pub config: Config,
}

impl AppState {
    pub fn new(analyzer: Arc<dyn AnalysisProvider>, config: Config) -> Self {
        Self {
            wizard: Arc::new(Mutex::new(Wizard::new())),
            analyzer,
            config,
        }
    }
}
