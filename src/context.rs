use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::activity::{ActivityIndicator, ActivityTracker};
use crate::client::{ApiClient, ClientError, Executor, HttpConfig, RequestContext};
use crate::config::Config;
use crate::detail::DetailController;
use crate::observability::Metrics;
use crate::response::{AlertPresenter, ResponseInterpreter};
use crate::search::{SearchController, SearchSettings};
use crate::store::{Preferences, ResultStore, StoreError};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shared components, built once from configuration and handed out by `Arc`
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub metrics: Arc<Metrics>,
    pub activity: Arc<ActivityTracker>,
    pub request_context: Arc<RequestContext>,
    pub executor: Arc<dyn Executor>,
    pub interpreter: Arc<ResponseInterpreter>,
    pub preferences: Preferences,
    pub results: Arc<ResultStore>,
}

impl AppContext {
    /// Wire the production components: reqwest executor and fjall-backed store
    pub fn build(
        config: Config,
        indicator: Arc<dyn ActivityIndicator>,
        alerts: Arc<dyn AlertPresenter>,
    ) -> Result<Self, ContextError> {
        let metrics = Arc::new(Metrics::new());
        let activity = Arc::new(ActivityTracker::new(indicator));
        let request_context = Arc::new(RequestContext::from_config(&config.api)?);

        let client = ApiClient::new(
            HttpConfig::from_config(&config),
            request_context.clone(),
            activity.clone(),
            metrics.clone(),
        )?;

        let preferences = Preferences::open(&config.storage.path)?;
        let results = Arc::new(ResultStore::open(preferences.clone())?);

        info!(
            base_url = %request_context.base_url,
            storage = %config.storage.path.display(),
            "Application context ready"
        );

        Ok(Self::with_executor(
            config,
            Arc::new(client),
            request_context,
            activity,
            metrics,
            alerts,
            preferences,
            results,
        ))
    }

    /// Assemble around an existing executor
    #[allow(clippy::too_many_arguments)]
    pub fn with_executor(
        config: Config,
        executor: Arc<dyn Executor>,
        request_context: Arc<RequestContext>,
        activity: Arc<ActivityTracker>,
        metrics: Arc<Metrics>,
        alerts: Arc<dyn AlertPresenter>,
        preferences: Preferences,
        results: Arc<ResultStore>,
    ) -> Self {
        let interpreter = Arc::new(ResponseInterpreter::new(alerts, metrics.clone()));
        Self {
            config: Arc::new(config),
            metrics,
            activity,
            request_context,
            executor,
            interpreter,
            preferences,
            results,
        }
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            debounce: self.config.search.debounce.as_duration(),
            search_type: self.config.search.search_type,
        }
    }

    pub fn search_controller(&self) -> SearchController {
        SearchController::new(
            self.executor.clone(),
            self.request_context.clone(),
            self.interpreter.clone(),
            self.results.clone(),
            self.metrics.clone(),
            self.search_settings(),
        )
    }

    pub fn detail_controller(&self) -> DetailController {
        DetailController::new(
            self.executor.clone(),
            self.request_context.clone(),
            self.interpreter.clone(),
        )
    }

    /// Flush stored results to disk
    pub fn persist(&self) -> Result<(), ContextError> {
        self.preferences.persist()?;
        Ok(())
    }
}
