use std::{convert::Infallible, pin::Pin, sync::Arc};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio_stream::{Stream, StreamExt};

use budgetwatch_core::{Budget, BudgetId, DomainError};
use budgetwatch_forecasting::{ForecastEngine, ForecastRequest, ForecastResult};
use budgetwatch_infra::InMemoryBudgetStore;
use budgetwatch_monitoring::{AlertBroker, AlertEvent, BudgetMonitor, BudgetRepository};

use crate::app::errors::ApiError;
use crate::config::ApiConfig;

pub type Store = Arc<InMemoryBudgetStore>;

/// Boxed stream of alert events feeding one SSE response.
pub type AlertEventStream = Pin<Box<dyn Stream<Item = AlertEvent> + Send>>;

/// Shared services behind every handler.
#[derive(Debug)]
pub struct AppServices {
    store: Store,
    monitor: BudgetMonitor<Store>,
    engine: ForecastEngine,
    config: ApiConfig,
}

impl AppServices {
    pub fn new(config: ApiConfig) -> Self {
        let store: Store = Arc::new(InMemoryBudgetStore::new());
        let broker = AlertBroker::with_capacity(config.alert_channel_capacity);
        let monitor = BudgetMonitor::new(store.clone(), broker);
        let engine = ForecastEngine::new().with_max_runs(config.forecast_max_runs);

        tracing::debug!(
            max_runs = config.forecast_max_runs,
            channel_capacity = config.alert_channel_capacity,
            "services initialized"
        );

        Self {
            store,
            monitor,
            engine,
            config,
        }
    }

    pub fn store(&self) -> &InMemoryBudgetStore {
        &self.store
    }

    pub fn monitor(&self) -> &BudgetMonitor<Store> {
        &self.monitor
    }

    pub fn broker(&self) -> &AlertBroker {
        self.monitor.broker()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn get_budget(&self, id: BudgetId) -> Result<Budget, DomainError> {
        self.store.get_budget(id)?.ok_or(DomainError::NotFound)
    }

    /// Run a simulation on the blocking pool, bounded by the configured timeout.
    ///
    /// On timeout the simulation keeps running to completion in the background;
    /// its result is discarded.
    pub async fn forecast(&self, request: ForecastRequest) -> Result<ForecastResult, ApiError> {
        let engine = self.engine;
        let timeout = self.config.forecast_timeout;
        let runs = request.runs;

        let task = tokio::task::spawn_blocking(move || engine.simulate(&request));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(join)) => Err(ApiError::Internal(format!("forecast task failed: {join}"))),
            Err(_) => {
                tracing::warn!(runs, timeout_ms = timeout.as_millis() as u64, "forecast timed out");
                Err(ApiError::ForecastTimeout(timeout))
            }
        }
    }

    /// Forecast a stored budget from its current total.
    pub async fn forecast_budget(&self, id: BudgetId) -> Result<(Budget, ForecastResult), ApiError> {
        let budget = self.get_budget(id)?;
        let result = self.forecast(ForecastRequest::for_budget_total(budget.total)).await?;
        Ok((budget, result))
    }

    /// Alert events for `id`, starting with its current state.
    ///
    /// `None` (an unparsable id) yields a single not-found error event.
    pub fn alert_events(&self, id: Option<BudgetId>) -> AlertEventStream {
        match id {
            Some(id) => Box::pin(self.monitor.subscribe(id)),
            None => Box::pin(tokio_stream::once(AlertEvent::not_found())),
        }
    }
}

pub fn alert_sse_stream(
    services: Arc<AppServices>,
    id: Option<BudgetId>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let stream = services.alert_events(id).map(|ev| {
        Ok(SseEvent::default()
            .event(ev.kind.as_str())
            .data(ev.data_json()))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(services.config.sse_keep_alive))
}
