use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::sse::{Event as SseEvent, Sse},
};

use budgetwatch_core::BudgetId;

use crate::app::services::{self, AppServices};

/// Long-lived alert feed for one budget.
///
/// Unknown or malformed ids still get a 200 event stream carrying one `error`
/// event, after which the stream ends.
pub async fn stream(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, std::convert::Infallible>>> {
    let id = match id.parse::<BudgetId>() {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::debug!("alert stream for bad id: {e}");
            None
        }
    };
    services::alert_sse_stream(services, id)
}
