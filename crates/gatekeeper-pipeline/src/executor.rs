//! Pipeline executor.
//!
//! Runs as one axum middleware. For each request it loads the current order
//! snapshot and walks it through a [`Chain`]: filters whose conditions say
//! "skip" are passed over, the rest are invoked with the remainder of the
//! chain as their continuation. The endpoint behind the middleware runs
//! once every filter has proceeded.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics::counter;
use tracing::{debug, error, warn};

use gatekeeper_core::AppError;

use crate::registry::{FilterRegistry, OrderedFilters};
use crate::request::{ClientAddr, RequestView, resolve_client_addr};

/// Remaining filters of one request plus the endpoint behind them.
pub struct Chain {
    registry: Arc<FilterRegistry>,
    filters: OrderedFilters,
    position: usize,
    endpoint: Next,
}

impl Chain {
    pub fn new(registry: Arc<FilterRegistry>, filters: OrderedFilters, endpoint: Next) -> Self {
        Self {
            registry,
            filters,
            position: 0,
            endpoint,
        }
    }

    /// Hands `request` to the next applicable filter, or to the endpoint
    /// once no filters remain.
    pub fn proceed(mut self, request: Request) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin(async move {
            while let Some(filter) = self.filters.get(self.position).cloned() {
                self.position += 1;
                let filter_id = filter.descriptor().id.clone();

                let skip = self
                    .registry
                    .skip_reason(&filter_id, &RequestView::from_request(&request));
                if let Some(condition_id) = skip {
                    debug!(
                        filter.id = %filter_id,
                        condition.id = %condition_id,
                        path = %request.uri().path(),
                        "Filter skipped"
                    );
                    counter!("gatekeeper_filter_skips_total", "filter" => filter_id).increment(1);
                    continue;
                }

                return match filter.apply(request, self).await {
                    Ok(response) => response,
                    Err(err) => render_error(&filter_id, err),
                };
            }

            self.endpoint.run(request).await
        })
    }
}

fn render_error(filter_id: &str, err: AppError) -> Response {
    if err.is_server_error() {
        error!(filter.id = %filter_id, code = err.code, error = %err.error, "Filter failed");
    } else {
        warn!(filter.id = %filter_id, code = err.code, error = %err.error, "Filter rejected request");
    }
    err.into_response()
}

/// State of the [`security_pipeline`] middleware.
#[derive(Clone, Debug)]
pub struct PipelineExecutor {
    registry: Arc<FilterRegistry>,
    trust_forwarded_for: bool,
}

impl PipelineExecutor {
    pub fn new(registry: Arc<FilterRegistry>, trust_forwarded_for: bool) -> Self {
        Self {
            registry,
            trust_forwarded_for,
        }
    }

    pub fn registry(&self) -> &Arc<FilterRegistry> {
        &self.registry
    }
}

/// Middleware running every request through the registered filters.
///
/// Use with `axum::middleware::from_fn_with_state(executor, security_pipeline)`.
pub async fn security_pipeline(
    State(executor): State<PipelineExecutor>,
    mut request: Request,
    next: Next,
) -> Response {
    let client = resolve_client_addr(&request, executor.trust_forwarded_for);
    request.extensions_mut().insert(ClientAddr(client));

    let filters = executor.registry.ordered_filters();
    Chain::new(Arc::clone(&executor.registry), filters, next)
        .proceed(request)
        .await
}
