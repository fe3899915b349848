//! alertscale-api — HTTP surface of alertscale.
//!
//! Receives Alertmanager webhooks, exposes the function replica registry,
//! and serves Prometheus metrics.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/system/alert` | Alertmanager webhook receiver |
//! | GET | `/system/functions` | List functions (`?namespace=` filter) |
//! | POST | `/system/functions` | Register or replace a function |
//! | GET | `/system/function/{name}` | Get a function (`name` or `name.namespace`) |
//! | DELETE | `/system/function/{name}` | Remove a function |
//! | GET | `/metrics` | Prometheus exposition |
//! | GET | `/healthz` | Liveness probe |

pub mod handlers;

use std::sync::Arc;

use alertscale_autoscale::{Autoscaler, ServiceQuery};
use alertscale_state::StateStore;
use axum::Router;
use axum::routing::{get, post};

/// Autoscaler over whichever replica backend the daemon was built with.
pub type SharedAutoscaler = Autoscaler<Arc<dyn ServiceQuery>>;

/// Shared state for API handlers.
///
/// `store` backs the function registry; the autoscaler applies alerts
/// through its own [`ServiceQuery`], which defaults to the same store.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub autoscaler: Arc<SharedAutoscaler>,
}

impl ApiState {
    pub fn new(store: StateStore, default_namespace: &str) -> Self {
        let service: Arc<dyn ServiceQuery> = Arc::new(store.clone());
        Self::with_service(store, service, default_namespace)
    }

    /// Apply alerts through `service` instead of the registry store.
    pub fn with_service(
        store: StateStore,
        service: Arc<dyn ServiceQuery>,
        default_namespace: &str,
    ) -> Self {
        let autoscaler = Arc::new(Autoscaler::new(service, default_namespace));
        Self { store, autoscaler }
    }
}

/// Build the complete router (webhook + registry + metrics).
pub fn build_router(store: StateStore, default_namespace: &str) -> Router {
    router(ApiState::new(store, default_namespace))
}

/// Build the router over an existing state.
pub fn router(state: ApiState) -> Router {
    let system_routes = Router::new()
        .route("/alert", post(handlers::handle_alert))
        .route(
            "/functions",
            get(handlers::list_functions).post(handlers::register_function),
        )
        .route(
            "/function/{name}",
            get(handlers::get_function).delete(handlers::delete_function),
        );

    Router::new()
        .nest("/system", system_routes)
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
