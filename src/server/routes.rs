use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;
use crate::constants::{MAX_REFRESH_SECS, MIN_REFRESH_SECS, REFRESH_STEP_SECS};
use crate::error::DashboardError;
use crate::metrics::FetchMetrics;
use crate::render::{render_dashboard, PageContext};
use crate::store::DashboardView;
use crate::types::{ComponentHealth, HealthStatus, MarketSummary};

/// Build the page and API sub-router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/snapshot", get(snapshot))
        .route("/api/summary", get(summary))
        .route("/api/metrics", get(metrics))
        .route("/api/refresh", post(refresh))
        .route(
            "/api/settings/refresh-interval",
            get(get_refresh_interval).put(put_refresh_interval),
        )
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshIntervalBody {
    seconds: u64,
}

#[derive(Debug, Serialize)]
struct RefreshIntervalResponse {
    seconds: u64,
    min: u64,
    max: u64,
    step: u64,
}

impl RefreshIntervalResponse {
    fn new(seconds: u64) -> Self {
        Self {
            seconds,
            min: MIN_REFRESH_SECS,
            max: MAX_REFRESH_SECS,
            step: REFRESH_STEP_SECS,
        }
    }
}

/// GET / — HTML dashboard.
async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let poller = &state.poller;
    let view = poller.store().latest().await;
    let failure = poller.store().last_failure().await;

    Html(render_dashboard(&PageContext {
        view: view.as_deref(),
        interval: poller.refresh_interval(),
        export_path: poller.export_path().map(|p| p.display().to_string()),
        last_failure: failure.as_ref(),
    }))
}

/// GET /health — poller health; 503 until the first snapshot arrives.
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ComponentHealth>) {
    let health = state.poller.health_check().await;
    let status = match health.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (status, Json(health))
}

/// GET /api/snapshot — latest table and statistics.
async fn snapshot(State(state): State<Arc<AppState>>) -> Result<Json<DashboardView>, DashboardError> {
    let view = state.poller.store().require_latest().await?;
    Ok(Json(DashboardView::clone(&view)))
}

/// GET /api/summary — statistics only.
async fn summary(State(state): State<Arc<AppState>>) -> Result<Json<MarketSummary>, DashboardError> {
    let view = state.poller.store().require_latest().await?;
    Ok(Json(view.summary.clone()))
}

/// GET /api/metrics — fetch latency and success counters.
async fn metrics(State(state): State<Arc<AppState>>) -> Json<FetchMetrics> {
    Json(state.poller.metrics().await)
}

/// POST /api/refresh — start the next cycle now.
async fn refresh(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    state.poller.request_refresh();
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "refresh_requested" })),
    )
}

/// GET /api/settings/refresh-interval
async fn get_refresh_interval(State(state): State<Arc<AppState>>) -> Json<RefreshIntervalResponse> {
    Json(RefreshIntervalResponse::new(
        state.poller.refresh_interval().as_secs(),
    ))
}

/// PUT /api/settings/refresh-interval — `{"seconds": n}`, n in [30, 600] on a 30s step.
async fn put_refresh_interval(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshIntervalBody>,
) -> Result<Json<RefreshIntervalResponse>, DashboardError> {
    let interval = state.poller.set_refresh_interval(body.seconds)?;
    Ok(Json(RefreshIntervalResponse::new(interval.as_secs())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::sample_rows;
    use crate::interval::RefreshInterval;
    use crate::poller::MarketPoller;
    use crate::provider::mock::MockProvider;
    use crate::store::DashboardStore;
    use axum::response::IntoResponse;

    fn state_with(provider: MockProvider) -> Arc<AppState> {
        AppState::new(Arc::new(MarketPoller::new(
            Arc::new(provider),
            Arc::new(DashboardStore::new()),
            None,
            RefreshInterval::default(),
        )))
    }

    #[tokio::test]
    async fn test_snapshot_not_ready() {
        let state = state_with(MockProvider::new());
        let err = snapshot(State(state.clone())).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let (status, Json(body)) = health(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_snapshot_and_summary_after_cycle() {
        let rows = sample_rows();
        let state = state_with(MockProvider::with_rows(rows.clone()));
        state.poller.run_cycle().await.unwrap();

        let Json(view) = snapshot(State(state.clone())).await.unwrap();
        assert_eq!(view.snapshot.rows.len(), rows.len());

        let Json(summary) = summary(State(state.clone())).await.unwrap();
        assert_eq!(summary.top_by_market_cap.len(), 5);
        assert_eq!(summary.highest_change.unwrap().name, "BNB");

        let Html(page) = index(State(state)).await;
        assert!(page.contains("Bitcoin"));
    }

    #[tokio::test]
    async fn test_put_refresh_interval() {
        let state = state_with(MockProvider::new());

        let Json(resp) = put_refresh_interval(
            State(state.clone()),
            Json(RefreshIntervalBody { seconds: 90 }),
        )
        .await
        .unwrap();
        assert_eq!(resp.seconds, 90);
        assert_eq!(state.poller.refresh_interval().as_secs(), 90);

        let err = put_refresh_interval(
            State(state.clone()),
            Json(RefreshIntervalBody { seconds: 700 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let Json(current) = get_refresh_interval(State(state)).await;
        assert_eq!(current.seconds, 90);
        assert_eq!((current.min, current.max, current.step), (30, 600, 30));
    }

    #[tokio::test]
    async fn test_refresh_accepted() {
        let state = state_with(MockProvider::new());
        let (status, _) = refresh(State(state)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }
}
