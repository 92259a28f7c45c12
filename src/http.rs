use crate::metrics::Metrics;
use crate::store::SnapshotStore;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use std::sync::Arc;

#[derive(Clone)]
pub struct HttpAppState {
    pub metrics: Arc<Metrics>,
    pub store: SnapshotStore,
}

pub fn build_router(metrics: Arc<Metrics>, store: SnapshotStore) -> Router {
    Router::new()
        .route("/stats", get(get_latest))
        .route("/api/stats", get(get_latest))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .with_state(HttpAppState { metrics, store })
}

/// Latest snapshot as JSON. Always 200; missing data shows up as fallback values.
async fn get_latest(State(state): State<HttpAppState>) -> Response {
    state.metrics.inc_stats_request();
    let snapshot = state.store.read().await;
    Json(&*snapshot).into_response()
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_handler(State(state): State<HttpAppState>) -> Response {
    state.metrics.inc_scrape_count();
    match state.metrics.encode_metrics() {
        Ok(encoded) => {
            let mut response = Response::new(Body::from(encoded));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to encode metrics: {err}"),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{DiskMount, Snapshot};
    use axum::body::to_bytes;
    use axum::http::Request;
    use std::time::{Duration, UNIX_EPOCH};
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> serde_json::Value {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn stats_before_first_cycle_is_zero_snapshot() {
        let metrics = Metrics::new().expect("metrics");
        let app = build_router(metrics, SnapshotStore::new());

        let body = get_json(app, "/stats").await;
        assert_eq!(body["cpu_usage_percent"], 0.0);
        assert_eq!(body["uptime"], "");
        assert_eq!(body["last_updated"], "");
        assert_eq!(body["disk_mounts"], serde_json::json!([]));
        assert_eq!(body.as_object().unwrap().len(), 13);
    }

    #[tokio::test]
    async fn stats_serves_latest_write() {
        let metrics = Metrics::new().expect("metrics");
        let store = SnapshotStore::new();
        let mut snapshot = Snapshot {
            cpu_usage_percent: 7.5,
            cpu_temperature_celsius: 51.0,
            net_rx_rate: 1.25,
            uptime: "2h 5m".to_string(),
            last_updated: Some(UNIX_EPOCH + Duration::from_secs(86_400)),
            fan_rpm: 2000,
            disk_mounts: vec![DiskMount {
                mountpoint: "/".to_string(),
                total_capacity_gb: 29.0,
                used_percent: 40.0,
            }],
            ..Snapshot::default()
        };
        snapshot
            .network_ips
            .insert("wlan0".to_string(), "10.0.0.5".to_string());
        store.write(snapshot).await;
        let app = build_router(metrics.clone(), store);

        let body = get_json(app.clone(), "/stats").await;
        assert_eq!(body["cpu_temp_celsius"], 51.0);
        assert_eq!(body["net_rx_speed"], 1.25);
        assert_eq!(body["fan_rpm"], 2000);
        assert_eq!(body["last_updated"], "1970-01-02T00:00:00Z");
        assert_eq!(body["network_ips"]["wlan0"], "10.0.0.5");
        assert_eq!(body["disk_mounts"][0]["total_gb"], 29.0);

        let alias = get_json(app, "/api/stats").await;
        assert_eq!(alias, body);
        assert_eq!(metrics.hoststat_stats_requests_total.get(), 2.0);
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let metrics = Metrics::new().expect("metrics");
        let app = build_router(metrics, SnapshotStore::new());

        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), b"ok");
    }

    #[tokio::test]
    async fn metrics_exposes_cycle_counter() {
        let metrics = Metrics::new().expect("metrics");
        let app = build_router(metrics, SnapshotStore::new());

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("hoststat_cycles_total"));
    }
}
