use std::fmt::Write as _;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Serialize;

use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    started_at: String,
    uptime_secs: i64,
    root: String,
    generate_tiles: bool,
    observability: ObservabilitySnapshot,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0);
    Json(HealthResponse {
        status: "ok",
        started_at: state.started_at.to_rfc3339(),
        uptime_secs,
        root: state.root.display().to_string(),
        generate_tiles: state.generate_tiles,
        observability: state.observability.snapshot(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus_metrics(state.generate_tiles, state.observability.snapshot());
    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(generate_tiles: bool, observability: ObservabilitySnapshot) -> String {
    let mut out = String::new();
    write_gauge(
        &mut out,
        "zui_tile_generation_enabled",
        "Whether missing generated tiles are rendered on demand.",
        u64::from(generate_tiles),
    );
    write_counter(
        &mut out,
        "zui_tile_requests_total",
        "Tile requests received.",
        observability.tile_requests_total,
    );
    write_counter(
        &mut out,
        "zui_tiles_served_total",
        "Tiles returned with a 200 response.",
        observability.tiles_served_total,
    );
    write_counter(
        &mut out,
        "zui_tiles_remapped_total",
        "MultiMap tiles rewritten into an embedded map.",
        observability.tiles_remapped_total,
    );
    write_counter(
        &mut out,
        "zui_tiles_missing_total",
        "Tile requests with no file on disk.",
        observability.tiles_missing_total,
    );
    write_counter(
        &mut out,
        "zui_tiles_generated_total",
        "Tiles rendered on demand.",
        observability.tiles_generated_total,
    );
    write_counter(
        &mut out,
        "zui_tile_generation_failures_total",
        "On-demand tile renders that failed.",
        observability.tile_generation_failures_total,
    );
    out
}

fn write_gauge(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} gauge");
    let _ = writeln!(out, "{name} {value}");
}

fn write_counter(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {value}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_status_and_counters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::new(dir.path(), true);
        state.observability.record_tile_request();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, crate::app::build_app(state))
                .await
                .expect("serve test app");
        });

        let body = reqwest::get(format!("http://{addr}/api/health"))
            .await
            .expect("health request")
            .bytes()
            .await
            .expect("health body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("health json");

        assert_eq!(json["status"], "ok");
        assert_eq!(json["generate_tiles"], true);
        assert_eq!(json["observability"]["tile_requests_total"], 1);
        assert!(json["uptime_secs"].as_i64().is_some());

        server_handle.abort();
    }

    #[test]
    fn metrics_output_contains_help_type_and_values() {
        let observability = ObservabilitySnapshot {
            tile_requests_total: 12,
            tiles_served_total: 9,
            tiles_remapped_total: 4,
            tiles_missing_total: 3,
            tiles_generated_total: 2,
            tile_generation_failures_total: 1,
        };

        let metrics = render_prometheus_metrics(true, observability);

        assert!(metrics.contains("# HELP zui_tile_requests_total"));
        assert!(metrics.contains("# TYPE zui_tiles_served_total counter"));
        assert!(metrics.contains("# TYPE zui_tile_generation_enabled gauge"));
        assert!(metrics.contains("zui_tile_generation_enabled 1"));
        assert!(metrics.contains("zui_tile_requests_total 12"));
        assert!(metrics.contains("zui_tiles_served_total 9"));
        assert!(metrics.contains("zui_tiles_remapped_total 4"));
        assert!(metrics.contains("zui_tiles_missing_total 3"));
        assert!(metrics.contains("zui_tiles_generated_total 2"));
        assert!(metrics.contains("zui_tile_generation_failures_total 1"));
    }
}
