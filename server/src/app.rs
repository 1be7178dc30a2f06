use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use zui_shared::url::parse_tile_path;

use crate::config::{IMAGE_CACHE_CONTROL, TILE_CACHE_CONTROL};
use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    let static_files = Router::new().fallback_service(ServeDir::new(state.root.as_path()));

    let app = Router::new()
        .route(
            "/maps/{name}/tiles/{z}/{x}/{file}",
            axum::routing::get(routes::tiles::get_tile),
        )
        .route("/api/health", axum::routing::get(routes::api::health))
        .route("/api/metrics", axum::routing::get(routes::api::metrics));

    app.layer(CompressionLayer::new())
        .fallback_service(static_files)
        .layer(middleware::from_fn(set_cache_control))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

async fn set_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success()
        && let Some(cache_control) = cache_control_for_path(&path)
    {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        );
    }

    response
}

fn cache_control_for_path(path: &str) -> Option<&'static str> {
    if parse_tile_path(path).is_some() {
        return Some(TILE_CACHE_CONTROL);
    }

    if path.starts_with("/images/") {
        return Some(IMAGE_CACHE_CONTROL);
    }

    None
}
