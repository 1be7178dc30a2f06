use std::io::ErrorKind;
use std::path::{Path as FsPath, PathBuf};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{debug, warn};
use zui_shared::TileCoord;
use zui_shared::multimap::{self, ResolvedTile};
use zui_shared::url::{is_valid_map_name, parse_tile_segments};

use crate::services::mandelbrot::{self, GenerateError};
use crate::state::AppState;

#[derive(Debug)]
pub enum TileRequestError {
    /// Bad map name, non-numeric segment, or indices outside the grid.
    Malformed,
    Missing(PathBuf),
    Generate(GenerateError),
    Io(std::io::Error),
}

impl TileRequestError {
    fn status(&self) -> StatusCode {
        match self {
            TileRequestError::Malformed | TileRequestError::Missing(_) => StatusCode::NOT_FOUND,
            TileRequestError::Generate(_) | TileRequestError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for TileRequestError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

/// `GET /maps/{name}/tiles/{z}/{x}/{y}.png`
pub async fn get_tile(
    State(state): State<AppState>,
    Path((name, z, x, file)): Path<(String, String, String, String)>,
) -> Result<Response, TileRequestError> {
    state.observability.record_tile_request();
    let tile = parse_request(&name, &z, &x, &file).ok_or(TileRequestError::Malformed)?;

    let resolved = multimap::resolve(&name, tile);
    if resolved.map != name {
        state.observability.record_tile_remapped();
        debug!(
            map = resolved.map,
            z = resolved.tile.z,
            x = resolved.tile.x,
            y = resolved.tile.y,
            "remapped MultiMap tile"
        );
    }

    let path = state.tile_file(resolved.map, resolved.tile);
    if state.generate_tiles && multimap::is_generated(resolved.map) {
        ensure_generated(&state, resolved, &path).await?;
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            state.observability.record_tile_served();
            Ok(png_response(Bytes::from(bytes)))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            state.observability.record_tile_missing();
            debug!(path = %path.display(), "tile not found");
            Err(TileRequestError::Missing(path))
        }
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to read tile");
            Err(TileRequestError::Io(e))
        }
    }
}

fn parse_request(name: &str, z: &str, x: &str, file: &str) -> Option<TileCoord> {
    if !is_valid_map_name(name) {
        return None;
    }
    parse_tile_segments(z, x, file).filter(TileCoord::is_in_bounds)
}

/// Render the tile into place if it is not on disk yet. Returns whether it rendered.
async fn ensure_generated(
    state: &AppState,
    resolved: ResolvedTile<'_>,
    path: &FsPath,
) -> Result<bool, TileRequestError> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(false);
    }

    let tile = resolved.tile;
    let target = path.to_path_buf();
    let scratch = state.scratch_file(path);
    debug!(map = resolved.map, z = tile.z, x = tile.x, y = tile.y, "generating tile");

    let outcome = tokio::task::spawn_blocking(move || mandelbrot::write_tile(tile, &target, &scratch))
        .await
        .map_err(|e| TileRequestError::Io(std::io::Error::other(e)))?;

    match outcome {
        Ok(()) => {
            state.observability.record_tile_generated();
            Ok(true)
        }
        Err(e) => {
            state.observability.record_tile_generation_failure();
            warn!(error = %e, map = resolved.map, path = %path.display(), "tile generation failed");
            Err(TileRequestError::Generate(e))
        }
    }
}

fn png_response(body: Bytes) -> Response {
    let mut response = Response::new(Body::from(body));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    response
}
