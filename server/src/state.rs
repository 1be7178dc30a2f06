use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use zui_shared::TileCoord;

use crate::config::{generate_tiles_enabled, root_dir};

#[derive(Clone)]
pub struct AppState {
    /// Directory holding `maps/<name>/tiles/...` and `images/...`.
    pub root: Arc<PathBuf>,
    pub generate_tiles: bool,
    pub started_at: DateTime<Utc>,
    pub observability: Arc<ObservabilityCounters>,
    scratch_seq: Arc<AtomicU64>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    tile_requests_total: AtomicU64,
    tiles_served_total: AtomicU64,
    tiles_remapped_total: AtomicU64,
    tiles_missing_total: AtomicU64,
    tiles_generated_total: AtomicU64,
    tile_generation_failures_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObservabilitySnapshot {
    pub tile_requests_total: u64,
    pub tiles_served_total: u64,
    pub tiles_remapped_total: u64,
    pub tiles_missing_total: u64,
    pub tiles_generated_total: u64,
    pub tile_generation_failures_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            tile_requests_total: self.tile_requests_total.load(Ordering::Relaxed),
            tiles_served_total: self.tiles_served_total.load(Ordering::Relaxed),
            tiles_remapped_total: self.tiles_remapped_total.load(Ordering::Relaxed),
            tiles_missing_total: self.tiles_missing_total.load(Ordering::Relaxed),
            tiles_generated_total: self.tiles_generated_total.load(Ordering::Relaxed),
            tile_generation_failures_total: self
                .tile_generation_failures_total
                .load(Ordering::Relaxed),
        }
    }

    pub fn record_tile_request(&self) {
        self.tile_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tile_served(&self) {
        self.tiles_served_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tile_remapped(&self) {
        self.tiles_remapped_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tile_missing(&self) {
        self.tiles_missing_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tile_generated(&self) {
        self.tiles_generated_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tile_generation_failure(&self) {
        self.tile_generation_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(root: impl Into<PathBuf>, generate_tiles: bool) -> Self {
        Self {
            root: Arc::new(root.into()),
            generate_tiles,
            started_at: Utc::now(),
            observability: Arc::new(ObservabilityCounters::default()),
            scratch_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_env() -> Self {
        Self::new(root_dir(), generate_tiles_enabled())
    }

    /// On-disk location of a tile: `<root>/maps/<name>/tiles/<z>/<x>/<y>.png`.
    pub fn tile_file(&self, map: &str, tile: TileCoord) -> PathBuf {
        tile_file_in(&self.root, map, tile)
    }

    /// A sibling path for writing `target` before an atomic rename.
    pub fn scratch_file(&self, target: &Path) -> PathBuf {
        let seq = self.scratch_seq.fetch_add(1, Ordering::Relaxed);
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}-{seq}.tmp", std::process::id()));
        target.with_file_name(name)
    }
}

pub fn tile_file_in(root: &Path, map: &str, tile: TileCoord) -> PathBuf {
    root.join("maps")
        .join(map)
        .join("tiles")
        .join(tile.z.to_string())
        .join(tile.x.to_string())
        .join(format!("{}.png", tile.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_file_follows_zxy_layout() {
        let state = AppState::new("/srv/zui", true);
        assert_eq!(
            state.tile_file("Mandelbrot", TileCoord::new(3, 5, 4)),
            PathBuf::from("/srv/zui/maps/Mandelbrot/tiles/3/5/4.png")
        );
    }

    #[test]
    fn scratch_files_are_unique_siblings() {
        let state = AppState::new("/srv/zui", true);
        let target = PathBuf::from("/srv/zui/maps/M/tiles/0/0/0.png");
        let a = state.scratch_file(&target);
        let b = state.scratch_file(&target);
        assert_ne!(a, b);
        assert_eq!(a.parent(), target.parent());
    }

    #[test]
    fn counters_snapshot_reflects_records() {
        let counters = ObservabilityCounters::default();
        counters.record_tile_request();
        counters.record_tile_request();
        counters.record_tile_served();
        counters.record_tile_missing();
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.tile_requests_total, 2);
        assert_eq!(snapshot.tiles_served_total, 1);
        assert_eq!(snapshot.tiles_missing_total, 1);
        assert_eq!(snapshot.tiles_generated_total, 0);
    }
}
