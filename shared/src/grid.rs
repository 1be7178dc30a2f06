use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;

/// Half-width of the square world extent, in projection units.
pub const WORLD_HALF_EXTENT: f64 = 20_037_508.342_789_244;
/// Edge length of a raster tile in pixels.
pub const TILE_SIZE: u32 = 256;
/// Highest zoom whose tile indices still fit in a `u64` with room to spare.
pub const MAX_ADDRESSABLE_ZOOM: u32 = 62;

/// XYZ tile address: origin top-left, `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u32,
    pub x: u64,
    pub y: u64,
}

/// The part of the unit square `[0, 1]²` a tile covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRegion {
    pub x_start: f64,
    pub x_end: f64,
    pub y_start: f64,
    pub y_end: f64,
}

impl TileRegion {
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_start + self.x_end) / 2.0,
            (self.y_start + self.y_end) / 2.0,
        )
    }

    /// Strict containment: points on an edge are outside.
    pub fn contains_strict(&self, x: f64, y: f64) -> bool {
        x > self.x_start && x < self.x_end && y > self.y_start && y < self.y_end
    }
}

impl TileCoord {
    pub const fn new(z: u32, x: u64, y: u64) -> Self {
        Self { z, x, y }
    }

    /// Tiles along one edge at this zoom.
    pub fn tiles_per_edge(z: u32) -> u64 {
        1u64 << z.min(MAX_ADDRESSABLE_ZOOM)
    }

    pub fn is_in_bounds(&self) -> bool {
        let n = Self::tiles_per_edge(self.z);
        self.z <= MAX_ADDRESSABLE_ZOOM && self.x < n && self.y < n
    }

    pub fn region(&self) -> TileRegion {
        let span = 1.0 / Self::tiles_per_edge(self.z) as f64;
        let x_start = self.x as f64 * span;
        let y_start = self.y as f64 * span;
        TileRegion {
            x_start,
            x_end: x_start + span,
            y_start,
            y_end: y_start + span,
        }
    }
}

/// Axis-aligned box in projection units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preload {
    None,
    Levels(u32),
    Unlimited,
}

impl Preload {
    fn lowest_zoom(self, z: u32, min_zoom: u32) -> u32 {
        match self {
            Preload::None => z,
            Preload::Levels(n) => z.saturating_sub(n).max(min_zoom),
            Preload::Unlimited => min_zoom,
        }
    }
}

/// A tile to draw: where its pixels come from and where they go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedTile {
    pub source: TileCoord,
    pub placement: Extent,
}

/// Square XYZ tile grid over the world extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    pub half_extent: f64,
    pub tile_size: u32,
    pub min_zoom: u32,
    pub max_zoom: u32,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self {
            half_extent: WORLD_HALF_EXTENT,
            tile_size: TILE_SIZE,
            min_zoom: 0,
            max_zoom: 40,
        }
    }
}

impl TileGrid {
    pub fn world(&self) -> Extent {
        Extent {
            min_x: -self.half_extent,
            min_y: -self.half_extent,
            max_x: self.half_extent,
            max_y: self.half_extent,
        }
    }

    /// Map units per pixel at zoom 0.
    pub fn max_resolution(&self) -> f64 {
        2.0 * self.half_extent / self.tile_size as f64
    }

    /// Map units per pixel at a (possibly fractional) zoom.
    pub fn resolution(&self, zoom: f64) -> f64 {
        self.max_resolution() / zoom.exp2()
    }

    /// Tile level used to draw a fractional view zoom.
    pub fn tile_z_for_zoom(&self, zoom: f64) -> u32 {
        let rounded = zoom.round().max(0.0) as u32;
        rounded.clamp(self.min_zoom, self.max_zoom.min(MAX_ADDRESSABLE_ZOOM))
    }

    fn tile_span(&self, z: u32) -> f64 {
        2.0 * self.half_extent / TileCoord::tiles_per_edge(z) as f64
    }

    /// Projection-space box of the tile at column `x` (may lie outside the world).
    fn placement(&self, z: u32, x: i64, y: u64) -> Extent {
        let span = self.tile_span(z);
        let min_x = -self.half_extent + x as f64 * span;
        let max_y = self.half_extent - y as f64 * span;
        Extent {
            min_x,
            min_y: max_y - span,
            max_x: min_x + span,
            max_y,
        }
    }

    /// Tiles at level `z` covering `extent`, in row-major order.
    pub fn tiles_in_extent(&self, extent: &Extent, z: u32, wrap_x: bool) -> Vec<PlannedTile> {
        let world = self.world();
        if extent.min_y >= world.max_y || extent.max_y <= world.min_y {
            return Vec::new();
        }
        if !wrap_x && !extent.intersects(&world) {
            return Vec::new();
        }

        let n = TileCoord::tiles_per_edge(z);
        let span = self.tile_span(z);
        let last = n as i64 - 1;

        let mut x0 = ((extent.min_x + self.half_extent) / span).floor() as i64;
        let mut x1 = ((extent.max_x + self.half_extent) / span).ceil() as i64 - 1;
        if !wrap_x {
            x0 = x0.clamp(0, last);
            x1 = x1.clamp(0, last);
        }
        let y0 = ((self.half_extent - extent.max_y) / span).floor().max(0.0) as i64;
        let y1 = (((self.half_extent - extent.min_y) / span).ceil() as i64 - 1).min(last);

        let mut out = Vec::new();
        for y in y0.max(0)..=y1 {
            for x in x0..=x1 {
                let source_x = if wrap_x {
                    x.rem_euclid(n as i64) as u64
                } else {
                    x as u64
                };
                out.push(PlannedTile {
                    source: TileCoord::new(z, source_x, y as u64),
                    placement: self.placement(z, x, y as u64),
                });
            }
        }
        out
    }

    /// Everything to draw for a view: ancestor levels first (when preloading),
    /// the current level last. Within a level tiles nearest `extent`'s center come first.
    pub fn plan(&self, extent: &Extent, zoom: f64, wrap_x: bool, preload: Preload) -> Vec<PlannedTile> {
        let z = self.tile_z_for_zoom(zoom);
        let lowest = preload.lowest_zoom(z, self.min_zoom);
        let center = extent.center();

        let mut out = Vec::new();
        for level in lowest..=z {
            let mut tiles = self.tiles_in_extent(extent, level, wrap_x);
            tiles.sort_by(|a, b| {
                distance_sq(a.placement.center(), center)
                    .total_cmp(&distance_sq(b.placement.center(), center))
                    .then_with(|| a.source.cmp(&b.source))
            });
            out.extend(tiles);
        }
        out
    }
}

fn distance_sq(a: Coordinate, b: Coordinate) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_splits_unit_square_per_level() {
        let region = TileCoord::new(3, 5, 4).region();
        assert_eq!(region.x_start, 0.625);
        assert_eq!(region.x_end, 0.75);
        assert_eq!(region.y_start, 0.5);
        assert_eq!(region.y_end, 0.625);
        assert_eq!(region.center(), (0.6875, 0.5625));
    }

    #[test]
    fn strict_containment_excludes_edges() {
        let region = TileCoord::new(1, 0, 0).region();
        assert!(region.contains_strict(0.25, 0.25));
        assert!(!region.contains_strict(0.5, 0.25));
        assert!(!region.contains_strict(0.0, 0.25));
    }

    #[test]
    fn resolution_halves_per_zoom_level() {
        let grid = TileGrid::default();
        let r0 = grid.resolution(0.0);
        assert!((r0 * 256.0 - 2.0 * WORLD_HALF_EXTENT).abs() < 1e-6);
        assert!((grid.resolution(1.0) * 2.0 - r0).abs() < 1e-6);
    }

    #[test]
    fn tile_z_is_rounded_and_clamped() {
        let grid = TileGrid::default();
        assert_eq!(grid.tile_z_for_zoom(2.4), 2);
        assert_eq!(grid.tile_z_for_zoom(2.6), 3);
        assert_eq!(grid.tile_z_for_zoom(-3.0), 0);
        assert_eq!(grid.tile_z_for_zoom(55.0), 40);
    }

    #[test]
    fn without_wrap_x_columns_are_clamped_to_world() {
        let grid = TileGrid::default();
        let h = WORLD_HALF_EXTENT;
        let wide = Extent {
            min_x: -3.0 * h,
            min_y: -h / 2.0,
            max_x: 3.0 * h,
            max_y: h / 2.0,
        };
        let tiles = grid.tiles_in_extent(&wide, 1, false);
        assert_eq!(tiles.len(), 4);
        assert!(tiles.iter().all(|t| t.source.is_in_bounds()));
    }

    #[test]
    fn with_wrap_x_columns_repeat() {
        let grid = TileGrid::default();
        let h = WORLD_HALF_EXTENT;
        let wide = Extent {
            min_x: -3.0 * h,
            min_y: -h / 2.0,
            max_x: h,
            max_y: h / 2.0,
        };
        let tiles = grid.tiles_in_extent(&wide, 0, true);
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|t| t.source == TileCoord::new(0, 0, 0)));
        assert_ne!(tiles[0].placement, tiles[1].placement);
    }

    #[test]
    fn extent_outside_world_yields_nothing_without_wrap() {
        let grid = TileGrid::default();
        let h = WORLD_HALF_EXTENT;
        let off = Extent {
            min_x: 2.0 * h,
            min_y: 0.0,
            max_x: 3.0 * h,
            max_y: 1.0,
        };
        assert!(grid.tiles_in_extent(&off, 2, false).is_empty());
    }

    #[test]
    fn unlimited_preload_includes_every_lower_level_first() {
        let grid = TileGrid::default();
        let view = Extent {
            min_x: -1000.0,
            min_y: -1000.0,
            max_x: 1000.0,
            max_y: 1000.0,
        };
        let plan = grid.plan(&view, 3.0, false, Preload::Unlimited);
        let levels: Vec<u32> = plan.iter().map(|t| t.source.z).collect();
        assert_eq!(levels.first(), Some(&0));
        assert_eq!(levels.last(), Some(&3));
        assert!(levels.windows(2).all(|w| w[0] <= w[1]));
        for z in 0..=3 {
            assert!(levels.contains(&z));
        }
    }

    #[test]
    fn no_preload_plans_only_current_level() {
        let grid = TileGrid::default();
        let view = grid.world();
        let plan = grid.plan(&view, 2.0, false, Preload::None);
        assert_eq!(plan.len(), 16);
        assert!(plan.iter().all(|t| t.source.z == 2));
    }

    #[test]
    fn limited_preload_stops_at_requested_depth() {
        let grid = TileGrid::default();
        let view = grid.world();
        let plan = grid.plan(&view, 4.0, false, Preload::Levels(1));
        assert!(plan.iter().all(|t| t.source.z >= 3));
    }
}
