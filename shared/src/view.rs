use crate::coord::Coordinate;
use crate::grid::{Extent, TileGrid};

/// Center/zoom of the map plus its zoom bounds.
///
/// `zoom` may be fractional while the user is zooming and is always kept inside
/// `[min_zoom, max_zoom]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    center: Coordinate,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    grid: TileGrid,
}

impl ViewState {
    pub fn new(center: Coordinate, zoom: f64, min_zoom: f64, max_zoom: f64, grid: TileGrid) -> Self {
        let (min_zoom, max_zoom) = if min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            (max_zoom, min_zoom)
        };
        Self {
            center,
            zoom: zoom.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
            grid,
        }
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_bounds(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn resolution(&self) -> f64 {
        self.grid.resolution(self.zoom)
    }

    pub fn set_center(&mut self, center: Coordinate) {
        if center.x.is_finite() && center.y.is_finite() {
            self.center = center;
        }
    }

    /// Clamp-and-set. Returns whether the zoom actually changed, so requests past
    /// a bound while already sitting on it are no-ops.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        if zoom.is_nan() {
            return false;
        }
        let clamped = zoom.clamp(self.min_zoom, self.max_zoom);
        if clamped == self.zoom {
            return false;
        }
        self.zoom = clamped;
        true
    }

    /// Visible area for a viewport of `width × height` pixels.
    pub fn extent(&self, width: f64, height: f64) -> Extent {
        let res = self.resolution();
        let half_w = width * res / 2.0;
        let half_h = height * res / 2.0;
        Extent {
            min_x: self.center.x - half_w,
            min_y: self.center.y - half_h,
            max_x: self.center.x + half_w,
            max_y: self.center.y + half_h,
        }
    }

    /// Map pixel (origin top-left of the viewport) to projection coordinate.
    pub fn pixel_to_coordinate(&self, px: f64, py: f64, width: f64, height: f64) -> Coordinate {
        let res = self.resolution();
        Coordinate::new(
            self.center.x + (px - width / 2.0) * res,
            self.center.y - (py - height / 2.0) * res,
        )
    }

    pub fn coordinate_to_pixel(&self, coordinate: Coordinate, width: f64, height: f64) -> (f64, f64) {
        let res = self.resolution();
        (
            (coordinate.x - self.center.x) / res + width / 2.0,
            (self.center.y - coordinate.y) / res + height / 2.0,
        )
    }

    /// Shift the view by a screen-space drag of `(dx, dy)` pixels.
    pub fn pan_pixels(&mut self, dx: f64, dy: f64) {
        let res = self.resolution();
        self.set_center(self.center.offset(-dx * res, dy * res));
    }

    /// Change zoom by `delta` levels, keeping the map point under `(px, py)` fixed.
    pub fn zoom_by_around(&mut self, delta: f64, px: f64, py: f64, width: f64, height: f64) -> bool {
        let anchor = self.pixel_to_coordinate(px, py, width, height);
        if !self.set_zoom(self.zoom + delta) {
            return false;
        }
        let res = self.resolution();
        self.center = Coordinate::new(
            anchor.x - (px - width / 2.0) * res,
            anchor.y + (py - height / 2.0) * res,
        );
        true
    }
}
