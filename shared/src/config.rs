use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::grid::{Preload, TileGrid};
use crate::url::TileUrlTemplate;
use crate::view::ViewState;

pub const DEFAULT_TILE_URL: &str = "http://localhost:2345/maps/MultiMap/tiles/{z}/{x}/{y}.png";
pub const DEFAULT_POPUP_IMAGE_URL: &str =
    "http://localhost:2345/images/AE/anim-grid_vs_autonomous.gif";

/// Ids the page must provide.
pub const MAP_TARGET_ID: &str = "map";
pub const POPUP_ID: &str = "popup";
pub const POPUP_CONTENT_ID: &str = "popup-content";
pub const POPUP_CLOSER_ID: &str = "popup-closer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayerConfig {
    pub url: TileUrlTemplate,
    pub wrap_x: bool,
    pub cross_origin: String,
    pub cache_size: usize,
    pub preload: Preload,
    pub z_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub center: Coordinate,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoPanConfig {
    pub enabled: bool,
    pub duration_ms: f64,
    pub margin_px: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub view: ViewConfig,
    pub tile_layer: TileLayerConfig,
    pub popup_image_url: String,
    pub auto_pan: AutoPanConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            view: ViewConfig {
                center: Coordinate::new(0.5, 0.5),
                zoom: 3.0,
                min_zoom: 0.0,
                max_zoom: 40.0,
            },
            tile_layer: TileLayerConfig {
                url: TileUrlTemplate::from_static(DEFAULT_TILE_URL),
                wrap_x: false,
                cross_origin: "anonymous".to_string(),
                cache_size: 10_000,
                preload: Preload::Unlimited,
                z_index: 1,
            },
            popup_image_url: DEFAULT_POPUP_IMAGE_URL.to_string(),
            auto_pan: AutoPanConfig {
                enabled: true,
                duration_ms: 250.0,
                margin_px: 20.0,
            },
        }
    }
}

impl MapConfig {
    pub fn grid(&self) -> TileGrid {
        TileGrid {
            max_zoom: self.view.max_zoom.max(0.0) as u32,
            min_zoom: self.view.min_zoom.max(0.0) as u32,
            ..TileGrid::default()
        }
    }

    pub fn initial_view(&self) -> ViewState {
        ViewState::new(
            self.view.center,
            self.view.zoom,
            self.view.min_zoom,
            self.view.max_zoom,
            self.grid(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tile_url_is_a_valid_template() {
        assert!(TileUrlTemplate::new(DEFAULT_TILE_URL).is_ok());
    }

    #[test]
    fn default_tile_layer_matches_deployment() {
        let config = MapConfig::default();
        assert_eq!(
            config.tile_layer.url.as_str(),
            "http://localhost:2345/maps/MultiMap/tiles/{z}/{x}/{y}.png"
        );
        assert!(!config.tile_layer.wrap_x);
        assert_eq!(config.tile_layer.cross_origin, "anonymous");
        assert_eq!(config.tile_layer.cache_size, 10_000);
        assert_eq!(config.tile_layer.preload, Preload::Unlimited);
    }

    #[test]
    fn default_view_is_centered_at_three() {
        let view = MapConfig::default().initial_view();
        assert_eq!(view.center(), Coordinate::new(0.5, 0.5));
        assert_eq!(view.zoom(), 3.0);
        assert_eq!(view.zoom_bounds(), (0.0, 40.0));
    }

    #[test]
    fn config_survives_json() {
        let config = MapConfig::default();
        let json = serde_json::to_string(&config).expect("serialize");
        assert!(json.contains("\"preload\":\"unlimited\""));
        let back: MapConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }
}
