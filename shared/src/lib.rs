pub mod cache;
pub mod config;
pub mod coord;
pub mod grid;
pub mod multimap;
pub mod overlay;
pub mod url;
pub mod view;

pub use cache::TileCache;
pub use config::MapConfig;
pub use coord::Coordinate;
pub use grid::{Extent, PlannedTile, Preload, TileCoord, TileGrid, TileRegion};
pub use overlay::{OverlayState, PopupContent};
pub use url::TileUrlTemplate;
pub use view::ViewState;
