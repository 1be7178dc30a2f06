pub mod api;
pub mod tiles;
