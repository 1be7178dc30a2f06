use std::path::PathBuf;

pub const DEFAULT_SERVER_PORT: u16 = 2345;
pub const DEFAULT_ROOT: &str = ".";

pub const TILE_CACHE_CONTROL: &str = "public, max-age=86400";
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=3600";

pub fn server_port() -> u16 {
    std::env::var("ZUI_PORT")
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

/// Directory holding `maps/` and `images/`.
pub fn root_dir() -> PathBuf {
    std::env::var("ZUI_ROOT")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT))
}

pub const DEFAULT_GENERATE_TILES: bool = true;

/// Unrecognised values fall back to the default rather than switching off.
pub fn generate_tiles_enabled() -> bool {
    std::env::var("ZUI_GENERATE_TILES")
        .ok()
        .and_then(|value| parse_flag(&value))
        .unwrap_or(DEFAULT_GENERATE_TILES)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
