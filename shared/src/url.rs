use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::{MAX_ADDRESSABLE_ZOOM, TileCoord};

/// A tile URL containing `{z}`, `{x}` and `{y}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TileUrlTemplate(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPlaceholder(pub &'static str);

impl fmt::Display for MissingPlaceholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile URL template is missing the {} placeholder", self.0)
    }
}

impl std::error::Error for MissingPlaceholder {}

impl TileUrlTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, MissingPlaceholder> {
        let template = template.into();
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !template.contains(placeholder) {
                return Err(MissingPlaceholder(placeholder));
            }
        }
        Ok(Self(template))
    }

    /// Compile-time templates checked by the config tests.
    pub(crate) fn from_static(template: &'static str) -> Self {
        Self(template.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn expand(&self, tile: TileCoord) -> String {
        self.0
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

impl TryFrom<String> for TileUrlTemplate {
    type Error = MissingPlaceholder;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TileUrlTemplate> for String {
    fn from(value: TileUrlTemplate) -> Self {
        value.0
    }
}

/// A map name as accepted in tile paths: `[A-Za-z0-9_]+`.
pub fn is_valid_map_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn parse_index(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Parse the `{z}`, `{x}` and `{y}.png` path segments of a tile request.
pub fn parse_tile_segments(z: &str, x: &str, file: &str) -> Option<TileCoord> {
    let y = file.strip_suffix(".png")?;
    let z = u32::try_from(parse_index(z)?).ok()?;
    if z > MAX_ADDRESSABLE_ZOOM {
        return None;
    }
    Some(TileCoord::new(z, parse_index(x)?, parse_index(y)?))
}

/// Parse `/maps/<name>/tiles/<z>/<x>/<y>.png`.
pub fn parse_tile_path(path: &str) -> Option<(&str, TileCoord)> {
    let rest = path.strip_prefix("/maps/")?;
    let mut parts = rest.split('/');
    let name = parts.next()?;
    if !is_valid_map_name(name) || parts.next()? != "tiles" {
        return None;
    }
    let (z, x, file) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some((name, parse_tile_segments(z, x, file)?))
}

/// Server-relative path of a tile file.
pub fn tile_path(name: &str, tile: TileCoord) -> String {
    format!("/maps/{name}/tiles/{}/{}/{}.png", tile.z, tile.x, tile.y)
}
