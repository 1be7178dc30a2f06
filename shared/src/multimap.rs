//! The composite `MultiMap` tile set: other maps are embedded at fixed tiles,
//! and requests landing inside one of them are rewritten into that map's own
//! tile space.

use crate::grid::{TileCoord, TileRegion};

pub const MULTIMAP_NAME: &str = "MultiMap";

/// A map embedded in `MultiMap` whose root tile sits at `anchor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbeddedMap {
    pub name: &'static str,
    pub anchor: TileCoord,
    /// Tiles are rendered on demand when missing.
    pub generated: bool,
}

impl EmbeddedMap {
    pub fn region(&self) -> TileRegion {
        self.anchor.region()
    }
}

pub const EMBEDDED_MAPS: &[EmbeddedMap] = &[
    EmbeddedMap {
        name: "Mandelbrot",
        anchor: TileCoord::new(3, 5, 4),
        generated: true,
    },
    EmbeddedMap {
        name: "MandelbrotUF",
        anchor: TileCoord::new(3, 5, 5),
        generated: true,
    },
    EmbeddedMap {
        name: "Atlas_of_Materials",
        anchor: TileCoord::new(2, 1, 1),
        generated: false,
    },
];

/// Where a tile request should actually be served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTile<'a> {
    pub map: &'a str,
    pub tile: TileCoord,
}

pub fn embedded_map(name: &str) -> Option<&'static EmbeddedMap> {
    EMBEDDED_MAPS.iter().find(|m| m.name == name)
}

/// Whether tiles of `name` may be rendered on demand.
pub fn is_generated(name: &str) -> bool {
    embedded_map(name).is_some_and(|m| m.generated)
}

/// Rewrite a `MultiMap` tile into an embedded map's tile space if the tile's
/// center falls strictly inside that map's anchor region.
pub fn remap(tile: TileCoord) -> ResolvedTile<'static> {
    let (cx, cy) = tile.region().center();
    let hit = EMBEDDED_MAPS
        .iter()
        .find(|m| m.region().contains_strict(cx, cy));

    let Some(embedded) = hit else {
        return ResolvedTile {
            map: MULTIMAP_NAME,
            tile,
        };
    };

    // A center strictly inside the anchor implies the tile is at or below the
    // anchor's zoom.
    let Some(dz) = tile.z.checked_sub(embedded.anchor.z) else {
        return ResolvedTile {
            map: MULTIMAP_NAME,
            tile,
        };
    };
    ResolvedTile {
        map: embedded.name,
        tile: TileCoord::new(
            dz,
            tile.x - (embedded.anchor.x << dz),
            tile.y - (embedded.anchor.y << dz),
        ),
    }
}

/// Resolve any requested map/tile; only `MultiMap` is rewritten.
pub fn resolve(name: &str, tile: TileCoord) -> ResolvedTile<'_> {
    if name == MULTIMAP_NAME {
        remap(tile)
    } else {
        ResolvedTile { map: name, tile }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_tile_becomes_embedded_root() {
        assert_eq!(
            remap(TileCoord::new(3, 5, 4)),
            ResolvedTile {
                map: "Mandelbrot",
                tile: TileCoord::new(0, 0, 0)
            }
        );
        assert_eq!(
            remap(TileCoord::new(3, 5, 5)),
            ResolvedTile {
                map: "MandelbrotUF",
                tile: TileCoord::new(0, 0, 0)
            }
        );
        assert_eq!(
            remap(TileCoord::new(2, 1, 1)),
            ResolvedTile {
                map: "Atlas_of_Materials",
                tile: TileCoord::new(0, 0, 0)
            }
        );
    }

    #[test]
    fn deeper_tiles_are_offset_into_embedded_space() {
        // z5 tile (22, 17) lies in Mandelbrot's anchor (5,4)@z3 -> offset (20, 16).
        assert_eq!(
            remap(TileCoord::new(5, 22, 17)),
            ResolvedTile {
                map: "Mandelbrot",
                tile: TileCoord::new(2, 2, 1)
            }
        );
    }

    #[test]
    fn coarser_and_unrelated_tiles_stay_on_multimap() {
        for tile in [
            TileCoord::new(0, 0, 0),
            TileCoord::new(1, 1, 1),
            TileCoord::new(2, 2, 2),
            TileCoord::new(3, 0, 0),
            TileCoord::new(4, 3, 3),
        ] {
            assert_eq!(remap(tile).map, MULTIMAP_NAME, "{tile:?}");
            assert_eq!(remap(tile).tile, tile);
        }
    }

    #[test]
    fn resolve_only_rewrites_multimap() {
        let tile = TileCoord::new(3, 5, 4);
        assert_eq!(resolve("Mandelbrot", tile).tile, tile);
        assert_eq!(resolve("MultiMap", tile).map, "Mandelbrot");
    }

    #[test]
    fn generated_maps_are_flagged() {
        assert!(is_generated("Mandelbrot"));
        assert!(is_generated("MandelbrotUF"));
        assert!(!is_generated("Atlas_of_Materials"));
        assert!(!is_generated("MultiMap"));
    }
}
