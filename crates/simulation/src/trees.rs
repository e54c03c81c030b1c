//! Legal perch trees per location.
//!
//! The host enumerates mature, non-stump, leafy trees and rebuilds this
//! directory whenever a location's trees change. Each entry carries its
//! canopy anchor directly — the spawn point for a perched grouse — so the
//! core never has to poke into host tree internals.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::config::TILE_SIZE;

/// One legal perch tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerchTree {
    /// Trunk tile position.
    pub tile: IVec2,
    /// World-space canopy anchor where a grouse sits.
    pub canopy: Vec2,
}

impl PerchTree {
    /// A tree at `tile` with the canopy anchor derived from the trunk: one
    /// tile up and centered. Hosts with real render bounds should compute
    /// the anchor themselves.
    pub fn at_tile(tile: IVec2) -> Self {
        Self {
            tile,
            canopy: Vec2::new(
                (tile.x as f32 + 0.5) * TILE_SIZE,
                (tile.y as f32 - 1.0) * TILE_SIZE,
            ),
        }
    }
}

/// All legal perch trees, keyed by location name.
#[derive(Resource, Debug, Clone, Default)]
pub struct TreeDirectory {
    by_location: HashMap<String, Vec<PerchTree>>,
}

impl TreeDirectory {
    /// Replace the tree list for a location.
    pub fn set_location(&mut self, location: impl Into<String>, trees: Vec<PerchTree>) {
        self.by_location.insert(location.into(), trees);
    }

    /// Trees in a location, empty when the location is unknown.
    pub fn trees_in(&self, location: &str) -> &[PerchTree] {
        self.by_location
            .get(location)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up a specific tree by trunk tile.
    pub fn find(&self, location: &str, tile: IVec2) -> Option<&PerchTree> {
        self.trees_in(location).iter().find(|t| t.tile == tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_location_is_empty_not_error() {
        let dir = TreeDirectory::default();
        assert!(dir.trees_in("Nowhere").is_empty());
        assert!(dir.find("Nowhere", IVec2::ZERO).is_none());
    }

    #[test]
    fn test_find_by_tile() {
        let mut dir = TreeDirectory::default();
        dir.set_location(
            "Forest",
            vec![PerchTree::at_tile(IVec2::new(4, 9)), PerchTree::at_tile(IVec2::new(10, 2))],
        );
        let tree = dir.find("Forest", IVec2::new(10, 2)).expect("tree exists");
        assert_eq!(tree.tile, IVec2::new(10, 2));
        assert!(dir.find("Forest", IVec2::new(1, 1)).is_none());
    }

    #[test]
    fn test_canopy_anchor_sits_above_trunk() {
        let tree = PerchTree::at_tile(IVec2::new(4, 9));
        assert!(tree.canopy.y < 9.0 * TILE_SIZE);
        assert_eq!(tree.canopy.x, 4.5 * TILE_SIZE);
    }
}
