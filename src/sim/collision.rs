//! Axis-aligned overlap checks
//!
//! Hosts with a physics engine report overlaps themselves; the headless runner
//! and the autopilot use these checks against the registry instead.

use glam::Vec2;

use super::entity::{EntityId, EntityRegistry, Wall, WallRole};
use crate::consts::TILE_SIZE;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size / 2.0;
        Self::new(center - half, center + half)
    }

    /// Strict overlap: touching edges do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }
}

/// Bounds of a wall's tile stack
pub fn wall_bounds(wall: &Wall) -> Aabb {
    if wall.tiles.is_empty() {
        let edge = Vec2::new(wall.boundary_x, 0.0);
        return Aabb::new(edge, edge);
    }
    let half = Vec2::splat(TILE_SIZE / 2.0);
    let (min, max) = wall.tiles.iter().fold(
        (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
        |(min, max), &tile| (min.min(tile - half), max.max(tile + half)),
    );
    Aabb::new(min, max)
}

/// Active collectibles touching the player, in ID order
pub fn overlapping_collectibles(registry: &EntityRegistry, player: &Aabb) -> Vec<EntityId> {
    registry
        .collectibles()
        .filter(|c| c.is_active())
        .filter(|c| Aabb::from_center_size(c.pos, c.size()).overlaps(player))
        .map(|c| c.id)
        .collect()
}

/// Push the player out of any blocking wall.
///
/// Exit walls hold the player on their left, entry walls on their right.
pub fn resolve_walls(registry: &EntityRegistry, pos: Vec2, size: Vec2) -> Vec2 {
    let mut pos = pos;
    for wall in registry.walls().filter(|w| w.is_blocking()) {
        let bounds = wall_bounds(wall);
        let player = Aabb::from_center_size(pos, size);
        if !player.overlaps(&bounds) {
            continue;
        }
        pos.x = match wall.role {
            WallRole::Exit => bounds.min.x - size.x / 2.0,
            WallRole::Entry => bounds.max.x + size.x / 2.0,
        };
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{CollectState, CollectibleValue, WallState};
    use crate::sim::grid::TileCoord;

    fn wall_column(col: i32, rows: i32) -> Vec<Vec2> {
        (0..rows).map(|row| TileCoord::new(col, row).center()).collect()
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::from_center_size(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::from_center_size(Vec2::new(8.0, 0.0), Vec2::new(10.0, 10.0));
        let c = Aabb::from_center_size(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c), "touching edges do not overlap");
        assert_eq!(b.center(), Vec2::new(8.0, 0.0));
    }

    #[test]
    fn test_overlaps_skip_rejected() {
        let mut registry = EntityRegistry::new();
        let a = registry.spawn_collectible(CollectibleValue::Letter('A'), TileCoord::new(2, 2), 0);
        let b = registry.spawn_collectible(CollectibleValue::Letter('B'), TileCoord::new(3, 2), 0);
        registry.spawn_collectible(CollectibleValue::Letter('C'), TileCoord::new(20, 2), 0);

        let player = Aabb::from_center_size(Vec2::new(96.0, 80.0), Vec2::new(80.0, 72.0));
        assert_eq!(overlapping_collectibles(&registry, &player), vec![a, b]);

        if let Some(c) = registry.collectible_mut(a) {
            c.state = CollectState::Rejected;
        }
        assert_eq!(overlapping_collectibles(&registry, &player), vec![b]);
    }

    #[test]
    fn test_exit_wall_blocks_until_fading() {
        let mut registry = EntityRegistry::new();
        let id = registry.spawn_wall(0, WallRole::Exit, 1280.0, wall_column(39, 43), WallState::Solid);
        let size = Vec2::new(80.0, 72.0);

        let pushed = resolve_walls(&registry, Vec2::new(1240.0, 1300.0), size);
        assert_eq!(pushed.x, 1248.0 - 40.0);

        if let Some(wall) = registry.wall_mut(id) {
            wall.state = WallState::FadingOut;
        }
        let free = resolve_walls(&registry, Vec2::new(1240.0, 1300.0), size);
        assert_eq!(free.x, 1240.0);
    }

    #[test]
    fn test_entry_wall_pushes_right() {
        let mut registry = EntityRegistry::new();
        registry.spawn_wall(1, WallRole::Entry, 1280.0, wall_column(39, 43), WallState::FadingIn);
        let pushed = resolve_walls(&registry, Vec2::new(1270.0, 1300.0), Vec2::new(80.0, 72.0));
        assert_eq!(pushed.x, 1280.0 + 40.0);
    }
}
