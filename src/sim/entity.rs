//! Plain-data entities and their registry
//!
//! Platforms, collectibles and boundary walls carry position, size, kind and
//! value only. Hosts attach sprites and physics bodies by entity ID.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::TileCoord;
use crate::consts::TILE_SIZE;

/// Stable entity handle (allocated monotonically)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Platform types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformKind {
    /// Wide ground piece covering the bottom rows
    Ground,
    /// Single floating tile
    Floating,
}

/// A static obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: EntityId,
    pub kind: PlatformKind,
    /// Center position
    pub pos: Vec2,
    pub size: Vec2,
    pub segment: usize,
}

/// Item catalog (no difficulty scaling)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Apple,
    Banana,
    Orange,
    Cherry,
    Gem,
}

impl ItemKind {
    pub const ALL: [ItemKind; 5] = [
        ItemKind::Apple,
        ItemKind::Banana,
        ItemKind::Orange,
        ItemKind::Cherry,
        ItemKind::Gem,
    ];
}

/// Collectible categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectibleKind {
    Letter,
    Number,
    Item,
}

/// Semantic value carried by a collectible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectibleValue {
    Letter(char),
    Number(u32),
    Item(ItemKind),
}

impl CollectibleValue {
    pub fn kind(&self) -> CollectibleKind {
        match self {
            CollectibleValue::Letter(_) => CollectibleKind::Letter,
            CollectibleValue::Number(_) => CollectibleKind::Number,
            CollectibleValue::Item(_) => CollectibleKind::Item,
        }
    }
}

impl fmt::Display for CollectibleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectibleValue::Letter(c) => write!(f, "{}", c),
            CollectibleValue::Number(n) => write!(f, "{}", n),
            CollectibleValue::Item(item) => write!(f, "{:?}", item),
        }
    }
}

/// Collision state of a collectible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectState {
    /// Overlaps with the player are reported
    Active,
    /// Wrong pick: flashing, collision disabled, removal pending
    Rejected,
}

/// A letter, number or item waiting to be picked up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub id: EntityId,
    pub value: CollectibleValue,
    pub tile: TileCoord,
    /// Center position
    pub pos: Vec2,
    pub segment: usize,
    pub state: CollectState,
}

impl Collectible {
    pub fn size(&self) -> Vec2 {
        Vec2::splat(TILE_SIZE)
    }

    pub fn is_active(&self) -> bool {
        self.state == CollectState::Active
    }
}

/// Boundary wall lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallState {
    Solid,
    /// Spawned behind the player, blocking while it fades in
    FadingIn,
    /// Goals met: no longer blocking, despawns after the fade
    FadingOut,
}

/// Which side of its segment a wall guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallRole {
    /// Trailing wall, removed once the segment's goals are met
    Exit,
    /// Spawned behind the player on entry to stop backtracking
    Entry,
}

/// Vertical stack of wall tiles at a segment boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub id: EntityId,
    pub segment: usize,
    pub role: WallRole,
    /// Boundary x-coordinate the wall stands on
    pub boundary_x: f32,
    /// Tile centers, top to bottom
    pub tiles: Vec<Vec2>,
    pub state: WallState,
}

impl Wall {
    pub fn is_blocking(&self) -> bool {
        matches!(self.state, WallState::Solid | WallState::FadingIn)
    }
}

/// Owns every live entity, keyed by ID for stable iteration order
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    platforms: BTreeMap<EntityId, Platform>,
    collectibles: BTreeMap<EntityId, Collectible>,
    walls: BTreeMap<EntityId, Wall>,
    next_id: u32,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    pub fn spawn_platform(
        &mut self,
        kind: PlatformKind,
        pos: Vec2,
        size: Vec2,
        segment: usize,
    ) -> EntityId {
        let id = self.next_entity_id();
        self.platforms.insert(
            id,
            Platform {
                id,
                kind,
                pos,
                size,
                segment,
            },
        );
        id
    }

    pub fn spawn_collectible(
        &mut self,
        value: CollectibleValue,
        tile: TileCoord,
        segment: usize,
    ) -> EntityId {
        let id = self.next_entity_id();
        self.collectibles.insert(
            id,
            Collectible {
                id,
                value,
                tile,
                pos: tile.center(),
                segment,
                state: CollectState::Active,
            },
        );
        id
    }

    pub fn spawn_wall(
        &mut self,
        segment: usize,
        role: WallRole,
        boundary_x: f32,
        tiles: Vec<Vec2>,
        state: WallState,
    ) -> EntityId {
        let id = self.next_entity_id();
        self.walls.insert(
            id,
            Wall {
                id,
                segment,
                role,
                boundary_x,
                tiles,
                state,
            },
        );
        id
    }

    pub fn platforms(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.values()
    }

    pub fn collectibles(&self) -> impl Iterator<Item = &Collectible> {
        self.collectibles.values()
    }

    pub fn walls(&self) -> impl Iterator<Item = &Wall> {
        self.walls.values()
    }

    pub fn collectible(&self, id: EntityId) -> Option<&Collectible> {
        self.collectibles.get(&id)
    }

    pub fn collectible_mut(&mut self, id: EntityId) -> Option<&mut Collectible> {
        self.collectibles.get_mut(&id)
    }

    pub fn wall(&self, id: EntityId) -> Option<&Wall> {
        self.walls.get(&id)
    }

    pub fn wall_mut(&mut self, id: EntityId) -> Option<&mut Wall> {
        self.walls.get_mut(&id)
    }

    /// Remove a collectible; None if it was already gone
    pub fn remove_collectible(&mut self, id: EntityId) -> Option<Collectible> {
        self.collectibles.remove(&id)
    }

    pub fn remove_wall(&mut self, id: EntityId) -> Option<Wall> {
        self.walls.remove(&id)
    }

    /// Active collectibles of a segment
    pub fn active_in_segment(&self, segment: usize) -> impl Iterator<Item = &Collectible> {
        self.collectibles
            .values()
            .filter(move |c| c.segment == segment && c.is_active())
    }

    /// Trailing (exit) wall of a segment, if still standing
    pub fn exit_wall(&self, segment: usize) -> Option<&Wall> {
        self.walls
            .values()
            .find(|w| w.segment == segment && w.role == WallRole::Exit)
    }

    pub fn platform_count(&self) -> usize {
        self.platforms.len()
    }

    pub fn collectible_count(&self) -> usize {
        self.collectibles.len()
    }
}
