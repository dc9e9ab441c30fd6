//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod goal;
pub mod grid;
pub mod level;
pub mod placement;
pub mod progression;
pub mod schedule;
pub mod state;
pub mod terrain;
pub mod tick;

pub use collision::{Aabb, overlapping_collectibles, resolve_walls};
pub use entity::{
    CollectState, Collectible, CollectibleKind, CollectibleValue, EntityId, EntityRegistry,
    ItemKind, Platform, PlatformKind, Wall, WallRole, WallState,
};
pub use goal::{Goal, GoalKind, GoalManager, GoalValue, Operation};
pub use grid::{OccupancyMap, Occupant, TileCoord, TileGrid};
pub use level::{SegmentBuild, SegmentLayout, build_level, segment_layouts};
pub use placement::{PlacementReport, place_collectibles};
pub use schedule::{Scheduler, TaskAction, TaskHandle};
pub use state::{
    GameEvent, GamePhase, GameSession, Player, PlayerAnimation, SegmentProgress, VisualProgress,
};
pub use terrain::{
    PlatformRun, RunOrigin, TerrainLayout, TraversalEnvelope, can_place_platform,
    generate_terrain,
};
pub use tick::{TickInput, tick};
