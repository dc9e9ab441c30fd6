//! Level construction
//!
//! Builds every segment once at load: terrain, the trailing boundary wall and
//! the collectibles, in segment order from a single RNG stream.

use std::ops::RangeInclusive;

use glam::Vec2;
use rand::Rng;

use super::collision::Aabb;
use super::entity::{EntityId, EntityRegistry, WallRole, WallState};
use super::grid::{OccupancyMap, Occupant, TileCoord};
use super::placement::{PlacementReport, place_collectibles};
use super::terrain::{TraversalEnvelope, generate_terrain, materialize, wall_tiles};
use crate::config::{CharacterConfig, LevelConfig, PlatformSubtype};
use crate::consts::TILE_SIZE;

/// Where a segment sits in the level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLayout {
    pub index: usize,
    pub start_x: f32,
    /// Boundary x-coordinate the player must cross to leave the segment
    pub end_x: f32,
    /// First absolute tile column
    pub start_col: i32,
    pub cols: i32,
    /// First ground row
    pub ground_top: i32,
}

impl SegmentLayout {
    /// Columns open to platforms and collectibles (the wall column excluded)
    pub fn open_cols(&self) -> i32 {
        (self.cols - 1).max(0)
    }

    /// Absolute column of the trailing wall
    pub fn wall_col(&self) -> i32 {
        self.start_col + self.cols - 1
    }

    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.start_x && x < self.end_x
    }

    /// World centers of the trailing wall's tiles
    pub fn wall_tile_centers(&self) -> Vec<Vec2> {
        wall_tiles(self.wall_col(), self.ground_top)
            .iter()
            .map(|t| t.center())
            .collect()
    }

    /// Respawn point: near the segment's first column, standing on the ground
    pub fn spawn_point(&self, character: &CharacterConfig) -> Vec2 {
        Vec2::new(
            self.start_x + TILE_SIZE + character.width / 2.0,
            self.ground_top as f32 * TILE_SIZE - character.height / 2.0,
        )
    }
}

/// Summary of one segment's build
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentBuild {
    pub layout: SegmentLayout,
    pub floating_tiles: usize,
    pub skipped_platforms: u32,
    pub exit_wall: EntityId,
    /// Open tiles held back around spawn points
    pub reserved_tiles: usize,
    pub placement: PlacementReport,
}

/// Compute every segment's span without generating anything
pub fn segment_layouts(config: &LevelConfig) -> Vec<SegmentLayout> {
    let ground_top = config.rows() - config.platform_config.ground_height_tiles as i32;
    let mut start_col = 0;
    config
        .segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let cols = crate::tiles_for(segment.width);
            let layout = SegmentLayout {
                index,
                start_x: start_col as f32 * TILE_SIZE,
                end_x: (start_col + cols) as f32 * TILE_SIZE,
                start_col,
                cols,
                ground_top,
            };
            start_col += cols;
            layout
        })
        .collect()
}

/// Tiles whose squares strictly overlap `bounds`
fn covered_tiles(bounds: &Aabb) -> (RangeInclusive<i32>, RangeInclusive<i32>) {
    let first = (bounds.min / TILE_SIZE).floor();
    let last = (bounds.max / TILE_SIZE).ceil() - Vec2::ONE;
    (
        first.x as i32..=last.x as i32,
        first.y as i32..=last.y as i32,
    )
}

/// Hold the segment's open tiles under each player box so nothing is placed
/// where the player appears. Returns the number of tiles reserved.
fn reserve_spawns(
    layout: &SegmentLayout,
    spawns: &[Vec2],
    size: Vec2,
    occupancy: &mut OccupancyMap,
) -> usize {
    let mut reserved = 0;
    for &spawn in spawns {
        let (cols, rows) = covered_tiles(&Aabb::from_center_size(spawn, size));
        let cols = (*cols.start()).max(layout.start_col)..=(*cols.end()).min(layout.wall_col() - 1);
        let rows = (*rows.start()).max(0)..=(*rows.end()).min(layout.ground_top - 1);
        for row in rows {
            for col in cols.clone() {
                let tile = TileCoord::new(col, row);
                if !occupancy.is_occupied(tile) && occupancy.occupy(tile, Occupant::Spawn) {
                    reserved += 1;
                }
            }
        }
    }
    reserved
}

/// Generate terrain, walls and collectibles for the whole level
pub fn build_level<R: Rng>(
    config: &LevelConfig,
    registry: &mut EntityRegistry,
    occupancy: &mut OccupancyMap,
    rng: &mut R,
) -> Vec<SegmentBuild> {
    let envelope = TraversalEnvelope::from_character(&config.character);
    let rows = config.rows();
    let layouts = segment_layouts(config);
    let player_size = Vec2::new(config.character.width, config.character.height);
    let spawns: Vec<Vec2> = std::iter::once(config.spawn())
        .chain(layouts.iter().map(|l| l.spawn_point(&config.character)))
        .collect();

    layouts
        .into_iter()
        .zip(&config.segments)
        .map(|(layout, segment)| {
            let floating = segment.has_platforms(PlatformSubtype::Floating);
            let terrain = generate_terrain(
                layout.cols,
                rows,
                &config.platform_config,
                envelope,
                floating,
                rng,
            );
            let platforms = materialize(
                &terrain,
                layout.index,
                layout.start_col,
                &config.platform_config,
                registry,
                occupancy,
            );

            let exit_wall = registry.spawn_wall(
                layout.index,
                WallRole::Exit,
                layout.end_x,
                layout.wall_tile_centers(),
                WallState::Solid,
            );
            for tile in wall_tiles(layout.wall_col(), layout.ground_top) {
                occupancy.occupy(tile, Occupant::Wall(exit_wall));
            }

            let reserved_tiles = reserve_spawns(&layout, &spawns, player_size, occupancy);

            let placement = place_collectibles(
                &layout,
                segment,
                &config.difficulty_tables,
                registry,
                occupancy,
                rng,
            );

            log::info!(
                "Segment {}: {} platform runs ({} skipped), {}/{} collectibles",
                layout.index,
                terrain.runs.len(),
                terrain.skipped,
                placement.placed,
                placement.requested
            );

            SegmentBuild {
                layout,
                floating_tiles: platforms.floating.len(),
                skipped_platforms: terrain.skipped,
                exit_wall,
                reserved_tiles,
                placement,
            }
        })
        .collect()
}
