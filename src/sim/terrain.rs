//! Procedural terrain generation
//!
//! Each segment gets a tile grid with unconditional ground rows, a few
//! rightward "paths" of floating platforms and some scattered extras. Every
//! candidate platform must pass a spacing check sized from the character's
//! bounding box, which keeps each individual gap inside the jump envelope.
//! Candidates that fail are skipped; sparse terrain is acceptable.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, EntityRegistry, PlatformKind};
use super::grid::{OccupancyMap, Occupant, TileCoord, TileGrid};
use crate::config::{CharacterConfig, PlatformConfig};
use crate::consts::TILE_SIZE;
use crate::tiles_for;

/// Clearances derived from the character's size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalEnvelope {
    pub character_width_tiles: i32,
    pub character_height_tiles: i32,
    /// Minimum free columns between platforms on the same rows
    pub min_horizontal_gap: i32,
    /// Minimum free rows between vertically stacked platforms
    pub min_vertical_gap: i32,
}

impl TraversalEnvelope {
    pub fn from_character(character: &CharacterConfig) -> Self {
        let character_width_tiles = tiles_for(character.width).max(1);
        let character_height_tiles = tiles_for(character.height).max(1);
        Self {
            character_width_tiles,
            character_height_tiles,
            min_horizontal_gap: character_width_tiles + 1,
            min_vertical_gap: character_height_tiles + 2,
        }
    }

    /// Widest gap a path step may leave
    pub fn max_horizontal_gap(&self) -> i32 {
        self.min_horizontal_gap + 3
    }
}

/// Spacing check for a candidate platform at (col, row) spanning `width` tiles.
///
/// Fails if the footprint leaves the grid or if any occupied tile lies within
/// `min_vertical_gap` rows and `min_horizontal_gap` columns of it.
pub fn can_place_platform(
    grid: &TileGrid,
    col: i32,
    row: i32,
    width: i32,
    envelope: &TraversalEnvelope,
) -> bool {
    if width <= 0 || !grid.in_bounds(col, row) || !grid.in_bounds(col + width - 1, row) {
        return false;
    }

    let rows = (row - envelope.min_vertical_gap)..=(row + envelope.min_vertical_gap);
    let cols = (col - envelope.min_horizontal_gap)..=(col + width - 1 + envelope.min_horizontal_gap);
    for r in rows {
        for c in cols.clone() {
            if grid.is_occupied(c, r) {
                return false;
            }
        }
    }
    true
}

/// Which pass produced a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOrigin {
    Path(u32),
    Scatter,
}

/// A horizontal run of floating tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRun {
    pub col: i32,
    pub row: i32,
    pub width: i32,
    pub origin: RunOrigin,
}

/// Output of one segment's generation pass (local tile coordinates)
#[derive(Debug, Clone)]
pub struct TerrainLayout {
    pub grid: TileGrid,
    /// First ground row
    pub ground_top: i32,
    /// Columns available to floating platforms (the last column is the wall's)
    pub usable_cols: i32,
    pub runs: Vec<PlatformRun>,
    /// Candidates dropped by the spacing check or the grid edge
    pub skipped: u32,
}

impl TerrainLayout {
    /// Lowest row a floating platform may occupy while clearing the ground band
    pub fn lowest_platform_row(&self, envelope: &TraversalEnvelope) -> i32 {
        self.ground_top - envelope.min_vertical_gap - 1
    }
}

struct Generator<'a, R: Rng> {
    layout: TerrainLayout,
    platform: &'a PlatformConfig,
    envelope: TraversalEnvelope,
    rng: &'a mut R,
}

impl<R: Rng> Generator<'_, R> {
    fn try_place(&mut self, col: i32, row: i32, width: i32, origin: RunOrigin) -> bool {
        let fits = col + width <= self.layout.usable_cols;
        if !fits || !can_place_platform(&self.layout.grid, col, row, width, &self.envelope) {
            log::debug!(
                "Skipped {:?} candidate at ({}, {}) width {}",
                origin,
                col,
                row,
                width
            );
            self.layout.skipped += 1;
            return false;
        }

        for c in col..col + width {
            self.layout.grid.occupy(c, row);
        }
        self.layout.runs.push(PlatformRun {
            col,
            row,
            width,
            origin,
        });
        true
    }

    fn random_width(&mut self) -> i32 {
        self.rng
            .random_range(self.platform.min_length..=self.platform.max_length) as i32
    }

    fn walk_path(&mut self, path: u32) {
        let lowest = self.layout.lowest_platform_row(&self.envelope);
        let highest = self.platform.ceiling_margin as i32;
        if lowest < highest {
            return;
        }

        let min_gap = self.envelope.min_horizontal_gap;
        let mut col = path as i32 * (min_gap + 2);
        let mut row = lowest;
        let mut first = true;

        while col < self.layout.usable_cols {
            if !first {
                let roll: f32 = self.rng.random();
                if roll < self.platform.up_weight {
                    row -= self.rng.random_range(1..=self.platform.max_ascend.max(1)) as i32;
                } else if roll < self.platform.up_weight + self.platform.down_weight {
                    row += self.rng.random_range(1..=self.platform.max_descend.max(1)) as i32;
                }
                row = row.clamp(highest, lowest);
            }
            first = false;

            let width = self.random_width();
            if self.try_place(col, row, width, RunOrigin::Path(path)) {
                col += width + self.rng.random_range(min_gap..=self.envelope.max_horizontal_gap());
            } else {
                col += min_gap;
            }
        }
    }

    fn scatter(&mut self) {
        let rows = self.layout.grid.rows();
        let highest = self.platform.ceiling_margin as i32;
        let lowest = (rows * 2 / 3 - 1)
            .min(self.layout.ground_top - self.platform.min_height_above_ground as i32)
            .min(self.layout.lowest_platform_row(&self.envelope));
        if lowest < highest {
            return;
        }

        for _ in 0..self.platform.extra_platforms {
            let width = self.random_width();
            let max_col = self.layout.usable_cols - width;
            if max_col < 0 {
                self.layout.skipped += 1;
                continue;
            }
            let col = self.rng.random_range(0..=max_col);
            let row = self.rng.random_range(highest..=lowest);
            self.try_place(col, row, width, RunOrigin::Scatter);
        }
    }
}

/// Lay out one segment's terrain.
///
/// `cols` includes the wall column. Ground-only segments pass `floating = false`
/// and get no paths or scatter.
pub fn generate_terrain<R: Rng>(
    cols: i32,
    rows: i32,
    platform: &PlatformConfig,
    envelope: TraversalEnvelope,
    floating: bool,
    rng: &mut R,
) -> TerrainLayout {
    let mut grid = TileGrid::new(cols, rows);
    let ground_height = platform.ground_height_tiles as i32;
    grid.fill_bottom_rows(ground_height);

    let mut generator = Generator {
        layout: TerrainLayout {
            grid,
            ground_top: rows - ground_height,
            usable_cols: (cols - 1).max(0),
            runs: Vec::new(),
            skipped: 0,
        },
        platform,
        envelope,
        rng,
    };

    if floating {
        for path in 0..platform.path_count {
            generator.walk_path(path);
        }
        generator.scatter();
    }

    generator.layout
}

/// Entities created for a segment's terrain
#[derive(Debug, Clone, Default)]
pub struct MaterializedTerrain {
    pub ground: Vec<EntityId>,
    pub floating: Vec<EntityId>,
}

/// Turn a layout into platform entities and record every occupied tile.
///
/// Floating cells become one-tile platforms at tile centers; the ground rows
/// become wide pieces of `ground_piece_width`.
pub fn materialize(
    layout: &TerrainLayout,
    segment: usize,
    start_col: i32,
    platform: &PlatformConfig,
    registry: &mut EntityRegistry,
    occupancy: &mut OccupancyMap,
) -> MaterializedTerrain {
    let mut out = MaterializedTerrain::default();
    let segment_left = start_col as f32 * TILE_SIZE;
    let segment_width = layout.grid.cols() as f32 * TILE_SIZE;
    let ground_rows = layout.grid.rows() - layout.ground_top;
    let ground_height = ground_rows as f32 * TILE_SIZE;
    let piece_width = platform.ground_piece_width.max(TILE_SIZE);

    // (first local column, id) of every ground piece
    let mut pieces: Vec<(i32, EntityId)> = Vec::new();
    let mut offset = 0.0;
    while offset < segment_width {
        let width = piece_width.min(segment_width - offset);
        let pos = Vec2::new(
            segment_left + offset + width / 2.0,
            layout.ground_top as f32 * TILE_SIZE + ground_height / 2.0,
        );
        let id = registry.spawn_platform(
            PlatformKind::Ground,
            pos,
            Vec2::new(width, ground_height),
            segment,
        );
        pieces.push(((offset / TILE_SIZE) as i32, id));
        out.ground.push(id);
        offset += width;
    }

    for tile in layout.grid.occupied() {
        let absolute = tile.offset(start_col, 0);
        let occupant = if tile.row >= layout.ground_top {
            let piece = pieces
                .iter()
                .rev()
                .find(|(first_col, _)| *first_col <= tile.col)
                .map(|&(_, id)| id);
            match piece {
                Some(id) => Occupant::Ground(id),
                None => continue,
            }
        } else {
            let id = registry.spawn_platform(
                PlatformKind::Floating,
                absolute.center(),
                Vec2::splat(TILE_SIZE),
                segment,
            );
            out.floating.push(id);
            Occupant::Platform(id)
        };
        occupancy.occupy(absolute, occupant);
    }

    out
}

/// Tiles of a boundary wall standing in `col`, from the ceiling to the ground
pub fn wall_tiles(col: i32, ground_top: i32) -> Vec<TileCoord> {
    (0..ground_top).map(|row| TileCoord::new(col, row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelConfig;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn default_envelope() -> TraversalEnvelope {
        TraversalEnvelope::from_character(&CharacterConfig::default())
    }

    fn generate(seed: u64) -> TerrainLayout {
        let config = LevelConfig::default();
        let mut rng = Pcg32::seed_from_u64(seed);
        generate_terrain(
            40,
            config.rows(),
            &config.platform_config,
            default_envelope(),
            true,
            &mut rng,
        )
    }

    /// Column distance between two runs (0 when they overlap)
    fn column_gap(a: &PlatformRun, b: &PlatformRun) -> i32 {
        let a_end = a.col + a.width - 1;
        let b_end = b.col + b.width - 1;
        if a_end < b.col {
            b.col - a_end - 1
        } else if b_end < a.col {
            a.col - b_end - 1
        } else {
            0
        }
    }

    #[test]
    fn test_envelope_from_default_character() {
        let envelope = default_envelope();
        assert_eq!(envelope.character_width_tiles, 3);
        assert_eq!(envelope.character_height_tiles, 3);
        assert_eq!(envelope.min_horizontal_gap, 4);
        assert_eq!(envelope.min_vertical_gap, 5);
        assert_eq!(envelope.max_horizontal_gap(), 7);
    }

    #[test]
    fn test_can_place_respects_spacing() {
        let envelope = default_envelope();
        let mut grid = TileGrid::new(40, 45);
        for c in 10..14 {
            grid.occupy(c, 20);
        }

        // Same row, too close on the right
        assert!(!can_place_platform(&grid, 16, 20, 3, &envelope));
        // Same row, exactly min_horizontal_gap free columns away
        assert!(can_place_platform(&grid, 18, 20, 3, &envelope));
        // Directly above within min_vertical_gap rows
        assert!(!can_place_platform(&grid, 10, 15, 3, &envelope));
        // One row further up clears it
        assert!(can_place_platform(&grid, 10, 14, 3, &envelope));
        // Off the grid
        assert!(!can_place_platform(&grid, 38, 5, 3, &envelope));
        assert!(!can_place_platform(&grid, 0, 5, 0, &envelope));
    }

    #[test]
    fn test_ground_rows_always_occupied() {
        let layout = generate(3);
        let rows = layout.grid.rows();
        assert_eq!(layout.ground_top, rows - 2);
        for row in layout.ground_top..rows {
            for col in 0..layout.grid.cols() {
                assert!(layout.grid.is_occupied(col, row));
            }
        }
    }

    #[test]
    fn test_ground_only_segment_has_no_runs() {
        let config = LevelConfig::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let layout = generate_terrain(
            40,
            config.rows(),
            &config.platform_config,
            default_envelope(),
            false,
            &mut rng,
        );
        assert!(layout.runs.is_empty());
        assert_eq!(layout.grid.occupied_count(), 80);
    }

    #[test]
    fn test_paths_produce_platforms() {
        let layout = generate(11);
        assert!(layout.runs.iter().any(|r| matches!(r.origin, RunOrigin::Path(0))));
        assert!(layout.runs.iter().all(|r| r.col + r.width <= layout.usable_cols));
    }

    #[test]
    fn test_materialize_counts_and_occupancy() {
        let config = LevelConfig::default();
        let layout = generate(21);
        let mut registry = EntityRegistry::new();
        let mut occupancy = OccupancyMap::new();

        let out = materialize(
            &layout,
            1,
            40,
            &config.platform_config,
            &mut registry,
            &mut occupancy,
        );

        let floating_tiles: i32 = layout.runs.iter().map(|r| r.width).sum();
        assert_eq!(out.floating.len(), floating_tiles as usize);
        assert_eq!(out.ground.len(), 1);
        assert_eq!(occupancy.len(), layout.grid.occupied_count());
        assert_eq!(occupancy.conflicts(), 0);

        // Absolute coordinates: segment 1 starts at column 40
        let ground_tile = TileCoord::new(40, layout.ground_top);
        assert!(matches!(occupancy.get(ground_tile), Some(Occupant::Ground(_))));
        assert!(!occupancy.is_occupied(TileCoord::new(0, layout.ground_top)));
    }

    #[test]
    fn test_ground_pieces_tile_the_segment() {
        let platform = PlatformConfig {
            ground_piece_width: 512.0,
            ..Default::default()
        };
        let layout = generate(2);
        let mut registry = EntityRegistry::new();
        let mut occupancy = OccupancyMap::new();

        let out = materialize(&layout, 0, 0, &platform, &mut registry, &mut occupancy);
        // 1280 px split as 512 + 512 + 256
        assert_eq!(out.ground.len(), 3);
        let widths: Vec<f32> = registry
            .platforms()
            .filter(|p| p.kind == PlatformKind::Ground)
            .map(|p| p.size.x)
            .collect();
        assert_eq!(widths, vec![512.0, 512.0, 256.0]);
    }

    #[test]
    fn test_wall_tiles_span_to_ground() {
        let tiles = wall_tiles(39, 43);
        assert_eq!(tiles.len(), 43);
        assert_eq!(tiles[0], TileCoord::new(39, 0));
        assert_eq!(tiles[42], TileCoord::new(39, 42));
    }

    proptest! {
        #[test]
        fn placed_runs_respect_spacing(seed in any::<u64>()) {
            let envelope = default_envelope();
            let layout = generate(seed);
            let lowest = layout.lowest_platform_row(&envelope);

            for (i, a) in layout.runs.iter().enumerate() {
                prop_assert!(a.row <= lowest);
                prop_assert!(a.col >= 0 && a.col + a.width <= layout.usable_cols);
                for b in layout.runs.iter().skip(i + 1) {
                    let vertical = (a.row - b.row).abs();
                    let horizontal = column_gap(a, b);
                    prop_assert!(
                        vertical > envelope.min_vertical_gap || horizontal >= envelope.min_horizontal_gap,
                        "runs {:?} and {:?} too close", a, b
                    );
                }
            }
        }

        #[test]
        fn floating_cells_match_runs(seed in any::<u64>()) {
            let layout = generate(seed);
            let floating_cells = layout
                .grid
                .occupied()
                .filter(|t| t.row < layout.ground_top)
                .count() as i32;
            let run_tiles: i32 = layout.runs.iter().map(|r| r.width).sum();
            prop_assert_eq!(floating_cells, run_tiles);
        }

        #[test]
        fn scattered_runs_stay_in_upper_band(seed in any::<u64>()) {
            let platform = LevelConfig::default().platform_config;
            let layout = generate(seed);
            let rows = layout.grid.rows();
            let highest = platform.ceiling_margin as i32;
            let lowest = (rows * 2 / 3 - 1)
                .min(layout.ground_top - platform.min_height_above_ground as i32);

            for run in layout.runs.iter().filter(|r| r.origin == RunOrigin::Scatter) {
                prop_assert!(run.row >= highest, "{:?} above the ceiling margin", run);
                prop_assert!(run.row <= lowest, "{:?} below row {}", run, lowest);
            }
        }
    }
}
