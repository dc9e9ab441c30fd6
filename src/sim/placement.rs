//! Collectible placement
//!
//! Scatters a segment's letters, numbers and items over free tiles. Sampling
//! is rejection-based but bounded: after `MAX_SAMPLE_ATTEMPTS` misses the
//! placer picks uniformly among the remaining free tiles, and stops once none
//! are left.

use rand::Rng;
use rand::seq::IndexedRandom;

use super::entity::{CollectibleKind, CollectibleValue, EntityRegistry, ItemKind};
use super::goal::{random_letter, random_number};
use super::grid::{OccupancyMap, Occupant, TileCoord};
use super::level::SegmentLayout;
use crate::config::{DifficultyTables, SegmentConfig};
use crate::consts::MAX_SAMPLE_ATTEMPTS;

/// Outcome of placing one segment's collectibles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementReport {
    pub requested: u32,
    pub placed: u32,
    /// Placements that needed the free-tile fallback
    pub fallbacks: u32,
}

impl PlacementReport {
    pub fn shortfall(&self) -> u32 {
        self.requested - self.placed
    }
}

/// Random value of a collectible kind at a difficulty
pub fn random_value<R: Rng>(
    kind: CollectibleKind,
    tables: &DifficultyTables,
    difficulty: u8,
    rng: &mut R,
) -> Option<CollectibleValue> {
    match kind {
        CollectibleKind::Letter => {
            let alphabet = tables.letters(difficulty)?;
            random_letter(alphabet, rng).map(CollectibleValue::Letter)
        }
        CollectibleKind::Number => {
            let range = tables.numbers(difficulty)?;
            Some(CollectibleValue::Number(random_number(range, rng)))
        }
        CollectibleKind::Item => ItemKind::ALL.choose(rng).copied().map(CollectibleValue::Item),
    }
}

/// Sample a free tile in the segment's open area
fn sample_free_tile<R: Rng>(
    layout: &SegmentLayout,
    occupancy: &OccupancyMap,
    rng: &mut R,
) -> Option<(TileCoord, bool)> {
    let (cols, rows) = (layout.open_cols(), layout.ground_top);
    if cols <= 0 || rows <= 0 {
        return None;
    }

    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let tile = TileCoord::new(
            layout.start_col + rng.random_range(0..cols),
            rng.random_range(0..rows),
        );
        if !occupancy.is_occupied(tile) {
            return Some((tile, false));
        }
    }

    let free: Vec<TileCoord> = (0..rows)
        .flat_map(|row| (0..cols).map(move |col| TileCoord::new(layout.start_col + col, row)))
        .filter(|tile| !occupancy.is_occupied(*tile))
        .collect();
    free.choose(rng).map(|&tile| (tile, true))
}

/// Place every collectible a segment asks for, in component order
pub fn place_collectibles<R: Rng>(
    layout: &SegmentLayout,
    segment: &SegmentConfig,
    tables: &DifficultyTables,
    registry: &mut EntityRegistry,
    occupancy: &mut OccupancyMap,
    rng: &mut R,
) -> PlacementReport {
    let mut report = PlacementReport {
        requested: segment.total_collectibles(),
        ..Default::default()
    };

    'kinds: for (kind, count) in segment.collectibles() {
        for _ in 0..count {
            let Some(value) = random_value(kind, tables, segment.difficulty, rng) else {
                log::warn!(
                    "Segment {}: no {:?} values at difficulty {}",
                    layout.index,
                    kind,
                    segment.difficulty
                );
                continue 'kinds;
            };
            let Some((tile, fallback)) = sample_free_tile(layout, occupancy, rng) else {
                log::warn!(
                    "Segment {}: out of free tiles after placing {}/{} collectibles",
                    layout.index,
                    report.placed,
                    report.requested
                );
                return report;
            };

            let id = registry.spawn_collectible(value, tile, layout.index);
            occupancy.occupy(tile, Occupant::Collectible(id));
            report.placed += 1;
            if fallback {
                report.fallbacks += 1;
            }
        }
    }

    report
}
