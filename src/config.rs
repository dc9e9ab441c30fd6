//! Level configuration
//!
//! Static, declarative description of a level: its segments, platform tuning,
//! the character's traversal envelope and the difficulty tables. Read-only
//! input to the simulation, loaded from JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::entity::CollectibleKind;
use crate::sim::goal::GoalKind;
use crate::sim::terrain::TraversalEnvelope;
use crate::tiles_for;

/// Configuration problems detected at load time
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Level has no segments")]
    NoSegments,

    #[error("Segment {segment}: no goal kinds allowed")]
    NoGoalKinds { segment: usize },

    #[error("Segment {segment}: goalsToComplete must be at least 1")]
    NoGoalsRequired { segment: usize },

    #[error("Segment {segment}: difficulty {difficulty} missing from the difficulty tables")]
    UnknownDifficulty { segment: usize, difficulty: u8 },

    #[error("Difficulty {difficulty}: number range {min}..={max} needs min >= 1 and max > min")]
    InvalidNumberRange { difficulty: u8, min: u32, max: u32 },

    #[error("Difficulty {difficulty}: empty alphabet")]
    EmptyAlphabet { difficulty: u8 },

    #[error("Segment {segment}: width {width} is not a positive multiple of the tile size")]
    SegmentWidth { segment: usize, width: f32 },

    #[error("Platform length bounds {min}..={max} are invalid")]
    PlatformLength { min: u32, max: u32 },

    #[error("Ground is {ground} rows but the level is only {rows} rows tall")]
    GroundTooTall { ground: u32, rows: i32 },

    #[error("Terrain is not reachable with the configured jump: {0}")]
    UnreachableEnvelope(String),

    #[error("Segment {segment}: {requested} collectibles requested but only {capacity} tiles may be filled")]
    OverCapacity {
        segment: usize,
        requested: u32,
        capacity: u32,
    },

    #[error("Segment {segment}: character at ({x}, {y}) is outside the level or inside the ground")]
    SpawnOutOfBounds { segment: usize, x: f32, y: f32 },
}

/// Inclusive numeric range for a difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: u32,
    pub max: u32,
}

/// Difficulty-indexed alphabet subsets and number ranges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyTables {
    pub letter_difficulty: BTreeMap<u8, String>,
    pub number_difficulty: BTreeMap<u8, NumberRange>,
}

impl Default for DifficultyTables {
    fn default() -> Self {
        let alphabet = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        let letter_lengths = [3, 4, 5, 6, 8, 10, 13, 16, 26];
        let number_max = [3, 5, 7, 9, 11, 13, 15, 17, 20];

        let mut letter_difficulty = BTreeMap::new();
        let mut number_difficulty = BTreeMap::new();
        for (i, (&len, &max)) in letter_lengths.iter().zip(number_max.iter()).enumerate() {
            let difficulty = i as u8 + 1;
            letter_difficulty.insert(difficulty, alphabet[..len].to_string());
            number_difficulty.insert(difficulty, NumberRange { min: 1, max });
        }

        Self {
            letter_difficulty,
            number_difficulty,
        }
    }
}

impl DifficultyTables {
    pub fn letters(&self, difficulty: u8) -> Option<&str> {
        self.letter_difficulty.get(&difficulty).map(String::as_str)
    }

    pub fn numbers(&self, difficulty: u8) -> Option<NumberRange> {
        self.number_difficulty.get(&difficulty).copied()
    }
}

/// Platform flavours a segment may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlatformSubtype {
    Ground,
    Floating,
}

/// One entry of a segment's component list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComponentSpec {
    /// Player spawn point
    Character { x: f32, y: f32 },
    Letter { count: u32 },
    Number { count: u32 },
    Item { count: u32 },
    Platform { subtype: PlatformSubtype },
}

/// A fixed-width horizontal slice of the level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentConfig {
    pub width: f32,
    pub components: Vec<ComponentSpec>,
    /// Goal kinds this segment may draw from
    pub goals: Vec<GoalKind>,
    pub difficulty: u8,
    pub goals_to_complete: u32,
}

impl SegmentConfig {
    /// Requested collectibles in component order
    pub fn collectibles(&self) -> impl Iterator<Item = (CollectibleKind, u32)> + '_ {
        self.components.iter().filter_map(|c| match *c {
            ComponentSpec::Letter { count } => Some((CollectibleKind::Letter, count)),
            ComponentSpec::Number { count } => Some((CollectibleKind::Number, count)),
            ComponentSpec::Item { count } => Some((CollectibleKind::Item, count)),
            _ => None,
        })
    }

    pub fn total_collectibles(&self) -> u32 {
        self.collectibles().map(|(_, count)| count).sum()
    }

    pub fn has_platforms(&self, subtype: PlatformSubtype) -> bool {
        self.components
            .iter()
            .any(|c| *c == ComponentSpec::Platform { subtype })
    }

    /// Player spawn, if this segment declares the character
    pub fn spawn(&self) -> Option<Vec2> {
        self.components.iter().find_map(|c| match *c {
            ComponentSpec::Character { x, y } => Some(Vec2::new(x, y)),
            _ => None,
        })
    }
}

/// Terrain generator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformConfig {
    pub min_length: u32,
    pub max_length: u32,
    /// Independent rightward walks per segment
    pub path_count: u32,
    /// Largest upward step of a path (tiles)
    pub max_ascend: u32,
    /// Largest downward step of a path (tiles)
    pub max_descend: u32,
    /// Probability a path step moves up
    pub up_weight: f32,
    /// Probability a path step moves down (remainder stays level)
    pub down_weight: f32,
    /// Randomly scattered platforms added after the paths
    pub extra_platforms: u32,
    /// Scatter never goes lower than this many tiles above the ground
    pub min_height_above_ground: u32,
    /// Rows kept free below the ceiling
    pub ceiling_margin: u32,
    pub ground_height_tiles: u32,
    /// Width of one ground texture piece (pixels)
    pub ground_piece_width: f32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 9,
            path_count: 3,
            max_ascend: 3,
            max_descend: 3,
            up_weight: 0.5,
            down_weight: 0.25,
            extra_platforms: 8,
            min_height_above_ground: 6,
            ceiling_margin: 2,
            ground_height_tiles: 2,
            ground_piece_width: SCREEN_WIDTH,
        }
    }
}

/// Character sprite size and jump envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterConfig {
    /// Sprite width after scaling (pixels)
    pub width: f32,
    /// Sprite height after scaling (pixels)
    pub height: f32,
    /// Highest ledge reachable from standing (tiles)
    pub jump_height_tiles: u32,
    /// Widest gap clearable with a running jump (tiles)
    pub jump_distance_tiles: u32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        // 40x36 frame at scale 2; jump 500 px/s against 500 px/s² gravity, run 160 px/s
        Self {
            width: 80.0,
            height: 72.0,
            jump_height_tiles: 7,
            jump_distance_tiles: 10,
        }
    }
}

/// Complete level description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    #[serde(default = "default_level_height")]
    pub height: f32,
    pub segments: Vec<SegmentConfig>,
    #[serde(default)]
    pub platform_config: PlatformConfig,
    #[serde(default)]
    pub character: CharacterConfig,
    #[serde(default)]
    pub difficulty_tables: DifficultyTables,
}

fn default_level_height() -> f32 {
    LEVEL_HEIGHT
}

impl Default for LevelConfig {
    fn default() -> Self {
        use ComponentSpec::*;

        let ground = Platform {
            subtype: PlatformSubtype::Ground,
        };
        let floating = Platform {
            subtype: PlatformSubtype::Floating,
        };

        Self {
            height: LEVEL_HEIGHT,
            segments: vec![
                SegmentConfig {
                    width: SCREEN_WIDTH,
                    components: vec![
                        Character {
                            x: 100.0,
                            y: LEVEL_HEIGHT - 150.0,
                        },
                        Letter { count: 50 },
                        ground.clone(),
                        floating.clone(),
                    ],
                    goals: vec![GoalKind::Letter],
                    difficulty: 1,
                    goals_to_complete: 1,
                },
                SegmentConfig {
                    width: SCREEN_WIDTH,
                    components: vec![ground.clone(), floating.clone(), Number { count: 100 }],
                    goals: vec![GoalKind::Number, GoalKind::Addition, GoalKind::Subtraction],
                    difficulty: 3,
                    goals_to_complete: 2,
                },
                SegmentConfig {
                    width: SCREEN_WIDTH,
                    components: vec![ground, floating, Item { count: 40 }],
                    goals: vec![
                        GoalKind::NumberVisual,
                        GoalKind::AdditionVisual,
                        GoalKind::SubtractionVisual,
                    ],
                    difficulty: 5,
                    goals_to_complete: 3,
                },
            ],
            platform_config: PlatformConfig::default(),
            character: CharacterConfig::default(),
            difficulty_tables: DifficultyTables::default(),
        }
    }
}

impl LevelConfig {
    /// Parse and validate a JSON level description
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LevelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from `path`, falling back to the built-in level on any error
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using built-in level");
            return Self::default();
        };

        match Self::from_file(path) {
            Ok(config) => {
                log::info!(
                    "Loaded level from {} ({} segments)",
                    path.display(),
                    config.segments.len()
                );
                config
            }
            Err(e) => {
                log::warn!("Failed to load {}: {} - using built-in level", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Total level width (pixels)
    pub fn width(&self) -> f32 {
        self.segments.iter().map(|s| s.width).sum()
    }

    /// Grid rows covering the level height
    pub fn rows(&self) -> i32 {
        tiles_for(self.height)
    }

    /// Player spawn: first declared character, else just above the ground of segment 0
    pub fn spawn(&self) -> Vec2 {
        self.segments
            .iter()
            .find_map(SegmentConfig::spawn)
            .unwrap_or_else(|| {
                let ground_top = self.rows() - self.platform_config.ground_height_tiles as i32;
                Vec2::new(
                    TILE_SIZE * 3.0,
                    ground_top as f32 * TILE_SIZE - self.character.height / 2.0,
                )
            })
    }

    /// Check everything the generator and progression rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segments.is_empty() {
            return Err(ConfigError::NoSegments);
        }

        for (&difficulty, range) in &self.difficulty_tables.number_difficulty {
            if range.min == 0 || range.max <= range.min {
                return Err(ConfigError::InvalidNumberRange {
                    difficulty,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        for (&difficulty, letters) in &self.difficulty_tables.letter_difficulty {
            if letters.is_empty() {
                return Err(ConfigError::EmptyAlphabet { difficulty });
            }
        }

        let platform = &self.platform_config;
        if platform.min_length == 0 || platform.min_length > platform.max_length {
            return Err(ConfigError::PlatformLength {
                min: platform.min_length,
                max: platform.max_length,
            });
        }

        let rows = self.rows();
        let envelope = TraversalEnvelope::from_character(&self.character);
        let ground = platform.ground_height_tiles;
        // Ground plus the spacing band above it plus one platform row
        if ground == 0 || ground as i32 + envelope.min_vertical_gap + 1 >= rows {
            return Err(ConfigError::GroundTooTall { ground, rows });
        }
        self.validate_envelope(&envelope)?;

        for (index, segment) in self.segments.iter().enumerate() {
            self.validate_segment(index, segment)?;
        }

        Ok(())
    }

    fn validate_envelope(&self, envelope: &TraversalEnvelope) -> Result<(), ConfigError> {
        let jump_height = self.character.jump_height_tiles as i32;
        let jump_distance = self.character.jump_distance_tiles as i32;

        if envelope.min_vertical_gap + 1 > jump_height {
            return Err(ConfigError::UnreachableEnvelope(format!(
                "lowest platform sits {} tiles above ground, jump reaches {}",
                envelope.min_vertical_gap + 1,
                jump_height
            )));
        }
        if self.platform_config.max_ascend as i32 > jump_height {
            return Err(ConfigError::UnreachableEnvelope(format!(
                "paths climb up to {} tiles per step, jump reaches {}",
                self.platform_config.max_ascend, jump_height
            )));
        }
        if envelope.max_horizontal_gap() > jump_distance {
            return Err(ConfigError::UnreachableEnvelope(format!(
                "gaps reach {} tiles, jump clears {}",
                envelope.max_horizontal_gap(),
                jump_distance
            )));
        }
        Ok(())
    }

    fn validate_segment(&self, index: usize, segment: &SegmentConfig) -> Result<(), ConfigError> {
        let cols = segment.width / TILE_SIZE;
        if segment.width <= 0.0 || cols.fract() != 0.0 {
            return Err(ConfigError::SegmentWidth {
                segment: index,
                width: segment.width,
            });
        }
        if segment.goals.is_empty() {
            return Err(ConfigError::NoGoalKinds { segment: index });
        }
        if segment.goals_to_complete == 0 {
            return Err(ConfigError::NoGoalsRequired { segment: index });
        }

        let tables = &self.difficulty_tables;
        if tables.letters(segment.difficulty).is_none() || tables.numbers(segment.difficulty).is_none() {
            return Err(ConfigError::UnknownDifficulty {
                segment: index,
                difficulty: segment.difficulty,
            });
        }

        // Last column holds the boundary wall, ground rows are never free
        let open_rows = self.rows() - self.platform_config.ground_height_tiles as i32;
        let open_tiles = (cols as i32 - 1).max(0) * open_rows.max(0);
        let capacity = (open_tiles / 2) as u32;
        let requested = segment.total_collectibles();
        if requested > capacity {
            return Err(ConfigError::OverCapacity {
                segment: index,
                requested,
                capacity,
            });
        }

        // The whole player box must sit in the level, above the ground
        let ground_y = open_rows as f32 * TILE_SIZE;
        let half = Vec2::new(self.character.width, self.character.height) / 2.0;
        for component in &segment.components {
            if let ComponentSpec::Character { x, y } = *component {
                let inside = x - half.x >= 0.0
                    && x + half.x <= self.width()
                    && y - half.y >= 0.0
                    && y + half.y <= ground_y;
                if !inside {
                    return Err(ConfigError::SpawnOutOfBounds { segment: index, x, y });
                }
            }
        }

        Ok(())
    }
}
