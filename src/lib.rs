//! Letter Leap - An educational side-scrolling platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain generation, goals, segment progression)
//! - `config`: Data-driven level configuration

pub mod config;
pub mod sim;

pub use config::{ConfigError, LevelConfig};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the arcade physics step)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Grid cell size in pixels
    pub const TILE_SIZE: f32 = 32.0;

    /// Viewport dimensions
    pub const SCREEN_WIDTH: f32 = 1280.0;
    pub const SCREEN_HEIGHT: f32 = 720.0;
    /// Level height (two screens tall)
    pub const LEVEL_HEIGHT: f32 = SCREEN_HEIGHT * 2.0;

    /// Mismatch flash duration (ticks)
    pub const REJECT_FLASH_TICKS: u64 = 30;
    /// Mismatched collectibles are removed after this many ticks
    pub const REJECT_REMOVE_TICKS: u64 = 60;
    /// Boundary wall fade in/out duration (ticks)
    pub const WALL_FADE_TICKS: u64 = 45;
    /// Celebration animation length (ticks)
    pub const CELEBRATION_TICKS: u64 = 150;
    /// End sequence length before the level reports finished (ticks)
    pub const END_SEQUENCE_TICKS: u64 = 180;
    /// Horizontal speed of the character running off-screen (pixels/s)
    pub const END_RUN_SPEED: f32 = 240.0;
    /// Directional input speed when the host reports no position (pixels/s)
    pub const PLAYER_RUN_SPEED: f32 = 160.0;
    /// Autopilot travel speed (pixels/s)
    pub const AUTOPILOT_SPEED: f32 = 480.0;

    /// Consecutive rejected samples before placement scans for free tiles
    pub const MAX_SAMPLE_ATTEMPTS: u32 = 64;
    /// Redraws allowed when a new goal has nothing left to match in the segment
    pub const MAX_GOAL_REDRAWS: u32 = 8;
}

/// Number of tiles needed to cover `length` pixels.
#[inline]
pub fn tiles_for(length: f32) -> i32 {
    (length / consts::TILE_SIZE).ceil() as i32
}

/// World-space center of the tile at (col, row)
#[inline]
pub fn tile_center(col: i32, row: i32) -> Vec2 {
    Vec2::new(
        (col as f32 + 0.5) * consts::TILE_SIZE,
        (row as f32 + 0.5) * consts::TILE_SIZE,
    )
}
