//! Session state and core simulation types
//!
//! `GameSession` owns everything a running level needs: the config, the
//! seeded RNG, the entity registry, the occupancy map, the goal manager, the
//! segment progress and the event queue. There are no globals; every core
//! operation takes the session.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{CollectibleValue, EntityId, EntityRegistry};
use super::goal::{Goal, GoalManager};
use super::grid::OccupancyMap;
use super::level::{SegmentBuild, SegmentLayout, build_level};
use super::schedule::{Scheduler, TaskHandle};
use crate::config::LevelConfig;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Segments are being played
    Playing,
    /// Last segment crossed: control disabled, character runs off-screen
    EndSequence,
    /// Terminal
    Finished,
}

/// Named character animations the host should play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAnimation {
    Victory,
    Run,
}

/// Notifications for the host, drained once per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SegmentEntered { segment: usize },
    GoalSet { segment: usize, goal: Goal },
    Collected {
        id: EntityId,
        value: CollectibleValue,
        matched: bool,
    },
    /// Wrong letter/number: flash for `ticks`, collision already disabled
    RejectFlash { id: EntityId, ticks: u64 },
    GoalAchieved {
        segment: usize,
        goal: Goal,
        goals_completed: u32,
        goals_required: u32,
    },
    VisualProgress { collected: u32, required: u32 },
    SegmentCleared { segment: usize },
    CelebrationStarted,
    CelebrationStopped,
    WallFadeOut { id: EntityId, ticks: u64 },
    WallFadeIn { id: EntityId, ticks: u64 },
    Despawned { id: EntityId },
    /// Camera should follow the player within this horizontal span
    CameraTarget { min_x: f32, max_x: f32 },
    PlayerControl { enabled: bool },
    PlayAnimation(PlayerAnimation),
    PlayerRespawned { pos: Vec2 },
    EndSequenceStarted,
    LevelFinished,
}

/// Item counter for visual goals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualProgress {
    pub collected: u32,
    /// Zero when the active goal is not visual
    pub required: u32,
}

/// Progress within the active segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentProgress {
    pub index: usize,
    pub goals_completed: u32,
    pub goals_required: u32,
    /// First gate: the goal count is met and the exit wall is gone
    pub goals_satisfied: bool,
    pub visual: VisualProgress,
}

impl SegmentProgress {
    pub fn new(index: usize, goals_required: u32) -> Self {
        Self {
            index,
            goals_completed: 0,
            goals_required,
            goals_satisfied: false,
            visual: VisualProgress::default(),
        }
    }
}

/// The player character as far as the core is concerned
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Center position
    pub pos: Vec2,
    pub size: Vec2,
    pub control_enabled: bool,
    /// Where the player returns after falling out of the level
    pub spawn: Vec2,
}

/// Complete session state (deterministic for a given config and seed)
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Run seed for reproducibility
    pub seed: u64,
    pub config: LevelConfig,
    pub(crate) rng: Pcg32,
    pub layouts: Vec<SegmentLayout>,
    /// Per-segment generation summaries
    pub builds: Vec<SegmentBuild>,
    pub registry: EntityRegistry,
    /// Tile occupancy written during load; read-only afterwards
    pub occupancy: OccupancyMap,
    pub goals: GoalManager,
    pub progress: SegmentProgress,
    pub phase: GamePhase,
    pub player: Player,
    pub scheduler: Scheduler,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Pending end of the running celebration
    pub(crate) celebration: Option<TaskHandle>,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Build the level and enter the first segment.
    ///
    /// `config` must already be validated.
    pub fn new(config: LevelConfig, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut registry = EntityRegistry::new();
        let mut occupancy = OccupancyMap::new();
        let builds = build_level(&config, &mut registry, &mut occupancy, &mut rng);
        let layouts: Vec<SegmentLayout> = builds.iter().map(|b| b.layout).collect();

        let spawn = config.spawn();
        let player = Player {
            pos: spawn,
            size: Vec2::new(config.character.width, config.character.height),
            control_enabled: true,
            spawn,
        };
        let goals = GoalManager::new(config.difficulty_tables.clone());
        let goals_required = config
            .segments
            .first()
            .map(|s| s.goals_to_complete)
            .unwrap_or(1);

        log::info!(
            "Level built: seed {}, {} segments, {} platforms, {} collectibles",
            seed,
            layouts.len(),
            registry.platform_count(),
            registry.collectible_count()
        );

        let mut session = Self {
            seed,
            config,
            rng,
            layouts,
            builds,
            registry,
            occupancy,
            goals,
            progress: SegmentProgress::new(0, goals_required),
            phase: GamePhase::Playing,
            player,
            scheduler: Scheduler::new(),
            time_ticks: 0,
            celebration: None,
            events: Vec::new(),
        };
        session.enter_segment(0);
        session
    }

    /// Layout of the active segment
    pub fn current_layout(&self) -> &SegmentLayout {
        &self.layouts[self.progress.index]
    }

    pub fn current_goal(&self) -> Option<&Goal> {
        self.goals.current()
    }

    pub fn is_last_segment(&self) -> bool {
        self.progress.index + 1 >= self.layouts.len()
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events queued since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Remove a collectible and cancel its scheduled tasks; no-op if already gone
    pub fn despawn_collectible(&mut self, id: EntityId) -> bool {
        if self.registry.remove_collectible(id).is_none() {
            return false;
        }
        self.scheduler.cancel_owned(id);
        self.emit(GameEvent::Despawned { id });
        true
    }

    /// Remove a wall and cancel its scheduled tasks; no-op if already gone
    pub fn despawn_wall(&mut self, id: EntityId) -> bool {
        if self.registry.remove_wall(id).is_none() {
            return false;
        }
        self.scheduler.cancel_owned(id);
        self.emit(GameEvent::Despawned { id });
        true
    }
}
