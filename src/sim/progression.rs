//! Segment progression
//!
//! Collection handling and segment transitions. A segment is left in two
//! stages: meeting its goal count fades the exit wall out (`goals_satisfied`),
//! and only physically crossing the boundary commits the move to the next
//! segment. Crossing the last boundary starts the end sequence instead.

use super::entity::{CollectState, CollectibleKind, EntityId, WallRole, WallState};
use super::goal::Goal;
use super::schedule::TaskAction;
use super::state::{GameEvent, GamePhase, GameSession, PlayerAnimation, SegmentProgress, VisualProgress};
use crate::consts::*;

impl GameSession {
    /// Handle the player overlapping a collectible.
    ///
    /// Rejected or already removed collectibles are ignored.
    pub fn on_collect(&mut self, id: EntityId) {
        if self.phase != GamePhase::Playing {
            return;
        }
        let Some(collectible) = self.registry.collectible(id).filter(|c| c.is_active()) else {
            return;
        };
        let value = collectible.value;

        if self.progress.goals_satisfied {
            self.emit(GameEvent::Collected {
                id,
                value,
                matched: false,
            });
            self.despawn_collectible(id);
            return;
        }

        let matched = self.goals.check_goal_achievement(&value);
        self.emit(GameEvent::Collected { id, value, matched });

        if !matched {
            match value.kind() {
                CollectibleKind::Letter | CollectibleKind::Number => self.reject(id),
                CollectibleKind::Item => {
                    self.despawn_collectible(id);
                }
            }
            return;
        }

        self.despawn_collectible(id);
        let visual = self
            .goals
            .current()
            .is_some_and(|goal| goal.kind.is_visual());
        if visual {
            self.progress.visual.collected += 1;
            let VisualProgress { collected, required } = self.progress.visual;
            self.emit(GameEvent::VisualProgress { collected, required });
            if collected < required {
                return;
            }
        }
        self.goal_achieved();
    }

    /// Wrong letter or number: stop colliding, flash, remove later
    fn reject(&mut self, id: EntityId) {
        if let Some(collectible) = self.registry.collectible_mut(id) {
            collectible.state = CollectState::Rejected;
        }
        self.emit(GameEvent::RejectFlash {
            id,
            ticks: REJECT_FLASH_TICKS,
        });
        self.scheduler.schedule(
            self.time_ticks,
            REJECT_REMOVE_TICKS,
            Some(id),
            TaskAction::RemoveCollectible(id),
        );
    }

    fn goal_achieved(&mut self) {
        let Some(goal) = self.goals.current().copied() else {
            return;
        };
        self.progress.goals_completed += 1;
        self.emit(GameEvent::GoalAchieved {
            segment: self.progress.index,
            goal,
            goals_completed: self.progress.goals_completed,
            goals_required: self.progress.goals_required,
        });
        log::info!(
            "Segment {}: goal {} achieved ({}/{})",
            self.progress.index,
            goal,
            self.progress.goals_completed,
            self.progress.goals_required
        );

        if self.progress.goals_completed >= self.progress.goals_required {
            self.complete_segment();
        } else {
            self.draw_goal();
        }
    }

    /// Goal count met: celebrate, open the exit and wipe leftover letters/numbers
    fn complete_segment(&mut self) {
        let segment = self.progress.index;
        self.progress.goals_satisfied = true;
        self.progress.visual = VisualProgress::default();
        self.emit(GameEvent::SegmentCleared { segment });
        log::info!("Segment {} cleared", segment);

        self.start_celebration();

        if let Some(wall_id) = self.registry.exit_wall(segment).map(|w| w.id) {
            if let Some(wall) = self.registry.wall_mut(wall_id) {
                wall.state = WallState::FadingOut;
            }
            self.emit(GameEvent::WallFadeOut {
                id: wall_id,
                ticks: WALL_FADE_TICKS,
            });
            self.scheduler.schedule(
                self.time_ticks,
                WALL_FADE_TICKS,
                Some(wall_id),
                TaskAction::DespawnWall(wall_id),
            );
        }

        let leftovers: Vec<EntityId> = self
            .registry
            .collectibles()
            .filter(|c| c.segment == segment)
            .filter(|c| c.value.kind() != CollectibleKind::Item)
            .map(|c| c.id)
            .collect();
        for id in leftovers {
            self.despawn_collectible(id);
        }
    }

    /// Start the celebration, stopping one that is still running
    fn start_celebration(&mut self) {
        if let Some(handle) = self.celebration.take() {
            self.scheduler.cancel(handle);
            self.emit(GameEvent::CelebrationStopped);
        }
        self.emit(GameEvent::CelebrationStarted);
        let handle = self.scheduler.schedule(
            self.time_ticks,
            CELEBRATION_TICKS,
            None,
            TaskAction::EndCelebration,
        );
        self.celebration = Some(handle);
    }

    /// Second gate: commit the transition once the player is past the boundary
    pub fn check_boundary(&mut self) {
        if self.phase != GamePhase::Playing || !self.progress.goals_satisfied {
            return;
        }
        if self.player.pos.x <= self.current_layout().end_x {
            return;
        }

        if self.is_last_segment() {
            self.start_end_sequence();
        } else {
            self.advance_segment();
        }
    }

    fn advance_segment(&mut self) {
        let previous = *self.current_layout();
        let next = previous.index + 1;

        let wall_id = self.registry.spawn_wall(
            next,
            WallRole::Entry,
            previous.end_x,
            previous.wall_tile_centers(),
            WallState::FadingIn,
        );
        self.emit(GameEvent::WallFadeIn {
            id: wall_id,
            ticks: WALL_FADE_TICKS,
        });
        self.scheduler.schedule(
            self.time_ticks,
            WALL_FADE_TICKS,
            Some(wall_id),
            TaskAction::FinishWallFadeIn(wall_id),
        );

        self.enter_segment(next);
    }

    /// Entry action: reset counters, retarget camera and spawn, draw a goal
    pub(crate) fn enter_segment(&mut self, index: usize) {
        let Some(layout) = self.layouts.get(index).copied() else {
            return;
        };
        let goals_required = self
            .config
            .segments
            .get(index)
            .map(|s| s.goals_to_complete)
            .unwrap_or(1);
        self.progress = SegmentProgress::new(index, goals_required);
        if index > 0 {
            self.player.spawn = layout.spawn_point(&self.config.character);
        }

        log::info!("Entered segment {}", index);
        self.emit(GameEvent::SegmentEntered { segment: index });
        self.emit(GameEvent::CameraTarget {
            min_x: layout.start_x,
            max_x: layout.end_x,
        });
        self.draw_goal();
    }

    /// Draw a goal for the active segment, redrawing when nothing left can satisfy it
    fn draw_goal(&mut self) {
        let index = self.progress.index;
        let Some(segment) = self.config.segments.get(index) else {
            return;
        };
        let (kinds, difficulty) = (segment.goals.clone(), segment.difficulty);

        let mut drawn = None;
        for attempt in 0..=MAX_GOAL_REDRAWS {
            let Some(goal) = self.goals.set_new_goal(&kinds, difficulty, &mut self.rng) else {
                break;
            };
            drawn = Some(goal);
            if self.is_satisfiable(&goal) {
                break;
            }
            if attempt == MAX_GOAL_REDRAWS {
                log::warn!(
                    "Segment {}: no collectible left for goal {}, keeping it",
                    index,
                    goal
                );
            }
        }

        let Some(goal) = drawn else {
            return;
        };
        self.progress.visual = VisualProgress {
            collected: 0,
            required: goal.required_items().unwrap_or(0),
        };
        log::info!("Segment {}: new goal {}", index, goal);
        self.emit(GameEvent::GoalSet { segment: index, goal });
    }

    /// Whether the active segment still holds what `goal` asks for
    pub fn is_satisfiable(&self, goal: &Goal) -> bool {
        let mut remaining = self.registry.active_in_segment(self.progress.index);
        match goal.required_items() {
            Some(required) => {
                let items = remaining
                    .filter(|c| c.value.kind() == CollectibleKind::Item)
                    .count();
                items as u32 >= required
            }
            None => remaining.any(|c| goal.matches(&c.value)),
        }
    }

    /// Terminal transition after the last boundary
    fn start_end_sequence(&mut self) {
        self.phase = GamePhase::EndSequence;
        self.player.control_enabled = false;
        log::info!("All segments complete, starting end sequence");

        self.emit(GameEvent::EndSequenceStarted);
        self.emit(GameEvent::PlayerControl { enabled: false });
        self.emit(GameEvent::PlayAnimation(PlayerAnimation::Run));
        self.scheduler.schedule(
            self.time_ticks,
            END_SEQUENCE_TICKS,
            None,
            TaskAction::FinishEndSequence,
        );
    }

    /// Run a scheduled task that came due
    pub(crate) fn run_task(&mut self, action: TaskAction) {
        match action {
            TaskAction::RemoveCollectible(id) => {
                self.despawn_collectible(id);
            }
            TaskAction::DespawnWall(id) => {
                self.despawn_wall(id);
            }
            TaskAction::FinishWallFadeIn(id) => {
                if let Some(wall) = self.registry.wall_mut(id) {
                    wall.state = WallState::Solid;
                }
            }
            TaskAction::EndCelebration => {
                self.celebration = None;
                self.emit(GameEvent::CelebrationStopped);
            }
            TaskAction::FinishEndSequence => {
                self.phase = GamePhase::Finished;
                self.emit(GameEvent::PlayAnimation(PlayerAnimation::Victory));
                self.emit(GameEvent::LevelFinished);
                log::info!("Level finished at tick {}", self.time_ticks);
            }
        }
    }
}
