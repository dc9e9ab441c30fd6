//! Fixed timestep simulation tick
//!
//! One call advances the session by one frame: scheduled tasks, player
//! movement, collection, and the boundary check.

use glam::Vec2;

use super::collision::{Aabb, overlapping_collectibles, resolve_walls};
use super::entity::EntityId;
use super::state::{GameEvent, GamePhase, GameSession};
use crate::consts::*;

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Player position from the host's physics, if it runs one
    pub player_pos: Option<Vec2>,
    /// Collectibles the host saw the player overlap; None to use the built-in AABB check
    pub overlaps: Option<Vec<EntityId>>,
    /// Polled directional input
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Idle/demo mode - the session steers the player itself
    pub autopilot: bool,
}

impl TickInput {
    fn direction(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }
}

/// Advance the session by one fixed timestep
pub fn tick(session: &mut GameSession, input: &TickInput, dt: f32) {
    if session.phase == GamePhase::Finished {
        return;
    }
    session.time_ticks += 1;

    for action in session.scheduler.drain_due(session.time_ticks) {
        session.run_task(action);
    }

    match session.phase {
        GamePhase::Playing => tick_playing(session, input, dt),
        GamePhase::EndSequence => {
            // Control is off; the character runs out of view
            session.player.pos.x += END_RUN_SPEED * dt;
        }
        GamePhase::Finished => {}
    }
}

fn tick_playing(session: &mut GameSession, input: &TickInput, dt: f32) {
    if session.player.control_enabled {
        if input.autopilot {
            let target = autopilot_target(session);
            session.player.pos = step_toward(session.player.pos, target, AUTOPILOT_SPEED * dt);
        } else if let Some(pos) = input.player_pos {
            session.player.pos = pos;
        } else {
            session.player.pos += input.direction() * PLAYER_RUN_SPEED * dt;
        }
    }

    session.player.pos = resolve_walls(&session.registry, session.player.pos, session.player.size);

    if session.player.pos.y > session.config.height {
        session.player.pos = session.player.spawn;
        log::debug!("Player fell out of the level, respawning");
        session.emit(GameEvent::PlayerRespawned {
            pos: session.player.pos,
        });
    }

    let overlaps = match &input.overlaps {
        Some(ids) => ids.clone(),
        None => {
            let bounds = Aabb::from_center_size(session.player.pos, session.player.size);
            overlapping_collectibles(&session.registry, &bounds)
        }
    };
    for id in overlaps {
        session.on_collect(id);
    }

    session.check_boundary();
}

/// Where the autopilot heads: the nearest matching collectible, or past the
/// boundary once the segment's goals are met
fn autopilot_target(session: &GameSession) -> Vec2 {
    let layout = session.current_layout();
    let pos = session.player.pos;

    if session.progress.goals_satisfied {
        return Vec2::new(layout.end_x + session.player.size.x, pos.y);
    }

    let Some(goal) = session.current_goal() else {
        return pos;
    };
    session
        .registry
        .active_in_segment(layout.index)
        .filter(|c| goal.matches(&c.value))
        .min_by(|a, b| {
            a.pos
                .distance_squared(pos)
                .partial_cmp(&b.pos.distance_squared(pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|c| c.pos)
        .unwrap_or(pos)
}

fn step_toward(from: Vec2, to: Vec2, max_step: f32) -> Vec2 {
    let delta = to - from;
    let dist = delta.length();
    if dist <= max_step {
        to
    } else {
        from + delta / dist * max_step
    }
}
