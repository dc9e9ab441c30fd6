//! Tick-based scheduled tasks
//!
//! Delayed effects (rejection removal, wall fades, celebration end) are queued
//! against a future tick. Tasks may be owned by an entity; despawning the
//! entity cancels everything it owns so nothing fires against a dead ID.

use serde::{Deserialize, Serialize};

use super::entity::EntityId;

/// Handle returned by `Scheduler::schedule`, used to cancel a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskHandle(pub u64);

/// Work performed when a task comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskAction {
    /// Despawn a rejected collectible after its flash
    RemoveCollectible(EntityId),
    /// Fade-out finished
    DespawnWall(EntityId),
    /// Fade-in finished, wall becomes solid
    FinishWallFadeIn(EntityId),
    EndCelebration,
    FinishEndSequence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Task {
    handle: TaskHandle,
    due_tick: u64,
    owner: Option<EntityId>,
    action: TaskAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_handle: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to run `delay_ticks` after `now`
    pub fn schedule(
        &mut self,
        now: u64,
        delay_ticks: u64,
        owner: Option<EntityId>,
        action: TaskAction,
    ) -> TaskHandle {
        self.next_handle += 1;
        let handle = TaskHandle(self.next_handle);
        self.tasks.push(Task {
            handle,
            due_tick: now + delay_ticks,
            owner,
            action,
        });
        handle
    }

    /// Cancel one task; false if it already ran or was cancelled
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        self.tasks.len() != before
    }

    /// Cancel every task owned by `owner`, returning how many were dropped
    pub fn cancel_owned(&mut self, owner: EntityId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.owner != Some(owner));
        before - self.tasks.len()
    }

    /// Remove and return every task due at or before `now`, oldest first
    pub fn drain_due(&mut self, now: u64) -> Vec<TaskAction> {
        let (mut due, pending): (Vec<Task>, Vec<Task>) =
            self.tasks.drain(..).partition(|t| t.due_tick <= now);
        self.tasks = pending;
        due.sort_by_key(|t| (t.due_tick, t.handle));
        due.into_iter().map(|t| t.action).collect()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    pub fn has_owned(&self, owner: EntityId) -> bool {
        self.tasks.iter().any(|t| t.owner == Some(owner))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
