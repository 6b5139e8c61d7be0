//! In-process backend.
//!
//! Realizes the full [`SimulatorBackend`] contract against an in-memory
//! world model: an entity map, a paused flag, and a tick counter. Used for
//! headless episode generation and as the second registered variant behind
//! the registry seam. There is no transport underneath, so this handle can
//! never fault.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;

use taskgen_types::prelude::{EntityDescriptor, Namespace, PositionOrientation};

use crate::simulation::{BackendError, BackendState, SimulatorBackend};

pub struct InProcessBackend {
    namespace: Namespace,
    entities: DashMap<String, PositionOrientation>,
    paused: AtomicBool,
    ticks: AtomicU64,
    last_goal: Mutex<Option<PositionOrientation>>,
    episode_active: AtomicBool,
}

impl InProcessBackend {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            entities: DashMap::new(),
            paused: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
            last_goal: Mutex::new(None),
            episode_active: AtomicBool::new(false),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Discrete ticks advanced so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entity_position(&self, name: &str) -> Option<PositionOrientation> {
        self.entities.get(name).map(|entry| *entry.value())
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn last_goal(&self) -> Option<PositionOrientation> {
        *self
            .last_goal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SimulatorBackend for InProcessBackend {
    fn state(&self) -> BackendState {
        if self.episode_active.load(Ordering::SeqCst) {
            BackendState::EpisodeActive
        } else {
            BackendState::Ready
        }
    }

    async fn before_episode_reset(&self) -> Result<(), BackendError> {
        self.paused.store(true, Ordering::SeqCst);
        self.episode_active.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn after_episode_reset(&self) -> Result<(), BackendError> {
        self.paused.store(false, Ordering::SeqCst);
        self.episode_active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn spawn_entity(&self, entity: &EntityDescriptor) -> Result<bool, BackendError> {
        match self.entities.entry(entity.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                debug!(
                    "[InProcessBackend] spawn rejected, name `{}` already exists",
                    entity.name
                );
                Ok(false)
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(entity.position);
                Ok(true)
            }
        }
    }

    async fn delete_entity(&self, name: &str) -> Result<bool, BackendError> {
        Ok(self.entities.remove(name).is_some())
    }

    async fn move_entity(
        &self,
        name: &str,
        position: PositionOrientation,
    ) -> Result<bool, BackendError> {
        match self.entities.get_mut(name) {
            Some(mut entry) => {
                *entry.value_mut() = position;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pause_world(&self) -> Result<bool, BackendError> {
        self.paused.store(true, Ordering::SeqCst);
        Ok(true)
    }

    async fn unpause_world(&self) -> Result<bool, BackendError> {
        self.paused.store(false, Ordering::SeqCst);
        Ok(true)
    }

    async fn step_world(&self, steps: u32) -> Result<bool, BackendError> {
        if steps == 0 {
            return Ok(true);
        }
        self.ticks.fetch_add(u64::from(steps), Ordering::SeqCst);
        Ok(true)
    }

    async fn publish_goal(&self, goal: PositionOrientation) -> Result<(), BackendError> {
        let mut last = self
            .last_goal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Some(goal);
        Ok(())
    }
}
