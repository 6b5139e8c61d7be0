//! Simulation backend abstraction.
//!
//! Every physics-engine adapter implements [`SimulatorBackend`], a uniform
//! capability contract for spawning, moving, and deleting entities and for
//! pausing, resuming, and stepping the world. The task-generation flow
//! obtains a handle through [`BackendRegistry`] using a configured
//! identifier and never branches on a concrete engine type.
//!
//! Call semantics: each operation issues exactly one outbound call and
//! awaits its completion before returning. No two in-flight calls of the
//! same operation kind are permitted on the same handle; this is a
//! contract of the interface, not an accident of the transport.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use taskgen_types::prelude::{EntityDescriptor, Namespace, PositionOrientation};

use crate::configuration::ConfigStore;
use crate::simulation::transport::{ServiceTransport, TransportFault};

pub mod gazebo;
pub mod in_process;
pub mod transport;

/// Lifecycle of one backend handle.
///
/// `Constructing -> Ready` happens only after every remote service the
/// adapter depends on reports available. `Ready <-> EpisodeActive` is
/// driven by the episode-reset hooks. Any unrecoverable transport failure
/// moves the handle to `Faulted`; a faulted handle rejects all further
/// operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Constructing,
    Ready,
    EpisodeActive,
    Faulted,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend `{0}` is not registered")]
    NotRegistered(String),
    #[error("service `{service}` not ready within {timeout:?}")]
    ServiceUnavailable { service: String, timeout: Duration },
    #[error("invalid service timeout {0}: must be a finite, non-negative number of seconds")]
    InvalidServiceTimeout(f64),
    #[error("backend unavailable: {reason}")]
    Unavailable { reason: String },
    #[error(transparent)]
    Transport(#[from] TransportFault),
}

/// Capability contract every physics-engine adapter must satisfy.
///
/// Operations returning `Ok(false)` report a structured, expected failure
/// (name collision, unknown entity); the handle stays usable. A transport
/// fault is normalized into [`BackendError::Unavailable`] and faults the
/// handle, except inside [`SimulatorBackend::after_episode_reset`], which
/// swallows and logs resume failures by contract.
#[async_trait]
pub trait SimulatorBackend: Send + Sync {
    fn state(&self) -> BackendState;

    /// Hook invoked before world state is torn down; default adapters
    /// pause the world here.
    async fn before_episode_reset(&self) -> Result<(), BackendError>;

    /// Hook invoked after reset; default adapters resume the world here.
    /// Transport failures of the resume call are logged, never propagated:
    /// resumption hiccups must not abort episode generation.
    async fn after_episode_reset(&self) -> Result<(), BackendError>;

    /// Spawns one entity. A name collision surfaces as `Ok(false)`, and a
    /// retry with a unique name is safe.
    async fn spawn_entity(&self, entity: &EntityDescriptor) -> Result<bool, BackendError>;

    /// Deletes an entity by name; deleting a non-existent entity is
    /// `Ok(false)`, not a crash.
    async fn delete_entity(&self, name: &str) -> Result<bool, BackendError>;

    /// Teleports an entity. The yaw is converted to the engine's native
    /// rotation representation at the adapter boundary, never upstream.
    async fn move_entity(
        &self,
        name: &str,
        position: PositionOrientation,
    ) -> Result<bool, BackendError>;

    /// Idempotent: pausing an already-paused world is not an error.
    async fn pause_world(&self) -> Result<bool, BackendError>;

    /// Idempotent, mirroring [`SimulatorBackend::pause_world`].
    async fn unpause_world(&self) -> Result<bool, BackendError>;

    /// Advances simulation time by exactly `steps` discrete ticks.
    /// `steps == 0` completes immediately without an engine call.
    async fn step_world(&self, steps: u32) -> Result<bool, BackendError>;

    /// Fire-and-forget goal broadcast; no acknowledgement is awaited.
    /// A publish failure does not fault the handle.
    async fn publish_goal(&self, goal: PositionOrientation) -> Result<(), BackendError>;

    /// Engine-provided reason for the most recent structured `false`
    /// result, when the adapter retains one. Cleared by the next
    /// successful call on the handle.
    fn last_failure(&self) -> Option<String> {
        None
    }
}

/// Closed set of built-in backend identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulatorKind {
    Gazebo,
    InProcess,
}

impl std::str::FromStr for SimulatorKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gazebo" => Ok(SimulatorKind::Gazebo),
            "in_process" => Ok(SimulatorKind::InProcess),
            other => Err(BackendError::NotRegistered(other.to_string())),
        }
    }
}

impl SimulatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulatorKind::Gazebo => "gazebo",
            SimulatorKind::InProcess => "in_process",
        }
    }
}

pub type ConstructorFuture =
    Pin<Box<dyn Future<Output = Result<Box<dyn SimulatorBackend>, BackendError>> + Send>>;

/// Maps a world namespace to a fully constructed backend handle.
pub type BackendConstructor = Arc<dyn Fn(Namespace) -> ConstructorFuture + Send + Sync>;

/// Maps backend identifiers to constructors, decoupling callers from
/// concrete adapters. Registration is static, one-time per process;
/// unknown identifiers fail at construction time, not at first use.
pub struct BackendRegistry {
    constructors: DashMap<String, BackendConstructor>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            constructors: DashMap::new(),
        }
    }

    /// Registry preloaded with the built-in adapters: `gazebo` against the
    /// given transport, and the transport-free `in_process` world.
    pub fn with_builtin(config: Arc<ConfigStore>, engine: Arc<dyn ServiceTransport>) -> Self {
        let registry = Self::new();

        let gazebo_config = Arc::clone(&config);
        registry.register(SimulatorKind::Gazebo.as_str(), move |namespace| {
            let config = Arc::clone(&gazebo_config);
            let engine = Arc::clone(&engine);
            Box::pin(async move {
                let backend = gazebo::GazeboBackend::connect(namespace, config, engine).await?;
                Ok(Box::new(backend) as Box<dyn SimulatorBackend>)
            })
        });

        registry.register(SimulatorKind::InProcess.as_str(), move |namespace| {
            Box::pin(async move {
                Ok(Box::new(in_process::InProcessBackend::new(namespace))
                    as Box<dyn SimulatorBackend>)
            })
        });

        registry
    }

    pub fn register<F>(&self, id: impl Into<String>, constructor: F)
    where
        F: Fn(Namespace) -> ConstructorFuture + Send + Sync + 'static,
    {
        self.constructors.insert(id.into(), Arc::new(constructor));
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    /// Constructs a backend for the identifier, bound to one world
    /// namespace. Fails fast with [`BackendError::NotRegistered`] before
    /// any construction work when the identifier is unknown.
    pub async fn create(
        &self,
        id: &str,
        namespace: Namespace,
    ) -> Result<Box<dyn SimulatorBackend>, BackendError> {
        let constructor = self
            .constructors
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BackendError::NotRegistered(id.to_string()))?;
        constructor(namespace).await
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulator_kind_round_trips() {
        for kind in [SimulatorKind::Gazebo, SimulatorKind::InProcess] {
            assert_eq!(kind.as_str().parse::<SimulatorKind>().unwrap(), kind);
        }
        assert!("flatland-2".parse::<SimulatorKind>().is_err());
    }
}
