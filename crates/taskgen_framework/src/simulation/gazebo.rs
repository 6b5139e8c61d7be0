//! Gazebo-style backend adapter.
//!
//! Translates the [`SimulatorBackend`] contract into the engine's remote
//! service surface: entity creation/removal/pose services and a world
//! control service, plus a namespaced goal topic. Domain poses are
//! converted to the engine's 3D pose (position + quaternion) here and
//! nowhere else.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use taskgen_types::prelude::{
    EntityDescriptor, Namespace, PositionOrientation, Quaternion,
};

use crate::configuration::ConfigStore;
use crate::simulation::transport::{
    call_with_deadline, ServiceTransport, TransportFault,
};
use crate::simulation::{BackendError, BackendState, SimulatorBackend};

/// World namespace the engine exposes its services under.
const WORLD_NAMESPACE: &str = "/world/default";

#[derive(Debug, Clone)]
struct GazeboServices {
    create: String,
    remove: String,
    set_pose: String,
    control: String,
}

impl GazeboServices {
    fn for_world(world: &Namespace) -> Self {
        Self {
            create: world.join("create").as_str().to_string(),
            remove: world.join("remove").as_str().to_string(),
            set_pose: world.join("set_pose").as_str().to_string(),
            control: world.join("control").as_str().to_string(),
        }
    }

    fn all(&self) -> [&str; 4] {
        [&self.create, &self.remove, &self.set_pose, &self.control]
    }
}

struct HandleState {
    state: BackendState,
    fault: Option<String>,
    last_failure: Option<String>,
}

/// Backend handle bound to one simulation world at construction.
pub struct GazeboBackend {
    namespace: Namespace,
    config: Arc<ConfigStore>,
    transport: Arc<dyn ServiceTransport>,
    services: GazeboServices,
    goal_topic: String,
    handle: Mutex<HandleState>,
}

// ---- engine payload schemas -------------------------------------------------

#[derive(Serialize)]
struct PointMsg {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Serialize)]
struct PoseMsg {
    position: PointMsg,
    orientation: Quaternion,
}

impl PoseMsg {
    fn from_position(position: &PositionOrientation) -> Self {
        Self {
            position: PointMsg {
                x: position.x,
                y: position.y,
                z: 0.0,
            },
            orientation: Quaternion::from_yaw(position.orientation),
        }
    }
}

#[derive(Serialize)]
struct EntityFactoryMsg<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    model_type: &'a str,
    sdf: &'a str,
    pose: PoseMsg,
}

#[derive(Serialize)]
struct SpawnEntityMsg<'a> {
    entity_factory: EntityFactoryMsg<'a>,
}

#[derive(Serialize)]
struct DeleteEntityMsg<'a> {
    entity: &'a str,
}

#[derive(Serialize)]
struct SetEntityPoseMsg<'a> {
    entity: &'a str,
    pose: PoseMsg,
}

#[derive(Serialize, Default)]
struct WorldControlMsg {
    #[serde(skip_serializing_if = "Option::is_none")]
    pause: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    multi_step: Option<u32>,
}

#[derive(Serialize)]
struct WorldControlRequestMsg {
    world_control: WorldControlMsg,
}

#[derive(Serialize)]
struct HeaderMsg<'a> {
    frame_id: &'a str,
}

#[derive(Serialize)]
struct PoseStampedMsg<'a> {
    header: HeaderMsg<'a>,
    pose: PoseMsg,
}

fn payload<T: Serialize>(msg: &T) -> Result<Value, TransportFault> {
    serde_json::to_value(msg).map_err(|e| TransportFault::Protocol(e.to_string()))
}

/// The configured wait bound doubles as the per-call deadline. A negative
/// or non-finite value is a configuration error, never a panic.
fn service_timeout(config: &ConfigStore) -> Result<Duration, BackendError> {
    let secs = config.get().general.wait_for_service_timeout;
    Duration::try_from_secs_f64(secs).map_err(|_| BackendError::InvalidServiceTimeout(secs))
}

// -----------------------------------------------------------------------------

impl GazeboBackend {
    /// Connects to the engine, blocking until every required service
    /// reports available. The wait is bounded by the configured
    /// `wait_for_service_timeout`; exceeding it is a construction failure
    /// and the handle never reaches `Ready`.
    pub async fn connect(
        namespace: Namespace,
        config: Arc<ConfigStore>,
        transport: Arc<dyn ServiceTransport>,
    ) -> Result<Self, BackendError> {
        let services = GazeboServices::for_world(&Namespace::new(WORLD_NAMESPACE));
        let goal_topic = namespace.join("goal").as_str().to_string();
        let timeout = service_timeout(&config)?;

        info!(
            "[GazeboBackend] Waiting for gazebo services (namespace {})...",
            namespace
        );
        for service in services.all() {
            transport
                .wait_for_service(service, timeout)
                .await
                .map_err(|fault| match fault {
                    TransportFault::Timeout { service, timeout } => {
                        BackendError::ServiceUnavailable { service, timeout }
                    }
                    other => BackendError::Transport(other),
                })?;
        }
        info!("[GazeboBackend] Gazebo services are available now.");

        Ok(Self {
            namespace,
            config,
            transport,
            services,
            goal_topic,
            handle: Mutex::new(HandleState {
                state: BackendState::Ready,
                fault: None,
                last_failure: None,
            }),
        })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn set_state(&self, state: BackendState) {
        let mut handle = self
            .handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        handle.state = state;
    }

    fn fault_handle(&self, fault: &TransportFault) {
        let mut handle = self
            .handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        handle.state = BackendState::Faulted;
        handle.fault = Some(fault.to_string());
    }

    fn ensure_available(&self) -> Result<(), BackendError> {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if handle.state == BackendState::Faulted {
            return Err(BackendError::Unavailable {
                reason: handle
                    .fault
                    .clone()
                    .unwrap_or_else(|| "handle is faulted".to_string()),
            });
        }
        Ok(())
    }

    fn call_deadline(&self) -> Result<Duration, BackendError> {
        service_timeout(&self.config)
    }

    fn record_failure(&self, status: Option<String>) {
        let mut handle = self
            .handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        handle.last_failure = status;
    }

    /// One blocking call: issue the request, await completion, normalize
    /// the outcome. A structured `false` keeps the handle usable and its
    /// engine-provided reason is retained for [`SimulatorBackend::last_failure`];
    /// a transport fault moves the handle to `Faulted` and surfaces as
    /// "backend unavailable".
    async fn call_blocking(&self, service: &str, request: Value) -> Result<bool, BackendError> {
        self.ensure_available()?;
        let deadline = self.call_deadline()?;
        match call_with_deadline(self.transport.as_ref(), service, request, deadline).await {
            Ok(reply) => {
                if reply.success {
                    self.record_failure(None);
                } else {
                    warn!(
                        "[GazeboBackend] `{service}` reported failure: {}",
                        reply.status.as_deref().unwrap_or("no reason given")
                    );
                    self.record_failure(reply.status.clone());
                }
                Ok(reply.success)
            }
            Err(fault) => {
                self.fault_handle(&fault);
                Err(BackendError::Unavailable {
                    reason: fault.to_string(),
                })
            }
        }
    }

    async fn control_world(&self, control: WorldControlMsg) -> Result<bool, BackendError> {
        let request = payload(&WorldControlRequestMsg {
            world_control: control,
        })?;
        self.call_blocking(&self.services.control, request).await
    }
}

#[async_trait]
impl SimulatorBackend for GazeboBackend {
    fn state(&self) -> BackendState {
        self.handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .state
    }

    fn last_failure(&self) -> Option<String> {
        self.handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .last_failure
            .clone()
    }

    async fn before_episode_reset(&self) -> Result<(), BackendError> {
        self.pause_world().await?;
        self.set_state(BackendState::Ready);
        Ok(())
    }

    async fn after_episode_reset(&self) -> Result<(), BackendError> {
        self.ensure_available()?;
        // The engine's control channel is documented as occasionally
        // unreliable; a failed resume must not abort episode generation,
        // so the raw transport is used here and faults stay local.
        let request = payload(&WorldControlRequestMsg {
            world_control: WorldControlMsg {
                pause: Some(false),
                multi_step: None,
            },
        })?;
        match call_with_deadline(
            self.transport.as_ref(),
            &self.services.control,
            request,
            self.call_deadline()?,
        )
        .await
        {
            Ok(reply) if !reply.success => {
                warn!(
                    "[GazeboBackend] world resume reported failure: {}",
                    reply.status.as_deref().unwrap_or("no reason given")
                );
            }
            Ok(_) => {}
            Err(fault) => {
                warn!("[GazeboBackend] world resume transport fault (ignored): {fault}");
            }
        }
        self.set_state(BackendState::EpisodeActive);
        Ok(())
    }

    async fn spawn_entity(&self, entity: &EntityDescriptor) -> Result<bool, BackendError> {
        let request = payload(&SpawnEntityMsg {
            entity_factory: EntityFactoryMsg {
                name: &entity.name,
                model_type: entity.model.model_type.as_str(),
                sdf: &entity.model.description,
                pose: PoseMsg::from_position(&entity.position),
            },
        })?;
        if entity.is_robot() {
            debug!(
                "[GazeboBackend] spawning robot `{}` under namespace {}",
                entity.name, self.namespace
            );
        }
        self.call_blocking(&self.services.create, request).await
    }

    async fn delete_entity(&self, name: &str) -> Result<bool, BackendError> {
        let request = payload(&DeleteEntityMsg { entity: name })?;
        self.call_blocking(&self.services.remove, request).await
    }

    async fn move_entity(
        &self,
        name: &str,
        position: PositionOrientation,
    ) -> Result<bool, BackendError> {
        let request = payload(&SetEntityPoseMsg {
            entity: name,
            pose: PoseMsg::from_position(&position),
        })?;
        self.call_blocking(&self.services.set_pose, request).await
    }

    async fn pause_world(&self) -> Result<bool, BackendError> {
        self.control_world(WorldControlMsg {
            pause: Some(true),
            multi_step: None,
        })
        .await
    }

    async fn unpause_world(&self) -> Result<bool, BackendError> {
        self.control_world(WorldControlMsg {
            pause: Some(false),
            multi_step: None,
        })
        .await
    }

    async fn step_world(&self, steps: u32) -> Result<bool, BackendError> {
        if steps == 0 {
            return Ok(true);
        }
        self.control_world(WorldControlMsg {
            pause: None,
            multi_step: Some(steps),
        })
        .await
    }

    async fn publish_goal(&self, goal: PositionOrientation) -> Result<(), BackendError> {
        self.ensure_available()?;
        let request = payload(&PoseStampedMsg {
            header: HeaderMsg { frame_id: "map" },
            pose: PoseMsg::from_position(&goal),
        })?;
        self.transport
            .publish(&self.goal_topic, request)
            .await
            .map_err(BackendError::Transport)
    }
}
