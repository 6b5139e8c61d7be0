//! # Taskgen Framework Structure
//! Taskgen generates randomized robot-navigation training and evaluation
//! episodes (robots, obstacles, pedestrians) and drives one of several
//! interchangeable physics-simulation backends to realize them.
//!
//! The framework is organized into the following submodules:
//!
//! - **Simulation Modules** (`simulation::*`): The capability contract every
//!   physics-engine adapter must satisfy, the registry that maps backend
//!   identifiers to constructors, and the concrete adapters (a Gazebo-style
//!   remote-service adapter and an in-process adapter for headless runs).
//! - **Configuration Modules** (`configuration::*`): The process-wide
//!   configuration store holding the shared RNG stream and per-domain
//!   tunables, the live-reconfiguration entry point, and the lazily sampled
//!   randomized parameters used for pedestrian defaults.
//! - **Generation Modules** (`generation::*`): The episode-session helper
//!   that sequences reset hooks and enforces the reset-failure budget.
//!
//! ## Backend selection
//!
//! Callers never branch on a concrete engine type. A configured identifier
//! is resolved through [`simulation::BackendRegistry`], and every world
//! operation flows through the [`simulation::SimulatorBackend`] trait. Each
//! operation issues one remote call and awaits its completion before
//! returning, so a handle never has two in-flight calls of the same kind.

/// **Simulation Modules**: Backend contract, registry, and adapters.
pub mod simulation;

/// **Configuration Modules**: Config store, reconfiguration, randomized
/// parameters, and the pedestrian parameter profile.
pub mod configuration;

/// **Generation Modules**: Episode sequencing built on top of a backend.
pub mod generation;

/// **System Utilities**: Observability wiring (logging initialization).
pub mod utilities {
    pub mod observability;
}

pub mod prelude {
    pub mod config {
        pub use crate::configuration::randomized::{
            MapParameterSource, ParameterSource, ParameterValue, RandomizedParameter,
        };
        pub use crate::configuration::{
            ConfigStore, ConfigurationError, GeneralConfig, ObstacleConfig, ReconfigureRequest,
            RobotConfig, TaskConfig, TaskConfigLoader,
        };
        pub use crate::configuration::pedestrian::PedestrianProfile;
    }
    pub mod simulation {
        pub use crate::simulation::gazebo::GazeboBackend;
        pub use crate::simulation::in_process::InProcessBackend;
        pub use crate::simulation::transport::{
            ServiceReply, ServiceTransport, TransportFault,
        };
        pub use crate::simulation::{
            BackendError, BackendRegistry, BackendState, SimulatorBackend, SimulatorKind,
        };
    }
    pub mod generation {
        pub use crate::generation::session::{EpisodeSession, SessionError};
    }
}
