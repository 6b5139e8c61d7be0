//! Default pedestrian actor parameters.
//!
//! Pedestrian tunables are loaded once at startup from the parameter
//! source under a fixed namespace prefix. Each is a [`RandomizedParameter`]:
//! scenario authors may pin a value explicitly, otherwise the configured
//! scalar or a fresh sample from the configured range is used per actor.

use crate::configuration::randomized::{ParameterSource, RandomizedParameter};

/// Namespace prefix the pedestrian defaults are scoped under.
pub const PEDESTRIAN_PARAM_PREFIX: &str =
    "task_generator_node/configuration/pedestrian/default_actor_config";

/// One `RandomizedParameter` per pedestrian tunable, with the stock
/// fallback defaults.
#[derive(Debug, Clone)]
pub struct PedestrianProfile {
    pub vmax: RandomizedParameter<f64>,
    pub start_up_mode: RandomizedParameter<String>,
    pub wait_time: RandomizedParameter<f64>,
    pub trigger_zone_radius: RandomizedParameter<f64>,
    pub chatting_probability: RandomizedParameter<f64>,
    pub tell_story_probability: RandomizedParameter<f64>,
    pub group_talking_probability: RandomizedParameter<f64>,
    pub talking_and_walking_probability: RandomizedParameter<f64>,
    pub requesting_service_probability: RandomizedParameter<f64>,
    pub requesting_guide_probability: RandomizedParameter<f64>,
    pub requesting_follower_probability: RandomizedParameter<f64>,
    pub max_talking_distance: RandomizedParameter<f64>,
    pub max_servicing_radius: RandomizedParameter<f64>,
    pub talking_base_time: RandomizedParameter<f64>,
    pub tell_story_base_time: RandomizedParameter<f64>,
    pub group_talking_base_time: RandomizedParameter<f64>,
    pub talking_and_walking_base_time: RandomizedParameter<f64>,
    pub receiving_service_base_time: RandomizedParameter<f64>,
    pub requesting_service_base_time: RandomizedParameter<f64>,
    pub force_factor_desired: RandomizedParameter<f64>,
    pub force_factor_obstacle: RandomizedParameter<f64>,
    pub force_factor_social: RandomizedParameter<f64>,
    pub force_factor_robot: RandomizedParameter<f64>,
    pub waypoint_mode: RandomizedParameter<i64>,
}

impl PedestrianProfile {
    /// Loads every pedestrian default from the source. One query per key,
    /// performed exactly once; the resulting profile is immutable.
    pub fn load(source: &dyn ParameterSource) -> Self {
        Self::load_with_prefix(source, PEDESTRIAN_PARAM_PREFIX)
    }

    pub fn load_with_prefix(source: &dyn ParameterSource, prefix: &str) -> Self {
        let float = |name: &str, fallback: f64| {
            RandomizedParameter::float_from_source(source, &format!("{prefix}/{name}"), fallback)
        };
        let text = |name: &str, fallback: &str| {
            RandomizedParameter::text_from_source(source, &format!("{prefix}/{name}"), fallback)
        };
        let int = |name: &str, fallback: i64| {
            RandomizedParameter::int_from_source(source, &format!("{prefix}/{name}"), fallback)
        };

        Self {
            vmax: float("VMAX", 0.3),
            start_up_mode: text("START_UP_MODE", "default"),
            wait_time: float("WAIT_TIME", 0.0),
            trigger_zone_radius: float("TRIGGER_ZONE_RADIUS", 0.0),
            chatting_probability: float("CHATTING_PROBABILITY", 0.0),
            tell_story_probability: float("TELL_STORY_PROBABILITY", 0.0),
            group_talking_probability: float("GROUP_TALKING_PROBABILITY", 0.0),
            talking_and_walking_probability: float("TALKING_AND_WALKING_PROBABILITY", 0.0),
            requesting_service_probability: float("REQUESTING_SERVICE_PROBABILITY", 0.0),
            requesting_guide_probability: float("REQUESTING_GUIDE_PROBABILITY", 0.0),
            requesting_follower_probability: float("REQUESTING_FOLLOWER_PROBABILITY", 0.0),
            max_talking_distance: float("MAX_TALKING_DISTANCE", 5.0),
            max_servicing_radius: float("MAX_SERVICING_RADIUS", 5.0),
            talking_base_time: float("TALKING_BASE_TIME", 10.0),
            tell_story_base_time: float("TELL_STORY_BASE_TIME", 0.0),
            group_talking_base_time: float("GROUP_TALKING_BASE_TIME", 10.0),
            talking_and_walking_base_time: float("TALKING_AND_WALKING_BASE_TIME", 6.0),
            receiving_service_base_time: float("RECEIVING_SERVICE_BASE_TIME", 20.0),
            requesting_service_base_time: float("REQUESTING_SERVICE_BASE_TIME", 30.0),
            force_factor_desired: float("FORCE_FACTOR_DESIRED", 1.0),
            force_factor_obstacle: float("FORCE_FACTOR_OBSTACLE", 1.0),
            force_factor_social: float("FORCE_FACTOR_SOCIAL", 5.0),
            force_factor_robot: float("FORCE_FACTOR_ROBOT", 0.0),
            waypoint_mode: int("WAYPOINT_MODE", 0),
        }
    }
}
