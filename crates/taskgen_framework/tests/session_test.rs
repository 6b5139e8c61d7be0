//! Integration tests for episode-session sequencing: reset-failure
//! budgeting and the desired-episodes budget.

use std::sync::Arc;

use taskgen_framework::configuration::{ConfigStore, ReconfigureRequest};
use taskgen_framework::generation::session::{EpisodeSession, SessionError};
use taskgen_framework::simulation::in_process::InProcessBackend;
use taskgen_types::prelude::{
    EntityDescriptor, EntityKind, EntityModel, ModelType, Namespace, PositionOrientation,
};

fn robot(name: &str) -> EntityDescriptor {
    EntityDescriptor {
        name: name.to_string(),
        kind: EntityKind::Robot,
        model: EntityModel::new(ModelType::Urdf, "<robot/>"),
        position: PositionOrientation::new(0.0, 0.0, 0.0),
    }
}

fn session(config: Arc<ConfigStore>) -> EpisodeSession {
    let backend = Box::new(InProcessBackend::new(Namespace::new("/sim_1")));
    EpisodeSession::new(backend, config)
}

#[tokio::test]
async fn successful_reset_spawns_world_and_counts_episode() {
    let config = Arc::new(ConfigStore::with_seed(1));
    let mut session = session(config);

    session
        .reset(|backend| async move { backend.spawn_entity(&robot("jackal")).await })
        .await
        .expect("reset");

    assert_eq!(session.episodes_started(), 1);
}

#[tokio::test]
async fn structured_failures_exhaust_the_reset_budget() {
    let config = Arc::new(ConfigStore::with_seed(1));
    let mut session = session(Arc::clone(&config));

    // spawn the name once so that every retry collides
    session
        .reset(|backend| async move { backend.spawn_entity(&robot("jackal")).await })
        .await
        .expect("first reset");

    let err = session
        .reset(|backend| async move { backend.spawn_entity(&robot("jackal")).await })
        .await
        .unwrap_err();

    let max = config.get().general.max_reset_fail_times;
    match err {
        SessionError::ResetLimit { attempts } => assert_eq!(attempts, max),
        other => panic!("expected ResetLimit, got {other:?}"),
    }
}

#[tokio::test]
async fn desired_episode_budget_is_enforced() {
    let config = Arc::new(ConfigStore::with_seed(1));
    config.reconfigure(ReconfigureRequest {
        random_seed: 1,
        episodes: 2,
        goal_radius: 1.0,
        goal_tolerance_angle: 0.5,
        timeout: -1.0,
    });
    let mut session = session(config);

    for i in 0..2 {
        let name = format!("robot_{i}");
        session
            .reset(|backend| {
                let name = name.clone();
                async move { backend.spawn_entity(&robot(&name)).await }
            })
            .await
            .expect("reset within budget");
    }

    let err = session
        .reset(|backend| async move { backend.spawn_entity(&robot("overflow")).await })
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::EpisodeBudgetExhausted));
}

#[tokio::test]
async fn infinite_timeout_maps_to_no_episode_deadline() {
    let config = Arc::new(ConfigStore::with_seed(1));
    let session = session(Arc::clone(&config));
    assert!(session.episode_timeout().is_none());

    config.reconfigure(ReconfigureRequest {
        random_seed: 1,
        episodes: -1,
        goal_radius: 1.0,
        goal_tolerance_angle: 0.5,
        timeout: 12.5,
    });
    assert_eq!(
        session.episode_timeout(),
        Some(std::time::Duration::from_secs_f64(12.5))
    );
}
