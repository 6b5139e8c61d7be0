//! World-level value types: poses, namespaces, and entity descriptors.
//!
//! `PositionOrientation` is the domain's pose representation: a 2D position
//! plus a single yaw angle in radians. Engines that want a full 3D pose get
//! one only at the adapter boundary, via [`Quaternion::from_yaw`].

use serde::{Deserialize, Serialize};

use crate::types::model::EntityModel;

/// Immutable 2D pose: position plus yaw orientation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionOrientation {
    pub x: f64,
    pub y: f64,
    /// Heading in radians, counter-clockwise from the x axis.
    pub orientation: f64,
}

impl PositionOrientation {
    pub fn new(x: f64, y: f64, orientation: f64) -> Self {
        Self { x, y, orientation }
    }
}

/// Engine-native rotation representation.
///
/// The domain only ever rotates about the vertical axis, so this is
/// constructed exclusively through [`Quaternion::from_yaw`] with
/// roll = pitch = 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    /// Yaw-only rotation about the vertical axis (sxyz convention).
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw * 0.5;
        Self {
            x: 0.0,
            y: 0.0,
            z: half.sin(),
            w: half.cos(),
        }
    }
}

/// Slash-joined naming helper for worlds, topics, and services.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(ns: impl Into<String>) -> Self {
        Self(ns.into())
    }

    /// Appends a path segment, normalizing duplicate slashes.
    pub fn join(&self, segment: &str) -> Namespace {
        let base = self.0.trim_end_matches('/');
        let seg = segment.trim_start_matches('/');
        if base.is_empty() {
            Namespace(format!("/{seg}"))
        } else {
            Namespace(format!("{base}/{seg}"))
        }
    }

    /// Derives a node-safe identifier: slashes become underscores, with a
    /// fallback name when the namespace is empty.
    pub fn node_name(&self, fallback: &str) -> String {
        let name = self.0.trim_matches('/').replace('/', "_");
        if name.is_empty() {
            fallback.to_string()
        } else {
            name
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Namespace::new(s)
    }
}

/// Distinguishes robots from obstacles when spawning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Robot,
    StaticObstacle,
    DynamicObstacle,
}

/// Everything a backend needs to realize one entity in its world.
///
/// `name` must be unique within the world; a colliding spawn is reported by
/// the backend as a `false` result, not an error. The model description is
/// owned by the descriptor and read-only after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub name: String,
    pub kind: EntityKind,
    pub model: EntityModel,
    pub position: PositionOrientation,
}

impl EntityDescriptor {
    pub fn is_robot(&self) -> bool {
        matches!(self.kind, EntityKind::Robot)
    }
}
