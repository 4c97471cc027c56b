//! Projects 3D anchor points into overlay coordinates every frame.

use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::CameraProjector;
use crate::error::{check_finite, check_window, ConfigError};
use crate::scene::SceneArena;
use crate::store::{AnnotationPatch, SharedState};

/// Where the callout's leader line points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderTarget {
    Point([f32; 3]),
    Node(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub id: String,
    pub position: [f32; 3],
    /// When set, the anchor rides on this node's live world position instead
    /// of `position`.
    #[serde(default)]
    pub follow: Option<String>,
    #[serde(default)]
    pub leader: Option<LeaderTarget>,
    pub window: [f32; 2],
}

impl AnchorPoint {
    pub fn new(id: impl Into<String>, position: [f32; 3], window: [f32; 2]) -> Self {
        Self {
            id: id.into(),
            position,
            follow: None,
            leader: None,
            window,
        }
    }

    pub fn with_leader(mut self, leader: LeaderTarget) -> Self {
        self.leader = Some(leader);
        self
    }

    pub fn following(mut self, node: impl Into<String>) -> Self {
        self.follow = Some(node.into());
        self
    }

    /// Inclusive on both ends.
    pub fn is_visible(&self, progress: f32) -> bool {
        progress >= self.window[0] && progress <= self.window[1]
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let context = format!("anchor {}", self.id);
        check_finite(&context, &self.position)?;
        if let Some(LeaderTarget::Point(point)) = &self.leader {
            check_finite(&context, point)?;
        }
        check_window(&context, self.window[0], self.window[1])
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationProjector {
    anchors: Vec<AnchorPoint>,
}

impl AnnotationProjector {
    pub fn new(anchors: Vec<AnchorPoint>) -> Result<Self, ConfigError> {
        let mut seen = BTreeSet::new();
        for anchor in &anchors {
            anchor.validate()?;
            if !seen.insert(anchor.id.as_str()) {
                return Err(ConfigError::DuplicateAnchor(anchor.id.clone()));
            }
        }
        Ok(Self { anchors })
    }

    pub fn anchors(&self) -> &[AnchorPoint] {
        &self.anchors
    }

    /// Writes visibility and, when `camera` is available, screen positions for
    /// every anchor into `state`. Coordinates are not clipped to the viewport.
    pub fn project_all(
        &self,
        progress: f32,
        camera: Option<&CameraProjector>,
        arena: &mut SceneArena,
        state: &mut SharedState,
    ) {
        for anchor in &self.anchors {
            let mut patch = AnnotationPatch::visibility(anchor.is_visible(progress));

            if let Some(camera) = camera {
                let position = match anchor.follow.as_deref() {
                    Some(node) => live_position(arena, node),
                    None => Some(Vec3::from_array(anchor.position)),
                };
                match position.and_then(|position| camera.project_to_screen(position)) {
                    Some(screen) => patch = patch.position(screen.x, screen.y),
                    None => log::debug!("anchor {} did not project this frame", anchor.id),
                }

                let leader = match &anchor.leader {
                    Some(LeaderTarget::Point(point)) => Some(Vec3::from_array(*point)),
                    Some(LeaderTarget::Node(node)) => live_position(arena, node),
                    None => None,
                };
                if let Some(screen) = leader.and_then(|target| camera.project_to_screen(target)) {
                    patch = patch.leader([screen.x, screen.y]);
                }
            }

            state.update_annotation(&anchor.id, patch);
        }
    }
}

fn live_position(arena: &mut SceneArena, node: &str) -> Option<Vec3> {
    let id = arena.resolve(node)?;
    Some(arena.node(id).world_position())
}
