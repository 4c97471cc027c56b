//! Arena of named scene nodes.
//!
//! The timeline and procedural layers never hold references into a rendering
//! backend; they write into this arena by node id and a separate render-sync
//! step pushes the results out.

use std::collections::{BTreeSet, HashMap};

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::{check_finite, ConfigError};
use crate::timeline::{Property, PropertyValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Transform and material state of one node.
///
/// `float_offset`/`float_rotation` describe an idle-bob wrapper transform
/// applied outside the node's own transform; they are rewritten every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "unit")]
    pub scale: f32,
    #[serde(default = "unit")]
    pub opacity: f32,
    #[serde(default = "white")]
    pub color: Rgb,
    #[serde(default = "black")]
    pub emissive: Rgb,
    #[serde(default)]
    pub emissive_intensity: f32,
    #[serde(default, skip_deserializing)]
    pub float_offset: [f32; 3],
    #[serde(default, skip_deserializing)]
    pub float_rotation: [f32; 3],
}

fn unit() -> f32 {
    1.0
}

fn white() -> Rgb {
    Rgb::WHITE
}

fn black() -> Rgb {
    Rgb::BLACK
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: 1.0,
            opacity: 1.0,
            color: Rgb::WHITE,
            emissive: Rgb::BLACK,
            emissive_intensity: 0.0,
            float_offset: [0.0; 3],
            float_rotation: [0.0; 3],
        }
    }
}

impl NodeState {
    pub fn set_property(&mut self, property: Property, value: f32) {
        match property {
            Property::Scale => self.scale = value,
            Property::Opacity => self.opacity = value,
            Property::PositionX => self.position[0] = value,
            Property::PositionY => self.position[1] = value,
            Property::PositionZ => self.position[2] = value,
            Property::RotationX => self.rotation[0] = value,
            Property::RotationY => self.rotation[1] = value,
            Property::RotationZ => self.rotation[2] = value,
            Property::EmissiveIntensity => self.emissive_intensity = value,
        }
    }

    /// Local-to-world transform: float wrapper first, then translate, rotate
    /// (XYZ order) and uniformly scale.
    pub fn model_matrix(&self) -> Mat4 {
        let wrapper = Mat4::from_rotation_translation(
            euler(self.float_rotation),
            Vec3::from_array(self.float_offset),
        );
        let local = Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            euler(self.rotation),
            Vec3::from_array(self.position),
        );
        wrapper * local
    }

    pub fn world_position(&self) -> Vec3 {
        self.model_matrix().transform_point3(Vec3::ZERO)
    }

    pub(crate) fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let context = format!("node {name}");
        check_finite(&context, &self.position)?;
        check_finite(&context, &self.rotation)?;
        check_finite(
            &context,
            &[self.scale, self.opacity, self.emissive_intensity],
        )
    }
}

fn euler(angles: [f32; 3]) -> Quat {
    Quat::from_euler(EulerRot::XYZ, angles[0], angles[1], angles[2])
}

/// Dense storage for every node the scene declares, with the rest pose kept
/// aside so a remount can start from scratch.
#[derive(Debug, Clone, Default)]
pub struct SceneArena {
    names: Vec<String>,
    index: HashMap<String, NodeId>,
    rest: Vec<NodeState>,
    nodes: Vec<NodeState>,
    reported_missing: BTreeSet<String>,
}

impl SceneArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, rest: NodeState) -> Result<NodeId, ConfigError> {
        if self.index.contains_key(name) {
            return Err(ConfigError::DuplicateNode(name.to_string()));
        }
        rest.validate(name)?;
        let id = NodeId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        self.nodes.push(rest.clone());
        self.rest.push(rest);
        Ok(id)
    }

    pub fn id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Looks up `name`, logging the first miss for each name so a missing
    /// target is reported without flooding the log every frame.
    pub fn resolve(&mut self, name: &str) -> Option<NodeId> {
        let id = self.id(name);
        if id.is_none() {
            self.report_missing(name, "scene arena");
        }
        id
    }

    pub fn report_missing(&mut self, name: &str, origin: &str) {
        if self.reported_missing.insert(name.to_string()) {
            log::warn!("{origin}: no scene node named `{name}`; skipping it");
        }
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.names[id.index()]
    }

    pub fn node(&self, id: NodeId) -> &NodeState {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeState {
        &mut self.nodes[id.index()]
    }

    pub fn get(&self, name: &str) -> Option<&NodeState> {
        self.id(name).map(|id| self.node(id))
    }

    pub fn rest(&self, id: NodeId) -> &NodeState {
        &self.rest[id.index()]
    }

    /// Writes keyframed values; unknown targets are reported and skipped.
    pub fn apply_keyframes(&mut self, values: &PropertyValues) {
        for (target, property, value) in values.iter() {
            if let Some(id) = self.resolve(target) {
                self.node_mut(id).set_property(property, value);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &str, &NodeState)> {
        self.names
            .iter()
            .zip(self.nodes.iter())
            .enumerate()
            .map(|(idx, (name, node))| (NodeId(idx as u32), name.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn reset(&mut self) {
        self.nodes.clone_from(&self.rest);
        self.reported_missing.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{Segment, Timeline};

    #[test]
    fn keyframes_land_on_named_nodes() {
        let mut arena = SceneArena::new();
        let star = arena.insert("star", NodeState::default()).expect("insert");
        let timeline = Timeline::new(vec![
            Segment::new("star", Property::Scale, (0.0, 2.0), (0.0, 1.0)),
            Segment::new("ghost", Property::Opacity, (1.0, 0.0), (0.0, 1.0)),
        ])
        .expect("valid timeline");

        arena.apply_keyframes(&timeline.evaluate(1.0));

        assert_eq!(arena.node(star).scale, 2.0);
        assert_eq!(arena.len(), 1);
        assert!(arena.reported_missing.contains("ghost"));
    }

    #[test]
    fn duplicate_nodes_are_rejected() {
        let mut arena = SceneArena::new();
        arena.insert("planet", NodeState::default()).expect("insert");
        assert!(matches!(
            arena.insert("planet", NodeState::default()),
            Err(ConfigError::DuplicateNode(_))
        ));
    }

    #[test]
    fn reset_restores_rest_pose() {
        let mut arena = SceneArena::new();
        let rest = NodeState {
            scale: 0.5,
            ..NodeState::default()
        };
        let id = arena.insert("disk", rest.clone()).expect("insert");
        arena.node_mut(id).rotation[1] = 3.0;
        arena.reset();
        assert_eq!(arena.node(id), &rest);
    }

    #[test]
    fn world_position_includes_float_wrapper() {
        let node = NodeState {
            position: [1.1, 0.0, 0.0],
            float_offset: [0.0, 0.25, 0.0],
            ..NodeState::default()
        };
        let world = node.world_position();
        assert!((world - Vec3::new(1.1, 0.25, 0.0)).length() < 1e-6);
    }
}
