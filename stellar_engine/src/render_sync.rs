//! Pushes computed node state out to a rendering backend.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::error::SceneError;
use crate::scene::{NodeState, SceneArena};

/// Receiver for per-frame node state. Implementations own the real scene
/// objects; `apply` returns `false` when the backend has no object by that
/// name.
pub trait SceneBackend {
    fn begin_frame(&mut self, _frame: u64) -> Result<(), SceneError> {
        Ok(())
    }

    fn apply(&mut self, name: &str, state: &NodeState) -> bool;

    fn end_frame(&mut self, _frame: u64) -> Result<(), SceneError> {
        Ok(())
    }
}

/// Sends every arena node to `backend`, reporting (once) and skipping the
/// ones the backend does not know. Returns the number of nodes applied.
pub fn sync_to_backend(
    frame: u64,
    arena: &mut SceneArena,
    backend: &mut dyn SceneBackend,
) -> Result<usize, SceneError> {
    backend.begin_frame(frame)?;
    let mut applied = 0;
    let mut missing = Vec::new();
    for (_, name, state) in arena.iter() {
        if backend.apply(name, state) {
            applied += 1;
        } else {
            missing.push(name.to_string());
        }
    }
    for name in missing {
        arena.report_missing(&name, "render sync");
    }
    backend.end_frame(frame)?;
    Ok(applied)
}

/// GPU-ready per-node record: column-major model matrix, RGBA base colour and
/// emissive colour with intensity in `w`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct NodeInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub emissive: [f32; 4],
}

impl NodeInstance {
    pub fn from_state(state: &NodeState) -> Self {
        let [r, g, b] = state.color.to_array();
        let [er, eg, eb] = state.emissive.to_array();
        Self {
            model: state.model_matrix().to_cols_array_2d(),
            color: [r, g, b, state.opacity.clamp(0.0, 1.0)],
            emissive: [er, eg, eb, state.emissive_intensity],
        }
    }
}

/// Instance buffer backend with one fixed slot per known object.
#[derive(Debug, Clone, Default)]
pub struct InstanceBuffer {
    slots: HashMap<String, usize>,
    instances: Vec<NodeInstance>,
    frame: u64,
}

impl InstanceBuffer {
    pub fn new<I, S>(objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut slots = HashMap::new();
        let mut instances = Vec::new();
        for name in objects {
            let name = name.into();
            if slots.contains_key(&name) {
                continue;
            }
            slots.insert(name, instances.len());
            instances.push(NodeInstance::zeroed());
        }
        Self {
            slots,
            instances,
            frame: 0,
        }
    }

    pub fn for_arena(arena: &SceneArena) -> Self {
        Self::new(arena.iter().map(|(_, name, _)| name.to_string()))
    }

    pub fn instance(&self, name: &str) -> Option<&NodeInstance> {
        self.slots.get(name).map(|slot| &self.instances[*slot])
    }

    pub fn instances(&self) -> &[NodeInstance] {
        &self.instances
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn last_frame(&self) -> u64 {
        self.frame
    }
}

impl SceneBackend for InstanceBuffer {
    /// Frame numbers must advance; frame 1 is always accepted since a driver
    /// restarts its count after an unmount.
    fn begin_frame(&mut self, frame: u64) -> Result<(), SceneError> {
        if frame != 1 && frame <= self.frame {
            return Err(SceneError::FrameRejected {
                frame,
                reason: format!("already uploaded frame {}", self.frame),
            });
        }
        self.frame = frame;
        Ok(())
    }

    fn apply(&mut self, name: &str, state: &NodeState) -> bool {
        match self.slots.get(name) {
            Some(slot) => {
                self.instances[*slot] = NodeInstance::from_state(state);
                true
            }
            None => false,
        }
    }
}
