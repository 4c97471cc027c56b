//! Per-frame tick: the single owner of progress, scene and overlay state.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::camera::CameraParameters;
use crate::config::SceneConfig;
use crate::error::{ConfigError, SceneError};
use crate::motion::{FrameClock, ProceduralMotion};
use crate::overlay::{OverlayFrame, SectionFade};
use crate::projector::AnnotationProjector;
use crate::render_sync::{sync_to_backend, SceneBackend};
use crate::scene::{NodeState, SceneArena};
use crate::scroll::ScrollTracker;
use crate::stages::{dominant_stage, StageWindow};
use crate::store::{AnnotationState, SharedState};
use crate::timeline::Timeline;

/// Node state as written to snapshots. Colours keep full precision as RGB
/// triples rather than the `#rrggbb` literals scene configs use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: f32,
    pub opacity: f32,
    pub color: [f32; 3],
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub float_offset: [f32; 3],
    pub float_rotation: [f32; 3],
}

impl From<&NodeState> for NodeSnapshot {
    fn from(node: &NodeState) -> Self {
        Self {
            position: node.position,
            rotation: node.rotation,
            scale: node.scale,
            opacity: node.opacity,
            color: node.color.to_array(),
            emissive: node.emissive.to_array(),
            emissive_intensity: node.emissive_intensity,
            float_offset: node.float_offset,
            float_rotation: node.float_rotation,
        }
    }
}

/// Serialisable view of everything one tick produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub progress: f32,
    pub elapsed: f32,
    pub stage: Option<String>,
    pub nodes: BTreeMap<String, NodeSnapshot>,
    pub annotations: Vec<AnnotationState>,
    pub overlay: OverlayFrame,
}

pub struct FrameDriver {
    tracker: ScrollTracker,
    timeline: Timeline,
    motion: ProceduralMotion,
    projector: AnnotationProjector,
    camera: CameraParameters,
    stages: Vec<StageWindow>,
    sections: Vec<SectionFade>,
    arena: SceneArena,
    state: SharedState,
    clock: FrameClock,
    viewport: (f32, f32),
    frame: u64,
    stage: Option<String>,
}

impl FrameDriver {
    pub fn from_config(config: &SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tracker: ScrollTracker::from_config(&config.scroll),
            timeline: config.timeline()?,
            motion: config.motion(),
            projector: config.projector()?,
            camera: config.camera.clone(),
            stages: config.stage_windows(),
            sections: config.sections.clone(),
            arena: config.arena()?,
            state: SharedState::new(),
            clock: FrameClock::default(),
            viewport: (1280.0, 720.0),
            frame: 0,
            stage: None,
        })
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            self.viewport = (width, height);
        } else {
            log::warn!("ignoring invalid viewport {width}x{height}");
        }
    }

    /// Runs one frame. Progress is sampled and committed before the timeline,
    /// procedural motion and projection run, so all three see the same value.
    /// Only a backend failure aborts the tick.
    pub fn tick(
        &mut self,
        raw_progress: f32,
        delta_seconds: f32,
        backend: &mut dyn SceneBackend,
    ) -> Result<(), SceneError> {
        self.frame += 1;
        self.clock.advance(delta_seconds);
        let progress = self.tracker.sample(raw_progress, self.clock.delta);
        self.state.set_scroll_progress(progress);

        let keyframes = self.timeline.evaluate(progress);
        self.arena.apply_keyframes(&keyframes);
        self.motion
            .apply(self.clock, progress, &keyframes, &mut self.arena);

        let aspect = self.viewport.0 / self.viewport.1;
        let camera = self.camera.projector(aspect);
        if camera.is_none() {
            log::debug!("frame {}: camera unavailable, positions held", self.frame);
        }
        self.projector
            .project_all(progress, camera.as_ref(), &mut self.arena, &mut self.state);

        self.note_stage(progress);
        sync_to_backend(self.frame, &mut self.arena, backend)?;
        Ok(())
    }

    fn note_stage(&mut self, progress: f32) {
        let current = dominant_stage(&self.stages, progress).map(|stage| stage.name.clone());
        if current != self.stage {
            log::info!(
                "frame {}: stage {} -> {} at progress {:.3}",
                self.frame,
                self.stage.as_deref().unwrap_or("none"),
                current.as_deref().unwrap_or("none"),
                progress
            );
            self.stage = current;
        }
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            frame: self.frame,
            progress: self.state.scroll_progress(),
            elapsed: self.clock.elapsed,
            stage: self.stage.clone(),
            nodes: self
                .arena
                .iter()
                .map(|(_, name, node)| (name.to_string(), NodeSnapshot::from(node)))
                .collect(),
            annotations: self.state.annotations().cloned().collect(),
            overlay: self.overlay(),
        }
    }

    pub fn overlay(&self) -> OverlayFrame {
        OverlayFrame::build(
            &self.sections,
            self.projector.anchors().iter().map(|anchor| anchor.id.as_str()),
            &self.state,
        )
    }

    /// Tears down per-view state; the next tick starts from the rest pose.
    pub fn unmount(&mut self) {
        self.state.clear();
        self.arena.reset();
        self.tracker.reset();
        self.clock = FrameClock::default();
        self.frame = 0;
        self.stage = None;
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn arena(&self) -> &SceneArena {
        &self.arena
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn stages(&self) -> &[StageWindow] {
        &self.stages
    }

    pub fn current_stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}
