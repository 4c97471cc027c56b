//! Declarative scene description, loadable from JSON.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::camera::CameraParameters;
use crate::error::{check_window, ConfigError};
use crate::motion::ProceduralMotion;
use crate::overlay::SectionFade;
use crate::projector::{AnchorPoint, AnnotationProjector};
use crate::scene::{NodeState, SceneArena};
use crate::scroll::ScrollConfig;
use crate::stages::StageWindow;
use crate::timeline::{Segment, Timeline};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    #[serde(flatten)]
    pub rest: NodeState,
}

impl NodeConfig {
    pub fn new(name: impl Into<String>, rest: NodeState) -> Self {
        Self {
            name: name.into(),
            rest,
        }
    }
}

/// One visual phase: its keyframes and the procedural rules that give it life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    pub window: [f32; 2],
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(flatten)]
    pub motion: ProceduralMotion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub camera: CameraParameters,
    #[serde(default)]
    pub scroll: ScrollConfig,
    pub nodes: Vec<NodeConfig>,
    pub stages: Vec<StageConfig>,
    #[serde(default)]
    pub anchors: Vec<AnchorPoint>,
    #[serde(default)]
    pub sections: Vec<SectionFade>,
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera.validate()?;
        if !(self.scroll.pages.is_finite() && self.scroll.pages > 1.0) {
            return Err(ConfigError::NonFiniteValue {
                context: format!("scroll pages {} (must exceed 1)", self.scroll.pages),
            });
        }
        if let Some(damping) = self.scroll.damping {
            if !damping.is_finite() || damping < 0.0 {
                return Err(ConfigError::NonFiniteValue {
                    context: format!("scroll damping {damping}"),
                });
            }
        }
        self.arena()?;
        self.timeline()?;
        self.motion().validate()?;
        self.projector()?;
        for stage in &self.stages {
            check_window(&format!("stage {}", stage.name), stage.window[0], stage.window[1])?;
        }
        for section in &self.sections {
            section.validate()?;
        }
        Ok(())
    }

    pub fn arena(&self) -> Result<SceneArena, ConfigError> {
        let mut arena = SceneArena::new();
        for node in &self.nodes {
            arena.insert(&node.name, node.rest.clone())?;
        }
        Ok(arena)
    }

    /// All stage segments, in stage then declaration order.
    pub fn timeline(&self) -> Result<Timeline, ConfigError> {
        Timeline::new(
            self.stages
                .iter()
                .flat_map(|stage| stage.segments.iter().cloned())
                .collect(),
        )
    }

    pub fn motion(&self) -> ProceduralMotion {
        let mut motion = ProceduralMotion::default();
        for stage in &self.stages {
            motion.extend(stage.motion.clone());
        }
        motion
    }

    pub fn projector(&self) -> Result<AnnotationProjector, ConfigError> {
        AnnotationProjector::new(self.anchors.clone())
    }

    pub fn stage_windows(&self) -> Vec<StageWindow> {
        self.stages
            .iter()
            .map(|stage| StageWindow {
                name: stage.name.clone(),
                window: stage.window,
            })
            .collect()
    }
}
