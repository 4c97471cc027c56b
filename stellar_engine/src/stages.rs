//! The four-stage evolving object: nebula, star, planet, dyson sphere.

use serde::Serialize;

use crate::camera::CameraParameters;
use crate::color::{ColorGradient, Rgb};
use crate::config::{NodeConfig, SceneConfig, StageConfig};
use crate::motion::{
    ColorChannel, ColorRule, DepthScale, FloatRule, OrbitRule, ProceduralMotion, RotationRule,
};
use crate::overlay::SectionFade;
use crate::projector::{AnchorPoint, LeaderTarget};
use crate::scene::NodeState;
use crate::scroll::ScrollConfig;
use crate::timeline::{Easing, Property, Segment};

pub const NEBULA: &str = "nebula";
pub const STAR: &str = "star";
pub const DISK: &str = "disk";
pub const PLANET: &str = "planet";
pub const DYSON_INNER: &str = "dyson_inner";
pub const DYSON_PANELS: &str = "dyson_panels";
pub const DYSON_OUTER: &str = "dyson_outer";

pub const PLANET_ORBIT_RADIUS: f32 = 1.1;
pub const PLANET_ORBIT_SPEED: f32 = 0.5;

/// Progress range during which a stage contributes to the picture. Windows of
/// neighbouring stages overlap so they can crossfade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageWindow {
    pub name: String,
    pub window: [f32; 2],
}

impl StageWindow {
    pub fn is_active(&self, progress: f32) -> bool {
        progress >= self.window[0] && progress <= self.window[1]
    }
}

/// The most recently started active stage; ties go to the later declaration.
pub fn dominant_stage(stages: &[StageWindow], progress: f32) -> Option<&StageWindow> {
    let mut best: Option<&StageWindow> = None;
    for stage in stages.iter().filter(|stage| stage.is_active(progress)) {
        if best.map_or(true, |current| stage.window[0] >= current.window[0]) {
            best = Some(stage);
        }
    }
    best
}

fn hidden() -> NodeState {
    NodeState {
        scale: 0.0,
        ..NodeState::default()
    }
}

fn rotation(target: &str, rate: [f32; 3]) -> RotationRule {
    RotationRule {
        target: target.to_string(),
        rate,
    }
}

fn uniform_scale(target: &str, values: (f32, f32), window: (f32, f32)) -> Segment {
    Segment::new(target, Property::Scale, values, window)
}

fn nodes() -> Vec<NodeConfig> {
    vec![
        NodeConfig::new(NEBULA, NodeState::default()),
        NodeConfig::new(
            STAR,
            NodeState {
                color: Rgb::from_u32(0xffaa00),
                emissive: Rgb::from_u32(0xff4400),
                emissive_intensity: 5.0,
                ..hidden()
            },
        ),
        NodeConfig::new(
            DISK,
            NodeState {
                color: Rgb::from_u32(0xffaa44),
                opacity: 0.0,
                ..NodeState::default()
            },
        ),
        NodeConfig::new(
            PLANET,
            NodeState {
                color: Rgb::from_u32(0xff4400),
                emissive: Rgb::from_u32(0xff4400),
                emissive_intensity: 2.0,
                ..hidden()
            },
        ),
        NodeConfig::new(
            DYSON_INNER,
            NodeState {
                color: Rgb::BLACK,
                emissive: Rgb::from_u32(0xff00ff),
                emissive_intensity: 2.0,
                ..hidden()
            },
        ),
        NodeConfig::new(
            DYSON_PANELS,
            NodeState {
                color: Rgb::BLACK,
                emissive: Rgb::from_u32(0xff00ff),
                emissive_intensity: 5.0,
                ..hidden()
            },
        ),
        NodeConfig::new(
            DYSON_OUTER,
            NodeState {
                color: Rgb::BLACK,
                emissive: Rgb::from_u32(0xff00ff),
                emissive_intensity: 4.0,
                ..hidden()
            },
        ),
    ]
}

fn nebula_stage() -> StageConfig {
    StageConfig {
        name: NEBULA.to_string(),
        window: [0.0, 0.25],
        segments: vec![
            uniform_scale(NEBULA, (1.0, 0.2), (0.0, 0.25)),
            Segment::new(NEBULA, Property::Opacity, (1.0, 0.0), (0.15, 0.25)),
        ],
        motion: ProceduralMotion {
            rotations: vec![rotation(NEBULA, [0.0, 0.05, 0.02])],
            ..ProceduralMotion::default()
        },
    }
}

fn star_stage() -> StageConfig {
    StageConfig {
        name: STAR.to_string(),
        window: [0.15, 0.7],
        segments: vec![
            uniform_scale(STAR, (0.0, 2.0), (0.15, 0.35)),
            uniform_scale(STAR, (2.0, 0.4), (0.45, 0.7)),
            Segment::new(DISK, Property::Opacity, (0.0, 1.0), (0.35, 0.45)),
            Segment::new(DISK, Property::Opacity, (1.0, 0.0), (0.55, 0.7)),
        ],
        motion: ProceduralMotion {
            rotations: vec![
                rotation(STAR, [0.0, 0.5, 0.0]),
                rotation(DISK, [0.0, 0.2, 0.0]),
            ],
            floats: vec![FloatRule {
                target: STAR.to_string(),
                speed: 2.0,
                rotation_intensity: 0.5,
                float_intensity: 0.5,
                phase: 0.0,
            }],
            ..ProceduralMotion::default()
        },
    }
}

fn planet_stage() -> StageConfig {
    let red = Rgb::from_u32(0xff4400);
    let window = [0.5, 0.75];
    StageConfig {
        name: PLANET.to_string(),
        window: [0.45, 1.0],
        segments: vec![uniform_scale(PLANET, (0.0, 0.3), (0.45, 0.6)).eased(Easing::Smooth)],
        motion: ProceduralMotion {
            rotations: vec![rotation(PLANET, [0.0, 1.0, 0.0])],
            orbits: vec![OrbitRule {
                target: PLANET.to_string(),
                radius: PLANET_ORBIT_RADIUS,
                angular_speed: PLANET_ORBIT_SPEED,
                center: [0.0; 3],
                depth_scale: Some(DepthScale::default()),
            }],
            colors: vec![
                ColorRule {
                    target: PLANET.to_string(),
                    channel: ColorChannel::Base,
                    gradient: ColorGradient::new(
                        vec![red, Rgb::from_u32(0x2266cc), Rgb::from_u32(0x22cc66)],
                        window,
                    ),
                },
                ColorRule {
                    target: PLANET.to_string(),
                    channel: ColorChannel::Emissive,
                    gradient: ColorGradient::new(vec![red, Rgb::BLACK, Rgb::BLACK], window),
                },
            ],
            ..ProceduralMotion::default()
        },
    }
}

fn dyson_stage() -> StageConfig {
    StageConfig {
        name: "dyson".to_string(),
        window: [0.75, 1.0],
        segments: vec![
            uniform_scale(DYSON_INNER, (0.0, 1.6), (0.75, 0.85)),
            uniform_scale(DYSON_PANELS, (0.0, 0.9), (0.8, 0.9)),
            uniform_scale(DYSON_OUTER, (0.0, 0.9), (0.85, 0.95)),
        ],
        motion: ProceduralMotion {
            rotations: vec![
                rotation(DYSON_INNER, [0.0, 0.2, 0.0]),
                rotation(DYSON_PANELS, [0.0, -0.1, 0.0]),
                rotation(DYSON_OUTER, [0.02, 0.05, 0.0]),
            ],
            ..ProceduralMotion::default()
        },
    }
}

fn anchors() -> Vec<AnchorPoint> {
    let origin = || LeaderTarget::Point([0.0; 3]);
    vec![
        AnchorPoint::new("Primordial Creativity", [2.5, 2.5, 0.0], [0.0, 0.2])
            .with_leader(origin()),
        AnchorPoint::new("The Ignition", [-3.5, 2.0, 0.0], [0.3, 0.45]).with_leader(origin()),
        AnchorPoint::new("Sustainable Growth", [3.5, -2.0, 0.0], [0.55, 0.75])
            .with_leader(LeaderTarget::Node(PLANET.to_string())),
        AnchorPoint::new("Total Innovation", [-3.0, -2.5, 0.0], [0.85, 1.0])
            .with_leader(origin()),
    ]
}

fn sections() -> Vec<SectionFade> {
    vec![
        SectionFade::new("intro", [0.0, 0.05], Some([0.15, 0.2])),
        SectionFade::new("ignition", [0.25, 0.35], Some([0.45, 0.5])),
        SectionFade::new("cultivation", [0.55, 0.65], Some([0.75, 0.8])),
        SectionFade::new("dyson", [0.85, 0.95], None),
    ]
}

/// Built-in scene: a single object that evolves from nebula to dyson sphere
/// over five pages of scroll.
pub fn hyper_object() -> SceneConfig {
    SceneConfig {
        camera: CameraParameters::default(),
        scroll: ScrollConfig::default(),
        nodes: nodes(),
        stages: vec![nebula_stage(), star_stage(), planet_stage(), dyson_stage()],
        anchors: anchors(),
        sections: sections(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_scene_is_valid() {
        let config = hyper_object();
        config.validate().expect("built-in scene validates");
        assert_eq!(config.nodes.len(), 7);
        assert_eq!(config.anchors.len(), 4);
    }

    #[test]
    fn every_segment_and_rule_targets_a_declared_node() {
        let config = hyper_object();
        let arena = config.arena().expect("arena builds");
        let timeline = config.timeline().expect("timeline builds");
        for target in timeline.targets() {
            assert!(arena.id(target).is_some(), "unknown target {target}");
        }
        let motion = config.motion();
        let rule_targets = motion
            .rotations
            .iter()
            .map(|rule| rule.target.as_str())
            .chain(motion.orbits.iter().map(|rule| rule.target.as_str()))
            .chain(motion.floats.iter().map(|rule| rule.target.as_str()))
            .chain(motion.colors.iter().map(|rule| rule.target.as_str()));
        for target in rule_targets {
            assert!(arena.id(target).is_some(), "unknown rule target {target}");
        }
    }

    #[test]
    fn star_grows_then_shrinks() {
        let timeline = hyper_object().timeline().expect("timeline builds");
        let at = |p| timeline.value(STAR, Property::Scale, p).expect("star track");
        assert_eq!(at(0.0), 0.0);
        assert_eq!(at(0.35), 2.0);
        assert_eq!(at(0.4), 2.0);
        assert_eq!(at(0.7), 0.4);
        assert_eq!(at(1.0), 0.4);
    }

    #[test]
    fn dominant_stage_prefers_latest_start() {
        let stages = hyper_object().stage_windows();
        let name = |p| dominant_stage(&stages, p).map(|stage| stage.name.as_str());
        assert_eq!(name(0.1), Some("nebula"));
        assert_eq!(name(0.2), Some("star"));
        assert_eq!(name(0.5), Some("planet"));
        assert_eq!(name(0.9), Some("dyson"));
        assert_eq!(name(1.0), Some("dyson"));
    }
}
