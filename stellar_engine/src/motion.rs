//! Continuous, non-keyframed motion: spin, orbits, idle float and colour
//! blends. Runs after the timeline has written its values for the frame.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::color::ColorGradient;
use crate::error::{check_finite, ConfigError};
use crate::scene::SceneArena;
use crate::timeline::{map_linear, Property, PropertyValues};

/// Elapsed and per-frame time in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameClock {
    pub elapsed: f32,
    pub delta: f32,
}

impl FrameClock {
    pub fn advance(&mut self, delta: f32) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        self.delta = delta;
        self.elapsed += delta;
    }
}

/// Accumulates `rate × delta` into a node's rotation every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationRule {
    pub target: String,
    /// Radians per second around X, Y and Z.
    pub rate: [f32; 3],
}

/// Maps the orbiting body's depth onto a scale multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthScale {
    pub far: f32,
    pub near: f32,
}

impl Default for DepthScale {
    fn default() -> Self {
        Self {
            far: 0.4,
            near: 1.6,
        }
    }
}

/// Circular motion in the XZ plane at `angle = −elapsed × angular_speed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitRule {
    pub target: String,
    pub radius: f32,
    pub angular_speed: f32,
    #[serde(default)]
    pub center: [f32; 3],
    #[serde(default)]
    pub depth_scale: Option<DepthScale>,
}

impl OrbitRule {
    /// Offset from the orbit centre at `elapsed` seconds.
    pub fn offset(&self, elapsed: f32) -> [f32; 3] {
        let angle = -elapsed * self.angular_speed;
        [angle.cos() * self.radius, 0.0, angle.sin() * self.radius]
    }

    /// Perspective multiplier for a depth offset `z` along the orbit.
    pub fn depth_factor(&self, z: f32) -> f32 {
        match self.depth_scale {
            Some(depth) if self.radius > 0.0 => {
                map_linear(z, -self.radius, self.radius, depth.far, depth.near)
            }
            _ => 1.0,
        }
    }
}

/// Idle bob: small rotation and vertical drift on a wrapper transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatRule {
    pub target: String,
    pub speed: f32,
    pub rotation_intensity: f32,
    pub float_intensity: f32,
    #[serde(default)]
    pub phase: f32,
}

impl FloatRule {
    pub fn wrapper(&self, elapsed: f32) -> ([f32; 3], [f32; 3]) {
        let t = (self.phase + elapsed) / 4.0 * self.speed;
        let rotation = [
            t.cos() / 8.0 * self.rotation_intensity,
            t.sin() / 8.0 * self.rotation_intensity,
            t.sin() / 20.0 * self.rotation_intensity,
        ];
        let offset = [0.0, t.sin() / 10.0 * self.float_intensity, 0.0];
        (offset, rotation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorChannel {
    Base,
    Emissive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRule {
    pub target: String,
    pub channel: ColorChannel,
    pub gradient: ColorGradient,
}

/// Every procedural rule in the scene, applied in a fixed order:
/// rotations, orbits, floats, colours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProceduralMotion {
    #[serde(default)]
    pub rotations: Vec<RotationRule>,
    #[serde(default)]
    pub orbits: Vec<OrbitRule>,
    #[serde(default)]
    pub floats: Vec<FloatRule>,
    #[serde(default)]
    pub colors: Vec<ColorRule>,
}

impl ProceduralMotion {
    pub fn extend(&mut self, other: ProceduralMotion) {
        self.rotations.extend(other.rotations);
        self.orbits.extend(other.orbits);
        self.floats.extend(other.floats);
        self.colors.extend(other.colors);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.rotations {
            check_finite(&format!("rotation on {}", rule.target), &rule.rate)?;
        }
        for rule in &self.orbits {
            let context = format!("orbit on {}", rule.target);
            check_finite(&context, &[rule.radius, rule.angular_speed])?;
            check_finite(&context, &rule.center)?;
            if let Some(depth) = rule.depth_scale {
                check_finite(&context, &[depth.far, depth.near])?;
            }
        }
        for rule in &self.floats {
            check_finite(
                &format!("float on {}", rule.target),
                &[
                    rule.speed,
                    rule.rotation_intensity,
                    rule.float_intensity,
                    rule.phase,
                ],
            )?;
        }
        for rule in &self.colors {
            rule.gradient.validate(&rule.target)?;
        }
        Ok(())
    }

    /// Mutates the arena for one frame. `keyframes` are this frame's timeline
    /// values; orbit scale is always derived from them (or the node's rest
    /// scale) rather than from last frame's result.
    pub fn apply(
        &self,
        clock: FrameClock,
        progress: f32,
        keyframes: &PropertyValues,
        arena: &mut SceneArena,
    ) {
        for rule in &self.rotations {
            let Some(id) = arena.resolve(&rule.target) else {
                continue;
            };
            let node = arena.node_mut(id);
            for axis in 0..3 {
                node.rotation[axis] =
                    (node.rotation[axis] + clock.delta * rule.rate[axis]).rem_euclid(TAU);
            }
        }

        for rule in &self.orbits {
            let Some(id) = arena.resolve(&rule.target) else {
                continue;
            };
            let base_scale = keyframes
                .get(&rule.target, Property::Scale)
                .unwrap_or_else(|| arena.rest(id).scale);
            let offset = rule.offset(clock.elapsed);
            let factor = rule.depth_factor(offset[2]);
            let node = arena.node_mut(id);
            node.position = [
                rule.center[0] + offset[0],
                rule.center[1] + offset[1],
                rule.center[2] + offset[2],
            ];
            node.scale = base_scale * factor;
        }

        for rule in &self.floats {
            let Some(id) = arena.resolve(&rule.target) else {
                continue;
            };
            let (offset, rotation) = rule.wrapper(clock.elapsed);
            let node = arena.node_mut(id);
            node.float_offset = offset;
            node.float_rotation = rotation;
        }

        for rule in &self.colors {
            let Some(id) = arena.resolve(&rule.target) else {
                continue;
            };
            let color = rule.gradient.sample(progress);
            let node = arena.node_mut(id);
            match rule.channel {
                ColorChannel::Base => node.color = color,
                ColorChannel::Emissive => node.emissive = color,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::scene::NodeState;
    use crate::timeline::{Segment, Timeline};

    const EPS: f32 = 1e-5;

    fn planet_orbit() -> OrbitRule {
        OrbitRule {
            target: "planet".to_string(),
            radius: 1.1,
            angular_speed: 0.5,
            center: [0.0; 3],
            depth_scale: Some(DepthScale::default()),
        }
    }

    fn clock(elapsed: f32, delta: f32) -> FrameClock {
        FrameClock { elapsed, delta }
    }

    #[test]
    fn orbit_follows_negative_angle() {
        let orbit = planet_orbit();
        let start = orbit.offset(0.0);
        assert!((start[0] - 1.1).abs() < EPS);
        assert!(start[2].abs() < EPS);

        // A quarter turn at 0.5 rad/s takes π seconds and ends at −z.
        let quarter = orbit.offset(std::f32::consts::PI);
        assert!(quarter[0].abs() < 1e-4);
        assert!((quarter[2] + 1.1).abs() < 1e-4);
    }

    #[test]
    fn depth_factor_spans_visual_range() {
        let orbit = planet_orbit();
        assert!((orbit.depth_factor(-1.1) - 0.4).abs() < EPS);
        assert!((orbit.depth_factor(1.1) - 1.6).abs() < EPS);
        assert!((orbit.depth_factor(0.0) - 1.0).abs() < EPS);
    }

    #[test]
    fn orbit_scale_never_compounds() {
        let mut arena = SceneArena::new();
        let id = arena.insert("planet", NodeState::default()).expect("insert");
        let timeline = Timeline::new(vec![Segment::new(
            "planet",
            Property::Scale,
            (0.0, 0.3),
            (0.45, 0.6),
        )])
        .expect("valid timeline");
        let motion = ProceduralMotion {
            orbits: vec![planet_orbit()],
            ..ProceduralMotion::default()
        };

        let keyframes = timeline.evaluate(0.8);
        let elapsed = 2.0;
        let expected = 0.3 * planet_orbit().depth_factor(planet_orbit().offset(elapsed)[2]);
        for _ in 0..50 {
            arena.apply_keyframes(&keyframes);
            motion.apply(clock(elapsed, 0.0), 0.8, &keyframes, &mut arena);
        }
        assert!((arena.node(id).scale - expected).abs() < EPS);
    }

    #[test]
    fn rotation_accumulates_with_delta() {
        let mut arena = SceneArena::new();
        let id = arena.insert("star", NodeState::default()).expect("insert");
        let motion = ProceduralMotion {
            rotations: vec![RotationRule {
                target: "star".to_string(),
                rate: [0.0, 0.5, 0.0],
            }],
            ..ProceduralMotion::default()
        };
        let keyframes = PropertyValues::default();
        for frame in 1..=10 {
            motion.apply(clock(frame as f32 * 0.1, 0.1), 0.0, &keyframes, &mut arena);
        }
        assert!((arena.node(id).rotation[1] - 0.5).abs() < EPS);
        assert_eq!(arena.node(id).rotation[0], 0.0);
    }

    #[test]
    fn float_wrapper_is_recomputed_not_accumulated() {
        let rule = FloatRule {
            target: "star".to_string(),
            speed: 2.0,
            rotation_intensity: 0.5,
            float_intensity: 0.5,
            phase: 0.0,
        };
        let mut arena = SceneArena::new();
        let id = arena.insert("star", NodeState::default()).expect("insert");
        let motion = ProceduralMotion {
            floats: vec![rule.clone()],
            ..ProceduralMotion::default()
        };
        let keyframes = PropertyValues::default();
        for _ in 0..5 {
            motion.apply(clock(3.0, 0.016), 0.0, &keyframes, &mut arena);
        }
        let (offset, rotation) = rule.wrapper(3.0);
        assert_eq!(arena.node(id).float_offset, offset);
        assert_eq!(arena.node(id).float_rotation, rotation);
        assert!(offset[1].abs() <= 0.05 + EPS);
    }

    #[test]
    fn colour_rule_writes_selected_channel() {
        let mut arena = SceneArena::new();
        let id = arena.insert("planet", NodeState::default()).expect("insert");
        let red = Rgb::from_u32(0xff4400);
        let motion = ProceduralMotion {
            colors: vec![ColorRule {
                target: "planet".to_string(),
                channel: ColorChannel::Emissive,
                gradient: ColorGradient::new(vec![red, Rgb::BLACK, Rgb::BLACK], [0.5, 0.75]),
            }],
            ..ProceduralMotion::default()
        };
        let keyframes = PropertyValues::default();
        motion.apply(clock(0.0, 0.0), 0.2, &keyframes, &mut arena);
        assert_eq!(arena.node(id).emissive, red);
        assert_eq!(arena.node(id).color, Rgb::WHITE);
        motion.apply(clock(0.0, 0.0), 0.7, &keyframes, &mut arena);
        assert_eq!(arena.node(id).emissive, Rgb::BLACK);
    }

    #[test]
    fn clock_ignores_bad_deltas() {
        let mut clock = FrameClock::default();
        clock.advance(0.5);
        clock.advance(f32::NAN);
        clock.advance(-1.0);
        assert_eq!(clock.elapsed, 0.5);
        assert_eq!(clock.delta, 0.0);
    }
}
