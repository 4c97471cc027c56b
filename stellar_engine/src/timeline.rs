//! Keyframe timeline evaluated as a pure function of scroll progress.
//!
//! Segments are declared once and never mutated. Each frame the whole list is
//! re-evaluated because progress may move in either direction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{check_finite, check_window, ConfigError};

/// Scalar node properties a segment can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Scale,
    Opacity,
    PositionX,
    PositionY,
    PositionZ,
    RotationX,
    RotationY,
    RotationZ,
    EmissiveIntensity,
}

impl Property {
    pub fn label(self) -> &'static str {
        match self {
            Property::Scale => "scale",
            Property::Opacity => "opacity",
            Property::PositionX => "position.x",
            Property::PositionY => "position.y",
            Property::PositionZ => "position.z",
            Property::RotationX => "rotation.x",
            Property::RotationY => "rotation.y",
            Property::RotationZ => "rotation.z",
            Property::EmissiveIntensity => "emissive_intensity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    /// Cubic smoothstep, `t²(3 − 2t)`.
    Smooth,
    /// Quadratic ease-out, `1 − (1 − t)²`.
    Power1Out,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Smooth => t * t * (3.0 - 2.0 * t),
            Easing::Power1Out => {
                let inv = 1.0 - t;
                1.0 - inv * inv
            }
        }
    }
}

/// Hermite smoothstep of `x` across `[min, max]`; 0 at or below `min`, 1 at or
/// above `max`.
pub fn smoothstep(x: f32, min: f32, max: f32) -> f32 {
    if x <= min {
        return 0.0;
    }
    if x >= max {
        return 1.0;
    }
    let t = (x - min) / (max - min);
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation that returns the endpoints exactly at `t = 0` and
/// `t = 1` and never leaves the `[a, b]` interval.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    if t <= 0.0 {
        return a;
    }
    if t >= 1.0 {
        return b;
    }
    let value = a + (b - a) * t;
    value.clamp(a.min(b), a.max(b))
}

/// Maps `x` from `[a1, a2]` onto `[b1, b2]` without clamping.
pub fn map_linear(x: f32, a1: f32, a2: f32, b1: f32, b2: f32) -> f32 {
    b1 + (x - a1) * (b2 - b1) / (a2 - a1)
}

/// One keyframe interpolation of a node property over a progress window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub target: String,
    pub property: Property,
    pub start_value: f32,
    pub end_value: f32,
    pub window_start: f32,
    pub window_end: f32,
    #[serde(default)]
    pub easing: Easing,
}

impl Segment {
    pub fn new(
        target: impl Into<String>,
        property: Property,
        values: (f32, f32),
        window: (f32, f32),
    ) -> Self {
        Self {
            target: target.into(),
            property,
            start_value: values.0,
            end_value: values.1,
            window_start: window.0,
            window_end: window.1,
            easing: Easing::Linear,
        }
    }

    pub fn eased(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let context = format!("segment {}.{}", self.target, self.property.label());
        check_finite(&context, &[self.start_value, self.end_value])?;
        check_window(&context, self.window_start, self.window_end)
    }

    /// Position within the window, clamped to `[0, 1]`.
    pub fn local_progress(&self, progress: f32) -> f32 {
        let span = self.window_end - self.window_start;
        if span <= 0.0 {
            return if progress >= self.window_start { 1.0 } else { 0.0 };
        }
        ((progress - self.window_start) / span).clamp(0.0, 1.0)
    }

    pub fn value_at(&self, progress: f32) -> f32 {
        let t = self.easing.apply(self.local_progress(progress));
        lerp(self.start_value, self.end_value, t)
    }

    /// Inclusive on both ends.
    pub fn contains(&self, progress: f32) -> bool {
        progress >= self.window_start && progress <= self.window_end
    }
}

/// Evaluated property values keyed by target then property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyValues {
    values: BTreeMap<String, BTreeMap<Property, f32>>,
}

impl PropertyValues {
    pub fn get(&self, target: &str, property: Property) -> Option<f32> {
        self.values.get(target)?.get(&property).copied()
    }

    pub fn set(&mut self, target: &str, property: Property, value: f32) {
        match self.values.get_mut(target) {
            Some(properties) => {
                properties.insert(property, value);
            }
            None => {
                self.values
                    .insert(target.to_string(), BTreeMap::from([(property, value)]));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Property, f32)> {
        self.values.iter().flat_map(|(target, properties)| {
            properties
                .iter()
                .map(move |(property, value)| (target.as_str(), *property, *value))
        })
    }

    pub fn len(&self) -> usize {
        self.values.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Picks the segment that decides a property's value at `progress`, from
/// candidates given in declaration order.
///
/// The last-declared segment whose window contains `progress` wins. Outside
/// every window the most recently finished segment holds its end value (ties
/// go to the later declaration), and before any window opens the first
/// declared segment holds its start value.
fn governing<'a, I>(candidates: I, progress: f32) -> Option<&'a Segment>
where
    I: IntoIterator<Item = &'a Segment>,
{
    let mut first = None;
    let mut active = None;
    let mut finished: Option<&Segment> = None;
    for segment in candidates {
        first.get_or_insert(segment);
        if segment.contains(progress) {
            active = Some(segment);
        } else if segment.window_end < progress
            && finished.map_or(true, |best| segment.window_end >= best.window_end)
        {
            finished = Some(segment);
        }
    }
    active.or(finished).or(first)
}

/// Ordered, immutable list of segments, grouped per `(target, property)`.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    segments: Vec<Segment>,
    tracks: BTreeMap<(String, Property), Vec<usize>>,
}

impl Timeline {
    pub fn new(segments: Vec<Segment>) -> Result<Self, ConfigError> {
        let mut tracks: BTreeMap<(String, Property), Vec<usize>> = BTreeMap::new();
        for (idx, segment) in segments.iter().enumerate() {
            segment.validate()?;
            tracks
                .entry((segment.target.clone(), segment.property))
                .or_default()
                .push(idx);
        }
        Ok(Self { segments, tracks })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn evaluate(&self, progress: f32) -> PropertyValues {
        let mut values = PropertyValues::default();
        for ((target, property), indices) in &self.tracks {
            let candidates = indices.iter().map(|idx| &self.segments[*idx]);
            if let Some(segment) = governing(candidates, progress) {
                values.set(target, *property, segment.value_at(progress));
            }
        }
        values
    }

    pub fn value(&self, target: &str, property: Property, progress: f32) -> Option<f32> {
        let candidates = self
            .segments
            .iter()
            .filter(|segment| segment.target == target && segment.property == property);
        governing(candidates, progress).map(|segment| segment.value_at(progress))
    }

    /// Distinct target names in first-declaration order.
    pub fn targets(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for segment in &self.segments {
            if !seen.contains(&segment.target.as_str()) {
                seen.push(segment.target.as_str());
            }
        }
        seen
    }
}
