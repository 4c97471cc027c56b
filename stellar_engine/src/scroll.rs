use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGES: f32 = 5.0;
pub const DEFAULT_DAMPING: f32 = 0.2;
const SNAP_EPSILON: f32 = 1e-5;

/// How page scroll maps to progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    #[serde(default = "default_pages")]
    pub pages: f32,
    /// Smooth time in seconds; `None` follows the input directly.
    #[serde(default)]
    pub damping: Option<f32>,
}

fn default_pages() -> f32 {
    DEFAULT_PAGES
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            pages: DEFAULT_PAGES,
            damping: Some(DEFAULT_DAMPING),
        }
    }
}

/// Scroll offset of a `pages`-tall scroll container as progress in `[0, 1]`.
/// Returns `None` when the container cannot scroll.
pub fn progress_from_scroll(scroll_top: f32, viewport_height: f32, pages: f32) -> Option<f32> {
    let span = (pages - 1.0) * viewport_height;
    if !span.is_finite() || span <= 0.0 || !scroll_top.is_finite() {
        return None;
    }
    Some((scroll_top / span).clamp(0.0, 1.0))
}

/// Samples progress once per frame, optionally easing towards the target
/// with a critically damped spring. Non-finite input holds the last good
/// value.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    target: f32,
    current: f32,
    velocity: f32,
    smooth_time: Option<f32>,
}

impl ScrollTracker {
    pub fn new(smooth_time: Option<f32>) -> Self {
        Self {
            target: 0.0,
            current: 0.0,
            velocity: 0.0,
            smooth_time: smooth_time.filter(|time| time.is_finite() && *time > 0.0),
        }
    }

    pub fn from_config(config: &ScrollConfig) -> Self {
        Self::new(config.damping)
    }

    pub fn progress(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn sample(&mut self, raw: f32, delta: f32) -> f32 {
        if raw.is_finite() {
            self.target = raw.clamp(0.0, 1.0);
        } else {
            log::debug!(
                "ignoring non-finite scroll progress; holding {:.4}",
                self.target
            );
        }

        match self.smooth_time {
            Some(smooth_time) if delta.is_finite() && delta > 0.0 => {
                self.current = smooth_damp(
                    self.current,
                    self.target,
                    &mut self.velocity,
                    smooth_time,
                    delta,
                )
                .clamp(0.0, 1.0);
                if (self.current - self.target).abs() < SNAP_EPSILON {
                    self.current = self.target;
                    self.velocity = 0.0;
                }
            }
            Some(_) => {}
            None => self.current = self.target,
        }
        self.current
    }

    pub fn reset(&mut self) {
        self.target = 0.0;
        self.current = 0.0;
        self.velocity = 0.0;
    }
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new(None)
    }
}

fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, delta: f32) -> f32 {
    let omega = 2.0 / smooth_time;
    let x = omega * delta;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    let change = current - target;
    let temp = (*velocity + omega * change) * delta;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    // Never overshoot the target.
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}
