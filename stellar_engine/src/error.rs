use std::path::PathBuf;

use thiserror::Error;

/// Problems detected while building a scene from its declarative description.
/// All of these are raised before the first frame runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{context}: window end {end} precedes window start {start}")]
    InvertedWindow { context: String, start: f32, end: f32 },
    #[error("{context}: window [{start}, {end}] lies outside [0, 1]")]
    WindowOutOfRange { context: String, start: f32, end: f32 },
    #[error("{context}: value is not finite")]
    NonFiniteValue { context: String },
    #[error("duplicate scene node `{0}`")]
    DuplicateNode(String),
    #[error("duplicate annotation anchor `{0}`")]
    DuplicateAnchor(String),
    #[error("colour gradient on `{target}` needs at least two stops (got {count})")]
    GradientStops { target: String, count: usize },
    #[error("invalid colour literal `{0}`")]
    InvalidColor(String),
    #[error("invalid camera: {0}")]
    InvalidCamera(String),
    #[error("reading scene config {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing scene config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures raised by a rendering backend during render sync.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("rendering backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("rendering backend rejected frame {frame}: {reason}")]
    FrameRejected { frame: u64, reason: String },
}

pub(crate) fn check_window(context: &str, start: f32, end: f32) -> Result<(), ConfigError> {
    if !start.is_finite() || !end.is_finite() {
        return Err(ConfigError::NonFiniteValue {
            context: context.to_string(),
        });
    }
    if end < start {
        return Err(ConfigError::InvertedWindow {
            context: context.to_string(),
            start,
            end,
        });
    }
    if start < 0.0 || end > 1.0 {
        return Err(ConfigError::WindowOutOfRange {
            context: context.to_string(),
            start,
            end,
        });
    }
    Ok(())
}

pub(crate) fn check_finite(context: &str, values: &[f32]) -> Result<(), ConfigError> {
    if values.iter().all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(ConfigError::NonFiniteValue {
            context: context.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_window_is_rejected() {
        let err = check_window("segment star", 0.4, 0.2).unwrap_err();
        assert!(matches!(err, ConfigError::InvertedWindow { .. }));
        assert!(err.to_string().contains("segment star"));
    }

    #[test]
    fn degenerate_window_is_allowed() {
        check_window("segment", 0.5, 0.5).expect("zero-length window is valid");
    }

    #[test]
    fn window_outside_unit_range_is_rejected() {
        let err = check_window("anchor", -0.1, 0.5).unwrap_err();
        assert!(matches!(err, ConfigError::WindowOutOfRange { .. }));
        let err = check_window("anchor", f32::NAN, 0.5).unwrap_err();
        assert!(matches!(err, ConfigError::NonFiniteValue { .. }));
    }
}
