use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use stellar_engine::scroll::progress_from_scroll;

/// One frame of scroll input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScrollSample {
    Progress(f32),
    Scroll { scroll_top: f32, viewport_height: f32 },
    /// No reading this frame; the tracker holds its last good value.
    Gap(()),
}

impl ScrollSample {
    pub fn progress(&self, pages: f32) -> f32 {
        match self {
            ScrollSample::Progress(value) => *value,
            ScrollSample::Scroll {
                scroll_top,
                viewport_height,
            } => progress_from_scroll(*scroll_top, *viewport_height, pages).unwrap_or(f32::NAN),
            ScrollSample::Gap(()) => f32::NAN,
        }
    }
}

pub fn load_script(path: &Path) -> Result<Vec<ScrollSample>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading scroll script {}", path.display()))?;
    let samples: Vec<ScrollSample> = serde_json::from_str(&json)
        .with_context(|| format!("parsing scroll script {}", path.display()))?;
    ensure!(!samples.is_empty(), "scroll script {} is empty", path.display());
    Ok(samples)
}

/// Evenly spaced progress from 0 to 1 inclusive.
pub fn sweep(frames: usize) -> Vec<ScrollSample> {
    match frames {
        0 => Vec::new(),
        1 => vec![ScrollSample::Progress(1.0)],
        _ => {
            let last = (frames - 1) as f32;
            (0..frames)
                .map(|idx| ScrollSample::Progress(idx as f32 / last))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_samples_parse() {
        let samples: Vec<ScrollSample> = serde_json::from_str(
            r#"[0.25, null, {"scroll_top": 1600, "viewport_height": 800}]"#,
        )
        .expect("script parses");
        assert_eq!(samples[0].progress(5.0), 0.25);
        assert!(samples[1].progress(5.0).is_nan());
        assert_eq!(samples[2].progress(5.0), 0.5);
    }

    #[test]
    fn sweep_covers_both_ends() {
        let samples = sweep(5);
        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0], ScrollSample::Progress(0.0));
        assert_eq!(samples[4], ScrollSample::Progress(1.0));
        assert!(sweep(0).is_empty());
    }
}
