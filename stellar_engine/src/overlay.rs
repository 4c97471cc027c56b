//! Maps stored progress and annotation state onto 2D overlay styling.

use serde::{Deserialize, Serialize};

use crate::error::{check_window, ConfigError};
use crate::store::SharedState;
use crate::timeline::smoothstep;

/// Text section that fades in over `fade_in` and, optionally, out over
/// `fade_out`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionFade {
    pub id: String,
    pub fade_in: [f32; 2],
    #[serde(default)]
    pub fade_out: Option<[f32; 2]>,
}

impl SectionFade {
    pub fn new(id: impl Into<String>, fade_in: [f32; 2], fade_out: Option<[f32; 2]>) -> Self {
        Self {
            id: id.into(),
            fade_in,
            fade_out,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let context = format!("section {}", self.id);
        check_window(&context, self.fade_in[0], self.fade_in[1])?;
        if let Some(out) = self.fade_out {
            check_window(&context, out[0], out[1])?;
        }
        Ok(())
    }

    pub fn opacity(&self, progress: f32) -> f32 {
        let fade_in = smoothstep(progress, self.fade_in[0], self.fade_in[1]);
        let fade_out = self
            .fade_out
            .map(|out| smoothstep(progress, out[0], out[1]))
            .unwrap_or(0.0);
        fade_in * (1.0 - fade_out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub id: String,
    pub opacity: f32,
}

/// Styling for one floating callout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalloutView {
    pub id: String,
    pub left_percent: f32,
    pub top_percent: f32,
    pub opacity: f32,
    pub interactive: bool,
    pub leader: Option<[f32; 2]>,
}

impl CalloutView {
    pub fn from_state(id: &str, state: &SharedState) -> Self {
        match state.annotation(id) {
            Some(entry) => Self {
                id: id.to_string(),
                left_percent: entry.x,
                top_percent: entry.y,
                opacity: if entry.visible { 1.0 } else { 0.0 },
                interactive: entry.visible,
                leader: entry.leader,
            },
            None => Self {
                id: id.to_string(),
                left_percent: 50.0,
                top_percent: 50.0,
                opacity: 0.0,
                interactive: false,
                leader: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayFrame {
    pub sections: Vec<SectionView>,
    pub callouts: Vec<CalloutView>,
}

impl OverlayFrame {
    pub fn build<'a, I>(sections: &[SectionFade], callout_ids: I, state: &SharedState) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let progress = state.scroll_progress();
        Self {
            sections: sections
                .iter()
                .map(|section| SectionView {
                    id: section.id.clone(),
                    opacity: section.opacity(progress),
                })
                .collect(),
            callouts: callout_ids
                .into_iter()
                .map(|id| CalloutView::from_state(id, state))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AnnotationPatch;

    #[test]
    fn section_fades_in_holds_and_fades_out() {
        let section = SectionFade::new("ignition", [0.25, 0.35], Some([0.45, 0.5]));
        assert_eq!(section.opacity(0.2), 0.0);
        assert!((section.opacity(0.3) - 0.5).abs() < 1e-5);
        assert_eq!(section.opacity(0.4), 1.0);
        assert_eq!(section.opacity(0.5), 0.0);
    }

    #[test]
    fn final_section_stays_visible() {
        let section = SectionFade::new("dyson", [0.85, 0.95], None);
        assert_eq!(section.opacity(1.0), 1.0);
    }

    #[test]
    fn callouts_default_to_hidden_centre() {
        let mut state = SharedState::new();
        state.update_annotation(
            "The Ignition",
            AnnotationPatch::visibility(true).position(20.0, 30.0),
        );
        let frame = OverlayFrame::build(&[], ["The Ignition", "Unknown"], &state);
        assert_eq!(frame.callouts[0].opacity, 1.0);
        assert!(frame.callouts[0].interactive);
        assert_eq!(frame.callouts[0].left_percent, 20.0);
        assert_eq!(frame.callouts[1].opacity, 0.0);
        assert_eq!(frame.callouts[1].left_percent, 50.0);
        assert!(!frame.callouts[1].interactive);
    }
}
