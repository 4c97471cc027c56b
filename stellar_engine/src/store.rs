use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Screen-space callout state derived from one anchor each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationState {
    pub id: String,
    /// Horizontal position in percent of the viewport width.
    pub x: f32,
    /// Vertical position in percent of the viewport height, top = 0.
    pub y: f32,
    pub visible: bool,
    /// Screen position of the leader-line target, when the anchor has one.
    #[serde(default)]
    pub leader: Option<[f32; 2]>,
}

impl AnnotationState {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            x: 50.0,
            y: 50.0,
            visible: false,
            leader: None,
        }
    }

    fn merge(&mut self, patch: AnnotationPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
        if let Some(leader) = patch.leader {
            self.leader = Some(leader);
        }
    }
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnnotationPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub visible: Option<bool>,
    pub leader: Option<[f32; 2]>,
}

impl AnnotationPatch {
    pub fn visibility(visible: bool) -> Self {
        Self {
            visible: Some(visible),
            ..Self::default()
        }
    }

    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn leader(mut self, leader: [f32; 2]) -> Self {
        self.leader = Some(leader);
        self
    }
}

/// Current scroll progress plus per-annotation screen state.
///
/// Owned by the frame driver, which commits progress first and annotations
/// after projection within the same tick; overlay code only reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SharedState {
    scroll_progress: f32,
    annotations: BTreeMap<String, AnnotationState>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_progress(&self) -> f32 {
        self.scroll_progress
    }

    pub fn set_scroll_progress(&mut self, value: f32) {
        self.scroll_progress = value;
    }

    /// Merges `patch` into the entry for `id`, creating it with defaults
    /// (centred, hidden) when absent.
    pub fn update_annotation(&mut self, id: &str, patch: AnnotationPatch) {
        match self.annotations.get_mut(id) {
            Some(entry) => entry.merge(patch),
            None => {
                let mut entry = AnnotationState::new(id);
                entry.merge(patch);
                self.annotations.insert(id.to_string(), entry);
            }
        }
    }

    pub fn annotation(&self, id: &str) -> Option<&AnnotationState> {
        self.annotations.get(id)
    }

    pub fn annotations(&self) -> impl Iterator<Item = &AnnotationState> {
        self.annotations.values()
    }

    pub fn clear(&mut self) {
        self.scroll_progress = 0.0;
        self.annotations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_creates_entry_with_defaults() {
        let mut state = SharedState::new();
        state.update_annotation("The Ignition", AnnotationPatch::visibility(true));
        let entry = state.annotation("The Ignition").expect("entry created");
        assert_eq!(entry.id, "The Ignition");
        assert_eq!((entry.x, entry.y), (50.0, 50.0));
        assert!(entry.visible);
        assert_eq!(entry.leader, None);
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut state = SharedState::new();
        state.update_annotation(
            "Total Innovation",
            AnnotationPatch::visibility(true).position(12.5, 80.0),
        );
        state.update_annotation("Total Innovation", AnnotationPatch::visibility(false));
        let entry = state.annotation("Total Innovation").expect("entry exists");
        assert_eq!((entry.x, entry.y), (12.5, 80.0));
        assert!(!entry.visible);
    }

    #[test]
    fn progress_is_replaced_and_cleared() {
        let mut state = SharedState::new();
        state.set_scroll_progress(0.4);
        state.set_scroll_progress(0.35);
        assert_eq!(state.scroll_progress(), 0.35);
        state.update_annotation("a", AnnotationPatch::default());
        state.clear();
        assert_eq!(state.scroll_progress(), 0.0);
        assert_eq!(state.annotations().count(), 0);
    }
}
