//! Scroll-driven scene engine.
//!
//! A single normalised scroll progress value drives a keyframe timeline,
//! continuous procedural motion and the projection of 3D anchor points into
//! overlay coordinates. [`frame::FrameDriver`] runs the whole pipeline once
//! per rendered frame and hands node state to a [`render_sync::SceneBackend`].

pub mod camera;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod motion;
pub mod overlay;
pub mod particles;
pub mod projector;
pub mod render_sync;
pub mod scene;
pub mod scroll;
pub mod stages;
pub mod store;
pub mod timeline;

pub use config::SceneConfig;
pub use error::{ConfigError, SceneError};
pub use frame::{FrameDriver, FrameSnapshot};
pub use render_sync::{InstanceBuffer, SceneBackend};
pub use timeline::{Easing, Property, Segment, Timeline};
