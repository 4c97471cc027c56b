use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{check_finite, ConfigError};

/// Perspective camera looking from `position` towards `interest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraParameters {
    pub position: [f32; 3],
    pub interest: [f32; 3],
    #[serde(default = "default_up")]
    pub up: [f32; 3],
    pub fov_degrees: f32,
    pub near_clip: f32,
    pub far_clip: f32,
}

fn default_up() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

impl Default for CameraParameters {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 8.0],
            interest: [0.0, 0.0, 0.0],
            up: default_up(),
            fov_degrees: 35.0,
            near_clip: 0.1,
            far_clip: 1000.0,
        }
    }
}

impl CameraParameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_finite("camera", &self.position)?;
        check_finite("camera", &self.interest)?;
        check_finite("camera", &self.up)?;
        check_finite("camera", &[self.fov_degrees, self.near_clip, self.far_clip])?;
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::InvalidCamera(format!(
                "field of view {}° outside (0, 180)",
                self.fov_degrees
            )));
        }
        if self.near_clip <= 0.0 || self.far_clip <= self.near_clip {
            return Err(ConfigError::InvalidCamera(format!(
                "clip range [{}, {}] is empty",
                self.near_clip, self.far_clip
            )));
        }
        let forward = Vec3::from_array(self.interest) - Vec3::from_array(self.position);
        if forward.length_squared() <= f32::EPSILON {
            return Err(ConfigError::InvalidCamera(
                "position and interest coincide".to_string(),
            ));
        }
        if forward.cross(Vec3::from_array(self.up)).length_squared() <= f32::EPSILON {
            return Err(ConfigError::InvalidCamera(
                "up vector is parallel to the view direction".to_string(),
            ));
        }
        Ok(())
    }

    pub fn projector(&self, aspect_ratio: f32) -> Option<CameraProjector> {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return None;
        }

        let eye = Vec3::from_array(self.position);
        let target = Vec3::from_array(self.interest);
        if (target - eye).length_squared() <= f32::EPSILON {
            return None;
        }
        let up = Vec3::from_array(self.up).try_normalize()?;

        let view = Mat4::look_at_rh(eye, target, up);
        let projection = Mat4::perspective_rh_gl(
            self.fov_degrees.to_radians(),
            aspect_ratio,
            self.near_clip.max(1e-4),
            self.far_clip.max(self.near_clip + 1.0),
        );

        Some(CameraProjector {
            view_projection: projection * view,
        })
    }
}

/// Combined view-projection for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraProjector {
    view_projection: Mat4,
}

impl CameraProjector {
    /// Normalised device coordinates of `position`. Points behind the camera
    /// or outside the frustum still project; only a degenerate `w` fails.
    pub fn project(&self, position: Vec3) -> Option<Vec3> {
        let clip = self.view_projection * Vec4::new(position.x, position.y, position.z, 1.0);
        if clip.w == 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !ndc.is_finite() {
            return None;
        }
        Some(ndc)
    }

    /// Projects straight to overlay percentages (see [`ndc_to_screen_percent`]).
    pub fn project_to_screen(&self, position: Vec3) -> Option<Vec2> {
        self.project(position)
            .map(|ndc| ndc_to_screen_percent(ndc.truncate()))
    }
}

/// NDC to percentage screen coordinates; Y is flipped because screen space
/// grows downward.
pub fn ndc_to_screen_percent(ndc: Vec2) -> Vec2 {
    Vec2::new((ndc.x * 0.5 + 0.5) * 100.0, (-ndc.y * 0.5 + 0.5) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projector() -> CameraProjector {
        CameraParameters::default()
            .projector(16.0 / 9.0)
            .expect("default camera projects")
    }

    #[test]
    fn focal_centre_lands_mid_screen() {
        let screen = projector()
            .project_to_screen(Vec3::ZERO)
            .expect("origin projects");
        assert!((screen.x - 50.0).abs() < 1e-4);
        assert!((screen.y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn screen_y_grows_downward() {
        let projector = projector();
        let above = projector
            .project_to_screen(Vec3::new(0.0, 1.0, 0.0))
            .expect("projects");
        let right = projector
            .project_to_screen(Vec3::new(1.0, 0.0, 0.0))
            .expect("projects");
        assert!(above.y < 50.0);
        assert!(right.x > 50.0);
    }

    #[test]
    fn points_behind_camera_still_project() {
        let screen = projector()
            .project_to_screen(Vec3::new(1.0, 1.0, 20.0))
            .expect("behind-camera point still yields coordinates");
        assert!(screen.x.is_finite() && screen.y.is_finite());
    }

    #[test]
    fn far_off_axis_points_leave_the_unit_range() {
        let screen = projector()
            .project_to_screen(Vec3::new(40.0, 0.0, 0.0))
            .expect("projects");
        assert!(screen.x > 100.0);
    }

    #[test]
    fn ndc_corners_map_to_screen_corners() {
        assert_eq!(ndc_to_screen_percent(Vec2::new(-1.0, 1.0)), Vec2::new(0.0, 0.0));
        assert_eq!(ndc_to_screen_percent(Vec2::new(1.0, -1.0)), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn invalid_cameras_are_rejected() {
        let mut camera = CameraParameters::default();
        camera.fov_degrees = 0.0;
        assert!(camera.validate().is_err());

        let mut camera = CameraParameters::default();
        camera.interest = camera.position;
        assert!(camera.validate().is_err());

        let mut camera = CameraParameters::default();
        camera.up = [0.0, 0.0, 1.0];
        assert!(camera.validate().is_err());

        assert!(CameraParameters::default().projector(0.0).is_none());
    }
}
