use glam::{Mat2, Mat4, Vec2, Vec3};

/// Orbit camera around the scene centre.
///
/// These three scalars are the whole camera state; they are what slot files
/// persist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraController {
    /// Distance from the camera to the centre of the scene.
    pub view_dist: f32,
    /// Rotates the camera sideways around the centre.
    pub rot_sideways_deg: f32,
    /// Rotates the camera up and over the centre.
    pub rot_up_over_deg: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(7.5, 0.0, 20.0)
    }
}

/// Which parameter of the camera a gesture channel drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraField {
    ViewDist,
    RotSideways,
    RotUpOver,
}

impl CameraController {
    pub fn new(view_dist: f32, rot_sideways_deg: f32, rot_up_over_deg: f32) -> Self {
        Self {
            view_dist,
            rot_sideways_deg,
            rot_up_over_deg,
        }
    }

    pub fn adjust(&mut self, field: CameraField, amount: f32, floor: Option<f32>) {
        let slot = match field {
            CameraField::ViewDist => &mut self.view_dist,
            CameraField::RotSideways => &mut self.rot_sideways_deg,
            CameraField::RotUpOver => &mut self.rot_up_over_deg,
        };
        let value = *slot + amount;
        *slot = floor.map_or(value, |min| value.max(min));
    }

    /// Scroll wheel towards the scene.
    pub fn zoom_in(&mut self) {
        let base = if self.view_dist < 0.0 {
            self.view_dist
        } else {
            self.view_dist * 0.8
        };
        self.view_dist = base - 0.05;
    }

    /// Scroll wheel away from the scene.
    pub fn zoom_out(&mut self) {
        let base = if self.view_dist < 0.0 {
            self.view_dist
        } else {
            self.view_dist * 1.25
        };
        self.view_dist = base + 0.05;
    }

    pub fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_x(self.rot_up_over_deg.to_radians())
            * Mat4::from_rotation_y(self.rot_sideways_deg.to_radians())
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.view_dist)) * self.rotation()
    }

    /// Maps a normalized screen position onto the ground plane's X/Z axes,
    /// following the camera's sideways rotation.
    pub fn screen_to_ground(&self, screen: Vec2) -> Vec2 {
        rotation_2d(self.rot_sideways_deg) * screen
    }

    /// Drag transform for moving an object across the ground so that it
    /// follows the pointer whatever the sideways rotation.
    pub fn ground_drag_transform(&self) -> Mat2 {
        rotation_2d(-self.rot_sideways_deg) * Mat2::from_diagonal(Vec2::new(10.0, -10.0))
    }
}

/// Counter-clockwise rotation of the X-Y plane.
pub fn rotation_2d(degrees: f32) -> Mat2 {
    Mat2::from_angle(degrees.to_radians())
}

/// Perspective frustum that keeps the same slice of the scene visible across
/// the narrower window axis.
pub fn projection_for_window(width: u32, height: u32) -> Mat4 {
    let near = 0.2;
    let far = 500.0;
    let half = 0.04;
    let width = width.max(1) as f32;
    let height = height.max(1) as f32;
    let (half_w, half_h) = if width < height {
        (half, half * height / width)
    } else {
        (half * width / height, half)
    };
    frustum(-half_w, half_w, -half_h, half_h, near, far)
}

fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let rl = right - left;
    let tb = top - bottom;
    let fnr = far - near;
    Mat4::from_cols_array(&[
        2.0 * near / rl,
        0.0,
        0.0,
        0.0,
        0.0,
        2.0 * near / tb,
        0.0,
        0.0,
        (right + left) / rl,
        (top + bottom) / tb,
        -(far + near) / fnr,
        -1.0,
        0.0,
        0.0,
        -2.0 * far * near / fnr,
        0.0,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn zoom_moves_towards_and_away() {
        let mut camera = CameraController::default();
        camera.zoom_in();
        assert!((camera.view_dist - (7.5 * 0.8 - 0.05)).abs() < 1e-6);
        camera.zoom_out();
        assert!((camera.view_dist - ((7.5 * 0.8 - 0.05) * 1.25 + 0.05)).abs() < 1e-5);
    }

    #[test]
    fn negative_distance_zooms_linearly() {
        let mut camera = CameraController::new(-1.0, 0.0, 0.0);
        camera.zoom_in();
        assert!((camera.view_dist + 1.05).abs() < 1e-6);
        camera.zoom_out();
        assert!((camera.view_dist + 1.0).abs() < 1e-6);
    }

    #[test]
    fn view_matrix_places_centre_in_front() {
        let camera = CameraController::new(5.0, 30.0, 20.0);
        let centre = camera.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((centre.z + 5.0).abs() < 1e-5);
        assert!(centre.x.abs() < 1e-5 && centre.y.abs() < 1e-5);
    }

    #[test]
    fn ground_drag_without_rotation_scales_axes() {
        let camera = CameraController::new(5.0, 0.0, 20.0);
        let moved = camera.ground_drag_transform() * Vec2::new(0.1, 0.2);
        assert!((moved - Vec2::new(1.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn screen_to_ground_follows_sideways_rotation() {
        let camera = CameraController::new(5.0, 90.0, 20.0);
        let ground = camera.screen_to_ground(Vec2::new(1.0, 0.0));
        assert!((ground - Vec2::new(0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn adjust_respects_floor() {
        let mut camera = CameraController::default();
        camera.adjust(CameraField::RotSideways, 45.0, None);
        assert_eq!(camera.rot_sideways_deg, 45.0);
        camera.adjust(CameraField::ViewDist, -100.0, Some(0.0));
        assert_eq!(camera.view_dist, 0.0);
    }

    #[test]
    fn projection_keeps_finite_values_for_any_aspect() {
        for (w, h) in [(960, 640), (640, 960), (0, 0)] {
            let projection = projection_for_window(w, h);
            assert!(projection.to_cols_array().iter().all(|v| v.is_finite()));
        }
    }
}
