use crate::render::camera::CameraField;
use crate::scene::{ObjectField, ObjectHandle};
use glam::{Mat2, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragButton {
    Primary,
    Secondary,
}

/// A scalar somewhere in the editor that a drag can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Camera(CameraField),
    Object(ObjectHandle, ObjectField),
}

/// One axis of a binding: where the delta goes and how low it may push.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub param: Param,
    pub floor: Option<f32>,
}

impl Channel {
    pub fn free(param: Param) -> Self {
        Self { param, floor: None }
    }

    pub fn non_negative(param: Param) -> Self {
        Self {
            param,
            floor: Some(0.0),
        }
    }
}

/// Receives adjusted values from a binding.
pub trait ParamSink {
    fn adjust(&mut self, param: Param, amount: f32, floor: Option<f32>);
}

/// Linear map from pointer motion to up to two parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding {
    pub transform: Mat2,
    pub channels: [Option<Channel>; 2],
}

impl Binding {
    pub fn new(transform: Mat2, x: Channel, y: Channel) -> Self {
        Self {
            transform,
            channels: [Some(x), Some(y)],
        }
    }

    /// Binding that ignores every motion.
    pub fn none() -> Self {
        Self {
            transform: Mat2::IDENTITY,
            channels: [None, None],
        }
    }

    /// Pushes `delta.x` to the first channel and `delta.y` to the second.
    pub fn dispatch(&self, delta: Vec2, sink: &mut dyn ParamSink) {
        for (amount, channel) in [delta.x, delta.y].into_iter().zip(self.channels) {
            if let Some(channel) = channel {
                sink.adjust(channel.param, amount, channel.floor);
            }
        }
    }
}

impl Default for Binding {
    fn default() -> Self {
        Self::none()
    }
}

/// Builds a matrix from its rows, `[a b; c d]`.
pub fn row_major(a: f32, b: f32, c: f32, d: f32) -> Mat2 {
    Mat2::from_cols_array(&[a, c, b, d])
}

/// Pointer drag state plus the bindings for both buttons.
#[derive(Debug, Clone)]
pub struct GestureBindings {
    primary: Binding,
    secondary: Binding,
    active: Option<DragButton>,
    prev: Vec2,
    pointer_px: Vec2,
    window: Vec2,
}

impl GestureBindings {
    pub fn new(width: u32, height: u32) -> Self {
        let mut gestures = Self {
            primary: Binding::none(),
            secondary: Binding::none(),
            active: None,
            prev: Vec2::ZERO,
            pointer_px: Vec2::ZERO,
            window: Vec2::ONE,
        };
        gestures.resize(width, height);
        gestures
    }

    /// Replaces both bindings and drops any drag in progress.
    pub fn install(&mut self, primary: Binding, secondary: Binding) {
        self.primary = primary;
        self.secondary = secondary;
        self.active = None;
    }

    pub fn activate(&mut self, button: DragButton) {
        self.prev = self.pointer_normalized();
        self.active = Some(button);
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.window = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    }

    /// Pointer position in `[0,1]²` with the origin at the bottom left.
    pub fn pointer_normalized(&self) -> Vec2 {
        Vec2::new(
            self.pointer_px.x / self.window.x,
            (self.window.y - self.pointer_px.y) / self.window.y,
        )
    }

    /// Records the pointer and, while dragging, dispatches the transformed
    /// motion. Returns the delta that was dispatched.
    pub fn on_pointer_move(&mut self, x: f32, y: f32, sink: &mut dyn ParamSink) -> Option<Vec2> {
        self.pointer_px = Vec2::new(x, y);
        let button = self.active?;
        let binding = match button {
            DragButton::Primary => self.primary,
            DragButton::Secondary => self.secondary,
        };
        let pos = self.pointer_normalized();
        let delta = binding.transform * (pos - self.prev);
        binding.dispatch(delta, sink);
        self.prev = pos;
        Some(delta)
    }
}
