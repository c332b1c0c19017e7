/// Gesture-driven orientation state machine
///
/// Drags rotate the model, pinches scale it. The vertical drag direction is
/// flipped depending on which band the spin angle is in, so that dragging
/// toward the viewer keeps tilting the visible face toward the viewer no
/// matter how far the object has been spun.
use log::{trace, warn};
use serde::{Deserialize, Serialize};

/// Degrees of rotation per pixel of drag
pub const TOUCH_SCALE_FACTOR: f32 = 180.0 / 320.0;

/// Width in degrees of the bands around 0/360 and 180
pub const ROTATE_THRESHOLD_DEG: f32 = 30.0;

/// Live model orientation. Angles are unbounded; only their value mod 360
/// matters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationState {
    /// Spin angle, driven by horizontal drags
    pub x_angle_deg: f32,
    /// Tilt angle, driven by vertical drags
    pub y_angle_deg: f32,
    pub scale: f32,
}

impl OrientationState {
    pub fn new(x_angle_deg: f32, y_angle_deg: f32, scale: f32) -> Self {
        Self {
            x_angle_deg,
            y_angle_deg,
            scale,
        }
    }

    /// Spin angle folded into `[0, 360)`
    pub fn normalized_x(&self) -> f32 {
        normalize_degrees(self.x_angle_deg)
    }
}

impl Default for OrientationState {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

/// One drag sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureDelta {
    /// Horizontal movement since the previous sample, in pixels
    pub dx: f32,
    /// Vertical movement since the previous sample, screen down positive
    pub dy: f32,
    /// Absolute horizontal pointer position
    pub pointer_x: f32,
    pub viewport_width: f32,
}

impl GestureDelta {
    pub fn new(dx: f32, dy: f32, pointer_x: f32, viewport_width: f32) -> Self {
        Self {
            dx,
            dy,
            pointer_x,
            viewport_width,
        }
    }

    fn is_left_of_center(&self) -> bool {
        self.pointer_x < self.viewport_width / 2.0
    }

    fn is_right_of_center(&self) -> bool {
        self.pointer_x > self.viewport_width / 2.0
    }
}

/// Band of the normalized spin angle, for threshold `t`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragBand {
    /// `[0, t)`
    FrontLeading,
    /// `[t, 180 - t)`
    Rising,
    /// `[180 - t, 180 + t)`
    Back,
    /// `[180 + t, 360 - t)`
    Falling,
    /// `[360 - t, 360)`
    FrontTrailing,
}

impl DragBand {
    pub fn classify(x_pos: f32, threshold: f32) -> Self {
        if x_pos < threshold {
            DragBand::FrontLeading
        } else if x_pos < 180.0 - threshold {
            DragBand::Rising
        } else if x_pos < 180.0 + threshold {
            DragBand::Back
        } else if x_pos < 360.0 - threshold {
            DragBand::Falling
        } else {
            DragBand::FrontTrailing
        }
    }

    /// Whether the vertical delta gets a second sign flip in this band
    ///
    /// Near 0/360 the flip depends on the pointer's side of the viewport; the
    /// back band always flips.
    pub fn flips(self, delta: &GestureDelta) -> bool {
        match self {
            DragBand::FrontLeading => delta.is_left_of_center(),
            DragBand::FrontTrailing => delta.is_right_of_center(),
            DragBand::Back => true,
            DragBand::Rising | DragBand::Falling => false,
        }
    }
}

/// Tunables for [`OrientationController`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub rotate_threshold_deg: f32,
    pub touch_scale_factor: f32,
    pub initial_x_angle_deg: f32,
    pub initial_y_angle_deg: f32,
    pub initial_scale: f32,
}

impl InteractionConfig {
    pub fn initial_state(&self) -> OrientationState {
        OrientationState::new(
            self.initial_x_angle_deg,
            self.initial_y_angle_deg,
            self.initial_scale,
        )
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            rotate_threshold_deg: ROTATE_THRESHOLD_DEG,
            touch_scale_factor: TOUCH_SCALE_FACTOR,
            initial_x_angle_deg: 0.0,
            initial_y_angle_deg: 0.0,
            initial_scale: 1.0,
        }
    }
}

/// Sole writer of an [`OrientationState`]
#[derive(Debug, Clone)]
pub struct OrientationController {
    state: OrientationState,
    config: InteractionConfig,
}

impl OrientationController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            state: config.initial_state(),
            config,
        }
    }

    pub fn with_state(config: InteractionConfig, state: OrientationState) -> Self {
        Self { state, config }
    }

    pub fn state(&self) -> &OrientationState {
        &self.state
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Multiply the scale. Zoom is unbounded; factors that are not strictly
    /// positive are dropped.
    pub fn on_scale(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            warn!("ignoring scale factor {factor}");
            return;
        }
        self.state.scale *= factor;
        trace!("scale x{factor} -> {}", self.state.scale);
    }

    /// The band the current spin angle falls in
    pub fn band(&self) -> DragBand {
        DragBand::classify(self.state.normalized_x(), self.config.rotate_threshold_deg)
    }

    /// Vertical delta after both sign rules, before degree scaling
    pub fn oriented_dy(&self, delta: &GestureDelta) -> f32 {
        let dy = -delta.dy;
        if self.band().flips(delta) {
            -dy
        } else {
            dy
        }
    }

    pub fn on_drag(&mut self, delta: GestureDelta) {
        let dy = self.oriented_dy(&delta);
        self.state.y_angle_deg += dy * self.config.touch_scale_factor;
        self.state.x_angle_deg += delta.dx * self.config.touch_scale_factor;
        trace!(
            "drag ({}, {}) -> x {} y {}",
            delta.dx,
            delta.dy,
            self.state.x_angle_deg,
            self.state.y_angle_deg
        );
    }

    /// Back to the configured starting orientation
    pub fn reset(&mut self) {
        self.state = self.config.initial_state();
    }
}

impl Default for OrientationController {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

/// Turns absolute pointer samples into [`GestureDelta`]s
///
/// The first sample after a press only records the position. Samples taken
/// while a scale gesture is in progress are swallowed.
#[derive(Debug, Clone, Default)]
pub struct DragTracker {
    previous: Option<(f32, f32)>,
    scaling: bool,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, x: f32, y: f32) {
        self.previous = Some((x, y));
    }

    pub fn release(&mut self) {
        self.previous = None;
    }

    pub fn set_scaling(&mut self, scaling: bool) {
        self.scaling = scaling;
    }

    /// Feed a move sample; returns a delta once a previous sample exists
    pub fn motion(&mut self, x: f32, y: f32, viewport_width: f32) -> Option<GestureDelta> {
        let previous = self.previous.replace((x, y));
        if self.scaling {
            return None;
        }
        previous.map(|(px, py)| GestureDelta::new(x - px, y - py, x, viewport_width))
    }
}

/// Fold an angle into `[0, 360)`
pub fn normalize_degrees(angle: f32) -> f32 {
    let folded = angle % 360.0;
    if folded < 0.0 {
        folded + 360.0
    } else {
        folded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f32 = 200.0;
    const LEFT: f32 = 50.0;
    const RIGHT: f32 = 150.0;

    fn controller_at(x_angle_deg: f32) -> OrientationController {
        OrientationController::with_state(
            InteractionConfig::default(),
            OrientationState::new(x_angle_deg, 0.0, 1.0),
        )
    }

    fn drag_down(pointer_x: f32) -> GestureDelta {
        GestureDelta::new(0.0, 10.0, pointer_x, WIDTH)
    }

    #[test]
    fn test_band_sign_table() {
        // (spin angle, pointer x, expected dy sign before scaling)
        let cases = [
            (0.0, LEFT, 10.0),
            (0.0, RIGHT, -10.0),
            (15.0, LEFT, 10.0),
            (15.0, RIGHT, -10.0),
            (30.0, LEFT, -10.0),
            (90.0, LEFT, -10.0),
            (90.0, RIGHT, -10.0),
            (150.0, LEFT, 10.0),
            (180.0, LEFT, 10.0),
            (180.0, RIGHT, 10.0),
            (210.0, RIGHT, -10.0),
            (270.0, LEFT, -10.0),
            (270.0, RIGHT, -10.0),
            (330.0, LEFT, -10.0),
            (345.0, LEFT, -10.0),
            (345.0, RIGHT, 10.0),
        ];
        for (angle, pointer_x, expected) in cases {
            let controller = controller_at(angle);
            assert_eq!(
                controller.oriented_dy(&drag_down(pointer_x)),
                expected,
                "angle {angle}, pointer {pointer_x}"
            );
        }
    }

    #[test]
    fn test_band_boundaries() {
        let t = ROTATE_THRESHOLD_DEG;
        assert_eq!(DragBand::classify(0.0, t), DragBand::FrontLeading);
        assert_eq!(DragBand::classify(29.99, t), DragBand::FrontLeading);
        assert_eq!(DragBand::classify(30.0, t), DragBand::Rising);
        assert_eq!(DragBand::classify(150.0, t), DragBand::Back);
        assert_eq!(DragBand::classify(209.99, t), DragBand::Back);
        assert_eq!(DragBand::classify(210.0, t), DragBand::Falling);
        assert_eq!(DragBand::classify(330.0, t), DragBand::FrontTrailing);
        assert_eq!(DragBand::classify(359.99, t), DragBand::FrontTrailing);
    }

    #[test]
    fn test_negative_angles_are_normalized() {
        // -180 folds to 180, the back band
        let controller = controller_at(-180.0);
        assert_eq!(controller.band(), DragBand::Back);
        assert_eq!(controller.oriented_dy(&drag_down(LEFT)), 10.0);

        // -20 folds to 340, flipped only right of center
        let controller = controller_at(-20.0);
        assert_eq!(controller.band(), DragBand::FrontTrailing);
        assert_eq!(controller.oriented_dy(&drag_down(RIGHT)), 10.0);
        assert_eq!(controller.oriented_dy(&drag_down(LEFT)), -10.0);

        // 720 + 90 behaves like 90
        assert_eq!(controller_at(810.0).band(), DragBand::Rising);
    }

    #[test]
    fn test_drag_applies_touch_scale_factor() {
        let mut controller = controller_at(90.0);
        controller.on_drag(GestureDelta::new(32.0, 16.0, LEFT, WIDTH));

        let state = controller.state();
        assert!((state.x_angle_deg - (90.0 + 32.0 * TOUCH_SCALE_FACTOR)).abs() < 1e-4);
        assert!((state.y_angle_deg - (-16.0 * TOUCH_SCALE_FACTOR)).abs() < 1e-4);
    }

    #[test]
    fn test_drag_uses_angle_before_update() {
        // The band is read before dx moves the spin angle out of it
        let mut controller = controller_at(25.0);
        controller.on_drag(GestureDelta::new(20.0, 10.0, LEFT, WIDTH));
        assert!(controller.state().y_angle_deg > 0.0);
        assert_eq!(controller.band(), DragBand::Rising);
    }

    #[test]
    fn test_scale_round_trip() {
        let mut controller = OrientationController::default();
        let before = controller.state().scale;
        controller.on_scale(2.0);
        controller.on_scale(0.5);
        assert!((controller.state().scale - before).abs() < 1e-6);
    }

    #[test]
    fn test_scale_ignores_non_positive_factors() {
        let mut controller = OrientationController::default();
        controller.on_scale(0.0);
        controller.on_scale(-2.0);
        controller.on_scale(f32::NAN);
        assert_eq!(controller.state().scale, 1.0);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let config = InteractionConfig {
            initial_y_angle_deg: -60.0,
            initial_scale: 12.0,
            ..Default::default()
        };
        let mut controller = OrientationController::new(config);
        controller.on_drag(GestureDelta::new(5.0, 5.0, LEFT, WIDTH));
        controller.on_scale(3.0);
        controller.reset();
        assert_eq!(*controller.state(), OrientationState::new(0.0, -60.0, 12.0));
    }

    #[test]
    fn test_drag_tracker() {
        let mut tracker = DragTracker::new();
        assert_eq!(tracker.motion(10.0, 10.0, WIDTH), None);

        tracker.press(10.0, 10.0);
        let delta = tracker.motion(14.0, 7.0, WIDTH).unwrap();
        assert_eq!(delta, GestureDelta::new(4.0, -3.0, 14.0, WIDTH));

        tracker.set_scaling(true);
        assert_eq!(tracker.motion(20.0, 20.0, WIDTH), None);
        tracker.set_scaling(false);
        let delta = tracker.motion(21.0, 20.0, WIDTH).unwrap();
        assert_eq!(delta.dx, 1.0);

        tracker.release();
        assert_eq!(tracker.motion(30.0, 30.0, WIDTH), None);
    }
}
