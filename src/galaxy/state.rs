/// Speeds are kept on a micro-radian grid so repeated steps do not drift.
const SPEED_GRID: f32 = 1_000_000.0;

/// Rotation flags written by UI handlers and read once per frame.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionState {
    rotation_enabled: bool,
    rotation_speed: f32,
    speed_step: f32,
}

impl InteractionState {
    pub fn new(rotation_enabled: bool, rotation_speed: f32, speed_step: f32) -> Self {
        InteractionState {
            rotation_enabled,
            rotation_speed: snap(rotation_speed.max(0.0)),
            speed_step: speed_step.abs(),
        }
    }

    pub fn rotation_enabled(&self) -> bool {
        self.rotation_enabled
    }

    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    pub fn toggle_rotation(&mut self) {
        self.rotation_enabled = !self.rotation_enabled;
    }

    pub fn set_rotation_enabled(&mut self, enabled: bool) {
        self.rotation_enabled = enabled;
    }

    pub fn faster(&mut self) {
        self.rotation_speed = snap(self.rotation_speed + self.speed_step);
    }

    pub fn slower(&mut self) {
        self.rotation_speed = snap((self.rotation_speed - self.speed_step).max(0.0));
    }

    /// Speed in thousandths of a radian per frame, as shown on the readout.
    pub fn speed_readout(&self) -> u32 {
        (self.rotation_speed * 1000.0).round() as u32
    }

    pub fn toggle_label(&self) -> &'static str {
        if self.rotation_enabled {
            "Stop Rotation"
        } else {
            "Start Rotation"
        }
    }
}

fn snap(speed: f32) -> f32 {
    (speed * SPEED_GRID).round() / SPEED_GRID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slower_clamps_at_zero() {
        let mut state = InteractionState::new(true, 0.005, 0.001);
        for _ in 0..3 {
            state.slower();
        }
        assert_eq!(state.rotation_speed(), 0.002);
        for _ in 0..3 {
            state.slower();
        }
        assert_eq!(state.rotation_speed(), 0.0);
    }

    #[test]
    fn speed_never_negative() {
        let mut state = InteractionState::new(true, 0.0, 0.001);
        let actions = [false, false, true, false, false, false, true, true, false];
        for faster in actions {
            if faster {
                state.faster();
            } else {
                state.slower();
            }
            assert!(state.rotation_speed() >= 0.0);
        }
    }

    #[test]
    fn readout_shows_thousandths() {
        let mut state = InteractionState::new(true, 0.005, 0.001);
        assert_eq!(state.speed_readout(), 5);
        state.faster();
        state.faster();
        assert_eq!(state.speed_readout(), 7);
        for _ in 0..10 {
            state.slower();
        }
        assert_eq!(state.speed_readout(), 0);
    }

    #[test]
    fn toggle_flips_label() {
        let mut state = InteractionState::new(true, 0.005, 0.001);
        assert_eq!(state.toggle_label(), "Stop Rotation");
        state.toggle_rotation();
        assert!(!state.rotation_enabled());
        assert_eq!(state.toggle_label(), "Start Rotation");
    }

    #[test]
    fn explicit_enable_is_idempotent() {
        let mut state = InteractionState::new(false, 0.005, 0.001);
        state.set_rotation_enabled(true);
        state.set_rotation_enabled(true);
        assert!(state.rotation_enabled());
        assert_eq!(state.toggle_label(), "Stop Rotation");
        state.set_rotation_enabled(false);
        assert!(!state.rotation_enabled());
    }

    #[test]
    fn negative_initial_speed_is_clamped() {
        assert_eq!(InteractionState::new(true, -1.0, 0.001).rotation_speed(), 0.0);
    }
}
