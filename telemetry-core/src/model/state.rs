// Mutable state of the primary car, owned by the physics tick.

/// Simulation state advanced once per tick. The tick driver is the sole
/// mutator; everything published to viewers is derived into an immutable
/// [`TelemetrySample`](super::TelemetrySample).
#[derive(Clone, Copy, Debug)]
pub struct VehicleState {
    /// Distance around the lap in metres, always within `[0, track length)`.
    pub distance_m: f64,
    pub speed_kmh: f64,
    /// Current gear, `1..=8`.
    pub gear: u8,
    pub fuel_percent: f64,
    /// Lap counter, starts at 1.
    pub lap: u32,
    pub lap_time_ms: f64,
    pub last_lap_time_ms: f64,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            distance_m: 0.0,
            speed_kmh: 0.0,
            gear: 1,
            fuel_percent: 98.0,
            lap: 1,
            lap_time_ms: 0.0,
            last_lap_time_ms: 0.0,
        }
    }
}

impl VehicleState {
    /// All fields finite and within their documented ranges. Used by the
    /// tick to reject a corrupted integration step before committing it.
    pub fn is_valid(&self, track_length_m: f64) -> bool {
        self.distance_m.is_finite()
            && self.speed_kmh.is_finite()
            && self.fuel_percent.is_finite()
            && self.lap_time_ms.is_finite()
            && (0.0..track_length_m).contains(&self.distance_m)
            && self.speed_kmh >= 0.0
            && (1..=8).contains(&self.gear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_valid() {
        let state = VehicleState::default();
        assert!(state.is_valid(3550.0));
        assert_eq!(state.lap, 1);
        assert_eq!(state.gear, 1);
    }

    #[test]
    fn invalid_states_are_rejected() {
        let mut state = VehicleState::default();
        state.speed_kmh = f64::NAN;
        assert!(!state.is_valid(3550.0));

        let mut state = VehicleState::default();
        state.distance_m = 3550.0;
        assert!(!state.is_valid(3550.0));

        let mut state = VehicleState::default();
        state.gear = 0;
        assert!(!state.is_valid(3550.0));
    }
}
