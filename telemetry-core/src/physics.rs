// Discrete-time vehicle simulation: rule-based driver model, longitudinal
// dynamics, gearbox, DRS, and derived telemetry channels.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::clock::{clock_string, format_lap_time};
use crate::model::{DrsState, TelemetrySample, VehicleState};
use crate::track::{SegmentKind, TrackModel, TrackSegment};

/// Recommended tick step in seconds (10 ms, 100 Hz).
pub const TICK_DT_S: f64 = 0.01;

pub const MAX_SPEED_KMH: f64 = 320.0;

// Braking-distance rule assumes this deceleration; the actual brake force
// below is stronger, so the car reaches the corner target with margin.
const BRAKE_RULE_DECEL_MS2: f64 = 25.0;
const BRAKE_MARGIN_M: f64 = 50.0;
const ENGINE_ACCEL_MS2: f64 = 15.0;
const BRAKE_FORCE_MS2: f64 = 30.0;
const DRAG_FACTOR_MS2: f64 = 2.0;

// Upshift thresholds in km/h; index g is the shift point out of gear g.
const GEAR_SHIFT_KMH: [f64; 8] = [0.0, 60.0, 100.0, 140.0, 190.0, 240.0, 280.0, 330.0];
const TOP_GEAR_CEILING_KMH: f64 = 350.0;
const RPM_FLOOR: f64 = 4000.0;
const RPM_SPAN: f64 = 8000.0;

const DRS_MIN_STRAIGHT_M: f64 = 500.0;
const DRS_EDGE_MARGIN_M: f64 = 100.0;
const DRS_BOOST_KMH: f64 = 0.1;

const GRAVITY_MS2: f64 = 9.81;
const FUEL_DRAIN_PER_TICK: f64 = 0.001;

#[derive(Clone, Copy, Debug, Default)]
struct DriverInputs {
    throttle: f64,
    brake: f64,
    steering_deg: f64,
}

/// Owns everything a tick mutates: the vehicle state, the tick counter,
/// and the noise source. One context per simulated car; the broadcast
/// server holds exactly one and passes it to [`advance`](Self::advance)
/// on every timer fire.
#[derive(Debug)]
pub struct SimulationContext {
    tick: u64,
    sim_time_s: f64,
    state: VehicleState,
    rng: SmallRng,
}

impl SimulationContext {
    pub fn new(seed: u64) -> Self {
        Self {
            tick: 0,
            sim_time_s: 0.0,
            state: VehicleState::default(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulated time elapsed, in seconds.
    pub fn sim_time_s(&self) -> f64 {
        self.sim_time_s
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Synthesizes the rival field for the current tick. Uses this
    /// context's clock and noise source so a seeded run reproduces the
    /// whole grid, not just the primary car.
    pub fn synthesize_rivals(
        &mut self,
        track: &TrackModel,
        count: u32,
        primary_rpm: f64,
    ) -> Vec<crate::model::RivalSample> {
        crate::rivals::synthesize_field(
            self.sim_time_s,
            &self.state,
            primary_rpm,
            track,
            count,
            &mut self.rng,
        )
    }

    /// Advances the simulation by `dt_s` and emits the tick's sample.
    ///
    /// Total over its valid domain: a non-finite or out-of-range result of
    /// the integration step is discarded and the previous state is held for
    /// this tick instead of corrupting the loop.
    pub fn advance(&mut self, track: &TrackModel, dt_s: f64, now_epoch_ms: u64) -> TelemetrySample {
        let total_length = track.total_length_m();
        let mut next = self.state;

        let (seg_index, segment, dist_into) = track.segment_at(next.distance_m);
        let inputs = self.driver_inputs(seg_index, segment, dist_into, track);

        // Longitudinal dynamics: engine torque falling with speed, brake
        // force, and aero drag.
        let mut accel_ms2 = 0.0;
        if inputs.throttle > 0.0 {
            let torque = 1.0 - next.speed_kmh / MAX_SPEED_KMH;
            accel_ms2 += (inputs.throttle / 100.0) * ENGINE_ACCEL_MS2 * torque;
        }
        if inputs.brake > 0.0 {
            accel_ms2 -= (inputs.brake / 100.0) * BRAKE_FORCE_MS2;
        }
        accel_ms2 -= (next.speed_kmh / MAX_SPEED_KMH) * DRAG_FACTOR_MS2;

        next.speed_kmh = (next.speed_kmh + accel_ms2 * dt_s * 3.6).max(0.0);
        next.distance_m += (next.speed_kmh / 3.6) * dt_s;
        next.lap_time_ms += dt_s * 1000.0;

        if next.distance_m >= total_length {
            next.distance_m -= total_length;
            next.lap += 1;
            next.last_lap_time_ms = next.lap_time_ms;
            next.lap_time_ms = 0.0;
        }

        next.gear = shift_gear(next.speed_kmh, next.gear);
        let rpm = self.rpm_for(next.speed_kmh, next.gear);

        let drs = drs_at(segment, dist_into);
        if drs.is_open() {
            next.speed_kmh += DRS_BOOST_KMH;
        }

        next.fuel_percent = (next.fuel_percent - (inputs.throttle / 100.0) * FUEL_DRAIN_PER_TICK).max(0.0);

        let g_long = accel_ms2 / GRAVITY_MS2;
        let g_lat = match segment.kind {
            SegmentKind::Corner { radius_m, .. } => {
                let v_ms = next.speed_kmh / 3.6;
                let sign = if inputs.steering_deg > 0.0 { 1.0 } else { -1.0 };
                (v_ms * v_ms / radius_m.max(1.0)) / GRAVITY_MS2 * sign
            }
            SegmentKind::Straight => 0.0,
        };

        // Commit only a sane state; otherwise hold the previous one and
        // emit a coasting sample for this tick.
        if next.is_valid(total_length) {
            self.state = next;
        }
        self.tick += 1;
        self.sim_time_s += dt_s;

        self.build_sample(
            track,
            now_epoch_ms,
            inputs,
            rpm,
            drs,
            g_long,
            g_lat,
        )
    }

    fn driver_inputs(
        &mut self,
        seg_index: usize,
        segment: &TrackSegment,
        dist_into: f64,
        track: &TrackModel,
    ) -> DriverInputs {
        let speed = self.state.speed_kmh;
        match segment.kind {
            SegmentKind::Straight => {
                let dist_to_corner = (segment.length_m - dist_into).max(0.0);
                let next_target = track
                    .next_segment(seg_index)
                    .target_speed_kmh()
                    .unwrap_or(0.0);

                let v_now = speed / 3.6;
                let v_target = next_target / 3.6;
                let braking_dist =
                    (v_now * v_now - v_target * v_target) / (2.0 * BRAKE_RULE_DECEL_MS2);

                let (throttle, brake) =
                    if dist_to_corner < braking_dist + BRAKE_MARGIN_M && speed > next_target {
                        let force = if dist_to_corner < braking_dist { 100.0 } else { 50.0 };
                        (0.0, force)
                    } else {
                        (100.0, 0.0)
                    };

                DriverInputs {
                    throttle,
                    brake,
                    // Straight-line micro corrections.
                    steering_deg: (self.rng.gen::<f64>() - 0.5) * 2.0,
                }
            }
            SegmentKind::Corner {
                target_speed_kmh,
                radius_m,
            } => {
                let (throttle, brake) = if speed > target_speed_kmh + 5.0 {
                    (0.0, 50.0)
                } else if speed < target_speed_kmh - 5.0 {
                    (80.0, 0.0)
                } else {
                    (40.0, 0.0)
                };

                // Alternate turn direction by segment parity.
                let direction = if seg_index % 2 == 0 { 1.0 } else { -1.0 };
                DriverInputs {
                    throttle,
                    brake,
                    steering_deg: (500.0 / radius_m.max(1.0)) * direction,
                }
            }
        }
    }

    fn rpm_for(&mut self, speed_kmh: f64, gear: u8) -> f64 {
        let gear_min = GEAR_SHIFT_KMH[(gear - 1) as usize];
        let gear_max = if (gear as usize) < GEAR_SHIFT_KMH.len() {
            GEAR_SHIFT_KMH[gear as usize]
        } else {
            TOP_GEAR_CEILING_KMH
        };
        let range = (gear_max - gear_min).max(1.0);
        let pct = ((speed_kmh - gear_min) / range).clamp(0.0, 1.0);
        RPM_FLOOR + pct * RPM_SPAN + self.rng.gen::<f64>() * 100.0
    }

    #[allow(clippy::too_many_arguments)]
    fn build_sample(
        &mut self,
        track: &TrackModel,
        now_epoch_ms: u64,
        inputs: DriverInputs,
        rpm: f64,
        drs: DrsState,
        g_long: f64,
        g_lat: f64,
    ) -> TelemetrySample {
        let state = &self.state;
        let tick_s = self.sim_time_s;
        let lap_fraction = state.distance_m / track.total_length_m();
        let rpm_pct = rpm / 12_000.0;
        let throttle_pct = inputs.throttle / 100.0;

        TelemetrySample {
            tick: self.tick,
            timestamp: clock_string(now_epoch_ms),
            original_time: now_epoch_ms,

            heart_rate: 120.0 + g_long * 10.0 + (g_lat * 20.0).abs() + self.rng.gen::<f64>() * 5.0,
            breath: 18.0 + g_long * 2.0,
            stress: 50.0 + (state.speed_kmh / MAX_SPEED_KMH) * 50.0,

            lap_progress: lap_fraction * 100.0,
            lap: state.lap,
            last_lap_time: format_lap_time(state.last_lap_time_ms),
            current_lap_time: format_lap_time(state.lap_time_ms),

            steering: inputs.steering_deg,
            throttle: inputs.throttle,
            brake: inputs.brake,
            gear: state.gear,
            drs_status: drs,

            speed: state.speed_kmh,
            rpm,
            g_lat,
            g_long,
            heading: lap_fraction * 360.0,

            oil_temp: 105.0 + rpm_pct * 10.0 + (tick_s * 0.1).sin() * 2.0,
            oil_pressure: 3.5 + rpm_pct * 2.5,
            water_temp: 90.0 + rpm_pct * 15.0,
            gearbox_temp: 110.0 + g_long.abs() * 5.0,
            fuel_flow: 10.0 + throttle_pct * 90.0,
            fuel: state.fuel_percent,
            turbo_boost: 1.0 + throttle_pct * 2.5,
            exhaust_temp: 600.0 + throttle_pct * 350.0,
            battery_voltage: 13.5 + tick_s.sin() * 0.2,

            fl_temp: 90.0 + (g_lat * 10.0).abs() + inputs.brake * 0.5,
            fr_temp: 90.0 + (g_lat * 10.0).abs() + inputs.brake * 0.5,
            rl_temp: 95.0 + inputs.throttle * 0.2,
            rr_temp: 95.0 + inputs.throttle * 0.2,
            fl_press: 1.2 + state.speed_kmh / 10_000.0,
            fr_press: 1.2 + state.speed_kmh / 10_000.0,
            rl_press: 1.2 + state.speed_kmh / 10_000.0,
            rr_press: 1.2 + state.speed_kmh / 10_000.0,
            brake_pressure: inputs.brake * 1.5,

            front_wing_load: state.speed_kmh * state.speed_kmh * 0.03,
            rear_wing_load: state.speed_kmh * state.speed_kmh * 0.05,
            suspension_fl: 120.0 + g_lat * 10.0 - g_long * 5.0 + self.rng.gen::<f64>() * 2.0,
            suspension_fr: 120.0 - g_lat * 10.0 - g_long * 5.0 + self.rng.gen::<f64>() * 2.0,
            suspension_rl: 120.0 + g_lat * 10.0 + g_long * 5.0 + self.rng.gen::<f64>() * 2.0,
            suspension_rr: 120.0 - g_lat * 10.0 + g_long * 5.0 + self.rng.gen::<f64>() * 2.0,

            air_temp: 28.0,
            track_temp: 42.0,
            humidity: 65.0,
            wind_speed: 12.0,
            wind_dir: "NE".to_string(),
            gps_sats: 14,
        }
    }
}

/// Hysteresis-free threshold lookup; shifts at most one gear per tick.
fn shift_gear(speed_kmh: f64, gear: u8) -> u8 {
    if gear < 8 && speed_kmh > GEAR_SHIFT_KMH[gear as usize] {
        gear + 1
    } else if gear > 1 && speed_kmh < GEAR_SHIFT_KMH[(gear - 1) as usize] {
        gear - 1
    } else {
        gear
    }
}

/// DRS opens only on long straights, away from both segment ends.
fn drs_at(segment: &TrackSegment, dist_into: f64) -> DrsState {
    let open = segment.is_straight()
        && segment.length_m > DRS_MIN_STRAIGHT_M
        && dist_into > DRS_EDGE_MARGIN_M
        && dist_into < segment.length_m - DRS_EDGE_MARGIN_M;
    if open {
        DrsState::Open
    } else {
        DrsState::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackModel;

    fn run_ticks(ctx: &mut SimulationContext, track: &TrackModel, n: usize) -> TelemetrySample {
        let mut last = None;
        for i in 0..n {
            last = Some(ctx.advance(track, TICK_DT_S, 1_700_000_000_000 + i as u64 * 10));
        }
        last.expect("at least one tick")
    }

    #[test]
    fn speed_never_goes_negative() {
        let track = TrackModel::new(vec![
            TrackSegment::corner(400.0, 10.0, 25.0),
            TrackSegment::corner(400.0, 10.0, 25.0),
        ]);
        let mut ctx = SimulationContext::new(7);
        ctx.state.speed_kmh = 80.0;
        for _ in 0..2_000 {
            let sample = ctx.advance(&track, TICK_DT_S, 0);
            assert!(sample.speed >= 0.0);
            assert!(ctx.state().speed_kmh >= 0.0);
        }
    }

    #[test]
    fn car_accelerates_from_standstill_on_a_straight() {
        let track = TrackModel::demo_circuit();
        let mut ctx = SimulationContext::new(1);
        let sample = run_ticks(&mut ctx, &track, 300);
        assert!(sample.speed > 50.0, "speed after 3 s: {}", sample.speed);
        assert!(sample.throttle > 0.0);
        assert_eq!(sample.brake, 0.0);
    }

    #[test]
    fn lap_wraps_once_and_distance_resets() {
        let track = TrackModel::demo_circuit();
        let mut ctx = SimulationContext::new(2);
        ctx.state.distance_m = track.total_length_m() - 3.0;
        ctx.state.speed_kmh = 60.0;
        ctx.state.lap_time_ms = 88_000.0;

        // 60 km/h covers 3 m in 180 ms; give it 50 ticks.
        let mut wraps = 0;
        for _ in 0..50 {
            let lap_before = ctx.state().lap;
            ctx.advance(&track, TICK_DT_S, 0);
            if ctx.state().lap > lap_before {
                wraps += 1;
            }
        }
        assert_eq!(wraps, 1);
        assert_eq!(ctx.state().lap, 2);
        assert!(ctx.state().distance_m < 10.0);
        assert!(ctx.state().last_lap_time_ms >= 88_000.0);
        assert!(ctx.state().lap_time_ms < 500.0);
    }

    #[test]
    fn gear_follows_monotonic_speed_profiles() {
        let mut gear = 1u8;
        let mut previous = gear;
        for step in 0..700 {
            let speed = step as f64 * 0.5;
            gear = shift_gear(speed, gear);
            assert!(gear >= previous, "gear dropped while accelerating");
            previous = gear;
        }
        assert_eq!(gear, 8);

        for step in (0..700).rev() {
            let speed = step as f64 * 0.5;
            gear = shift_gear(speed, gear);
            assert!(gear <= previous, "gear rose while decelerating");
            previous = gear;
        }
        assert_eq!(gear, 1);
    }

    #[test]
    fn gear_stays_in_range() {
        assert_eq!(shift_gear(400.0, 8), 8);
        assert_eq!(shift_gear(0.0, 1), 1);
    }

    #[test]
    fn braking_zone_reaches_corner_target_speed() {
        // 1200 m straight into a 90 km/h corner; car starts 1000 m out
        // at 300 km/h.
        let track = TrackModel::new(vec![
            TrackSegment::straight(1200.0),
            TrackSegment::corner(200.0, 90.0, 40.0),
            TrackSegment::straight(2000.0),
        ]);
        let mut ctx = SimulationContext::new(3);
        ctx.state.distance_m = 200.0;
        ctx.state.speed_kmh = 300.0;
        ctx.state.gear = 7;

        let mut entry_speed = None;
        for _ in 0..6_000 {
            ctx.advance(&track, TICK_DT_S, 0);
            if ctx.state().distance_m >= 1200.0 {
                entry_speed = Some(ctx.state().speed_kmh);
                break;
            }
        }
        let entry_speed = entry_speed.expect("car reached the corner");
        assert!(
            (80.0..=100.0).contains(&entry_speed),
            "corner entry speed {} not within ±10 of target 90",
            entry_speed
        );
    }

    #[test]
    fn drs_window_on_a_long_straight() {
        let straight = TrackSegment::straight(1000.0);
        assert_eq!(drs_at(&straight, 50.0), DrsState::Closed);
        assert_eq!(drs_at(&straight, 100.0), DrsState::Closed);
        assert_eq!(drs_at(&straight, 101.0), DrsState::Open);
        assert_eq!(drs_at(&straight, 500.0), DrsState::Open);
        assert_eq!(drs_at(&straight, 899.0), DrsState::Open);
        assert_eq!(drs_at(&straight, 900.0), DrsState::Closed);
        assert_eq!(drs_at(&straight, 950.0), DrsState::Closed);
    }

    #[test]
    fn drs_never_opens_on_short_straights_or_corners() {
        let short = TrackSegment::straight(400.0);
        assert_eq!(drs_at(&short, 200.0), DrsState::Closed);
        let corner = TrackSegment::corner(600.0, 120.0, 80.0);
        assert_eq!(drs_at(&corner, 300.0), DrsState::Closed);
    }

    #[test]
    fn identical_seeds_reproduce_identical_runs() {
        let track = TrackModel::demo_circuit();
        let mut a = SimulationContext::new(42);
        let mut b = SimulationContext::new(42);
        for i in 0..500 {
            let sa = a.advance(&track, TICK_DT_S, i);
            let sb = b.advance(&track, TICK_DT_S, i);
            assert_eq!(sa.speed, sb.speed);
            assert_eq!(sa.rpm, sb.rpm);
            assert_eq!(sa.steering, sb.steering);
        }
    }

    #[test]
    fn samples_stay_within_physical_bounds() {
        let track = TrackModel::demo_circuit();
        let mut ctx = SimulationContext::new(9);
        for _ in 0..20_000 {
            let sample = ctx.advance(&track, TICK_DT_S, 0);
            // DRS can push the car a little past the torque equilibrium.
            assert!(sample.speed >= 0.0 && sample.speed <= MAX_SPEED_KMH + 40.0);
            assert!(sample.rpm >= RPM_FLOOR && sample.rpm <= RPM_FLOOR + RPM_SPAN + 100.0);
            assert!((1..=8).contains(&sample.gear));
            assert!((0.0..=100.0).contains(&sample.lap_progress));
            assert!((0.0..=100.0).contains(&sample.throttle));
            assert!((0.0..=100.0).contains(&sample.brake));
            assert!(sample.fuel >= 0.0 && sample.fuel <= 98.0);
            assert!(sample.g_lat.is_finite() && sample.g_long.is_finite());
        }
    }

    #[test]
    fn fuel_drains_monotonically() {
        let track = TrackModel::demo_circuit();
        let mut ctx = SimulationContext::new(4);
        let mut previous = ctx.state().fuel_percent;
        for _ in 0..5_000 {
            ctx.advance(&track, TICK_DT_S, 0);
            let fuel = ctx.state().fuel_percent;
            assert!(fuel <= previous);
            assert!(fuel >= 0.0);
            previous = fuel;
        }
        assert!(previous < 98.0);
    }
}
