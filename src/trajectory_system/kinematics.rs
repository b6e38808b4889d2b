use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::aerodynamics::{AeroCoefficients, AerodynamicsModel};
use super::coefficient_table::CoefficientTable;
use super::flight_phase::{FlightEvent, FlightPhase, TerminationReason};
use crate::constants::GRAVITY;
use crate::control::environment::Atmosphere;
use crate::control::guidance::{PitchPolicy, PolicyContext, TargetPursuit};
use crate::control::mission::{IntegrationSettings, LaunchConditions, Mission};
use crate::control::propulsion::PropulsionState;
use crate::control::rocket::Rocket;
use crate::errors::{SimulationError, SimulationResult};
use crate::telemetry_system::telemetry::{
    AuxiliaryRecord, ForceRecord, KinematicRecord, TrajectoryLog,
};
use crate::utils::vector2d::Vector2D;

/// Vehicle state in flight-path axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightState {
    pub time: f64,
    pub position: Vector2D,
    pub velocity: f64,
    pub theta: f64,
    pub alpha: f64,
    pub mass: f64,
    pub dynamic_pressure: f64,
    pub load_factor: f64,
}

impl FlightState {
    pub fn at_launch(launch: &LaunchConditions) -> Self {
        FlightState {
            time: 0.0,
            position: Vector2D::ZERO,
            velocity: launch.velocity,
            theta: launch.theta_0,
            alpha: 0.0,
            mass: launch.m_0,
            dynamic_pressure: 0.0,
            load_factor: 0.0,
        }
    }

    fn vector(&self) -> [f64; 5] {
        [self.velocity, self.theta, self.position.x, self.position.y, self.mass]
    }

    fn is_finite(&self) -> bool {
        self.vector().iter().all(|v| v.is_finite())
    }
}

/// Final state of a completed run with its logs.
#[derive(Debug, Clone)]
pub struct BallisticsCalculationResult {
    pub mdot_final: f64,
    pub theta_final: f64,
    pub m_final: f64,
    pub v_final: f64,
    pub x_final: f64,
    pub y_final: f64,
    pub t_final: f64,
    pub termination: TerminationReason,
    pub events: Vec<FlightEvent>,
    pub log: TrajectoryLog,
}

impl BallisticsCalculationResult {
    pub fn burnout_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, FlightEvent::Burnout { .. }))
            .count()
    }
}

/// Forces and derived quantities at one state.
#[derive(Debug, Clone, Copy)]
struct Loads {
    propulsion: PropulsionState,
    coefficients: AeroCoefficients,
    mach: f64,
    dynamic_pressure: f64,
    lift: f64,
    drag: f64,
}

pub struct TrajectoryIntegrator {
    rocket: Rocket,
    table: Arc<CoefficientTable>,
    mission: Mission,
    settings: IntegrationSettings,
    policy: Box<dyn PitchPolicy>,
    atmosphere: Atmosphere,
}

impl TrajectoryIntegrator {
    /// Fails with `AerodynamicsUnavailable` until the model has been prepared.
    pub fn new(
        rocket: Rocket,
        aerodynamics: &AerodynamicsModel,
        mission: Mission,
        settings: IntegrationSettings,
    ) -> SimulationResult<Self> {
        Self::with_table(rocket, aerodynamics.table()?, mission, settings)
    }

    pub fn with_table(
        rocket: Rocket,
        table: Arc<CoefficientTable>,
        mission: Mission,
        settings: IntegrationSettings,
    ) -> SimulationResult<Self> {
        settings.validate()?;
        let mission = Mission::new(mission.launch, mission.target)?;
        let rocket = rocket.for_launch_mass(mission.launch.m_0)?;
        if table.geometry_hash() != rocket.geometry.fingerprint() {
            log::warn!(
                "coefficient table {:016x} was built for a different geometry than {:016x}",
                table.geometry_hash(),
                rocket.geometry.fingerprint()
            );
        }
        Ok(TrajectoryIntegrator {
            rocket,
            table,
            mission,
            settings,
            policy: Box::new(TargetPursuit::default()),
            atmosphere: Atmosphere,
        })
    }

    pub fn with_policy(mut self, policy: Box<dyn PitchPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn rocket(&self) -> &Rocket {
        &self.rocket
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn run(&self) -> SimulationResult<BallisticsCalculationResult> {
        self.run_until_cancelled(&AtomicBool::new(false))
    }

    /// Integrate from launch to the first termination condition. `cancel` is
    /// polled once per step.
    pub fn run_until_cancelled(
        &self,
        cancel: &AtomicBool,
    ) -> SimulationResult<BallisticsCalculationResult> {
        let burn_duration = self.rocket.propulsion.burn_duration();
        let mut state = FlightState::at_launch(&self.mission.launch);
        let mut phase = FlightPhase::at_launch(burn_duration);
        let mut log = TrajectoryLog::new();
        let mut events = vec![FlightEvent::Launch { time: 0.0 }];
        let mut airborne = false;
        let mut step: u64 = 0;

        log::debug!(
            "integrating with {} pitch policy, dt = {} s, burn = {} s",
            self.policy.name(),
            self.settings.time_step,
            burn_duration
        );

        let mut mdot_final = 0.0;
        let termination = loop {
            if let Some(reason) = phase.termination() {
                break reason;
            }

            let loads = self.observe(&mut state, phase);
            self.record(&mut log, step, &state, &loads)?;

            if let Some(reason) = self.termination(&state, airborne, cancel) {
                mdot_final = loads.propulsion.mass_flow_rate;
                phase = FlightPhase::Terminated(reason);
                continue;
            }

            let dt = phase.step_limit(self.settings.time_step, burn_duration);
            let next = self.rk4(phase.is_boost(), state.time, state.vector(), state.alpha, dt);
            let time = state.time + dt;
            let previous_theta = state.theta;
            state = FlightState {
                time,
                velocity: next[0],
                theta: next[1],
                position: Vector2D::new(next[2], next[3]),
                mass: next[4],
                ..state
            };

            if let Some(reason) = Self::divergence(&state) {
                log::warn!("integration diverged at t = {time:.3} s: {reason}");
                return Err(SimulationError::IntegrationDiverged {
                    time,
                    reason,
                    partial: Box::new(log),
                });
            }

            if state.position.y > 0.0 {
                airborne = true;
            }
            if airborne && previous_theta >= 0.0 && state.theta < 0.0 {
                events.push(FlightEvent::Apogee {
                    time,
                    altitude: state.position.y,
                });
            }

            let (next_phase, burnout) = phase.advance(dt, burn_duration);
            if burnout {
                log::info!("burnout at t = {time:.3} s, mass {:.2} kg", state.mass);
                events.push(FlightEvent::Burnout { time, mass: state.mass });
            }
            phase = next_phase;
            step += 1;
        };

        log::info!(
            "terminated at t = {:.3} s ({termination}), x = {:.1} m, V = {:.1} m/s",
            state.time,
            state.position.x,
            state.velocity
        );
        events.push(FlightEvent::Terminated {
            time: state.time,
            reason: termination,
        });

        Ok(BallisticsCalculationResult {
            mdot_final,
            theta_final: state.theta,
            m_final: state.mass,
            v_final: state.velocity,
            x_final: state.position.x,
            y_final: state.position.y,
            t_final: state.time,
            termination,
            events,
            log,
        })
    }

    fn divergence(state: &FlightState) -> Option<String> {
        if !state.is_finite() {
            Some(format!("non-finite state {:?}", state.vector()))
        } else if state.mass < 0.0 {
            Some(format!("negative mass {} kg", state.mass))
        } else {
            None
        }
    }

    fn termination(
        &self,
        state: &FlightState,
        airborne: bool,
        cancel: &AtomicBool,
    ) -> Option<TerminationReason> {
        if airborne && state.position.y <= 0.0 {
            Some(TerminationReason::Impact)
        } else if state.position.x >= self.mission.target.x {
            Some(TerminationReason::TargetReached)
        } else if state.time >= self.settings.max_time {
            Some(TerminationReason::MaxTimeExceeded)
        } else if state.velocity < self.settings.stall_velocity && state.theta < 0.0 {
            Some(TerminationReason::Stall)
        } else if cancel.load(Ordering::Relaxed) {
            Some(TerminationReason::Cancelled)
        } else {
            None
        }
    }

    /// Choose the angle of attack for the coming step and fill in derived quantities.
    fn observe(&self, state: &mut FlightState, phase: FlightPhase) -> Loads {
        let burning = phase.is_boost();
        let neutral = self.loads(burning, state.time, state.velocity, state.position.y, 0.0);
        let ctx = PolicyContext {
            target: &self.mission.target,
            thrust: neutral.propulsion.thrust,
            dynamic_pressure: neutral.dynamic_pressure,
            reference_area: self.rocket.geometry.reference_area(),
            lift_slope: self.table.lift_slope(neutral.mach),
        };
        state.alpha = self.policy.angle_of_attack(state, &ctx);

        let loads = self.loads(burning, state.time, state.velocity, state.position.y, state.alpha);
        state.dynamic_pressure = loads.dynamic_pressure;
        let weight = state.mass * GRAVITY;
        state.load_factor = if weight > 0.0 {
            (loads.lift + loads.propulsion.thrust * state.alpha.sin()) / weight
        } else {
            0.0
        };
        loads
    }

    fn record(
        &self,
        log: &mut TrajectoryLog,
        step: u64,
        state: &FlightState,
        loads: &Loads,
    ) -> SimulationResult<()> {
        let geometry = &self.rocket.geometry;
        let launch_mass = self.mission.launch.m_0;
        let burned = self.rocket.mass_budget.fraction_for_mass(state.mass, launch_mass);
        let center_of_mass = self.rocket.mass_budget.compute(burned)?.center_of_mass;
        let moment = loads.coefficients.m_z_about(geometry, center_of_mass)
            * loads.dynamic_pressure
            * geometry.reference_area()
            * geometry.reference_length();

        log.push(
            KinematicRecord {
                step,
                time: state.time,
                x: state.position.x,
                y: state.position.y,
                velocity: state.velocity,
                theta: state.theta,
            },
            ForceRecord {
                step,
                time: state.time,
                lift: loads.lift,
                drag: loads.drag,
                thrust: loads.propulsion.thrust,
                moment,
            },
            AuxiliaryRecord {
                step,
                time: state.time,
                mass_flow_rate: loads.propulsion.mass_flow_rate,
                theta: state.theta,
                alpha: state.alpha,
                mass: state.mass,
                center_of_mass,
                mach: loads.mach,
                dynamic_pressure: loads.dynamic_pressure,
            },
        );
        Ok(())
    }

    fn loads(&self, burning: bool, time: f64, velocity: f64, altitude: f64, alpha: f64) -> Loads {
        let atmosphere = self.atmosphere.at(altitude);
        let propulsion = if burning {
            let elapsed = time.min(self.rocket.propulsion.burn_duration());
            self.rocket.propulsion.at_pressure(elapsed, atmosphere.pressure)
        } else {
            PropulsionState::default()
        };
        let mach = velocity / self.settings.speed_of_sound;
        let dynamic_pressure = atmosphere.dynamic_pressure(velocity);
        let coefficients = self.table.evaluate(alpha, mach);
        let force_scale = dynamic_pressure * self.rocket.geometry.reference_area();

        Loads {
            propulsion,
            coefficients,
            mach,
            dynamic_pressure,
            lift: coefficients.c_y * force_scale,
            drag: coefficients.c_x * force_scale,
        }
    }

    /// Time derivatives of `[V, theta, x, y, m]`.
    fn derivatives(&self, burning: bool, time: f64, s: &[f64; 5], alpha: f64) -> [f64; 5] {
        let [velocity, theta, _, altitude, mass] = *s;
        let loads = self.loads(burning, time, velocity, altitude, alpha);
        let thrust = loads.propulsion.thrust;
        let (sin_a, cos_a) = alpha.sin_cos();
        let (sin_t, cos_t) = theta.sin_cos();

        [
            (thrust * cos_a - loads.drag) / mass - GRAVITY * sin_t,
            (thrust * sin_a + loads.lift) / (mass * velocity) - GRAVITY * cos_t / velocity,
            velocity * cos_t,
            velocity * sin_t,
            loads.propulsion.mass_flow_rate,
        ]
    }

    fn rk4(&self, burning: bool, time: f64, s: [f64; 5], alpha: f64, dt: f64) -> [f64; 5] {
        let offset =
            |k: &[f64; 5], h: f64| -> [f64; 5] { std::array::from_fn(|i| s[i] + k[i] * h) };

        let k1 = self.derivatives(burning, time, &s, alpha);
        let k2 = self.derivatives(burning, time + dt / 2.0, &offset(&k1, dt / 2.0), alpha);
        let k3 = self.derivatives(burning, time + dt / 2.0, &offset(&k2, dt / 2.0), alpha);
        let k4 = self.derivatives(burning, time + dt, &offset(&k3, dt), alpha);

        std::array::from_fn(|i| s[i] + dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
    }
}
