use serde::{Deserialize, Serialize};

/// Position and velocity at one accepted step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicRecord {
    pub step: u64,
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub velocity: f64,
    pub theta: f64,
}

/// Forces in flight-path axes and the pitching moment about the centre of mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceRecord {
    pub step: u64,
    pub time: f64,
    pub lift: f64,
    pub drag: f64,
    pub thrust: f64,
    pub moment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryRecord {
    pub step: u64,
    pub time: f64,
    pub mass_flow_rate: f64,
    pub theta: f64,
    pub alpha: f64,
    pub mass: f64,
    pub center_of_mass: f64,
    pub mach: f64,
    pub dynamic_pressure: f64,
}

/// Keyed by the shared step index.
pub trait StepRecord {
    fn step(&self) -> u64;
    fn time(&self) -> f64;
}

macro_rules! impl_step_record {
    ($($record:ty),*) => {
        $(impl StepRecord for $record {
            fn step(&self) -> u64 {
                self.step
            }

            fn time(&self) -> f64 {
                self.time
            }
        })*
    };
}

impl_step_record!(KinematicRecord, ForceRecord, AuxiliaryRecord);

/// The three append-only streams a run produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajectoryLog {
    pub kinematic: Vec<KinematicRecord>,
    pub force: Vec<ForceRecord>,
    pub auxiliary: Vec<AuxiliaryRecord>,
}

impl TrajectoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kinematic: KinematicRecord,
        force: ForceRecord,
        auxiliary: AuxiliaryRecord,
    ) {
        self.kinematic.push(kinematic);
        self.force.push(force);
        self.auxiliary.push(auxiliary);
    }

    pub fn len(&self) -> usize {
        self.kinematic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinematic.is_empty()
    }

    pub fn max_altitude(&self) -> f64 {
        self.kinematic.iter().map(|r| r.y).fold(0.0, f64::max)
    }

    pub fn max_velocity(&self) -> f64 {
        self.kinematic.iter().map(|r| r.velocity).fold(0.0, f64::max)
    }

    pub fn summary(&self) -> String {
        let duration = self.kinematic.last().map_or(0.0, |r| r.time);
        let range = self.kinematic.last().map_or(0.0, |r| r.x);
        format!(
            "Steps: {}\nFlight time: {}\nRange: {}\nMax altitude: {}\nMax velocity: {:.2} m/s",
            self.len(),
            format_time(duration),
            format_distance(range),
            format_distance(self.max_altitude()),
            self.max_velocity()
        )
    }
}

pub fn format_time(elapsed_time: f64) -> String {
    if elapsed_time >= 60.0 {
        let minutes = (elapsed_time / 60.0).floor();
        let seconds = elapsed_time % 60.0;
        format!("{:.0}m {:.2}s", minutes, seconds)
    } else {
        format!("{:.2}s", elapsed_time)
    }
}

pub fn format_distance(distance: f64) -> String {
    if distance.abs() >= 1000.0 {
        format!("{:.2} km", distance / 1000.0)
    } else {
        format!("{:.2} m", distance)
    }
}
