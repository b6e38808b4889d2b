use std::fmt;

/// Propulsion phase of a run. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightPhase {
    Boost { elapsed_burn: f64 },
    Coast { since_burnout: f64 },
    Terminated(TerminationReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    Impact,
    TargetReached,
    MaxTimeExceeded,
    Stall,
    Cancelled,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TerminationReason::Impact => "ground impact",
            TerminationReason::TargetReached => "target downrange reached",
            TerminationReason::MaxTimeExceeded => "maximum flight time exceeded",
            TerminationReason::Stall => "stalled in descent",
            TerminationReason::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

impl FlightPhase {
    /// Phase at launch for a motor that burns for `burn_duration` seconds.
    pub fn at_launch(burn_duration: f64) -> Self {
        if burn_duration > 0.0 {
            FlightPhase::Boost { elapsed_burn: 0.0 }
        } else {
            FlightPhase::Coast { since_burnout: 0.0 }
        }
    }

    pub fn is_boost(&self) -> bool {
        matches!(self, FlightPhase::Boost { .. })
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, FlightPhase::Terminated(_))
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        match *self {
            FlightPhase::Terminated(reason) => Some(reason),
            _ => None,
        }
    }

    /// Largest step allowed from this phase, so a boost step ends exactly at burnout.
    pub fn step_limit(&self, time_step: f64, burn_duration: f64) -> f64 {
        match *self {
            FlightPhase::Boost { elapsed_burn } => time_step.min(burn_duration - elapsed_burn),
            _ => time_step,
        }
    }

    /// Phase after advancing by `dt`. Returns `true` alongside if burnout happened.
    pub fn advance(self, dt: f64, burn_duration: f64) -> (Self, bool) {
        match self {
            FlightPhase::Boost { elapsed_burn } => {
                let elapsed_burn = elapsed_burn + dt;
                if elapsed_burn >= burn_duration - BURNOUT_TOLERANCE {
                    (FlightPhase::Coast { since_burnout: 0.0 }, true)
                } else {
                    (FlightPhase::Boost { elapsed_burn }, false)
                }
            }
            FlightPhase::Coast { since_burnout } => (
                FlightPhase::Coast {
                    since_burnout: since_burnout + dt,
                },
                false,
            ),
            terminated => (terminated, false),
        }
    }
}

const BURNOUT_TOLERANCE: f64 = 1e-9;

/// Discrete milestones of a run, in time order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightEvent {
    Launch { time: f64 },
    Burnout { time: f64, mass: f64 },
    Apogee { time: f64, altitude: f64 },
    Terminated { time: f64, reason: TerminationReason },
}

impl FlightEvent {
    pub fn time(&self) -> f64 {
        match *self {
            FlightEvent::Launch { time }
            | FlightEvent::Burnout { time, .. }
            | FlightEvent::Apogee { time, .. }
            | FlightEvent::Terminated { time, .. } => time,
        }
    }
}
