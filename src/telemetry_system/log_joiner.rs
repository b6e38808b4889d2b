use super::telemetry::{AuxiliaryRecord, ForceRecord, KinematicRecord, StepRecord};

/// One step with fields from all three streams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedPoint {
    pub step: u64,
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub velocity: f64,
    pub theta: f64,
    pub lift: f64,
    pub drag: f64,
    pub thrust: f64,
    pub moment: f64,
    pub mass_flow_rate: f64,
    pub alpha: f64,
    pub mass: f64,
    pub center_of_mass: f64,
    pub mach: f64,
    pub dynamic_pressure: f64,
}

impl JoinedPoint {
    /// True when every measured field is a finite number.
    pub fn is_finite(&self) -> bool {
        [
            self.time,
            self.x,
            self.y,
            self.velocity,
            self.theta,
            self.lift,
            self.drag,
            self.thrust,
            self.moment,
            self.mass_flow_rate,
            self.alpha,
            self.mass,
            self.center_of_mass,
            self.mach,
            self.dynamic_pressure,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    fn combine(k: &KinematicRecord, f: &ForceRecord, a: &AuxiliaryRecord) -> Self {
        JoinedPoint {
            step: k.step,
            time: k.time,
            x: k.x,
            y: k.y,
            velocity: k.velocity,
            theta: k.theta,
            lift: f.lift,
            drag: f.drag,
            thrust: f.thrust,
            moment: f.moment,
            mass_flow_rate: a.mass_flow_rate,
            alpha: a.alpha,
            mass: a.mass,
            center_of_mass: a.center_of_mass,
            mach: a.mach,
            dynamic_pressure: a.dynamic_pressure,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinResult {
    pub points: Vec<JoinedPoint>,
    /// Step indices present in some stream but not in all three.
    pub dropped: usize,
}

/// Merge three step-ordered streams, keeping steps present in all of them.
///
/// Each stream is walked once with its own cursor; the smallest current step
/// is consumed from every stream holding it, and counted as dropped unless
/// all three do. Duplicate steps within one stream are treated as one.
pub fn join(
    kinematic: &[KinematicRecord],
    force: &[ForceRecord],
    auxiliary: &[AuxiliaryRecord],
) -> JoinResult {
    let mut result = JoinResult {
        points: Vec::with_capacity(kinematic.len().min(force.len()).min(auxiliary.len())),
        dropped: 0,
    };
    let (mut ik, mut jf, mut ka) = (0, 0, 0);

    loop {
        let heads = [
            kinematic.get(ik).map(StepRecord::step),
            force.get(jf).map(StepRecord::step),
            auxiliary.get(ka).map(StepRecord::step),
        ];
        let Some(step) = heads.iter().flatten().copied().min() else {
            break;
        };

        if heads.iter().all(|h| *h == Some(step)) {
            result
                .points
                .push(JoinedPoint::combine(&kinematic[ik], &force[jf], &auxiliary[ka]));
        } else {
            result.dropped += 1;
        }

        ik = skip_step(kinematic, ik, step);
        jf = skip_step(force, jf, step);
        ka = skip_step(auxiliary, ka, step);
    }

    if result.dropped > 0 {
        log::warn!("dropped {} step(s) missing from at least one log", result.dropped);
    }
    result
}

fn skip_step<T: StepRecord>(records: &[T], mut cursor: usize, step: u64) -> usize {
    while records
        .get(cursor)
        .map_or(false, |r| r.step() <= step)
    {
        cursor += 1;
    }
    cursor
}
