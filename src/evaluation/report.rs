use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    LoadFactor,
    AngleOfAttack,
    ManeuverReserve,
    TrimAuthority,
    StaticMargin,
    TerminalVelocity,
    TerminalMassFlow,
    TerminalTheta,
    TerminalMass,
    LaunchMass,
    StructuralThreshold,
    MissingPoint,
    BadDenominator,
    DivisionByZeroMz,
    NonFiniteData,
    NoPoints,
    BallisticsFailure,
}

impl ViolationKind {
    /// Degenerate-data kinds that carry a fixed penalty rather than an excess.
    pub fn is_fixed_penalty(&self) -> bool {
        matches!(
            self,
            ViolationKind::MissingPoint
                | ViolationKind::BadDenominator
                | ViolationKind::DivisionByZeroMz
                | ViolationKind::NonFiniteData
                | ViolationKind::NoPoints
                | ViolationKind::BallisticsFailure
        )
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationKind::LoadFactor => "load_factor",
            ViolationKind::AngleOfAttack => "alpha",
            ViolationKind::ManeuverReserve => "c_y_alpha_reserve",
            ViolationKind::TrimAuthority => "trim_authority",
            ViolationKind::StaticMargin => "static_margin",
            ViolationKind::TerminalVelocity => "terminal_velocity",
            ViolationKind::TerminalMassFlow => "terminal_mdot",
            ViolationKind::TerminalTheta => "terminal_theta",
            ViolationKind::TerminalMass => "terminal_mass",
            ViolationKind::LaunchMass => "launch_mass",
            ViolationKind::StructuralThreshold => "warhead_start",
            ViolationKind::MissingPoint => "missing_point",
            ViolationKind::BadDenominator => "bad_denom",
            ViolationKind::DivisionByZeroMz => "div0_mz",
            ViolationKind::NonFiniteData => "non_finite",
            ViolationKind::NoPoints => "no_points",
            ViolationKind::BallisticsFailure => "ballistics_fail",
        };
        f.write_str(name)
    }
}

/// One breach. `index` is the position in the evaluated sequence, `None`
/// for checks that apply to the run as a whole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Violation {
    pub index: Option<usize>,
    pub kind: ViolationKind,
    pub magnitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViolationReport {
    violations: Vec<Violation>,
    total: f64,
}

impl ViolationReport {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    pub fn summary(&self) -> String {
        if self.violations.is_empty() {
            return "feasible (score 0)".to_string();
        }
        let mut kinds: Vec<ViolationKind> = Vec::new();
        for v in &self.violations {
            if !kinds.contains(&v.kind) {
                kinds.push(v.kind);
            }
        }
        let parts: Vec<String> = kinds
            .iter()
            .map(|&kind| format!("{kind} x{}", self.count(kind)))
            .collect();
        format!("score {:.4}: {}", self.total, parts.join(", "))
    }
}

/// Accumulates violations while an evaluation runs.
#[derive(Debug)]
pub(crate) struct ReportBuilder {
    violations: Vec<Violation>,
    non_finite_penalty: f64,
}

impl ReportBuilder {
    pub fn new(non_finite_penalty: f64) -> Self {
        ReportBuilder {
            violations: Vec::new(),
            non_finite_penalty,
        }
    }

    /// Record `excess / scale` when `excess` is positive. A NaN or infinite
    /// excess or magnitude is recorded as `NonFiniteData` with the fixed
    /// penalty instead.
    pub fn excess(&mut self, index: Option<usize>, kind: ViolationKind, excess: f64, scale: f64) {
        if !excess.is_finite() {
            self.non_finite(index, kind);
        } else if excess > 0.0 {
            let magnitude = excess / scale;
            if magnitude.is_finite() {
                self.violations.push(Violation {
                    index,
                    kind,
                    magnitude,
                });
            } else {
                self.non_finite(index, kind);
            }
        }
    }

    fn non_finite(&mut self, index: Option<usize>, kind: ViolationKind) {
        log::warn!("non-finite {kind} excess at {index:?}");
        self.fixed(index, ViolationKind::NonFiniteData, self.non_finite_penalty);
    }

    pub fn fixed(&mut self, index: Option<usize>, kind: ViolationKind, penalty: f64) {
        self.violations.push(Violation {
            index,
            kind,
            magnitude: penalty,
        });
    }

    pub fn finish(self) -> ViolationReport {
        let total = self.violations.iter().map(|v| v.magnitude).sum();
        ViolationReport {
            violations: self.violations,
            total,
        }
    }
}
