use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::aerodynamics::{AeroCoefficients, AeroDerivatives, AeroSettings};
use crate::control::geometry::GeometryModel;
use crate::errors::{SimulationError, SimulationResult};
use crate::utils::interpolation::{bilerp, grid, locate};

const HASH_PREFIX: &str = "# geometry-hash: ";

/// One persisted `(alpha, mach) -> coefficients` sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoefficientRow {
    pub alpha_deg: f64,
    pub mach: f64,
    pub c_y: f64,
    pub c_x: f64,
    pub m_z: f64,
}

/// Immutable coefficient table over a regular (alpha, mach) grid.
///
/// Rows are stored alpha-major. Lookups are bilinear inside the grid, odd in
/// alpha for `c_y`/`m_z`, even for `c_x`, held at the stall angle beyond it
/// and held at the nearest grid Mach outside the tabulated range.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    geometry_hash: u64,
    stall_alpha_deg: f64,
    alphas: Vec<f64>,
    machs: Vec<f64>,
    rows: Vec<CoefficientRow>,
}

impl CoefficientTable {
    pub fn build(geometry: &GeometryModel, settings: &AeroSettings) -> Self {
        let alphas = grid(0.0, settings.alpha_max_deg, settings.alpha_step_deg);
        let machs = grid(settings.mach_min, settings.mach_max, settings.mach_step);
        let derivatives: Vec<AeroDerivatives> =
            machs.iter().map(|&m| AeroDerivatives::at(geometry, m)).collect();

        let mut rows = Vec::with_capacity(alphas.len() * machs.len());
        for &alpha_deg in &alphas {
            for (&mach, d) in machs.iter().zip(&derivatives) {
                let coefficients = d.coefficients(alpha_deg.to_radians());
                rows.push(CoefficientRow {
                    alpha_deg,
                    mach,
                    c_y: coefficients.c_y,
                    c_x: coefficients.c_x,
                    m_z: coefficients.m_z,
                });
            }
        }

        CoefficientTable {
            geometry_hash: geometry.fingerprint(),
            stall_alpha_deg: settings.stall_alpha_deg,
            alphas,
            machs,
            rows,
        }
    }

    fn from_rows(
        geometry_hash: u64,
        stall_alpha_deg: f64,
        rows: Vec<CoefficientRow>,
    ) -> SimulationResult<Self> {
        let first_alpha = rows.first().map(|r| r.alpha_deg).ok_or_else(|| {
            SimulationError::InvalidConfiguration("coefficient table is empty".to_string())
        })?;
        let machs: Vec<f64> = rows
            .iter()
            .take_while(|r| r.alpha_deg == first_alpha)
            .map(|r| r.mach)
            .collect();
        let alphas: Vec<f64> = rows.iter().step_by(machs.len()).map(|r| r.alpha_deg).collect();

        let well_formed = machs.len() >= 2
            && alphas.len() >= 2
            && rows.len() == alphas.len() * machs.len()
            && machs.windows(2).all(|w| w[0] < w[1])
            && alphas.windows(2).all(|w| w[0] < w[1])
            && rows.iter().enumerate().all(|(i, r)| {
                r.alpha_deg == alphas[i / machs.len()] && r.mach == machs[i % machs.len()]
            });
        if !well_formed {
            return Err(SimulationError::InvalidConfiguration(
                "coefficient table is not a complete ascending alpha/mach grid".to_string(),
            ));
        }

        Ok(CoefficientTable {
            geometry_hash,
            stall_alpha_deg,
            alphas,
            machs,
            rows,
        })
    }

    pub fn geometry_hash(&self) -> u64 {
        self.geometry_hash
    }

    pub fn rows(&self) -> &[CoefficientRow] {
        &self.rows
    }

    pub fn mach_range(&self) -> (f64, f64) {
        (self.machs[0], self.machs[self.machs.len() - 1])
    }

    fn row(&self, alpha_idx: usize, mach_idx: usize) -> &CoefficientRow {
        &self.rows[alpha_idx * self.machs.len() + mach_idx]
    }

    pub fn evaluate(&self, alpha: f64, mach: f64) -> AeroCoefficients {
        let sign = if alpha < 0.0 { -1.0 } else { 1.0 };
        let stall = self.stall_alpha_deg.min(self.alphas[self.alphas.len() - 1]);
        let alpha_deg = alpha.abs().to_degrees().min(stall);

        let (ia, ta) = locate(&self.alphas, alpha_deg);
        let (im, tm) = locate(&self.machs, mach);
        let blend = |field: fn(&CoefficientRow) -> f64| {
            bilerp(
                field(self.row(ia, im)),
                field(self.row(ia, im + 1)),
                field(self.row(ia + 1, im)),
                field(self.row(ia + 1, im + 1)),
                tm,
                ta,
            )
        };

        AeroCoefficients {
            c_y: sign * blend(|r| r.c_y),
            c_x: blend(|r| r.c_x),
            m_z: sign * blend(|r| r.m_z),
        }
    }

    /// Lift-curve slope (per rad) read from the first non-zero alpha column.
    pub fn lift_slope(&self, mach: f64) -> f64 {
        let alpha = self.alphas[1].to_radians();
        self.evaluate(alpha, mach).c_y / alpha
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> SimulationResult<()> {
        let (hash, stall) = (self.geometry_hash, self.stall_alpha_deg);
        writeln!(writer, "{HASH_PREFIX}{hash:016x} stall={stall}")?;
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> SimulationResult<Self> {
        let mut buffered = BufReader::new(reader);
        let mut header = String::new();
        buffered.read_line(&mut header)?;
        let (geometry_hash, stall_alpha_deg) = parse_header(&header).ok_or_else(|| {
            let got = header.trim();
            SimulationError::InvalidConfiguration(format!("missing table header, got {got:?}"))
        })?;

        let mut csv_reader = csv::Reader::from_reader(buffered);
        let rows = csv_reader
            .deserialize()
            .collect::<Result<Vec<CoefficientRow>, csv::Error>>()?;
        Self::from_rows(geometry_hash, stall_alpha_deg, rows)
    }

    pub fn save(&self, path: &Path) -> SimulationResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.write_to(BufWriter::new(File::create(path)?))
    }

    pub fn load(path: &Path) -> SimulationResult<Self> {
        Self::read_from(File::open(path)?)
    }

    /// Geometry hash stored in an existing resource, without reading the rows.
    pub fn stored_hash(path: &Path) -> Option<u64> {
        let file = File::open(path).ok()?;
        let mut header = String::new();
        BufReader::new(file).read_line(&mut header).ok()?;
        parse_header(&header).map(|(hash, _)| hash)
    }
}

fn parse_header(line: &str) -> Option<(u64, f64)> {
    let rest = line.trim().strip_prefix(HASH_PREFIX)?;
    let mut parts = rest.split_whitespace();
    let hash = u64::from_str_radix(parts.next()?, 16).ok()?;
    let stall = parts.next()?.strip_prefix("stall=")?.parse().ok()?;
    Some((hash, stall))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> CoefficientTable {
        let geometry = GeometryModel::new(GeometryModel::reference_descriptor()).unwrap();
        CoefficientTable::build(&geometry, &AeroSettings::default())
    }

    #[test]
    fn test_grid_shape() {
        let t = table();
        assert_eq!(t.rows().len(), 21 * 39);
        assert_eq!(t.mach_range(), (0.2, 4.0));
    }

    #[test]
    fn test_odd_and_even_symmetry() {
        let t = table();
        let up = t.evaluate(0.1, 1.7);
        let down = t.evaluate(-0.1, 1.7);
        assert_relative_eq!(up.c_y, -down.c_y, epsilon = 1e-12);
        assert_relative_eq!(up.m_z, -down.m_z, epsilon = 1e-12);
        assert_relative_eq!(up.c_x, down.c_x, epsilon = 1e-12);
    }

    #[test]
    fn test_held_beyond_stall_and_mach_range() {
        let t = table();
        let at_stall = t.evaluate(16.0_f64.to_radians(), 2.0);
        let past_stall = t.evaluate(40.0_f64.to_radians(), 2.0);
        assert_relative_eq!(at_stall.c_y, past_stall.c_y, epsilon = 1e-9);
        assert_relative_eq!(at_stall.c_x, past_stall.c_x, epsilon = 1e-9);
        assert_relative_eq!(at_stall.m_z, past_stall.m_z, epsilon = 1e-9);

        assert_eq!(t.evaluate(0.05, 4.0), t.evaluate(0.05, 9.0));
        assert_eq!(t.evaluate(0.05, 0.2), t.evaluate(0.05, 0.0));
    }

    #[test]
    fn test_matches_grid_nodes() {
        let t = table();
        let row = t.row(5, 10);
        let c = t.evaluate(row.alpha_deg.to_radians(), row.mach);
        assert_relative_eq!(c.c_y, row.c_y, epsilon = 1e-12);
        assert_relative_eq!(c.c_x, row.c_x, epsilon = 1e-12);
        assert_relative_eq!(c.m_z, row.m_z, epsilon = 1e-12);
    }

    #[test]
    fn test_round_trip_through_text() {
        let t = table();
        let mut buffer = Vec::new();
        t.write_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with(HASH_PREFIX));
        assert!(text.lines().nth(1).unwrap().starts_with("alpha_deg,mach,c_y,c_x,m_z"));

        let parsed = CoefficientTable::read_from(buffer.as_slice()).unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn test_rejects_incomplete_grid() {
        let t = table();
        let mut rows = t.rows().to_vec();
        rows.pop();
        assert!(CoefficientTable::from_rows(t.geometry_hash(), 16.0, rows).is_err());
        assert!(CoefficientTable::from_rows(0, 16.0, Vec::new()).is_err());
    }

    #[test]
    fn test_rejects_missing_header() {
        let text = "alpha_deg,mach,c_y,c_x,m_z\n0,0.2,0,0.3,0\n";
        assert!(CoefficientTable::read_from(text.as_bytes()).is_err());
    }
}
