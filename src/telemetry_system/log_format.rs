use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::telemetry::{StepRecord, TrajectoryLog};
use crate::errors::{SimulationError, SimulationResult};

pub fn write_records<W: Write, T: Serialize>(writer: W, records: &[T]) -> SimulationResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Parse one stream, rejecting records whose step or time goes backwards.
pub fn read_records<R, T>(reader: R) -> SimulationResult<Vec<T>>
where
    R: Read,
    T: DeserializeOwned + StepRecord,
{
    let mut csv_reader = csv::Reader::from_reader(reader);
    let records = csv_reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()?;

    if let Some(pair) = records
        .windows(2)
        .find(|w| w[1].step() < w[0].step() || w[1].time() < w[0].time())
    {
        return Err(SimulationError::InvalidConfiguration(format!(
            "log goes backwards between step {} (t = {}) and step {} (t = {})",
            pair[0].step(),
            pair[0].time(),
            pair[1].step(),
            pair[1].time()
        )));
    }
    Ok(records)
}

/// File names of the three streams written for `stem` inside `dir`.
pub fn stream_paths(dir: &Path, stem: &str) -> [PathBuf; 3] {
    ["kinematic", "force", "auxiliary"].map(|stream| dir.join(format!("{stem}.{stream}.csv")))
}

pub fn write_log(log: &TrajectoryLog, dir: &Path, stem: &str) -> SimulationResult<[PathBuf; 3]> {
    std::fs::create_dir_all(dir)?;
    let paths = stream_paths(dir, stem);
    write_records(BufWriter::new(File::create(&paths[0])?), &log.kinematic)?;
    write_records(BufWriter::new(File::create(&paths[1])?), &log.force)?;
    write_records(BufWriter::new(File::create(&paths[2])?), &log.auxiliary)?;
    log::debug!("wrote {} log records under {}", log.len(), dir.display());
    Ok(paths)
}

pub fn read_log(dir: &Path, stem: &str) -> SimulationResult<TrajectoryLog> {
    let paths = stream_paths(dir, stem);
    Ok(TrajectoryLog {
        kinematic: read_records(BufReader::new(File::open(&paths[0])?))?,
        force: read_records(BufReader::new(File::open(&paths[1])?))?,
        auxiliary: read_records(BufReader::new(File::open(&paths[2])?))?,
    })
}
