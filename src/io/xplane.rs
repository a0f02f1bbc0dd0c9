use std::collections::HashMap;
use std::io::BufRead;

use nalgebra::Vector3;
use tracing::{debug, warn};

use crate::attitude;
use crate::error::{Error, Result};
use crate::reference::{Sample, Trajectory};
use crate::units;

// ---------------------------------------------------------------------------
// X-Plane "Data.txt" field names
// ---------------------------------------------------------------------------

/// First field of a header row.
pub const HEADER_SENTINEL: &str = "_real,_time";

pub const TIME: &str = "_real,_time";
pub const POS_X: &str = "____X,____m";
pub const POS_Y: &str = "____Y,____m";
pub const POS_Z: &str = "____Z,____m";
pub const VEL_X: &str = "___vX,__m/s";
pub const VEL_Y: &str = "___vY,__m/s";
pub const VEL_Z: &str = "___vZ,__m/s";
pub const HEADING: &str = "hding,_true";
pub const PITCH: &str = "pitch,__deg";
pub const ROLL: &str = "_roll,__deg";
pub const RATE_P: &str = "____P,rad/s";
pub const RATE_Q: &str = "____Q,rad/s";
pub const RATE_R: &str = "____R,rad/s";

/// Split a `|`-delimited row into trimmed, non-empty fields.
pub fn split_fields(line: &str) -> Vec<&str> {
    line.split('|')
        .map(|f| f.trim_matches(|c| c == ' ' || c == '\n' || c == '\r'))
        .filter(|f| !f.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Record: one data row keyed by column name
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Record {
    pub line: usize,
    fields: HashMap<String, String>,
}

impl Record {
    /// Pair values with column names. X-Plane repeats some column names;
    /// the first occurrence wins.
    pub fn new(line: usize, headers: &[String], values: &[&str]) -> Self {
        let mut fields = HashMap::with_capacity(headers.len());
        for (name, value) in headers.iter().zip(values) {
            fields.entry(name.clone()).or_insert_with(|| value.to_string());
        }
        Self { line, fields }
    }

    pub fn raw(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Field value converted to canonical units.
    pub fn value(&self, field: &str) -> Result<f64> {
        let raw = self.raw(field).ok_or_else(|| Error::MalformedInput {
            line: self.line,
            reason: format!("missing field `{field}`"),
        })?;
        units::normalize(field, raw).map_err(|e| Error::MalformedInput {
            line: self.line,
            reason: e.to_string(),
        })
    }
}

/// Read every data row, tracking the active header row.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<Record>> {
    let mut headers: Option<Vec<String>> = None;
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_fields(&line);
        if fields.is_empty() {
            continue;
        }
        if fields[0] == HEADER_SENTINEL {
            headers = Some(fields.iter().map(|f| f.to_string()).collect());
            continue;
        }
        let Some(names) = headers.as_ref() else {
            return Err(Error::MalformedInput {
                line: line_no,
                reason: format!("data row before `{HEADER_SENTINEL}` header"),
            });
        };
        if fields.len() < names.len() {
            warn!(line = line_no, fields = fields.len(), columns = names.len(), "short data row");
        }
        records.push(Record::new(line_no, names, &fields));
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Record → Sample (X-Plane local frame → NED about the first row)
// ---------------------------------------------------------------------------

/// Time and position of the first data row; every sample is relative to it.
#[derive(Debug, Clone, Copy)]
pub struct Origin {
    pub time: f64,
    pub position: Vector3<f64>, // X-Plane local x, y, z
}

impl Origin {
    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            time: record.value(TIME)?,
            position: Vector3::new(record.value(POS_X)?, record.value(POS_Y)?, record.value(POS_Z)?),
        })
    }
}

/// X-Plane local axes are x east, y up, z south.
pub fn sample_from_record(record: &Record, origin: &Origin) -> Result<Sample> {
    let local = Vector3::new(record.value(POS_X)?, record.value(POS_Y)?, record.value(POS_Z)?)
        - origin.position;
    let heading = record.value(HEADING)?.to_radians();
    let attitude = attitude::compose(heading, record.value(PITCH)?, record.value(ROLL)?);

    Ok(Sample {
        time: record.value(TIME)? - origin.time,
        position: Vector3::new(-local.z, local.x, -local.y),
        velocity: Vector3::new(
            -record.value(VEL_Z)?,
            record.value(VEL_X)?,
            -record.value(VEL_Y)?,
        ),
        attitude,
        angular_velocity: Vector3::new(
            record.value(RATE_P)?,
            record.value(RATE_Q)?,
            record.value(RATE_R)?,
        ),
    })
}

/// Load a whole log into a reference trajectory.
pub fn read_trajectory<R: BufRead>(reader: R) -> Result<Trajectory> {
    let records = read_records(reader)?;
    let Some(first) = records.first() else {
        return Err(Error::MalformedInput { line: 0, reason: "log contains no data rows".into() });
    };
    let origin = Origin::from_record(first)?;

    let mut samples = Vec::with_capacity(records.len());
    for record in &records {
        let sample = sample_from_record(record, &origin)?;
        if let Some(prev) = samples.last().map(|s: &Sample| s.time) {
            if sample.time < prev {
                return Err(Error::MalformedInput {
                    line: record.line,
                    reason: format!("time {} goes backwards from {}", sample.time, prev),
                });
            }
        }
        samples.push(sample);
    }
    debug!(samples = samples.len(), "parsed flight log");
    Trajectory::new(samples)
}
