use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Conversion factors to SI / radians
// ---------------------------------------------------------------------------

pub const KNOTS_TO_MS: f64 = 1.852 / 3.6;
pub const FEET_TO_M: f64 = 0.3048;
pub const POUNDS_TO_N: f64 = 0.45359237 * 9.80665;
pub const FOOT_POUNDS_TO_NM: f64 = 1.3558179483314004;

/// Unit encoded in a log field name, e.g. `_Vind,_ktas` or `pitch,__deg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Knots,
    Feet,
    Pounds,
    FootPounds,
    Degrees,
    /// Already canonical, or a suffix we don't convert.
    Plain,
}

impl Unit {
    /// Unit from the text after the last `,` in a field name, underscores
    /// stripped. Unknown or absent suffixes are `Plain`.
    pub fn from_field(field: &str) -> Unit {
        let suffix = match field.rfind(',') {
            Some(idx) => &field[idx + 1..],
            None => field,
        };
        match suffix.trim_matches('_') {
            "ktas" => Unit::Knots,
            "ftmsl" => Unit::Feet,
            "lb" => Unit::Pounds,
            "ftlb" => Unit::FootPounds,
            "deg" => Unit::Degrees,
            _ => Unit::Plain,
        }
    }

    /// Convert a value in this unit to the canonical metric/radian unit.
    pub fn to_canonical(self, value: f64) -> f64 {
        match self {
            Unit::Knots => value * KNOTS_TO_MS,
            Unit::Feet => value * FEET_TO_M,
            Unit::Pounds => value * POUNDS_TO_N,
            Unit::FootPounds => value * FOOT_POUNDS_TO_NM,
            Unit::Degrees => value.to_radians(),
            Unit::Plain => value,
        }
    }
}

/// Parse `raw` and convert it according to the unit suffix of `field`.
/// `nan` and `inf` are rejected along with non-numeric text.
pub fn normalize(field: &str, raw: &str) -> Result<f64> {
    let parse_error = || Error::Parse {
        field: field.to_string(),
        value: raw.to_string(),
    };
    let value: f64 = raw.trim().parse().map_err(|_| parse_error())?;
    if !value.is_finite() {
        return Err(parse_error());
    }
    Ok(Unit::from_field(field).to_canonical(value))
}
