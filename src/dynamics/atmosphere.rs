use super::state::G0;

// ---------------------------------------------------------------------------
// ISA troposphere (sea level to 11 km)
// ---------------------------------------------------------------------------

const R_AIR: f64 = 287.052_87; // specific gas constant for dry air, J/(kg·K)
const T0: f64 = 288.15;        // sea-level temperature, K
const P0: f64 = 101_325.0;     // sea-level pressure, Pa
const LAPSE: f64 = -0.0065;    // K/m
const TROPOPAUSE: f64 = 11_000.0;

/// Air density (kg/m^3) at a geometric altitude above mean sea level.
///
/// Low-altitude aircraft only: altitudes are clamped to the troposphere.
pub fn density(altitude_m: f64) -> f64 {
    let h = altitude_m.clamp(0.0, TROPOPAUSE);
    let t = T0 + LAPSE * h;
    let p = P0 * (t / T0).powf(-G0 / (LAPSE * R_AIR));
    p / (R_AIR * t)
}
