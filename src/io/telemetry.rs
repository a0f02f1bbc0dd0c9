use std::io::{self, Write};

use crate::dynamics::state::VehicleState;
use crate::reference::Trajectory;

/// Write one closed-loop telemetry row, tab separated.
///
/// Columns: time, pos_n, pos_e, pos_d, att_w, att_x, att_y, att_z
pub fn write_row<W: Write>(writer: &mut W, time: f64, state: &VehicleState) -> io::Result<()> {
    let p = state.position;
    let q = state.attitude.quaternion();
    writeln!(
        writer,
        "{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
        time, p.x, p.y, p.z, q.w, q.i, q.j, q.k,
    )
}

/// Write the converted reference trajectory, one sample per row.
///
/// Columns: time, pos_n, pos_e, pos_d, vel_n, vel_e, vel_d,
///          att_x, att_y, att_z, att_w, rate_p, rate_q, rate_r
pub fn write_reference<W: Write>(writer: &mut W, trajectory: &Trajectory) -> io::Result<()> {
    for s in trajectory.samples() {
        let row: Vec<String> = std::iter::once(s.time)
            .chain(s.state_vector())
            .map(|v| format!("{v:.6}"))
            .collect();
        writeln!(writer, "{}", row.join("\t"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attitude;
    use crate::reference::Sample;
    use nalgebra::Vector3;

    #[test]
    fn telemetry_row_has_eight_columns() {
        let state = VehicleState {
            position: Vector3::new(1.5, -2.0, -100.0),
            attitude: attitude::compose(0.0, 0.0, 0.0),
            ..VehicleState::default()
        };
        let mut buf = Vec::new();
        write_row(&mut buf, 0.04, &state).unwrap();
        let line = String::from_utf8(buf).unwrap();
        assert_eq!(
            line,
            "0.040000\t1.500000\t-2.000000\t-100.000000\t1.000000\t0.000000\t0.000000\t0.000000\n"
        );
    }

    #[test]
    fn reference_dump_has_fourteen_columns() {
        let traj = Trajectory::new(vec![
            Sample {
                time: 0.0,
                position: Vector3::zeros(),
                velocity: Vector3::new(20.0, 0.0, 0.0),
                attitude: attitude::compose(0.0, 0.0, 0.0),
                angular_velocity: Vector3::zeros(),
            },
            Sample {
                time: 0.1,
                position: Vector3::new(2.0, 0.0, 0.0),
                velocity: Vector3::new(20.0, 0.0, 0.0),
                attitude: attitude::compose(0.0, 0.0, 0.0),
                angular_velocity: Vector3::zeros(),
            },
        ])
        .unwrap();
        let mut buf = Vec::new();
        write_reference(&mut buf, &traj).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.split('\t').count() == 14));
        assert!(lines[1].starts_with("0.100000\t2.000000\t"));
    }
}
