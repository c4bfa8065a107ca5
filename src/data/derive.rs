use std::collections::BTreeMap;

use super::model::{Channel, Session};

// ---------------------------------------------------------------------------
// Tracked points
// ---------------------------------------------------------------------------

/// A body point tracked by motion capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedPoint {
    Finger,
    Wrist,
    Elbow,
}

impl TrackedPoint {
    pub const ALL: [TrackedPoint; 3] = [TrackedPoint::Finger, TrackedPoint::Wrist, TrackedPoint::Elbow];

    pub fn position(self) -> Channel {
        match self {
            TrackedPoint::Finger => Channel::MFing,
            TrackedPoint::Wrist => Channel::MWrist,
            TrackedPoint::Elbow => Channel::MElb,
        }
    }

    pub fn velocity(self) -> Channel {
        match self {
            TrackedPoint::Finger => Channel::VFing,
            TrackedPoint::Wrist => Channel::VWrist,
            TrackedPoint::Elbow => Channel::VElb,
        }
    }
}

// ---------------------------------------------------------------------------
// Velocity derivation
// ---------------------------------------------------------------------------

/// Add a velocity channel for every tracked point.
///
/// Each velocity is the first difference of the position channel taken along
/// the rows of one session. The first row of every session has no
/// predecessor and stays `None`.
pub fn derive_velocities(
    sessions: &[Session],
    channels: &mut BTreeMap<Channel, Vec<Option<f64>>>,
    n_rows: usize,
) {
    for point in TrackedPoint::ALL {
        let velocity = match channels.get(&point.position()) {
            Some(position) => session_differences(position, sessions),
            None => vec![None; n_rows],
        };
        channels.insert(point.velocity(), velocity);
    }
}

/// First difference of `values` restarted at every session boundary.
pub fn session_differences(values: &[Option<f64>], sessions: &[Session]) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    for session in sessions {
        for pair in session.rows.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            out[cur] = match (values[prev], values[cur]) {
                (Some(a), Some(b)) => Some(b - a),
                _ => None,
            };
        }
    }
    out
}
