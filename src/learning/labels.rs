//! Heuristic "ideal" corrections used as supervised targets.
//!
//! The labels are hand-written rules over the relative state, not rewards.

use crate::state::RelativeState;

use super::OutputEncoding;

/// Horizontal offset beyond which the direct label asks for a move
pub const HORIZONTAL_DEADBAND: f32 = 0.2;
/// Vertical offset beyond which the direct label asks for a nudge
pub const VERTICAL_DEADBAND: f32 = 0.1;
/// Activation used for vertical nudges
pub const VERTICAL_NUDGE: f32 = 0.3;

/// Ideal raw outputs for `state` under `encoding`.
///
/// `dy` is the learner's height above its anchor; only the direct encoding
/// reads it.
#[tracing::instrument(level = "trace")]
pub fn ideal_output(encoding: OutputEncoding, state: &RelativeState, dy: f32) -> Vec<f32> {
    match encoding {
        OutputEncoding::Direct => direct_label(state, dy).to_vec(),
        OutputEncoding::Signed => signed_label(state).to_vec(),
    }
}

/// `[up, down, left, right, forward, back]`
fn direct_label(state: &RelativeState, dy: f32) -> [f32; 6] {
    let mut label = [0.0; 6];
    let (dx, dz) = (state.dx(), state.dz());

    if dx > HORIZONTAL_DEADBAND {
        label[2] = 1.0;
    } else if dx < -HORIZONTAL_DEADBAND {
        label[3] = 1.0;
    }

    if dz > HORIZONTAL_DEADBAND {
        label[4] = 1.0;
    } else if dz < -HORIZONTAL_DEADBAND {
        label[5] = 1.0;
    }

    if dy > VERTICAL_DEADBAND {
        label[1] = VERTICAL_NUDGE;
    } else if dy < -VERTICAL_DEADBAND {
        label[0] = VERTICAL_NUDGE;
    }

    label
}

/// Proportional term plus target-velocity feedforward; never vertical.
fn signed_label(state: &RelativeState) -> [f32; 3] {
    [
        -state.dx() * 0.5 + state.target_vx() * 2.0,
        0.0,
        -state.dz() * 0.5 + state.target_vz() * 2.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(dx: f32, dz: f32, vx: f32, vz: f32) -> RelativeState {
        RelativeState::from_features([dx, dz, vx, vz, 0.0, 1.0]).unwrap()
    }

    #[test]
    fn test_signed_label() {
        let label = ideal_output(OutputEncoding::Signed, &state(0.4, -0.2, 0.01, 0.02), 5.0);

        assert_eq!(label.len(), 3);
        assert!((label[0] - (-0.2 + 0.02)).abs() < 1e-6);
        assert_eq!(label[1], 0.0);
        assert!((label[2] - (0.1 + 0.04)).abs() < 1e-6);
    }

    #[test]
    fn test_direct_label_moves_toward_target() {
        // Learner right of and behind the target, sitting too high
        let label = ideal_output(OutputEncoding::Direct, &state(0.5, 0.5, 0.0, 0.0), 0.2);
        assert_eq!(label, vec![0.0, VERTICAL_NUDGE, 1.0, 0.0, 1.0, 0.0]);

        // Left of, in front of, and below
        let label = ideal_output(OutputEncoding::Direct, &state(-0.5, -0.5, 0.0, 0.0), -0.2);
        assert_eq!(label, vec![VERTICAL_NUDGE, 0.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_direct_label_deadband() {
        let label = ideal_output(OutputEncoding::Direct, &state(0.2, -0.2, 3.0, 3.0), 0.1);
        assert_eq!(label, vec![0.0; 6]);
    }

    #[test]
    fn test_labels_are_deterministic() {
        let s = state(0.123_456, -0.654_321, 0.0101, -0.0303);
        for encoding in [OutputEncoding::Direct, OutputEncoding::Signed] {
            let first = ideal_output(encoding, &s, 0.37);
            let second = ideal_output(encoding, &s, 0.37);

            let first_bits: Vec<u32> = first.iter().map(|v| v.to_bits()).collect();
            let second_bits: Vec<u32> = second.iter().map(|v| v.to_bits()).collect();
            assert_eq!(first_bits, second_bits);
        }
    }

    #[test]
    fn test_label_sizes_match_encoding() {
        let s = state(0.0, 0.0, 0.0, 0.0);
        for encoding in [OutputEncoding::Direct, OutputEncoding::Signed] {
            assert_eq!(ideal_output(encoding, &s, 0.0).len(), encoding.output_size());
        }
    }
}
