use chart_schema::Lane;

/// Linear position of `pitch` within `[min_pitch, max_pitch]`, on lanes 0-4.
///
/// A flat range maps to the center lane. Halves round to even. Differences
/// are taken in `i64`, so any pair of `i32` pitches is in range.
pub fn scale_pitch_to_lane(pitch: i32, min_pitch: i32, max_pitch: i32) -> i32 {
    if max_pitch == min_pitch {
        return i32::from(Lane::CENTER.index());
    }
    let offset = i64::from(pitch) - i64::from(min_pitch);
    let span = i64::from(max_pitch) - i64::from(min_pitch);
    let ratio = offset as f64 / span as f64;
    ((ratio * 4.0).round_ties_even() as i32).clamp(0, 4)
}

/// Limits each consecutive lane change to `max_jump`, sweeping left to right
/// once per pass.
pub fn smooth_lanes(lanes: &[i32], max_jump: i32, passes: u32) -> Vec<i32> {
    let mut result = lanes.to_vec();
    if result.len() <= 1 {
        return result;
    }

    for _ in 0..passes {
        for i in 1..result.len() {
            let diff = result[i] - result[i - 1];
            if diff.abs() > max_jump {
                let clamped = result[i - 1] + max_jump * diff.signum();
                result[i] = clamped.clamp(0, 4);
            }
        }
    }
    result
}

/// Nudges lanes so they move the same way as the pitches they came from.
///
/// Works on the already adjusted previous lane, so one nudge can carry into
/// the next note.
pub fn preserve_direction(lanes: &[i32], pitches: &[i32]) -> Vec<i32> {
    let mut result = lanes.to_vec();

    for i in 1..result.len().min(pitches.len()) {
        let pitch_diff = i64::from(pitches[i]) - i64::from(pitches[i - 1]);
        let lane_diff = result[i] - result[i - 1];

        if pitch_diff > 0 && lane_diff <= 0 {
            result[i] = (result[i - 1] + 1).min(4);
        } else if pitch_diff < 0 && lane_diff >= 0 {
            result[i] = (result[i - 1] - 1).max(0);
        }
    }
    result
}
