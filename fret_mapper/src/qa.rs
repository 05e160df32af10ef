use std::collections::{BTreeMap, HashMap, HashSet};

use chart_schema::{Lane, MappedNote, NoteEvent, QaIssue};

use crate::MapError;

fn check_lengths(notes: &[NoteEvent], lanes: &[Lane]) -> Result<(), MapError> {
    if notes.len() != lanes.len() {
        return Err(MapError::LengthMismatch {
            notes: notes.len(),
            lanes: lanes.len(),
        });
    }
    Ok(())
}

/// One issue list per note.
///
/// - `DifferentFret`: the pitch was already charted on some other lane.
/// - `TooLow`: pitch rose by more than 2 semitones while the lane fell by more than 1.
/// - `TooHigh`: the mirror image.
pub fn detect_qa_issues(notes: &[NoteEvent], lanes: &[Lane]) -> Result<Vec<Vec<QaIssue>>, MapError> {
    check_lengths(notes, lanes)?;

    let mut issues = vec![Vec::new(); notes.len()];
    let mut seen: HashMap<i32, HashSet<Lane>> = HashMap::new();

    for (i, (note, &lane)) in notes.iter().zip(lanes).enumerate() {
        let lanes_for_pitch = seen.entry(note.pitch).or_default();
        if !lanes_for_pitch.is_empty() && !lanes_for_pitch.contains(&lane) {
            issues[i].push(QaIssue::DifferentFret);
        }
        lanes_for_pitch.insert(lane);

        if i == 0 {
            continue;
        }
        let pitch_diff = i64::from(note.pitch) - i64::from(notes[i - 1].pitch);
        let lane_diff = i32::from(lane.index()) - i32::from(lanes[i - 1].index());

        if pitch_diff > 2 && lane_diff < -1 {
            issues[i].push(QaIssue::TooLow);
        }
        if pitch_diff < -2 && lane_diff > 1 {
            issues[i].push(QaIssue::TooHigh);
        }
    }

    Ok(issues)
}

/// Pairs notes with lanes, with QA findings when `include_qa` is set.
pub fn create_mapped_notes(
    notes: &[NoteEvent],
    lanes: &[Lane],
    include_qa: bool,
) -> Result<Vec<MappedNote>, MapError> {
    check_lengths(notes, lanes)?;

    let issues = if include_qa {
        detect_qa_issues(notes, lanes)?
    } else {
        vec![Vec::new(); notes.len()]
    };

    Ok(notes
        .iter()
        .zip(lanes)
        .zip(issues)
        .map(|((&note, &lane), issues)| MappedNote { note, lane, issues })
        .collect())
}

pub fn summarize_qa_issues(mapped: &[MappedNote]) -> BTreeMap<QaIssue, usize> {
    let mut summary = BTreeMap::new();
    for issue in mapped.iter().flat_map(|m| &m.issues) {
        *summary.entry(*issue).or_insert(0) += 1;
    }
    summary
}
