use std::ops::Range;

use chart_schema::NoteEvent;

/// Splits `notes` into contiguous phrases.
///
/// A new phrase starts whenever the silence between the previous release and
/// the next onset is at least `silence_beats` beats. Overlapping notes never
/// split.
pub fn segment_into_phrases(
    notes: &[NoteEvent],
    ticks_per_beat: u32,
    silence_beats: f64,
) -> Vec<Range<usize>> {
    if notes.is_empty() {
        return Vec::new();
    }

    let silence_ticks = (silence_beats * f64::from(ticks_per_beat)).floor() as i64;
    let mut phrases = Vec::new();
    let mut start = 0;

    for i in 1..notes.len() {
        let gap = i64::from(notes[i].start_tick) - i64::from(notes[i - 1].end_tick);
        if gap >= silence_ticks {
            phrases.push(start..i);
            start = i;
        }
    }
    phrases.push(start..notes.len());
    phrases
}
