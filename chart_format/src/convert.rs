use chart_schema::{
    BpmChange, Chart, Difficulty, Event, Instrument, Lane, MappedNote, Metadata, Note, NoteEvent,
    Section, Tick, TimeSignature, Track, TrackId,
};

use crate::ticks::convert_ticks;
use crate::writer::{format_sync_track_section, format_track_section, write_chart_string};
use crate::ChartError;

/// How a mapped note sequence becomes a chart document.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Ticks per quarter note of the incoming note sequence.
    pub input_ppq: u32,
    pub bpm: f64,
    /// (numerator, denominator), 4/4 by default.
    pub time_signature: (u32, u32),
    /// Shortest duration, in beats, kept as a sustain.
    pub min_sustain_beats: f64,
    pub instrument: Instrument,
    pub difficulties: Vec<Difficulty>,
    pub include_qa_events: bool,
}

impl ConvertOptions {
    pub fn new(input_ppq: u32, bpm: f64) -> Self {
        Self {
            input_ppq,
            bpm,
            time_signature: (4, 4),
            min_sustain_beats: 0.5,
            instrument: Instrument::Guitar,
            difficulties: vec![Difficulty::Expert],
            include_qa_events: true,
        }
    }
}

pub fn min_sustain_ticks(min_sustain_beats: f64, resolution: u32) -> Tick {
    // `as` saturates, so negative minimums collapse to 0.
    (min_sustain_beats * f64::from(resolution)).floor() as Tick
}

fn check_resolutions(input_ppq: u32, resolution: u32) -> Result<(), ChartError> {
    if input_ppq == 0 || resolution == 0 {
        return Err(ChartError::new(
            "E4003",
            format!("resolutions must be positive (input {input_ppq}, chart {resolution})"),
            0,
        ));
    }
    Ok(())
}

fn chart_note(event: &NoteEvent, lane: Lane, input_ppq: u32, resolution: u32, min_sustain: Tick) -> Note {
    let start = convert_ticks(event.start_tick, input_ppq, resolution);
    let end = convert_ticks(event.end_tick, input_ppq, resolution);
    let duration = end.saturating_sub(start);
    let sustain = if duration >= min_sustain { duration } else { 0 };
    Note::new(start, lane.index(), sustain)
}

/// Builds a complete document from mapped notes: tempo, meter and an `intro`
/// section at tick 0, optional QA markers in `[Events]`, and one identical
/// track per requested difficulty.
pub fn build_chart(meta: Metadata, mapped: &[MappedNote], options: &ConvertOptions) -> Result<Chart, ChartError> {
    let resolution = meta.resolution;
    check_resolutions(options.input_ppq, resolution)?;
    let min_sustain = min_sustain_ticks(options.min_sustain_beats, resolution);

    let mut chart = Chart::new(meta);
    chart.bpm_changes.push(BpmChange {
        tick: 0,
        bpm: options.bpm,
    });
    let (numerator, denominator) = options.time_signature;
    chart
        .time_signatures
        .push(TimeSignature::new(0, numerator, denominator));
    chart.sections.push(Section {
        tick: 0,
        name: "intro".to_string(),
    });

    let mut track = Track::new();
    for m in mapped {
        let note = chart_note(&m.note, m.lane, options.input_ppq, resolution, min_sustain);
        if options.include_qa_events {
            for issue in &m.issues {
                chart.events.push(Event {
                    tick: note.tick,
                    text: issue.tag().to_string(),
                });
            }
        }
        track.add_note(note);
    }

    for &difficulty in &options.difficulties {
        chart.set_track(options.instrument, difficulty, track.clone());
    }
    log::debug!(
        "built chart: {} notes x {} difficulties, {} QA events",
        track.note_count(),
        options.difficulties.len(),
        chart.events.len()
    );
    Ok(chart)
}

/// `[SyncTrack]` holding a single tempo and meter at tick 0.
pub fn format_sync_track(bpm: f64, numerator: u32, denominator: u32) -> String {
    format_sync_track_section(
        &[BpmChange { tick: 0, bpm }],
        &[TimeSignature::new(0, numerator, denominator)],
    )
}

/// One guitar track section straight from note/lane pairs.
pub fn format_notes_section(
    notes: &[NoteEvent],
    lanes: &[Lane],
    input_ppq: u32,
    resolution: u32,
    min_sustain_beats: f64,
    difficulty: Difficulty,
) -> Result<String, ChartError> {
    check_lane_count(notes, lanes)?;
    check_resolutions(input_ppq, resolution)?;
    let min_sustain = min_sustain_ticks(min_sustain_beats, resolution);

    let track: Track = notes
        .iter()
        .zip(lanes)
        .map(|(note, &lane)| chart_note(note, lane, input_ppq, resolution, min_sustain))
        .collect();
    format_track_section(TrackId::new(difficulty, Instrument::Guitar), &track)
}

/// Whole document for note/lane pairs with no QA markers.
pub fn generate_chart_string(
    notes: &[NoteEvent],
    lanes: &[Lane],
    input_ppq: u32,
    bpm: f64,
    meta: Metadata,
    difficulties: &[Difficulty],
) -> Result<String, ChartError> {
    check_lane_count(notes, lanes)?;
    let mapped: Vec<MappedNote> = notes
        .iter()
        .zip(lanes)
        .map(|(&note, &lane)| MappedNote {
            note,
            lane,
            issues: Vec::new(),
        })
        .collect();

    let options = ConvertOptions {
        difficulties: difficulties.to_vec(),
        include_qa_events: false,
        ..ConvertOptions::new(input_ppq, bpm)
    };
    write_chart_string(&build_chart(meta, &mapped, &options)?)
}

fn check_lane_count(notes: &[NoteEvent], lanes: &[Lane]) -> Result<(), ChartError> {
    if notes.len() != lanes.len() {
        return Err(ChartError::new(
            "E4002",
            format!("{} notes but {} lanes", notes.len(), lanes.len()),
            0,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_schema::QaIssue;

    fn mapped(start: Tick, end: Tick, pitch: i32, lane: Lane, issues: Vec<QaIssue>) -> MappedNote {
        MappedNote {
            note: NoteEvent::new(start, end, pitch, 100),
            lane,
            issues,
        }
    }

    #[test]
    fn sync_track_scenarios() {
        let text = format_sync_track(120.0, 4, 4);
        assert!(text.contains("0 = B 120000"));
        assert!(text.contains("0 = TS 4 2"));
        assert!(format_sync_track(120.0, 6, 8).contains("0 = TS 6 3"));
    }

    #[test]
    fn two_beat_note_keeps_its_sustain() {
        let notes = [NoteEvent::new(0, 960, 60, 100)];
        let text = format_notes_section(&notes, &[Lane::Green], 480, 192, 0.5, Difficulty::Expert).unwrap();
        assert!(text.starts_with("[ExpertSingle]\n{\n"));
        assert!(text.contains("  0 = N 0 384\n"));
    }

    #[test]
    fn short_note_drops_its_sustain() {
        // 200 input ticks -> 80 chart ticks, under the 96-tick minimum.
        let notes = [NoteEvent::new(480, 680, 60, 100)];
        let text = format_notes_section(&notes, &[Lane::Blue], 480, 192, 0.5, Difficulty::Hard).unwrap();
        assert!(text.starts_with("[HardSingle]"));
        assert!(text.contains("  192 = N 3 0\n"));
    }

    #[test]
    fn mismatched_lanes_are_rejected() {
        let notes = [NoteEvent::new(0, 10, 60, 100), NoteEvent::new(10, 20, 62, 100)];
        let err = format_notes_section(&notes, &[Lane::Red], 480, 192, 0.5, Difficulty::Expert).unwrap_err();
        assert_eq!(err.code, "E4002");
        let err = generate_chart_string(&notes, &[], 480, 120.0, Metadata::default(), &[Difficulty::Expert])
            .unwrap_err();
        assert_eq!(err.code, "E4002");
    }

    #[test]
    fn zero_input_resolution_is_rejected() {
        let err = build_chart(Metadata::default(), &[], &ConvertOptions::new(0, 120.0)).unwrap_err();
        assert_eq!(err.code, "E4003");
    }

    #[test]
    fn build_chart_lays_out_timeline_and_qa_events() {
        let notes = vec![
            mapped(0, 480, 60, Lane::Green, vec![]),
            mapped(480, 960, 72, Lane::Green, vec![QaIssue::TooLow]),
            mapped(960, 1440, 60, Lane::Red, vec![QaIssue::DifferentFret]),
        ];
        let mut options = ConvertOptions::new(480, 140.0);
        options.difficulties = vec![Difficulty::Expert, Difficulty::Easy];
        let chart = build_chart(Metadata::default(), &notes, &options).unwrap();

        assert_eq!(chart.get_initial_bpm(), 140.0);
        assert_eq!(chart.time_signatures, [TimeSignature::new(0, 4, 4)]);
        assert_eq!(chart.sections[0].name, "intro");
        let tags: Vec<_> = chart.events.iter().map(|e| (e.tick, e.text.as_str())).collect();
        assert_eq!(tags, [(192, "Bad_Too_Low"), (384, "Bad_Different_Fret")]);

        assert_eq!(chart.track_count(), 2);
        let expert = chart.get_track(Instrument::Guitar, Difficulty::Expert).unwrap();
        let easy = chart.get_track(Instrument::Guitar, Difficulty::Easy).unwrap();
        assert_eq!(expert, easy);
        let layout: Vec<_> = expert.notes().iter().map(|n| (n.tick, n.fret, n.sustain)).collect();
        assert_eq!(layout, [(0, 0, 192), (192, 0, 192), (384, 1, 192)]);
    }

    #[test]
    fn qa_events_can_be_disabled() {
        let notes = vec![mapped(0, 10, 60, Lane::Green, vec![QaIssue::TooHigh])];
        let mut options = ConvertOptions::new(480, 120.0);
        options.include_qa_events = false;
        let chart = build_chart(Metadata::default(), &notes, &options).unwrap();
        assert!(chart.events.is_empty());
    }

    #[test]
    fn empty_sequence_still_writes_a_track_section() {
        let text = generate_chart_string(&[], &[], 480, 120.0, Metadata::default(), &[Difficulty::Expert]).unwrap();
        assert!(text.contains("[ExpertSingle]\n{\n}\n"));
        assert!(text.contains("0 = E \"section intro\""));
    }
}
