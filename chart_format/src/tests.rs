use super::*;
use chart_schema::{
    BpmChange, Difficulty, Event, Instrument, Metadata, Note, Section, StarPowerPhrase, TimeSignature,
    Track,
};
use pretty_assertions::assert_eq;
use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir()
        .join(format!("chart_format_{}_{nanos}", std::process::id()))
        .join(name)
}

fn sample_chart() -> Chart {
    let mut chart = Chart::new(Metadata {
        name: "Round Trip".to_string(),
        artist: "The Testers".to_string(),
        album: "Fixtures".to_string(),
        genre: "metal".to_string(),
        year: "1999".to_string(),
        charter: "Auto-Generated".to_string(),
        offset: 0.25,
        resolution: 192,
        difficulty: 4,
        preview_start: 12.5,
        preview_end: 0.0,
        player2: Some("bass".to_string()),
        media_type: Some("cd".to_string()),
    });
    chart.bpm_changes.push(BpmChange { tick: 0, bpm: 120.0 });
    chart.bpm_changes.push(BpmChange { tick: 1536, bpm: 133.5 });
    chart.time_signatures.push(TimeSignature::new(0, 4, 4));
    chart.time_signatures.push(TimeSignature::new(1536, 6, 8));
    chart.sections.push(Section {
        tick: 0,
        name: "intro".to_string(),
    });
    chart.sections.push(Section {
        tick: 768,
        name: "verse 1".to_string(),
    });
    chart.events.push(Event {
        tick: 384,
        text: "Bad_Too_High".to_string(),
    });

    let mut expert: Track = [
        Note::new(0, 0, 0),
        Note::new(192, 1, 96),
        Note::new(192, 3, 96),
        Note::new(384, 2, 0).forced(),
        Note::new(576, 4, 0).tap(),
        Note::open(768, 192),
        Note::new(960, 1, 0).forced().tap(),
    ]
    .into_iter()
    .collect();
    expert.star_power.push(StarPowerPhrase { tick: 192, length: 576 });
    expert.events.push(Event {
        tick: 960,
        text: "solo".to_string(),
    });
    chart.set_track(Instrument::Guitar, Difficulty::Expert, expert);

    let easy: Track = [Note::new(0, 0, 0), Note::new(384, 1, 0)].into_iter().collect();
    chart.set_track(Instrument::Bass, Difficulty::Easy, easy);
    chart
}

#[test]
fn written_chart_parses_back_identically() {
    let chart = sample_chart();
    let text = write_string(&chart).unwrap();
    let back = parse_str(&text).unwrap();
    assert_eq!(back, chart);

    // A second pass is byte-for-byte stable.
    assert_eq!(write_string(&back).unwrap(), text);
}

#[test]
fn sections_are_written_in_canonical_order() {
    let text = write_string(&sample_chart()).unwrap();
    let headers: Vec<&str> = text.lines().filter(|l| l.starts_with('[')).collect();
    assert_eq!(
        headers,
        ["[Song]", "[SyncTrack]", "[Events]", "[EasyDoubleBass]", "[ExpertSingle]"]
    );
}

#[test]
fn parse_reads_song_metadata() {
    let src = r#"
[Song]
{
  Name = "Through the Fire"
  Artist = "Someone"
  Year = ", 2006"
  Offset = -0.5
  Resolution = 480
  Difficulty = 2
  PreviewStart = 30.5
  Genre = "power metal"
  Player2 = bass
  MusicStream = "song.ogg"
}
"#;
    let chart = parse_str(src).unwrap();
    assert_eq!(chart.meta.name, "Through the Fire");
    assert_eq!(chart.meta.year, "2006");
    assert_eq!(chart.meta.offset, -0.5);
    assert_eq!(chart.meta.resolution, 480);
    assert_eq!(chart.meta.difficulty, 2);
    assert_eq!(chart.meta.preview_start, 30.5);
    assert_eq!(chart.meta.genre, "power metal");
    assert_eq!(chart.meta.player2.as_deref(), Some("bass"));
    // Untouched keys keep their defaults.
    assert_eq!(chart.meta.charter, "");
    assert_eq!(chart.meta.album, "");
}

#[test]
fn flags_apply_to_every_note_on_their_tick() {
    let src = "\
[ExpertSingle]
{
  0 = N 5 0
  0 = N 0 0
  0 = N 2 0
  192 = N 1 48
  192 = N 6 0
  384 = N 7 96
  384 = N 5 0
  576 = N 3 0
}
";
    let chart = parse_str(src).unwrap();
    let track = chart.get_track(Instrument::Guitar, Difficulty::Expert).unwrap();
    let notes = track.notes();
    assert_eq!(notes.len(), 5);

    let flags: Vec<_> = notes
        .iter()
        .map(|n| (n.tick, n.fret, n.is_forced, n.is_tap))
        .collect();
    assert_eq!(
        flags,
        [
            (0, 0, true, false),
            (0, 2, true, false),
            (192, 1, false, true),
            (384, 7, true, false),
            (576, 3, false, false),
        ]
    );
    assert!(notes[3].is_open());
    assert_eq!(notes[3].sustain, 96);
}

#[test]
fn flag_without_notes_creates_nothing() {
    let src = "[HardSingle]\n{\n  0 = N 5 0\n  0 = N 6 0\n}\n";
    let chart = parse_str(src).unwrap();
    let track = chart.get_track(Instrument::Guitar, Difficulty::Hard).unwrap();
    assert_eq!(track.note_count(), 0);
}

#[test]
fn unknown_input_is_ignored() {
    let src = r#"
[Song]
{
  Name = "X"
  FutureKey = 12
}
[SyncTrack]
{
  0 = A 12345
  0 = B 90000
}
[Events]
{
  0 = L "lyric"
  96 = E "crowd_on"
}
[ExpertDrumsPro]
{
  0 = N 0 0
}
[MediumKeyboard]
{
  0 = N 9 0
  0 = N 1 0
  0 = S 64 192
  0 = S 2 192
  96 = Q 1 1
}
"#;
    let chart = parse_str(src).unwrap();
    assert_eq!(chart.meta.name, "X");
    assert_eq!(chart.bpm_changes, [BpmChange { tick: 0, bpm: 90.0 }]);
    assert_eq!(chart.events.len(), 1);
    assert_eq!(chart.events[0].text, "crowd_on");
    assert_eq!(chart.track_count(), 1);

    let keys = chart.get_track(Instrument::Keys, Difficulty::Medium).unwrap();
    assert_eq!(keys.note_count(), 1);
    assert_eq!(keys.notes()[0].fret, 1);
    assert_eq!(keys.star_power, [StarPowerPhrase { tick: 0, length: 192 }]);
}

#[test]
fn time_signature_without_exponent_defaults_to_quarter() {
    let src = "[SyncTrack]\n{\n  0 = TS 3\n  0 = B 100000\n}\n";
    let chart = parse_str(src).unwrap();
    assert_eq!(chart.time_signatures, [TimeSignature::new(0, 3, 4)]);
    assert_eq!(chart.get_initial_bpm(), 100.0);
}

#[test]
fn empty_document_parses_to_defaults() {
    let chart = parse_str("").unwrap();
    assert_eq!(chart, Chart::default());
    assert_eq!(chart.meta.resolution, 192);
}

#[test]
fn non_integer_tick_is_e1001() {
    let src = "[SyncTrack]\n{\n  0 = B 120000\n  abc = B 120000\n}\n";
    let err = parse_str(src).unwrap_err();
    assert_eq!(err.code, "E1001");
    assert_eq!(err.kind, ChartErrorKind::Parse);
    assert_eq!(err.line, 4);
    assert_eq!(err.section.as_deref(), Some("SyncTrack"));
    assert_eq!(err.context.as_deref(), Some("abc = B 120000"));
}

#[test]
fn truncated_note_line_is_e1002() {
    let src = "[ExpertSingle]\n{\n  0 = N 1\n}\n";
    let err = parse_str(src).unwrap_err();
    assert_eq!(err.code, "E1002");
    assert!(err.message.contains("sustain"));
}

#[test]
fn bad_numbers_are_rejected() {
    let err = parse_str("[ExpertSingle]\n{\n  0 = N x 0\n}\n").unwrap_err();
    assert_eq!(err.code, "E1003");

    let err = parse_str("[SyncTrack]\n{\n  0 = B 120.5\n}\n").unwrap_err();
    assert_eq!(err.code, "E1003");

    let err = parse_str("[Song]\n{\n  Offset = soon\n}\n").unwrap_err();
    assert_eq!(err.code, "E1004");
    assert_eq!(err.line, 3);
}

#[test]
fn zero_resolution_is_e1005() {
    let err = parse_str("[Song]\n{\n  Resolution = 0\n}\n").unwrap_err();
    assert_eq!(err.code, "E1005");
    assert_eq!(err.to_string(), "E1005: Resolution must be > 0 (line 3)");
}

#[test]
fn huge_time_signature_exponent_is_e1006() {
    let err = parse_str("[SyncTrack]\n{\n  0 = TS 4 40\n}\n").unwrap_err();
    assert_eq!(err.code, "E1006");
}

#[test]
fn quote_in_metadata_fails_to_write() {
    let mut chart = sample_chart();
    chart.meta.artist = "The \"Testers\"".to_string();
    let err = write_string(&chart).unwrap_err();
    assert_eq!(err.code, "E4001");
    assert_eq!(err.kind, ChartErrorKind::Validation);
}

#[test]
fn file_round_trip_creates_parent_dirs() {
    let path = temp_path("nested/out.chart");
    let chart = sample_chart();
    write_file(&chart, &path).unwrap();
    assert_eq!(parse_file(&path).unwrap(), chart);
    let _ = fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
}

#[test]
fn missing_file_is_e2001() {
    let path = temp_path("does_not_exist.chart");
    let err = parse_file(&path).unwrap_err();
    assert_eq!(err.code, "E2001");
    assert_eq!(err.kind, ChartErrorKind::IO);
    assert_eq!(err.file, Some(path.display().to_string()));
}

#[test]
fn parse_errors_from_files_carry_the_path() {
    let path = temp_path("broken.chart");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "[SyncTrack]\n{\n  x = B 1\n}\n").unwrap();
    let err = parse_file(&path).unwrap_err();
    assert_eq!(err.code, "E1001");
    assert_eq!(err.file, Some(path.display().to_string()));
    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn converted_chart_survives_a_round_trip() {
    use chart_schema::{Lane, MappedNote, NoteEvent, QaIssue};

    let mapped = vec![
        MappedNote {
            note: NoteEvent::new(0, 960, 60, 100),
            lane: Lane::Green,
            issues: vec![],
        },
        MappedNote {
            note: NoteEvent::new(960, 1000, 48, 100),
            lane: Lane::Orange,
            issues: vec![QaIssue::TooHigh],
        },
    ];
    let meta = Metadata {
        name: "Converted".to_string(),
        charter: "Auto-Generated".to_string(),
        ..Metadata::default()
    };
    let chart = build_chart(meta, &mapped, &ConvertOptions::new(480, 96.0)).unwrap();
    let text = write_string(&chart).unwrap();
    assert!(text.contains("  384 = E \"Bad_Too_High\"\n"));
    assert!(text.contains("  0 = B 96000\n"));
    assert!(text.contains("  0 = N 0 384\n  384 = N 4 0\n"));
    assert_eq!(parse_str(&text).unwrap(), chart);
}
