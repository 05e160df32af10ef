use std::fmt::Write as _;

use chart_schema::{BpmChange, Chart, Event, Metadata, Section, Tick, TimeSignature, Track, TrackId};

use crate::ChartError;

const FORCED_FLAG: u8 = 5;
const TAP_FLAG: u8 = 6;

/// Renders the whole document: `[Song]`, `[SyncTrack]`, `[Events]`, then
/// every populated track in difficulty-major order.
pub fn write_chart_string(chart: &Chart) -> Result<String, ChartError> {
    let mut sections = vec![
        format_song_section(&chart.meta)?,
        format_sync_track_section(&chart.bpm_changes, &chart.time_signatures),
        format_events_section(&chart.sections, &chart.events)?,
    ];
    for (id, track) in chart.tracks() {
        sections.push(format_track_section(id, track)?);
    }
    Ok(sections.join("\n"))
}

/// Quotes are written verbatim with no escaping, so a value containing a
/// double quote or a line break cannot be represented and is rejected.
fn checked<'a>(field: &str, value: &'a str) -> Result<&'a str, ChartError> {
    if value.contains(['"', '\n', '\r']) {
        return Err(ChartError::new(
            "E4001",
            format!("{field} contains a double quote or line break: {value}"),
            0,
        )
        .with_context(value.to_string()));
    }
    Ok(value)
}

fn block(name: &str, body: &[String]) -> String {
    let mut out = format!("[{name}]\n{{\n");
    for line in body {
        let _ = writeln!(out, "  {line}");
    }
    out.push_str("}\n");
    out
}

pub fn format_song_section(meta: &Metadata) -> Result<String, ChartError> {
    let mut body = vec![
        format!("Name = \"{}\"", checked("Name", &meta.name)?),
        format!("Artist = \"{}\"", checked("Artist", &meta.artist)?),
    ];
    if !meta.charter.is_empty() {
        body.push(format!("Charter = \"{}\"", checked("Charter", &meta.charter)?));
    }
    if !meta.album.is_empty() {
        body.push(format!("Album = \"{}\"", checked("Album", &meta.album)?));
    }
    if !meta.year.is_empty() {
        body.push(format!("Year = \", {}\"", checked("Year", &meta.year)?));
    }
    body.push(format!("Offset = {}", meta.offset));
    body.push(format!("Resolution = {}", meta.resolution));
    if let Some(player2) = &meta.player2 {
        body.push(format!("Player2 = {}", checked("Player2", player2)?));
    }
    if meta.difficulty >= 0 {
        body.push(format!("Difficulty = {}", meta.difficulty));
    }
    if meta.preview_start != 0.0 {
        body.push(format!("PreviewStart = {}", meta.preview_start));
    }
    if meta.preview_end != 0.0 {
        body.push(format!("PreviewEnd = {}", meta.preview_end));
    }
    body.push(format!("Genre = \"{}\"", checked("Genre", &meta.genre)?));
    if let Some(media_type) = &meta.media_type {
        body.push(format!("MediaType = \"{}\"", checked("MediaType", media_type)?));
    }
    Ok(block("Song", &body))
}

/// Time signatures sort ahead of tempo changes on the same tick.
pub fn format_sync_track_section(bpm_changes: &[BpmChange], time_signatures: &[TimeSignature]) -> String {
    let mut lines: Vec<(Tick, u8, String)> = Vec::new();
    for ts in time_signatures {
        lines.push((
            ts.tick,
            0,
            format!("{} = TS {} {}", ts.tick, ts.numerator, ts.denominator_exponent()),
        ));
    }
    for bpm in bpm_changes {
        lines.push((bpm.tick, 1, format!("{} = B {}", bpm.tick, bpm.milli_bpm())));
    }
    block("SyncTrack", &ordered(lines))
}

pub fn format_events_section(sections: &[Section], events: &[Event]) -> Result<String, ChartError> {
    let mut lines: Vec<(Tick, u8, String)> = Vec::new();
    for section in sections {
        let name = checked("section name", &section.name)?;
        lines.push((section.tick, 0, format!("{} = E \"section {name}\"", section.tick)));
    }
    for event in events {
        let text = checked("event text", &event.text)?;
        lines.push((event.tick, 1, format!("{} = E \"{text}\"", event.tick)));
    }
    Ok(block("Events", &ordered(lines)))
}

/// Each chord is followed by one `N 5` / `N 6` line when any of its notes is
/// forced or tapped; the parser applies those flags to the whole tick.
pub fn format_track_section(id: TrackId, track: &Track) -> Result<String, ChartError> {
    let mut lines: Vec<(Tick, u8, String)> = Vec::new();

    let notes = track.notes();
    let mut i = 0;
    while i < notes.len() {
        let tick = notes[i].tick;
        let chord = track.notes_at_tick(tick);
        for note in chord {
            lines.push((tick, 0, format!("{tick} = N {} {}", note.fret, note.sustain)));
        }
        if chord.iter().any(|n| n.is_forced) {
            lines.push((tick, 0, format!("{tick} = N {FORCED_FLAG} 0")));
        }
        if chord.iter().any(|n| n.is_tap) {
            lines.push((tick, 0, format!("{tick} = N {TAP_FLAG} 0")));
        }
        i += chord.len();
    }

    for sp in &track.star_power {
        lines.push((sp.tick, 1, format!("{} = S 2 {}", sp.tick, sp.length)));
    }
    for event in &track.events {
        let text = checked("event text", &event.text)?;
        lines.push((event.tick, 2, format!("{} = E {text}", event.tick)));
    }

    Ok(block(id.section_name(), &ordered(lines)))
}

/// Stable sort by (tick, kind rank) so equal keys keep insertion order.
fn ordered(mut lines: Vec<(Tick, u8, String)>) -> Vec<String> {
    lines.sort_by_key(|(tick, rank, _)| (*tick, *rank));
    lines.into_iter().map(|(_, _, line)| line).collect()
}
