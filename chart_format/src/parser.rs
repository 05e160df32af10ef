use std::collections::BTreeMap;

use chart_schema::{
    parse_section_name, BpmChange, Chart, Event, Metadata, Note, Section, StarPowerPhrase, Tick,
    TimeSignature, Track, OPEN_FRET,
};

use crate::ChartError;

const FORCED_FLAG: u32 = 5;
const TAP_FLAG: u32 = 6;
const STAR_POWER_PHRASE: u32 = 2;

/// Lines of one `[Name]` block, with braces and blank lines dropped.
#[derive(Debug, Clone)]
pub(crate) struct RawSection {
    pub(crate) name: String,
    pub(crate) lines: Vec<(usize, String)>,
}

pub(crate) fn parse_chart(src: &str) -> Result<Chart, ChartError> {
    let mut chart = Chart::default();

    for section in split_sections(src) {
        match section.name.as_str() {
            "Song" => parse_song_section(&mut chart.meta, &section)?,
            "SyncTrack" => parse_sync_track(&mut chart, &section)?,
            "Events" => parse_events(&mut chart, &section)?,
            name => match parse_section_name(name) {
                Some(id) => {
                    let track = parse_track_section(&section)?;
                    chart.set_track(id.instrument, id.difficulty, track);
                }
                None => log::debug!("ignoring unknown section [{name}]"),
            },
        }
    }

    Ok(chart)
}

/// Never fails. Content before the first header is dropped; a repeated
/// section name replaces the earlier block's lines.
pub(crate) fn split_sections(src: &str) -> Vec<RawSection> {
    let mut sections: Vec<RawSection> = Vec::new();
    let mut current: Option<RawSection> = None;

    for (i, raw_line) in src.lines().enumerate() {
        let line = raw_line.trim_start_matches('\u{feff}').trim();

        if let Some(name) = section_header(line) {
            if let Some(done) = current.take() {
                push_section(&mut sections, done);
            }
            current = Some(RawSection {
                name: name.to_string(),
                lines: Vec::new(),
            });
            continue;
        }

        if line.is_empty() || line == "{" || line == "}" {
            continue;
        }
        if let Some(section) = current.as_mut() {
            section.lines.push((i + 1, line.to_string()));
        }
    }

    if let Some(done) = current {
        push_section(&mut sections, done);
    }
    sections
}

fn push_section(sections: &mut Vec<RawSection>, section: RawSection) {
    match sections.iter_mut().find(|s| s.name == section.name) {
        Some(existing) => existing.lines = section.lines,
        None => sections.push(section),
    }
}

fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']')
}

/// Splits `lhs = rhs` at the first `=`. Lines without one are not data.
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let (lhs, rhs) = line.split_once('=')?;
    Some((lhs.trim(), rhs.trim()))
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"')
}

fn parse_song_section(meta: &mut Metadata, section: &RawSection) -> Result<(), ChartError> {
    for (line_no, line) in &section.lines {
        let Some((key, raw_value)) = split_assignment(line) else {
            continue;
        };
        let value = unquote(raw_value);
        let number_err = || {
            ChartError::new("E1004", format!("invalid {key} value: {raw_value}"), *line_no)
                .with_section("Song")
                .with_context(line.clone())
        };

        match key {
            "Name" => meta.name = value.to_string(),
            "Artist" => meta.artist = value.to_string(),
            "Album" => meta.album = value.to_string(),
            "Genre" => meta.genre = value.to_string(),
            "Year" => meta.year = value.strip_prefix(", ").unwrap_or(value).to_string(),
            "Charter" => meta.charter = value.to_string(),
            "Offset" => meta.offset = value.parse().map_err(|_| number_err())?,
            "Resolution" => {
                let resolution: u32 = value.parse().map_err(|_| number_err())?;
                if resolution == 0 {
                    return Err(ChartError::new("E1005", "Resolution must be > 0", *line_no)
                        .with_section("Song")
                        .with_context(line.clone()));
                }
                meta.resolution = resolution;
            }
            "Difficulty" => meta.difficulty = value.parse().map_err(|_| number_err())?,
            "PreviewStart" => meta.preview_start = value.parse().map_err(|_| number_err())?,
            "PreviewEnd" => meta.preview_end = value.parse().map_err(|_| number_err())?,
            "Player2" => meta.player2 = Some(value.to_string()),
            "MediaType" => meta.media_type = Some(value.to_string()),
            _ => log::debug!("ignoring [Song] key {key}"),
        }
    }
    Ok(())
}

/// A `tick = TYPE args...` line.
struct DataLine<'a> {
    line_no: usize,
    text: &'a str,
    section: &'a str,
    tick: Tick,
    kind: &'a str,
    /// Everything after the type token, untrimmed of quotes.
    rest: &'a str,
}

impl<'a> DataLine<'a> {
    fn parse(line_no: usize, text: &'a str, section: &'a str) -> Result<Option<Self>, ChartError> {
        let Some((lhs, rhs)) = split_assignment(text) else {
            return Ok(None);
        };
        let tick = lhs.parse::<Tick>().map_err(|_| {
            ChartError::new("E1001", format!("invalid tick: {lhs}"), line_no)
                .with_section(section)
                .with_context(text)
        })?;
        let (kind, rest) = match rhs.split_once(char::is_whitespace) {
            Some((kind, rest)) => (kind, rest.trim()),
            None => (rhs, ""),
        };
        if kind.is_empty() {
            return Err(ChartError::new("E1002", "missing event type", line_no)
                .with_section(section)
                .with_context(text));
        }
        Ok(Some(Self {
            line_no,
            text,
            section,
            tick,
            kind,
            rest,
        }))
    }

    /// The `index`-th whitespace separated argument as an integer.
    fn arg(&self, index: usize, what: &str) -> Result<u32, ChartError> {
        let token = self.rest.split_whitespace().nth(index).ok_or_else(|| {
            ChartError::new("E1002", format!("missing {what}"), self.line_no)
                .with_section(self.section)
                .with_context(self.text)
        })?;
        token.parse().map_err(|_| {
            ChartError::new("E1003", format!("invalid {what}: {token}"), self.line_no)
                .with_section(self.section)
                .with_context(self.text)
        })
    }

    fn opt_arg(&self, index: usize, what: &str) -> Result<Option<u32>, ChartError> {
        if self.rest.split_whitespace().nth(index).is_none() {
            return Ok(None);
        }
        self.arg(index, what).map(Some)
    }

    fn text_arg(&self) -> &'a str {
        unquote(self.rest)
    }
}

fn data_lines<'a>(
    section: &'a RawSection,
) -> impl Iterator<Item = Result<DataLine<'a>, ChartError>> + 'a {
    section
        .lines
        .iter()
        .filter_map(move |(line_no, text)| DataLine::parse(*line_no, text, &section.name).transpose())
}

fn parse_sync_track(chart: &mut Chart, section: &RawSection) -> Result<(), ChartError> {
    for line in data_lines(section) {
        let line = line?;
        match line.kind {
            "B" => {
                let milli_bpm = line.arg(0, "tempo")?;
                chart.bpm_changes.push(BpmChange {
                    tick: line.tick,
                    bpm: f64::from(milli_bpm) / 1000.0,
                });
            }
            "TS" => {
                let numerator = line.arg(0, "time signature numerator")?;
                let exponent = line.opt_arg(1, "time signature denominator")?.unwrap_or(2);
                let denominator = 1u32.checked_shl(exponent).ok_or_else(|| {
                    ChartError::new(
                        "E1006",
                        format!("time signature exponent out of range: {exponent}"),
                        line.line_no,
                    )
                    .with_section(line.section)
                    .with_context(line.text)
                })?;
                chart
                    .time_signatures
                    .push(TimeSignature::new(line.tick, numerator, denominator));
            }
            other => log::debug!("ignoring sync event {other} at tick {}", line.tick),
        }
    }
    Ok(())
}

fn parse_events(chart: &mut Chart, section: &RawSection) -> Result<(), ChartError> {
    for line in data_lines(section) {
        let line = line?;
        if line.kind != "E" {
            log::debug!("ignoring [Events] line: {}", line.text);
            continue;
        }
        let text = line.text_arg();
        match text.strip_prefix("section ") {
            Some(name) => chart.sections.push(Section {
                tick: line.tick,
                name: name.to_string(),
            }),
            None => chart.events.push(Event {
                tick: line.tick,
                text: text.to_string(),
            }),
        }
    }
    Ok(())
}

/// Everything seen at one tick of a track section.
#[derive(Debug, Default)]
struct TickBuffer {
    notes: BTreeMap<u8, Note>,
    forced: bool,
    tap: bool,
}

/// Notes are buffered per tick and only resolved once the whole section has
/// been read, since a flag line may come before or after the notes it marks.
fn parse_track_section(section: &RawSection) -> Result<Track, ChartError> {
    let mut track = Track::new();
    let mut buffer: BTreeMap<Tick, TickBuffer> = BTreeMap::new();

    for line in data_lines(section) {
        let line = line?;
        match line.kind {
            "N" => {
                let fret = line.arg(0, "fret")?;
                let sustain = line.arg(1, "sustain")?;
                let slot = buffer.entry(line.tick).or_default();
                match fret {
                    0..=4 => {
                        slot.notes.insert(fret as u8, Note::new(line.tick, fret as u8, sustain));
                    }
                    FORCED_FLAG => slot.forced = true,
                    TAP_FLAG => slot.tap = true,
                    f if f == u32::from(OPEN_FRET) => {
                        slot.notes.insert(OPEN_FRET, Note::open(line.tick, sustain));
                    }
                    other => log::debug!(
                        "ignoring fret value {other} at tick {} in [{}]",
                        line.tick,
                        line.section
                    ),
                }
            }
            "S" => {
                let phrase_type = line.arg(0, "star power type")?;
                let length = line.arg(1, "star power length")?;
                if phrase_type == STAR_POWER_PHRASE {
                    track.star_power.push(StarPowerPhrase {
                        tick: line.tick,
                        length,
                    });
                }
            }
            "E" => track.events.push(Event {
                tick: line.tick,
                text: line.text_arg().to_string(),
            }),
            other => log::debug!("ignoring track event {other} at tick {}", line.tick),
        }
    }

    for slot in buffer.into_values() {
        for mut note in slot.notes.into_values() {
            note.is_forced |= slot.forced;
            note.is_tap |= slot.tap;
            track.add_note(note);
        }
    }
    Ok(track)
}
