use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod performance;
mod track_id;

pub use performance::{Lane, MappedNote, NoteEvent, Performance, QaIssue};
pub use track_id::{
    parse_section_name, section_name, Difficulty, Instrument, TrackId, TRACK_SECTIONS,
};

pub type Tick = u32;

pub const DEFAULT_RESOLUTION: u32 = 192;
pub const DEFAULT_BPM: f64 = 120.0;

/// Fret value reserved for open notes.
pub const OPEN_FRET: u8 = 7;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chart {
    pub meta: Metadata,
    pub bpm_changes: Vec<BpmChange>,
    pub time_signatures: Vec<TimeSignature>,
    pub sections: Vec<Section>,
    pub events: Vec<Event>,
    #[serde(default)]
    tracks: BTreeMap<TrackId, Track>,
}

impl Chart {
    pub fn new(meta: Metadata) -> Self {
        Self {
            meta,
            ..Self::default()
        }
    }

    pub fn get_track(&self, instrument: Instrument, difficulty: Difficulty) -> Option<&Track> {
        self.tracks.get(&TrackId::new(difficulty, instrument))
    }

    pub fn track_mut(&mut self, instrument: Instrument, difficulty: Difficulty) -> Option<&mut Track> {
        self.tracks.get_mut(&TrackId::new(difficulty, instrument))
    }

    /// Inserts or replaces the track for the pair, returning the old one.
    pub fn set_track(
        &mut self,
        instrument: Instrument,
        difficulty: Difficulty,
        track: Track,
    ) -> Option<Track> {
        self.tracks.insert(TrackId::new(difficulty, instrument), track)
    }

    /// Populated tracks in section order (difficulty-major).
    pub fn tracks(&self) -> impl Iterator<Item = (TrackId, &Track)> {
        self.tracks.iter().map(|(id, track)| (*id, track))
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn get_initial_bpm(&self) -> f64 {
        self.bpm_changes.first().map(|b| b.bpm).unwrap_or(DEFAULT_BPM)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub year: String,
    pub charter: String,
    /// Audio offset in seconds.
    pub offset: f64,
    /// Chart ticks per quarter note.
    pub resolution: u32,
    /// Written only when non-negative.
    pub difficulty: i32,
    pub preview_start: f64,
    pub preview_end: f64,
    #[serde(default)]
    pub player2: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            artist: "Unknown Artist".to_string(),
            album: String::new(),
            genre: "rock".to_string(),
            year: String::new(),
            charter: String::new(),
            offset: 0.0,
            resolution: DEFAULT_RESOLUTION,
            difficulty: -1,
            preview_start: 0.0,
            preview_end: 0.0,
            player2: None,
            media_type: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpmChange {
    pub tick: Tick,
    pub bpm: f64,
}

impl BpmChange {
    /// Tempo as stored on disk, in thousandths of a beat per minute.
    pub fn milli_bpm(&self) -> u64 {
        (self.bpm * 1000.0).round() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub tick: Tick,
    pub numerator: u32,
    /// Real denominator (4 for 4/4), not the on-disk exponent.
    pub denominator: u32,
}

impl TimeSignature {
    pub fn new(tick: Tick, numerator: u32, denominator: u32) -> Self {
        Self {
            tick,
            numerator,
            denominator,
        }
    }

    /// `log2(denominator)` as written after `TS`; 2 for a zero denominator.
    pub fn denominator_exponent(&self) -> u32 {
        if self.denominator == 0 {
            2
        } else {
            self.denominator.ilog2()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub tick: Tick,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub tick: Tick,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarPowerPhrase {
    pub tick: Tick,
    pub length: Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Note {
    pub tick: Tick,
    /// 0-4 for Green..Orange, or [`OPEN_FRET`].
    pub fret: u8,
    pub sustain: Tick,
    #[serde(default)]
    pub is_forced: bool,
    #[serde(default)]
    pub is_tap: bool,
}

impl Note {
    pub fn new(tick: Tick, fret: u8, sustain: Tick) -> Self {
        Self {
            tick,
            fret,
            sustain,
            is_forced: false,
            is_tap: false,
        }
    }

    pub fn open(tick: Tick, sustain: Tick) -> Self {
        Self::new(tick, OPEN_FRET, sustain)
    }

    pub fn forced(mut self) -> Self {
        self.is_forced = true;
        self
    }

    pub fn tap(mut self) -> Self {
        self.is_tap = true;
        self
    }

    pub fn is_open(&self) -> bool {
        self.fret == OPEN_FRET
    }

    pub fn is_chord_with(&self, other: &Note) -> bool {
        self.tick == other.tick
    }

    /// A note becomes a hammer-on/pull-off on its own when it follows the
    /// previous note within a twelfth of a beat on a different fret.
    pub fn is_natural_hopo(&self, previous: Option<&Note>, resolution: u32) -> bool {
        let Some(prev) = previous else {
            return false;
        };
        let threshold = resolution / 12;
        let gap = self.tick.saturating_sub(prev.tick);
        gap <= threshold && self.fret != prev.fret
    }

    /// Final HOPO state; the forced flag inverts the natural one.
    pub fn is_hopo(&self, previous: Option<&Note>, resolution: u32) -> bool {
        self.is_natural_hopo(previous, resolution) != self.is_forced
    }
}

/// Note data for one (instrument, difficulty) pair.
///
/// `notes` stays sorted by (tick, fret); [`Track::add_note`] is the only way
/// to put a note in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "TrackRepr")]
pub struct Track {
    notes: Vec<Note>,
    pub star_power: Vec<StarPowerPhrase>,
    pub events: Vec<Event>,
}

#[derive(Deserialize)]
struct TrackRepr {
    #[serde(default)]
    notes: Vec<Note>,
    #[serde(default)]
    star_power: Vec<StarPowerPhrase>,
    #[serde(default)]
    events: Vec<Event>,
}

impl From<TrackRepr> for Track {
    fn from(repr: TrackRepr) -> Self {
        let mut track = Track {
            notes: Vec::with_capacity(repr.notes.len()),
            star_power: repr.star_power,
            events: repr.events,
        };
        for note in repr.notes {
            track.add_note(note);
        }
        track
    }
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts after any note with the same (tick, fret).
    pub fn add_note(&mut self, note: Note) {
        let key = (note.tick, note.fret);
        let idx = self.notes.partition_point(|n| (n.tick, n.fret) <= key);
        self.notes.insert(idx, note);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn notes_at_tick(&self, tick: Tick) -> &[Note] {
        let start = self.notes.partition_point(|n| n.tick < tick);
        let end = self.notes.partition_point(|n| n.tick <= tick);
        &self.notes[start..end]
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.star_power.is_empty() && self.events.is_empty()
    }
}

impl FromIterator<Note> for Track {
    fn from_iter<I: IntoIterator<Item = Note>>(iter: I) -> Self {
        let mut track = Track::new();
        for note in iter {
            track.add_note(note);
        }
        track
    }
}
