use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Tick;

/// One performed note, timed in the performance's own resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub start_tick: Tick,
    pub end_tick: Tick,
    pub pitch: i32,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

fn default_velocity() -> u8 {
    100
}

impl NoteEvent {
    pub fn new(start_tick: Tick, end_tick: Tick, pitch: i32, velocity: u8) -> Self {
        Self {
            start_tick,
            end_tick,
            pitch,
            velocity,
        }
    }

    pub fn duration_ticks(&self) -> Tick {
        self.end_tick.saturating_sub(self.start_tick)
    }
}

/// A monophonic note sequence as handed over by a capture or transcription
/// front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub ticks_per_beat: u32,
    #[serde(default)]
    pub bpm: Option<f64>,
    #[serde(default)]
    pub track_name: Option<String>,
    pub notes: Vec<NoteEvent>,
}

impl Performance {
    /// Restores (start_tick, pitch) order. Stable, so equal notes keep their
    /// relative order.
    pub fn sort_notes(&mut self) {
        self.notes.sort_by_key(|n| (n.start_tick, n.pitch));
    }

    pub fn is_sorted(&self) -> bool {
        self.notes
            .windows(2)
            .all(|w| (w[0].start_tick, w[0].pitch) <= (w[1].start_tick, w[1].pitch))
    }

    /// Span from the first onset to the last release, in performance ticks.
    pub fn span_ticks(&self) -> Tick {
        let Some(first) = self.notes.first() else {
            return 0;
        };
        let end = self.notes.iter().map(|n| n.end_tick).max().unwrap_or(first.end_tick);
        end.saturating_sub(first.start_tick)
    }
}

/// One of the five fret lanes, Green through Orange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Lane {
    Green = 0,
    Red = 1,
    Yellow = 2,
    Blue = 3,
    Orange = 4,
}

impl Lane {
    pub const ALL: [Lane; 5] = [Lane::Green, Lane::Red, Lane::Yellow, Lane::Blue, Lane::Orange];
    pub const CENTER: Lane = Lane::Yellow;

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Saturates out-of-range values to the nearest edge lane.
    pub fn clamped(value: i32) -> Self {
        Self::ALL[value.clamp(0, 4) as usize]
    }

    pub fn initial(self) -> char {
        match self {
            Lane::Green => 'G',
            Lane::Red => 'R',
            Lane::Yellow => 'Y',
            Lane::Blue => 'B',
            Lane::Orange => 'O',
        }
    }
}

/// Likely charting mistake attached to a mapped note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QaIssue {
    /// Higher pitch charted on a clearly lower lane.
    TooLow,
    /// Lower pitch charted on a clearly higher lane.
    TooHigh,
    /// Pitch seen earlier on another lane.
    DifferentFret,
}

impl QaIssue {
    /// Tag written into `[Events]` lines.
    pub fn tag(self) -> &'static str {
        match self {
            QaIssue::TooLow => "Bad_Too_Low",
            QaIssue::TooHigh => "Bad_Too_High",
            QaIssue::DifferentFret => "Bad_Different_Fret",
        }
    }
}

impl fmt::Display for QaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedNote {
    pub note: NoteEvent,
    pub lane: Lane,
    #[serde(default)]
    pub issues: Vec<QaIssue>,
}
