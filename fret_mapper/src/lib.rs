//! Pitch-to-lane mapping for five-fret charts.
//!
//! [`map_pitches_to_lanes`] runs the full pipeline: phrase segmentation,
//! per-phrase linear scaling, jump clamping, direction preservation and a
//! final clamp. [`create_mapped_notes`] pairs the result with QA findings.

use chart_schema::{Lane, NoteEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod phrase;
mod preview;
mod qa;
mod shape;

pub use phrase::segment_into_phrases;
pub use preview::preview_lanes_ascii;
pub use qa::{create_mapped_notes, detect_qa_issues, summarize_qa_issues};
pub use shape::{preserve_direction, scale_pitch_to_lane, smooth_lanes};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("notes ({notes}) and lanes ({lanes}) must have the same length")]
    LengthMismatch { notes: usize, lanes: usize },
}

/// Tunables of the mapping engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Silence, in beats, that splits two phrases.
    pub phrase_silence_beats: f64,
    /// Largest lane change allowed between consecutive notes.
    pub max_lane_jump: u8,
    pub smoothing_passes: u32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            phrase_silence_beats: 1.0,
            max_lane_jump: 2,
            smoothing_passes: 1,
        }
    }
}

/// Assigns one lane per note, same length and order as `notes`.
///
/// `notes` must already be ordered by start tick.
pub fn map_pitches_to_lanes(
    notes: &[NoteEvent],
    ticks_per_beat: u32,
    config: &MapperConfig,
) -> Vec<Lane> {
    if notes.is_empty() {
        return Vec::new();
    }

    let phrases = segment_into_phrases(notes, ticks_per_beat, config.phrase_silence_beats);
    log::debug!("{} notes split into {} phrases", notes.len(), phrases.len());

    let mut lanes = vec![0i32; notes.len()];
    for phrase in phrases {
        let pitches = notes[phrase.clone()].iter().map(|n| n.pitch);
        let min_pitch = pitches.clone().min().unwrap_or_default();
        let max_pitch = pitches.max().unwrap_or_default();
        for idx in phrase {
            lanes[idx] = scale_pitch_to_lane(notes[idx].pitch, min_pitch, max_pitch);
        }
    }

    let pitches: Vec<i32> = notes.iter().map(|n| n.pitch).collect();
    let lanes = smooth_lanes(&lanes, i32::from(config.max_lane_jump), config.smoothing_passes);
    let lanes = preserve_direction(&lanes, &pitches);

    lanes.into_iter().map(Lane::clamped).collect()
}
