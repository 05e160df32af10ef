use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Instrument {
    Guitar,
    Bass,
    Rhythm,
    Coop,
    Keys,
    Drums,
    GhlGuitar,
    GhlBass,
}

impl Instrument {
    pub const ALL: [Instrument; 8] = [
        Instrument::Guitar,
        Instrument::Bass,
        Instrument::Rhythm,
        Instrument::Coop,
        Instrument::Keys,
        Instrument::Drums,
        Instrument::GhlGuitar,
        Instrument::GhlBass,
    ];

    /// Suffix used in track section names, e.g. `Single` in `[ExpertSingle]`.
    pub fn suffix(self) -> &'static str {
        match self {
            Instrument::Guitar => "Single",
            Instrument::Bass => "DoubleBass",
            Instrument::Rhythm => "DoubleRhythm",
            Instrument::Coop => "DoubleGuitar",
            Instrument::Keys => "Keyboard",
            Instrument::Drums => "Drums",
            Instrument::GhlGuitar => "GHLGuitar",
            Instrument::GhlBass => "GHLBass",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.suffix().eq_ignore_ascii_case(suffix))
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// One (difficulty, instrument) slot of a chart.
///
/// Ordering is difficulty-major, instrument-minor, which is also the order
/// track sections are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackId {
    pub difficulty: Difficulty,
    pub instrument: Instrument,
}

impl TrackId {
    pub fn new(difficulty: Difficulty, instrument: Instrument) -> Self {
        Self {
            difficulty,
            instrument,
        }
    }

    pub fn section_name(self) -> &'static str {
        section_name(self.difficulty, self.instrument)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_name())
    }
}

impl From<TrackId> for String {
    fn from(id: TrackId) -> Self {
        id.section_name().to_string()
    }
}

impl TryFrom<String> for TrackId {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        parse_section_name(&name).ok_or_else(|| format!("unknown track section: {name}"))
    }
}

use Difficulty::*;
use Instrument::*;

/// Every valid track section name. Lookups in both directions go through
/// this table so the accepted set stays exhaustive.
pub static TRACK_SECTIONS: [(Difficulty, Instrument, &str); 32] = [
    (Easy, Guitar, "EasySingle"),
    (Easy, Bass, "EasyDoubleBass"),
    (Easy, Rhythm, "EasyDoubleRhythm"),
    (Easy, Coop, "EasyDoubleGuitar"),
    (Easy, Keys, "EasyKeyboard"),
    (Easy, Drums, "EasyDrums"),
    (Easy, GhlGuitar, "EasyGHLGuitar"),
    (Easy, GhlBass, "EasyGHLBass"),
    (Medium, Guitar, "MediumSingle"),
    (Medium, Bass, "MediumDoubleBass"),
    (Medium, Rhythm, "MediumDoubleRhythm"),
    (Medium, Coop, "MediumDoubleGuitar"),
    (Medium, Keys, "MediumKeyboard"),
    (Medium, Drums, "MediumDrums"),
    (Medium, GhlGuitar, "MediumGHLGuitar"),
    (Medium, GhlBass, "MediumGHLBass"),
    (Hard, Guitar, "HardSingle"),
    (Hard, Bass, "HardDoubleBass"),
    (Hard, Rhythm, "HardDoubleRhythm"),
    (Hard, Coop, "HardDoubleGuitar"),
    (Hard, Keys, "HardKeyboard"),
    (Hard, Drums, "HardDrums"),
    (Hard, GhlGuitar, "HardGHLGuitar"),
    (Hard, GhlBass, "HardGHLBass"),
    (Expert, Guitar, "ExpertSingle"),
    (Expert, Bass, "ExpertDoubleBass"),
    (Expert, Rhythm, "ExpertDoubleRhythm"),
    (Expert, Coop, "ExpertDoubleGuitar"),
    (Expert, Keys, "ExpertKeyboard"),
    (Expert, Drums, "ExpertDrums"),
    (Expert, GhlGuitar, "ExpertGHLGuitar"),
    (Expert, GhlBass, "ExpertGHLBass"),
];

pub fn section_name(difficulty: Difficulty, instrument: Instrument) -> &'static str {
    TRACK_SECTIONS
        .iter()
        .find(|(d, i, _)| *d == difficulty && *i == instrument)
        .map(|(_, _, name)| *name)
        .unwrap_or_else(|| unreachable!("section table covers every pair"))
}

/// Case-sensitive: `[expertsingle]` is not a track section.
pub fn parse_section_name(name: &str) -> Option<TrackId> {
    TRACK_SECTIONS
        .iter()
        .find(|(_, _, n)| *n == name)
        .map(|(d, i, _)| TrackId::new(*d, *i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_table_is_exhaustive_and_consistent() {
        for d in Difficulty::ALL {
            for i in Instrument::ALL {
                let name = section_name(d, i);
                assert_eq!(name, format!("{}{}", d.name(), i.suffix()));
                assert_eq!(parse_section_name(name), Some(TrackId::new(d, i)));
            }
        }
    }

    #[test]
    fn unknown_section_names_are_rejected() {
        assert_eq!(parse_section_name("ExpertVocals"), None);
        assert_eq!(parse_section_name("Song"), None);
        assert_eq!(parse_section_name("expertsingle"), None);
        assert_eq!(parse_section_name(""), None);
    }

    #[test]
    fn track_ids_order_difficulty_major() {
        let mut ids = vec![
            TrackId::new(Expert, Guitar),
            TrackId::new(Easy, Bass),
            TrackId::new(Easy, Guitar),
            TrackId::new(Hard, Drums),
        ];
        ids.sort();
        let names: Vec<_> = ids.iter().map(|id| id.section_name()).collect();
        assert_eq!(names, ["EasySingle", "EasyDoubleBass", "HardDrums", "ExpertSingle"]);
    }

    #[test]
    fn track_id_serializes_as_section_name() {
        let json = serde_json::to_string(&TrackId::new(Medium, Keys)).unwrap();
        assert_eq!(json, "\"MediumKeyboard\"");
        let back: TrackId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TrackId::new(Medium, Keys));
        assert!(serde_json::from_str::<TrackId>("\"MediumKazoo\"").is_err());
    }

    #[test]
    fn names_parse_case_insensitively_for_cli_use() {
        assert_eq!(Difficulty::from_name("expert"), Some(Expert));
        assert_eq!(Instrument::from_suffix("doublebass"), Some(Bass));
        assert_eq!(Instrument::from_suffix("Banjo"), None);
    }
}
