// Static music-theory tables: pitch classes, scales, triads, and the
// functional-harmony transition graphs.
//
// Everything here is lookup data. `Mode` picks between the major and minor
// scale patterns and graphs; `ChordSymbol` names a roman-numeral triad and
// knows its semitone offsets from the key root; `TransitionGraph` lists which
// chords may legally follow which.
//
// Minor triads are derived from their major counterparts at compile time by
// lowering the third one semitone (`lower_third`). The major entries are left
// untouched.
//
// Used by progression.rs (graph walks), melody.rs (scale and chord tones), and
// compose.rs (block chords and arpeggios).

use crate::error::MuseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The twelve pitch classes, sharps only. Index = semitones above C.
pub const CHROMATIC: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Map a flat (or otherwise non-standard) spelling to its sharp equivalent.
///
/// Returns `None` for names that are already standard or unknown.
pub fn sharp_equivalent(name: &str) -> Option<&'static str> {
    match name {
        "Db" => Some("C#"),
        "Eb" => Some("D#"),
        "E#" => Some("F"),
        "Fb" => Some("E"),
        "Gb" => Some("F#"),
        "Ab" => Some("G#"),
        "Bb" => Some("A#"),
        "B#" => Some("C"),
        "Cb" => Some("B"),
        _ => None,
    }
}

/// Position of a sharp-spelled pitch class in `CHROMATIC`.
pub fn pitch_class_index(name: &str) -> Option<usize> {
    CHROMATIC.iter().position(|&pc| pc == name)
}

/// Semitone offsets of the major scale, root through octave.
pub const MAJOR_SCALE: [i32; 8] = [0, 2, 4, 5, 7, 9, 11, 12];

/// Semitone offsets of the natural minor scale, root through octave.
pub const MINOR_SCALE: [i32; 8] = [0, 2, 3, 5, 7, 8, 10, 12];

/// Tonality of a song: selects the scale and the transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    pub fn from_is_major(is_major: bool) -> Self {
        if is_major { Mode::Major } else { Mode::Minor }
    }

    pub fn is_major(self) -> bool {
        self == Mode::Major
    }

    /// The 8 scale offsets spanning one octave (last is 12).
    pub fn scale(self) -> &'static [i32; 8] {
        match self {
            Mode::Major => &MAJOR_SCALE,
            Mode::Minor => &MINOR_SCALE,
        }
    }

    /// The chord-transition graph for this mode.
    pub fn transitions(self) -> &'static TransitionGraph {
        match self {
            Mode::Major => &MAJOR_TRANSITIONS,
            Mode::Minor => &MINOR_TRANSITIONS,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => f.write_str("major"),
            Mode::Minor => f.write_str("minor"),
        }
    }
}

// ---------------------------------------------------------------------------
// Diatonic triads
// ---------------------------------------------------------------------------

const MAJOR_I: [i32; 3] = [0, 4, 7];
const MAJOR_II: [i32; 3] = [2, 6, 9];
const MAJOR_III: [i32; 3] = [4, 8, 11];
const MAJOR_IV: [i32; 3] = [5, 9, 12];
const MAJOR_V: [i32; 3] = [7, 11, 14];
const MAJOR_VI: [i32; 3] = [9, 13, 16];
const MAJOR_VII: [i32; 3] = [11, 15, 18];

const MINOR_I: [i32; 3] = lower_third(MAJOR_I);
const MINOR_II: [i32; 3] = lower_third(MAJOR_II);
const MINOR_III: [i32; 3] = lower_third(MAJOR_III);
const MINOR_IV: [i32; 3] = lower_third(MAJOR_IV);
const MINOR_V: [i32; 3] = lower_third(MAJOR_V);
const MINOR_VI: [i32; 3] = lower_third(MAJOR_VI);
const MINOR_VII: [i32; 3] = lower_third(MAJOR_VII);

const DIMINISHED_II: [i32; 4] = [1, 4, 7, 9];
const DIMINISHED_VII: [i32; 4] = [0, 4, 7, 10];

/// Turn a major triad into the minor triad on the same degree.
const fn lower_third(major: [i32; 3]) -> [i32; 3] {
    [major[0], major[1] - 1, major[2]]
}

/// A roman-numeral chord label. Upper case is a major triad, lower case a
/// minor triad, and a trailing `0` marks the four-note diminished chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChordSymbol {
    #[serde(rename = "I")]
    MajorI,
    #[serde(rename = "II")]
    MajorII,
    #[serde(rename = "III")]
    MajorIII,
    #[serde(rename = "IV")]
    MajorIV,
    #[serde(rename = "V")]
    MajorV,
    #[serde(rename = "VI")]
    MajorVI,
    #[serde(rename = "VII")]
    MajorVII,
    #[serde(rename = "i")]
    MinorI,
    #[serde(rename = "ii")]
    MinorII,
    #[serde(rename = "iii")]
    MinorIII,
    #[serde(rename = "iv")]
    MinorIV,
    #[serde(rename = "v")]
    MinorV,
    #[serde(rename = "vi")]
    MinorVI,
    #[serde(rename = "vii")]
    MinorVII,
    #[serde(rename = "ii0")]
    DiminishedII,
    #[serde(rename = "vii0")]
    DiminishedVII,
}

impl ChordSymbol {
    pub const ALL: [ChordSymbol; 16] = [
        ChordSymbol::MajorI,
        ChordSymbol::MajorII,
        ChordSymbol::MajorIII,
        ChordSymbol::MajorIV,
        ChordSymbol::MajorV,
        ChordSymbol::MajorVI,
        ChordSymbol::MajorVII,
        ChordSymbol::MinorI,
        ChordSymbol::MinorII,
        ChordSymbol::MinorIII,
        ChordSymbol::MinorIV,
        ChordSymbol::MinorV,
        ChordSymbol::MinorVI,
        ChordSymbol::MinorVII,
        ChordSymbol::DiminishedII,
        ChordSymbol::DiminishedVII,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChordSymbol::MajorI => "I",
            ChordSymbol::MajorII => "II",
            ChordSymbol::MajorIII => "III",
            ChordSymbol::MajorIV => "IV",
            ChordSymbol::MajorV => "V",
            ChordSymbol::MajorVI => "VI",
            ChordSymbol::MajorVII => "VII",
            ChordSymbol::MinorI => "i",
            ChordSymbol::MinorII => "ii",
            ChordSymbol::MinorIII => "iii",
            ChordSymbol::MinorIV => "iv",
            ChordSymbol::MinorV => "v",
            ChordSymbol::MinorVI => "vi",
            ChordSymbol::MinorVII => "vii",
            ChordSymbol::DiminishedII => "ii0",
            ChordSymbol::DiminishedVII => "vii0",
        }
    }

    /// Semitone offsets of the chord tones above the key root.
    pub fn offsets(self) -> &'static [i32] {
        match self {
            ChordSymbol::MajorI => &MAJOR_I,
            ChordSymbol::MajorII => &MAJOR_II,
            ChordSymbol::MajorIII => &MAJOR_III,
            ChordSymbol::MajorIV => &MAJOR_IV,
            ChordSymbol::MajorV => &MAJOR_V,
            ChordSymbol::MajorVI => &MAJOR_VI,
            ChordSymbol::MajorVII => &MAJOR_VII,
            ChordSymbol::MinorI => &MINOR_I,
            ChordSymbol::MinorII => &MINOR_II,
            ChordSymbol::MinorIII => &MINOR_III,
            ChordSymbol::MinorIV => &MINOR_IV,
            ChordSymbol::MinorV => &MINOR_V,
            ChordSymbol::MinorVI => &MINOR_VI,
            ChordSymbol::MinorVII => &MINOR_VII,
            ChordSymbol::DiminishedII => &DIMINISHED_II,
            ChordSymbol::DiminishedVII => &DIMINISHED_VII,
        }
    }
}

impl fmt::Display for ChordSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChordSymbol {
    type Err = MuseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChordSymbol::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| MuseError::UnknownChord {
                chord: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Transition graphs
// ---------------------------------------------------------------------------

/// Which chords may follow which, in table order.
///
/// Order matters: an unseeded progression picks its opening chord uniformly
/// from `symbols()` in this order, so reordering changes seeded output.
#[derive(Debug)]
pub struct TransitionGraph {
    edges: &'static [(ChordSymbol, &'static [ChordSymbol])],
}

impl TransitionGraph {
    pub const fn new(edges: &'static [(ChordSymbol, &'static [ChordSymbol])]) -> Self {
        TransitionGraph { edges }
    }

    /// Every chord that appears as a source, in table order.
    pub fn symbols(&self) -> Vec<ChordSymbol> {
        self.edges.iter().map(|&(from, _)| from).collect()
    }

    pub fn contains(&self, chord: ChordSymbol) -> bool {
        self.edges.iter().any(|&(from, _)| from == chord)
    }

    /// The legal successors of `chord`.
    ///
    /// Fails if `chord` is not a source in this graph or has no successors;
    /// both mean the table is malformed for this walk.
    pub fn targets(&self, chord: ChordSymbol) -> Result<&'static [ChordSymbol], MuseError> {
        let targets = self
            .edges
            .iter()
            .find(|&&(from, _)| from == chord)
            .map(|&(_, to)| to)
            .ok_or_else(|| MuseError::UnknownChord {
                chord: chord.to_string(),
            })?;
        if targets.is_empty() {
            return Err(MuseError::EmptyTransitions {
                chord: chord.to_string(),
            });
        }
        Ok(targets)
    }

    pub fn is_valid_edge(&self, from: ChordSymbol, to: ChordSymbol) -> bool {
        self.targets(from).is_ok_and(|targets| targets.contains(&to))
    }

    /// Check that every source has successors and every successor is itself
    /// a source, so any walk can continue indefinitely.
    pub fn validate(&self) -> Result<(), MuseError> {
        for &(from, _) in self.edges {
            for &to in self.targets(from)? {
                if !self.contains(to) {
                    return Err(MuseError::UnknownChord {
                        chord: to.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

use ChordSymbol::*;

pub static MAJOR_TRANSITIONS: TransitionGraph = TransitionGraph::new(&[
    (MajorI, &[MajorI, MinorII, MinorIII, MajorIV, MajorV, MinorVI, DiminishedVII]),
    (MinorII, &[MajorV, DiminishedVII]),
    (MinorIII, &[MajorIV, MinorVI]),
    (MajorIV, &[MajorI, MinorII, MajorV, DiminishedVII]),
    (MajorV, &[MajorI, MinorVI]),
    (MinorVI, &[MinorII, MajorIV, MajorV]),
    (DiminishedVII, &[MajorI]),
]);

pub static MINOR_TRANSITIONS: TransitionGraph = TransitionGraph::new(&[
    (
        MinorI,
        &[MinorI, DiminishedII, MajorIII, MinorIV, MajorV, MajorVI, MajorVII, DiminishedVII],
    ),
    (DiminishedII, &[MajorV, DiminishedVII]),
    (MajorIII, &[MinorIV, MajorVI]),
    (MinorIV, &[MinorI, DiminishedII, MajorV, DiminishedVII]),
    (MajorV, &[MinorI, MajorVI]),
    (MajorVI, &[DiminishedII, MinorIV, MajorV]),
    (MajorVII, &[MajorIII]),
    (DiminishedVII, &[MinorI, MajorV]),
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_triads_lower_the_third_only() {
        assert_eq!(MinorI.offsets(), &[0, 3, 7]);
        assert_eq!(MinorIV.offsets(), &[5, 8, 12]);
        // The major source entries are untouched.
        assert_eq!(MajorI.offsets(), &[0, 4, 7]);
        assert_eq!(MajorV.offsets(), &[7, 11, 14]);
    }

    #[test]
    fn scales_span_an_octave() {
        for mode in [Mode::Major, Mode::Minor] {
            let scale = mode.scale();
            assert_eq!(scale[0], 0);
            assert_eq!(scale[7], 12);
            assert!(scale.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn both_graphs_are_closed() {
        MAJOR_TRANSITIONS.validate().unwrap();
        MINOR_TRANSITIONS.validate().unwrap();
    }

    #[test]
    fn targets_of_unknown_chord_fail() {
        let err = MAJOR_TRANSITIONS.targets(MajorVII).unwrap_err();
        assert!(matches!(err, MuseError::UnknownChord { .. }));
    }

    #[test]
    fn empty_edge_list_is_a_configuration_error() {
        static BROKEN: TransitionGraph = TransitionGraph::new(&[(MajorI, &[MajorV]), (MajorV, &[])]);
        let err = BROKEN.validate().unwrap_err();
        assert!(matches!(err, MuseError::EmptyTransitions { .. }));
    }

    #[test]
    fn chord_labels_round_trip_through_from_str() {
        for chord in ChordSymbol::ALL {
            assert_eq!(chord.label().parse::<ChordSymbol>().unwrap(), chord);
        }
        assert!("IX".parse::<ChordSymbol>().is_err());
    }

    #[test]
    fn chord_symbol_serializes_as_label() {
        let json = serde_json::to_string(&DiminishedVII).unwrap();
        assert_eq!(json, "\"vii0\"");
        let back: ChordSymbol = serde_json::from_str("\"ii0\"").unwrap();
        assert_eq!(back, DiminishedII);
    }

    #[test]
    fn flats_map_to_sharps() {
        assert_eq!(sharp_equivalent("Db"), Some("C#"));
        assert_eq!(sharp_equivalent("Cb"), Some("B"));
        assert_eq!(sharp_equivalent("C#"), None);
        assert_eq!(pitch_class_index("A#"), Some(10));
        assert_eq!(pitch_class_index("Bb"), None);
    }
}
