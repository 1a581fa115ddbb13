// Chord progression generation: a uniform random walk over a transition graph.
//
// The opening chord is drawn uniformly from every chord in the mode's graph,
// or, when a seed chord is given, uniformly from the seed's successors. That
// is how a chorus picks up where the verse left off. Each following chord is
// drawn uniformly from the previous chord's successors, so every adjacent
// pair in the result is a legal edge. There is no backtracking; a chord with
// no successors is a table error.

use crate::error::MuseError;
use crate::theory::{ChordSymbol, Mode};
use muse_prng::MuseRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// An ordered list of chords, one per bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progression {
    chords: Vec<ChordSymbol>,
}

impl Progression {
    pub fn from_chords(chords: Vec<ChordSymbol>) -> Self {
        Progression { chords }
    }

    pub fn chords(&self) -> &[ChordSymbol] {
        &self.chords
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn first(&self) -> Option<ChordSymbol> {
        self.chords.first().copied()
    }

    pub fn last(&self) -> Option<ChordSymbol> {
        self.chords.last().copied()
    }

    /// True if every adjacent pair is an edge of `mode`'s graph.
    pub fn is_valid_walk(&self, mode: Mode) -> bool {
        let graph = mode.transitions();
        self.chords.iter().all(|&c| graph.contains(c))
            && self
                .chords
                .windows(2)
                .all(|pair| graph.is_valid_edge(pair[0], pair[1]))
    }
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.chords.iter().map(|c| c.label()).collect();
        f.write_str(&labels.join(" "))
    }
}

/// Generate a `bar_count`-chord progression in `mode`.
///
/// With `seed`, the first chord is a legal successor of `seed`; the seed
/// itself is not part of the result.
pub fn generate_progression(
    bar_count: usize,
    mode: Mode,
    seed: Option<ChordSymbol>,
    rng: &mut MuseRng,
) -> Result<Progression, MuseError> {
    let graph = mode.transitions();
    let mut chords = Vec::with_capacity(bar_count);
    if bar_count == 0 {
        return Ok(Progression { chords });
    }

    let first = match seed {
        Some(seed) => pick_next(seed, mode, rng)?,
        None => {
            let symbols = graph.symbols();
            *rng.choose(&symbols).ok_or(MuseError::EmptyTransitions {
                chord: format!("<{mode} graph>"),
            })?
        }
    };
    chords.push(first);

    let mut current = first;
    for _ in 1..bar_count {
        current = pick_next(current, mode, rng)?;
        chords.push(current);
    }

    let progression = Progression { chords };
    debug!(%mode, seed = ?seed, %progression, "generated progression");
    Ok(progression)
}

/// A uniformly chosen legal successor of `chord`.
fn pick_next(chord: ChordSymbol, mode: Mode, rng: &mut MuseRng) -> Result<ChordSymbol, MuseError> {
    let targets = mode.transitions().targets(chord)?;
    rng.choose(targets)
        .copied()
        .ok_or_else(|| MuseError::EmptyTransitions {
            chord: chord.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_matches_bar_count() {
        let mut rng = MuseRng::new(1);
        for bars in 1..20 {
            for mode in [Mode::Major, Mode::Minor] {
                let p = generate_progression(bars, mode, None, &mut rng).unwrap();
                assert_eq!(p.len(), bars);
            }
        }
        assert!(generate_progression(0, Mode::Major, None, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn every_step_is_a_legal_edge() {
        let mut rng = MuseRng::new(2);
        for _ in 0..500 {
            for mode in [Mode::Major, Mode::Minor] {
                let p = generate_progression(8, mode, None, &mut rng).unwrap();
                assert!(p.is_valid_walk(mode), "illegal walk in {mode}: {p}");
            }
        }
    }

    #[test]
    fn seeded_progression_continues_from_seed() {
        let mut rng = MuseRng::new(3);
        let graph = Mode::Major.transitions();
        for seed in graph.symbols() {
            for _ in 0..50 {
                let p = generate_progression(4, Mode::Major, Some(seed), &mut rng).unwrap();
                assert!(graph.is_valid_edge(seed, p.first().unwrap()));
            }
        }
        // vii0 only resolves to I.
        let p = generate_progression(1, Mode::Major, Some(ChordSymbol::DiminishedVII), &mut rng).unwrap();
        assert_eq!(p.chords(), &[ChordSymbol::MajorI]);
    }

    #[test]
    fn seed_outside_the_graph_is_an_error() {
        let mut rng = MuseRng::new(4);
        let err = generate_progression(4, Mode::Minor, Some(ChordSymbol::MajorI), &mut rng).unwrap_err();
        assert!(matches!(err, MuseError::UnknownChord { .. }));
    }

    #[test]
    fn opening_chord_covers_the_whole_graph() {
        let mut rng = MuseRng::new(5);
        let symbols = Mode::Minor.transitions().symbols();
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..2000 {
            let p = generate_progression(1, Mode::Minor, None, &mut rng).unwrap();
            seen.insert(p.first().unwrap());
        }
        assert_eq!(seen.len(), symbols.len());
    }

    #[test]
    fn is_major_flag_selects_the_graph() {
        let mut rng = MuseRng::new(6);
        for is_major in [true, false] {
            let mode = Mode::from_is_major(is_major);
            assert_eq!(mode.is_major(), is_major);
            for _ in 0..100 {
                let p = generate_progression(4, mode, None, &mut rng).unwrap();
                assert!(p.is_valid_walk(mode));
            }
        }
        // The minor graph has no major tonic, the major graph no minor one.
        assert!(!Mode::from_is_major(false).transitions().contains(ChordSymbol::MajorI));
        assert!(!Mode::from_is_major(true).transitions().contains(ChordSymbol::MinorI));
    }

    #[test]
    fn same_seed_same_progression() {
        let a = generate_progression(16, Mode::Major, None, &mut MuseRng::new(77)).unwrap();
        let b = generate_progression(16, Mode::Major, None, &mut MuseRng::new(77)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn serializes_as_label_list() {
        let p = Progression::from_chords(vec![ChordSymbol::MajorI, ChordSymbol::MinorVI]);
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"["I","vi"]"#);
    }
}
