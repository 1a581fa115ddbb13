// Error type shared by every generation stage.
//
// Three families: bad runtime input (`Parse`), sampler contract violations
// (`LengthMismatch`, `NotNormalized`, `EmptyOptions`), and malformed static
// tables or config (`Unnormalizable`, `UnknownChord`, `EmptyTransitions`,
// `InvalidConfig`). None of these are retried; generation has no I/O.

/// Errors produced while resolving notes, sampling, or composing.
#[derive(Debug, thiserror::Error)]
pub enum MuseError {
    #[error("bad note name {input:?}: expected a letter A-G, optional '#' or 'b', then an octave")]
    Parse { input: String },

    #[error("sampler got {options} options but {probabilities} probabilities")]
    LengthMismatch { options: usize, probabilities: usize },

    #[error("sampler probabilities sum to {sum}, expected 1")]
    NotNormalized { sum: f64 },

    #[error("sampler called with no options")]
    EmptyOptions,

    #[error("weights cannot be normalized: they sum to zero or less")]
    Unnormalizable,

    #[error("chord {chord} is not in the transition graph")]
    UnknownChord { chord: String },

    #[error("chord {chord} has no outgoing transitions")]
    EmptyTransitions { chord: String },

    #[error("no drum voice has number {0}")]
    UnknownDrumVoice(u8),

    #[error("invalid composer config: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
