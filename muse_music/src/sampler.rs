// Weighted sampling over a discrete distribution.
//
// `sample` draws one value from the RNG and walks the cumulative probability
// list in order, returning the first option whose running sum reaches or
// exceeds the draw. A draw landing exactly on a boundary goes to the earlier
// option, and an option with probability 0 is never returned. The probability list must already be normalized; callers
// with raw weights go through `normalize` first.
//
// Contract violations (length mismatch, an unnormalized or non-finite list,
// no options) are errors, never a silent fallback.

use crate::error::MuseError;
use muse_prng::MuseRng;

/// How far a probability list may drift from 1.0 and still count as normalized.
const NORMALIZATION_TOLERANCE: f64 = 1e-9;

/// Scale raw non-negative weights so they sum to 1.
///
/// Fails with `Unnormalizable` if the weights sum to zero or less, or if any
/// weight is negative or not finite.
pub fn normalize(weights: &[f64]) -> Result<Vec<f64>, MuseError> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(MuseError::Unnormalizable);
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(MuseError::Unnormalizable);
    }
    Ok(weights.iter().map(|w| w / total).collect())
}

/// Draw one option according to `probabilities`.
pub fn sample<'a, T>(
    options: &'a [T],
    probabilities: &[f64],
    rng: &mut MuseRng,
) -> Result<&'a T, MuseError> {
    check_contract(options.len(), probabilities)?;
    let draw = rng.next_f64();
    pick(options, probabilities, draw)
}

/// Same walk as `sample` with a caller-supplied draw in [0, 1).
pub fn sample_with_draw<'a, T>(
    options: &'a [T],
    probabilities: &[f64],
    draw: f64,
) -> Result<&'a T, MuseError> {
    check_contract(options.len(), probabilities)?;
    pick(options, probabilities, draw)
}

/// Convenience for raw weights: normalize, then sample.
pub fn sample_weighted<'a, T>(
    options: &'a [T],
    weights: &[f64],
    rng: &mut MuseRng,
) -> Result<&'a T, MuseError> {
    if options.len() != weights.len() {
        return Err(MuseError::LengthMismatch {
            options: options.len(),
            probabilities: weights.len(),
        });
    }
    let probabilities = normalize(weights)?;
    sample(options, &probabilities, rng)
}

fn check_contract(options: usize, probabilities: &[f64]) -> Result<(), MuseError> {
    if options != probabilities.len() {
        return Err(MuseError::LengthMismatch {
            options,
            probabilities: probabilities.len(),
        });
    }
    if options == 0 {
        return Err(MuseError::EmptyOptions);
    }
    let sum: f64 = probabilities.iter().sum();
    let malformed = probabilities.iter().any(|&p| !p.is_finite() || p < 0.0);
    if malformed || !sum.is_finite() || (sum - 1.0).abs() > NORMALIZATION_TOLERANCE {
        return Err(MuseError::NotNormalized { sum });
    }
    Ok(())
}

fn pick<'a, T>(options: &'a [T], probabilities: &[f64], draw: f64) -> Result<&'a T, MuseError> {
    let mut cumulative = 0.0;
    for (option, &p) in options.iter().zip(probabilities) {
        cumulative += p;
        if p > 0.0 && draw <= cumulative {
            return Ok(option);
        }
    }
    // Rounding can leave the final sum a hair under the draw.
    options
        .iter()
        .zip(probabilities)
        .rev()
        .find(|&(_, &p)| p > 0.0)
        .map(|(option, _)| option)
        .ok_or(MuseError::NotNormalized { sum: cumulative })
}
