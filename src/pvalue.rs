use crate::error::{MotifError, Result};
use crate::lookahead::symbol_score;
use crate::types::{Background, MotifMatrix, BASES};
use serde::{Deserialize, Serialize};

/// Score units per nat used when discretising per-position scores.
pub const PVALUE_PRECISION: f64 = 1000.0;

/// Rounding allowance when comparing accumulated tail mass against the p-value.
const TAIL_TOLERANCE: f64 = 1e-12;

/// A match threshold, given directly or as a p-value under the background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Threshold {
    Score(f64),
    PValue(f64),
}

impl Threshold {
    /// Converts the threshold to log-likelihood-ratio units for `pwm`.
    pub fn resolve<M: MotifMatrix + ?Sized>(&self, background: &Background, pwm: &M) -> Result<f64> {
        match *self {
            Threshold::Score(score) => Ok(score),
            Threshold::PValue(p) => pvalue_to_score(p, background, pwm),
        }
    }
}

/// Converts a p-value into a log-likelihood-ratio score threshold.
///
/// The exact distribution of window scores over A/C/G/T under `background` is
/// built by dynamic programming, with every per-position score floored to
/// `1 / PVALUE_PRECISION`. The result is the lowest discretised score whose
/// upper-tail probability does not exceed `p`. Flooring keeps the threshold at
/// or below the true score of every window counted in that tail.
///
/// If even the best window is more probable than `p`, the best achievable
/// score is returned.
///
/// # Errors
/// * `MotifError::InvalidParameter` if `p` is not in (0, 1]
/// * `MotifError::DegenerateMotif` if the motif cannot be scored
pub fn pvalue_to_score<M: MotifMatrix + ?Sized>(
    p: f64,
    background: &Background,
    pwm: &M,
) -> Result<f64> {
    if !(p > 0.0 && p <= 1.0) {
        return Err(MotifError::invalid_parameter(
            "p-value",
            p,
            "must be in (0, 1]",
        ));
    }
    if pwm.width() == 0 {
        return Err(MotifError::DegenerateMotif("motif has no positions".into()));
    }

    let total: f64 = background.freqs().iter().sum();
    let probs = background.freqs().map(|f| f / total);

    let mut dist = vec![1.0f64];
    let mut offset = 0i64;
    for pos in 0..pwm.width() {
        let mut row = [0i64; 4];
        for (b, &base) in BASES.iter().enumerate() {
            let score = symbol_score(background, pwm, pos, base)?;
            if !score.is_finite() {
                return Err(MotifError::DegenerateMotif(format!(
                    "score of '{}' at position {} is {}",
                    base as char, pos, score
                )));
            }
            row[b] = (score * PVALUE_PRECISION).floor() as i64;
        }
        let row_min = row.iter().copied().min().unwrap_or(0);
        let row_max = row.iter().copied().max().unwrap_or(0);

        let mut next = vec![0.0f64; dist.len() + (row_max - row_min) as usize];
        for (k, &pk) in dist.iter().enumerate() {
            if pk == 0.0 {
                continue;
            }
            for b in 0..4 {
                next[k + (row[b] - row_min) as usize] += pk * probs[b];
            }
        }
        dist = next;
        offset += row_min;
    }

    let mut tail = 0.0;
    let mut lowest = None;
    for (k, &pk) in dist.iter().enumerate().rev() {
        if pk == 0.0 {
            continue;
        }
        if tail + pk > p + TAIL_TOLERANCE {
            break;
        }
        tail += pk;
        lowest = Some(k);
    }

    let k = match lowest {
        Some(k) => k,
        None => {
            log::warn!(
                "p-value {} is below the probability of the best window; using the maximum score",
                p
            );
            dist.len() - 1
        }
    };
    Ok((offset + k as i64) as f64 / PVALUE_PRECISION)
}
