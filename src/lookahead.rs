//! Branch-and-bound scoring of a single alignment start.
//!
//! A window is scored position by position. Before each position the running
//! score is compared against `threshold - bound[d]`, where `bound[d]` is the best
//! score any symbols could still add over positions `d..n`. Once the running
//! score falls below that, no completion of the window can reach the threshold
//! and the window is abandoned.

use crate::alphabet::{self, bases_of, SYMBOLS, SYMBOL_CODES, SYMBOL_COUNT};
use crate::error::{MotifError, Result};
use crate::types::{Background, MotifMatrix, PSEUDOCOUNT};
use ndarray::Array2;

/// Slack on the pruning test so rounding in the bound never drops a window
/// whose score lands exactly on the threshold.
const BOUND_SLACK: f64 = 1e-9;

/// Log-likelihood ratio of one symbol at one motif position.
///
/// Unambiguous bases score `ln(f / bg)`; ambiguity codes score the ratio of the
/// summed frequencies of the bases they represent. A numerator of exactly zero
/// is replaced by [`PSEUDOCOUNT`]. `N` scores 0 regardless of the background.
///
/// # Errors
/// * `MotifError::InvalidSymbol` if `symbol` is outside the DNA/IUPAC alphabet
pub fn symbol_score<M: MotifMatrix + ?Sized>(
    background: &Background,
    pwm: &M,
    pos: usize,
    symbol: u8,
) -> Result<f64> {
    if symbol == b'N' {
        return Ok(0.0);
    }
    let bases = bases_of(symbol).ok_or_else(|| MotifError::invalid_symbol(pos, symbol))?;
    let (freq, bg) = bases.fold((0.0, 0.0), |(f, g), b| {
        (f + pwm.freq(pos, b), g + background.freq(b))
    });
    let freq = if freq == 0.0 { PSEUDOCOUNT } else { freq };
    Ok((freq / bg).ln())
}

/// Score of every symbol code at every motif position (n x 15).
#[derive(Debug, Clone)]
pub struct ScoreTable {
    scores: Array2<f64>,
}

impl ScoreTable {
    /// # Errors
    /// * `MotifError::DegenerateMotif` if any entry is not a finite score, which a
    ///   validated [`Pwm`](crate::types::Pwm) never produces
    pub fn new<M: MotifMatrix + ?Sized>(background: &Background, pwm: &M) -> Result<Self> {
        let n = pwm.width();
        if n == 0 {
            return Err(MotifError::DegenerateMotif("motif has no positions".into()));
        }
        let mut scores = Array2::<f64>::zeros((n, SYMBOL_COUNT));
        for pos in 0..n {
            for (code, &symbol) in SYMBOLS.iter().enumerate() {
                let score = symbol_score(background, pwm, pos, symbol)?;
                if !score.is_finite() {
                    return Err(MotifError::DegenerateMotif(format!(
                        "score of '{}' at position {} is {}",
                        symbol as char, pos, score
                    )));
                }
                scores[[pos, code]] = score;
            }
        }
        Ok(Self { scores })
    }

    pub fn width(&self) -> usize {
        self.scores.nrows()
    }

    #[inline]
    pub fn get(&self, pos: usize, code: u8) -> f64 {
        self.scores[[pos, code as usize]]
    }

    /// Best contribution any symbol can make at `pos`.
    ///
    /// `N` is always admissible, so this is never below zero.
    pub fn best_at(&self, pos: usize) -> f64 {
        self.scores
            .row(pos)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Upper bound on the score still reachable from each motif position to the end.
///
/// Entry `d` is `total - prefix[d]`, where `prefix` accumulates the best
/// per-position contributions. Entries never increase with `d`.
#[derive(Debug, Clone, PartialEq)]
pub struct SuffixBounds {
    bounds: Vec<f64>,
}

impl SuffixBounds {
    pub fn from_table(table: &ScoreTable) -> Self {
        let n = table.width();
        let mut prefix = Vec::with_capacity(n + 1);
        prefix.push(0.0);
        for pos in 0..n {
            prefix.push(prefix[pos] + table.best_at(pos));
        }
        let total = prefix[n];
        let bounds = prefix[..n].iter().map(|p| total - p).collect();
        Self { bounds }
    }

    #[inline]
    pub fn get(&self, pos: usize) -> f64 {
        self.bounds[pos]
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.bounds
    }

    /// Highest score any window can reach.
    pub fn best_score(&self) -> f64 {
        self.bounds[0]
    }
}

/// Computes the suffix bound vector for one (background, PWM) pair.
pub fn suffix_bounds<M: MotifMatrix + ?Sized>(
    background: &Background,
    pwm: &M,
) -> Result<SuffixBounds> {
    Ok(SuffixBounds::from_table(&ScoreTable::new(background, pwm)?))
}

/// Result of evaluating one start position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanOutcome {
    /// Every position was scored; carries the full window score.
    Complete(f64),
    /// Abandoned before scoring `position`; `partial` is the score up to there.
    Pruned { position: usize, partial: f64 },
}

impl ScanOutcome {
    /// True for a complete window scoring at least `threshold`.
    #[inline]
    pub fn is_match(&self, threshold: f64) -> bool {
        matches!(self, ScanOutcome::Complete(score) if *score >= threshold)
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            ScanOutcome::Complete(score) => Some(*score),
            ScanOutcome::Pruned { .. } => None,
        }
    }
}

/// Precomputed tables for scanning one motif against one background.
#[derive(Debug, Clone)]
pub struct LookaheadScanner {
    table: ScoreTable,
    bounds: SuffixBounds,
}

impl LookaheadScanner {
    pub fn new<M: MotifMatrix + ?Sized>(background: &Background, pwm: &M) -> Result<Self> {
        let table = ScoreTable::new(background, pwm)?;
        let bounds = SuffixBounds::from_table(&table);
        log::debug!(
            "Built look-ahead scanner: width {}, best score {:.4}",
            table.width(),
            bounds.best_score()
        );
        Ok(Self { table, bounds })
    }

    pub fn width(&self) -> usize {
        self.table.width()
    }

    pub fn bounds(&self) -> &SuffixBounds {
        &self.bounds
    }

    /// Evaluates the window at `start` against `threshold`.
    ///
    /// # Errors
    /// * `MotifError::InvalidParameter` if the window runs past the sequence end
    /// * `MotifError::InvalidSymbol` if the window holds a symbol outside the alphabet
    pub fn scan(&self, sequence: &[u8], start: usize, threshold: f64) -> Result<ScanOutcome> {
        let window = self.checked_window(sequence, start)?;
        Ok(self.scan_window(window, threshold))
    }

    /// Full score of the window at `start`, without pruning.
    ///
    /// # Errors
    /// Same as [`LookaheadScanner::scan`].
    pub fn score_at(&self, sequence: &[u8], start: usize) -> Result<f64> {
        let window = self.checked_window(sequence, start)?;
        Ok(self.score_window(window))
    }

    fn checked_window<'s>(&self, sequence: &'s [u8], start: usize) -> Result<&'s [u8]> {
        let end = match start.checked_add(self.width()) {
            Some(end) if end <= sequence.len() => end,
            _ => {
                return Err(MotifError::invalid_parameter(
                    "start",
                    start,
                    format!(
                        "window of width {} runs past sequence length {}",
                        self.width(),
                        sequence.len()
                    ),
                ))
            }
        };
        let window = &sequence[start..end];
        alphabet::validate(window).map_err(|e| match e {
            MotifError::InvalidSymbol { position, symbol } => MotifError::InvalidSymbol {
                position: start + position,
                symbol,
            },
            other => other,
        })?;
        Ok(window)
    }

    /// Pruned evaluation of a window already checked against the alphabet.
    #[inline]
    pub(crate) fn scan_window(&self, window: &[u8], threshold: f64) -> ScanOutcome {
        debug_assert_eq!(window.len(), self.width());
        let mut score = 0.0;
        for (d, &symbol) in window.iter().enumerate() {
            let remaining = threshold - self.bounds.get(d);
            if score + BOUND_SLACK < remaining {
                return ScanOutcome::Pruned {
                    position: d,
                    partial: score,
                };
            }
            score += self.table.get(d, SYMBOL_CODES[symbol as usize]);
        }
        ScanOutcome::Complete(score)
    }

    /// Unpruned score of a window already checked against the alphabet.
    ///
    /// Accumulates in the same order as [`scan_window`](Self::scan_window), so a
    /// complete scan and this function agree exactly.
    #[inline]
    pub(crate) fn score_window(&self, window: &[u8]) -> f64 {
        debug_assert_eq!(window.len(), self.width());
        let mut score = 0.0;
        for (d, &symbol) in window.iter().enumerate() {
            score += self.table.get(d, SYMBOL_CODES[symbol as usize]);
        }
        score
    }
}
