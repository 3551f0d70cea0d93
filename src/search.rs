use crate::alphabet;
use crate::error::{MotifError, Result};
use crate::lookahead::LookaheadScanner;
use crate::types::{Background, MotifMatrix};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that stops a running scan at the next start position.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Lazy, ascending iterator over the start positions whose window reaches a threshold.
///
/// A clone resumes from the same position, so cloning before iterating
/// replays the whole scan.
#[derive(Debug, Clone)]
pub struct TfbsIter<'a> {
    scanner: Cow<'a, LookaheadScanner>,
    sequence: &'a [u8],
    threshold: f64,
    next: usize,
}

impl<'a> TfbsIter<'a> {
    /// Validates `sequence` up front so iteration itself cannot fail.
    fn new(
        scanner: Cow<'a, LookaheadScanner>,
        sequence: &'a [u8],
        threshold: f64,
    ) -> Result<Self> {
        if sequence.len() >= scanner.width() {
            alphabet::validate(sequence)?;
        }
        Ok(Self {
            scanner,
            sequence,
            threshold,
            next: 0,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Iterator for TfbsIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let n = self.scanner.width();
        while self.next + n <= self.sequence.len() {
            let start = self.next;
            self.next += 1;
            let window = &self.sequence[start..start + n];
            if self.scanner.scan_window(window, self.threshold).is_match(self.threshold) {
                return Some(start);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.sequence.len() + 1).saturating_sub(self.next + self.scanner.width());
        (0, Some(remaining))
    }
}

impl std::iter::FusedIterator for TfbsIter<'_> {}

impl LookaheadScanner {
    /// Lazily finds every window of `sequence` scoring at least `threshold`.
    ///
    /// # Errors
    /// * `MotifError::InvalidSymbol` if `sequence` is at least as long as the motif
    ///   and contains a symbol outside the DNA/IUPAC alphabet
    pub fn matches<'a>(&'a self, sequence: &'a [u8], threshold: f64) -> Result<TfbsIter<'a>> {
        TfbsIter::new(Cow::Borrowed(self), sequence, threshold)
    }
}

/// Lazily finds binding sites of `pwm` in `sequence` using look-ahead pruning.
///
/// # Arguments
/// * `background` - Null-model nucleotide frequencies
/// * `pwm` - Motif frequency matrix
/// * `sequence` - DNA/IUPAC sequence, upper case
/// * `threshold` - Minimum log-likelihood-ratio score of a reported window
///
/// # Returns
/// * `Result<TfbsIter>` - Ascending start positions of matching windows; empty when
///   the sequence is shorter than the motif
///
/// # Errors
/// * `MotifError::InvalidSymbol` for a symbol outside the alphabet
/// * `MotifError::DegenerateMotif` if the motif cannot be scored
///
/// # Example
/// ```
/// use tfbs_lookahead::search::find_tfbs;
/// use tfbs_lookahead::types::{Background, Pwm};
///
/// let pwm = Pwm::from_rows(&[[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]]).unwrap();
/// let first = find_tfbs(&Background::uniform(), &pwm, b"AACGTAC", 2.0)
///     .unwrap()
///     .next();
/// assert_eq!(first, Some(1));
/// ```
pub fn find_tfbs<'a, M: MotifMatrix + ?Sized>(
    background: &Background,
    pwm: &M,
    sequence: &'a [u8],
    threshold: f64,
) -> Result<TfbsIter<'a>> {
    let scanner = LookaheadScanner::new(background, pwm)?;
    TfbsIter::new(Cow::Owned(scanner), sequence, threshold)
}

/// Collects every binding site of `pwm` in `sequence`, in ascending order.
pub fn find_tfbs_all<M: MotifMatrix + ?Sized>(
    background: &Background,
    pwm: &M,
    sequence: &[u8],
    threshold: f64,
) -> Result<Vec<usize>> {
    Ok(find_tfbs(background, pwm, sequence, threshold)?.collect())
}

/// Like [`find_tfbs_all`], but checks `token` before every start position.
///
/// # Errors
/// * `MotifError::Cancelled` once the token has been cancelled
pub fn find_tfbs_cancellable<M: MotifMatrix + ?Sized>(
    background: &Background,
    pwm: &M,
    sequence: &[u8],
    threshold: f64,
    token: &CancellationToken,
) -> Result<Vec<usize>> {
    let scanner = LookaheadScanner::new(background, pwm)?;
    let n = scanner.width();
    if sequence.len() < n {
        return Ok(Vec::new());
    }
    alphabet::validate(sequence)?;

    let mut positions = Vec::new();
    for (start, window) in sequence.windows(n).enumerate() {
        if token.is_cancelled() {
            log::debug!("Scan cancelled at position {}", start);
            return Err(MotifError::Cancelled);
        }
        if scanner.scan_window(window, threshold).is_match(threshold) {
            positions.push(start);
        }
    }
    Ok(positions)
}

/// Finds binding sites by scoring every window in full, without pruning.
///
/// Returns the same positions as [`find_tfbs_all`] for any input.
pub fn find_tfbs_naive<M: MotifMatrix + ?Sized>(
    background: &Background,
    pwm: &M,
    sequence: &[u8],
    threshold: f64,
) -> Result<Vec<usize>> {
    let scanner = LookaheadScanner::new(background, pwm)?;
    let n = scanner.width();
    if sequence.len() < n {
        return Ok(Vec::new());
    }
    alphabet::validate(sequence)?;

    Ok(sequence
        .windows(n)
        .enumerate()
        .filter(|(_, window)| scanner.score_window(window) >= threshold)
        .map(|(start, _)| start)
        .collect())
}

/// Highest full-window score of `pwm` anywhere in `sequence`.
///
/// Each window is pruned against the best score seen so far. Returns
/// negative infinity when the sequence is shorter than the motif.
pub fn max_match_score<M: MotifMatrix + ?Sized>(
    background: &Background,
    pwm: &M,
    sequence: &[u8],
) -> Result<f64> {
    let scanner = LookaheadScanner::new(background, pwm)?;
    let n = scanner.width();
    if sequence.len() < n {
        return Ok(f64::NEG_INFINITY);
    }
    alphabet::validate(sequence)?;

    let mut best = f64::NEG_INFINITY;
    for window in sequence.windows(n) {
        if let Some(score) = scanner.scan_window(window, best).score() {
            if score > best {
                best = score;
            }
        }
    }
    Ok(best)
}

/// Full log-likelihood-ratio score of the window starting at `start`.
pub fn score_window<M: MotifMatrix + ?Sized>(
    background: &Background,
    pwm: &M,
    sequence: &[u8],
    start: usize,
) -> Result<f64> {
    LookaheadScanner::new(background, pwm)?.score_at(sequence, start)
}
