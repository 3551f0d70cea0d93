//! Co-occurrence of two motifs at fixed relative offsets.

use crate::error::{MotifError, Result};
use crate::pvalue::pvalue_to_score;
use crate::search::find_tfbs;
use crate::types::{Background, Pwm};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Binomial, DiscreteCDF};
use std::collections::BTreeSet;

/// Number of ranked bins kept in a [`SpacingReport`].
pub const TOP_BINS: usize = 10;

/// Relative strand of the two motifs in a bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// forward/forward plus reverse/reverse
    Same,
    /// forward/reverse plus reverse/forward
    Opposite,
}

/// Overlap count of one orientation at one bin center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpacingBin {
    pub orientation: Orientation,
    pub offset: i64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacingReport {
    /// Highest-count bins, count descending.
    pub bins: Vec<SpacingBin>,
    /// Motif 1 sites on both strands.
    pub motif1_count: usize,
    /// Motif 2 sites on both strands.
    pub motif2_count: usize,
    pub sequence_length: usize,
    pub bin_width: usize,
}

impl SpacingReport {
    /// Binomial upper-tail probability of a bin's count.
    ///
    /// Each motif 1 site is a trial whose window of `2w + 1` positions holds a
    /// motif 2 site with probability `1 - (1 - m2 / L)^(2w + 1)`.
    pub fn bin_pvalue(&self, bin: &SpacingBin) -> Result<f64> {
        if bin.count == 0 || self.sequence_length == 0 {
            return Ok(1.0);
        }
        let density = (self.motif2_count as f64 / self.sequence_length as f64).min(1.0);
        let window = (2 * self.bin_width + 1) as i32;
        let q = 1.0 - (1.0 - density).powi(window);
        let binomial = Binomial::new(q, self.motif1_count as u64)
            .map_err(|e| MotifError::invalid_parameter("window probability", q, e.to_string()))?;
        Ok(binomial.sf(bin.count as u64 - 1))
    }
}

/// Spacing analysis settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacingParams {
    pub p_value: f64,
    /// Half-width `w` of each bin; bins are `2w + 1` positions wide.
    pub bin_width: usize,
    /// Largest absolute offset examined.
    pub bin_bound: usize,
}

impl Default for SpacingParams {
    fn default() -> Self {
        Self {
            p_value: 0.0001,
            bin_width: 2,
            bin_bound: 100,
        }
    }
}

impl SpacingParams {
    pub fn analyze(
        &self,
        pwm1: &Pwm,
        pwm2: &Pwm,
        background: &Background,
        sequence: &[u8],
    ) -> Result<SpacingReport> {
        spacing_constraint(
            pwm1,
            pwm2,
            background,
            self.p_value,
            self.bin_width,
            self.bin_bound,
            sequence,
        )
    }
}

/// Forward and reverse-strand sites of one motif.
///
/// Reverse sites are reported at their 3' end, i.e. shifted by `n - 1`.
fn strand_sites(
    pwm: &Pwm,
    background: &Background,
    sequence: &[u8],
    threshold: f64,
) -> Result<(Vec<i64>, Vec<i64>)> {
    let shift = pwm.len() as i64 - 1;
    let forward = find_tfbs(background, pwm, sequence, threshold)?
        .map(|p| p as i64)
        .collect();
    let reverse = find_tfbs(background, &pwm.reverse_complement(), sequence, threshold)?
        .map(|p| p as i64 + shift)
        .collect();
    Ok((forward, reverse))
}

/// Number of sites `x` in `sites` with a `targets` entry in `[x+offset-w, x+offset+w]`.
fn overlap_count(sites: &[i64], targets: &BTreeSet<i64>, offset: i64, w: i64) -> usize {
    sites
        .iter()
        .filter(|&&x| {
            let center = x.saturating_add(offset);
            targets
                .range(center.saturating_sub(w)..=center.saturating_add(w))
                .next()
                .is_some()
        })
        .count()
}

/// Symmetric bin centers `2w + 1` apart covering `[-bound, bound]`.
///
/// # Errors
/// * `MotifError::InvalidParameter` if the width or bound does not fit in an `i64`
fn bin_offsets(bin_width: usize, bin_bound: usize) -> Result<Vec<i64>> {
    let step = i64::try_from(bin_width)
        .ok()
        .and_then(|w| w.checked_mul(2))
        .and_then(|w| w.checked_add(1))
        .ok_or_else(|| MotifError::invalid_parameter("bin width", bin_width, "too large"))?;
    let bound = i64::try_from(bin_bound)
        .map_err(|_| MotifError::invalid_parameter("bin bound", bin_bound, "too large"))?;

    let half: Vec<i64> = (0..=bound).step_by(step as usize).collect();
    Ok(half
        .iter()
        .rev()
        .filter(|&&o| o != 0)
        .map(|&o| -o)
        .chain(half.iter().copied())
        .collect())
}

/// Ranks relative offsets at which sites of two motifs co-occur.
///
/// Both motifs are scanned on both strands at the threshold derived from
/// `p_value`. For every bin center `i` and every strand pairing, a motif 1 site
/// `x` counts once if any motif 2 site lies within `bin_width` of `x + i`.
/// Forward/forward at `i` is pooled with reverse/reverse at `-i` (same
/// orientation), and forward/reverse at `i` with reverse/forward at `-i`
/// (opposite orientation).
///
/// # Returns
/// * `Result<SpacingReport>` - The top [`TOP_BINS`] bins by count plus the site
///   counts and sequence length needed for significance
///
/// # Errors
/// * `MotifError::InvalidParameter` for a p-value outside (0, 1], or a bin width
///   or bound too large for signed offsets
/// * `MotifError::InvalidSymbol` for a symbol outside the DNA/IUPAC alphabet
pub fn spacing_constraint(
    pwm1: &Pwm,
    pwm2: &Pwm,
    background: &Background,
    p_value: f64,
    bin_width: usize,
    bin_bound: usize,
    sequence: &[u8],
) -> Result<SpacingReport> {
    let offsets = bin_offsets(bin_width, bin_bound)?;
    let threshold1 = pvalue_to_score(p_value, background, pwm1)?;
    let threshold2 = pvalue_to_score(p_value, background, pwm2)?;

    let (forward1, reverse1) = strand_sites(pwm1, background, sequence, threshold1)?;
    let (forward2, reverse2) = strand_sites(pwm2, background, sequence, threshold2)?;
    log::debug!(
        "Motif 1: {} forward, {} reverse sites (threshold {:.3}); motif 2: {} forward, {} reverse sites (threshold {:.3})",
        forward1.len(),
        reverse1.len(),
        threshold1,
        forward2.len(),
        reverse2.len(),
        threshold2
    );
    let motif2_count = forward2.len() + reverse2.len();
    let forward2: BTreeSet<i64> = forward2.into_iter().collect();
    let reverse2: BTreeSet<i64> = reverse2.into_iter().collect();

    let w = bin_width as i64;
    let count_all = |sites: &[i64], targets: &BTreeSet<i64>| -> Vec<usize> {
        offsets
            .iter()
            .map(|&i| overlap_count(sites, targets, i, w))
            .collect()
    };
    let ff = count_all(&forward1, &forward2);
    let rr = count_all(&reverse1, &reverse2);
    let fr = count_all(&forward1, &reverse2);
    let rf = count_all(&reverse1, &forward2);

    let last = offsets.len() - 1;
    let same = offsets.iter().enumerate().map(|(j, &offset)| SpacingBin {
        orientation: Orientation::Same,
        offset,
        count: ff[j] + rr[last - j],
    });
    let opposite = offsets.iter().enumerate().map(|(j, &offset)| SpacingBin {
        orientation: Orientation::Opposite,
        offset,
        count: fr[j] + rf[last - j],
    });
    let mut bins: Vec<SpacingBin> = same.chain(opposite).collect();
    bins.sort_by(|a, b| b.count.cmp(&a.count));
    bins.truncate(TOP_BINS);

    Ok(SpacingReport {
        bins,
        motif1_count: forward1.len() + reverse1.len(),
        motif2_count,
        sequence_length: sequence.len(),
        bin_width,
    })
}
