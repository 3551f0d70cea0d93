use crate::error::{MotifError, Result};
use ndarray::{s, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Nucleotide column order shared by every matrix in the crate.
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Pseudocount substituted for a stored frequency of exactly zero.
pub const PSEUDOCOUNT: f64 = 0.0001;

/// Capability set the scan core needs from a motif representation.
pub trait MotifMatrix {
    /// Motif width (number of rows).
    fn width(&self) -> usize;

    /// Stored frequency of `base` (0..4, A/C/G/T) at motif position `pos`.
    fn freq(&self, pos: usize, base: usize) -> f64;
}

/// Genome-wide nucleotide frequencies (A, C, G, T) used as the null model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Background {
    freqs: [f64; 4],
}

impl Background {
    /// Builds a background from A, C, G, T frequencies.
    ///
    /// Frequencies must be positive and finite; they are not required to sum to 1.
    pub fn new(a: f64, c: f64, g: f64, t: f64) -> Result<Self> {
        let freqs = [a, c, g, t];
        for (base, f) in BASES.iter().zip(freqs) {
            if !f.is_finite() || f <= 0.0 {
                return Err(MotifError::InvalidBackground(format!(
                    "frequency of {} must be positive, got {}",
                    *base as char, f
                )));
            }
        }
        Ok(Self { freqs })
    }

    pub fn uniform() -> Self {
        Self { freqs: [0.25; 4] }
    }

    /// Estimates a background from the A/C/G/T composition of a sequence.
    ///
    /// Every count starts at one so no frequency is ever zero. Ambiguity codes
    /// are ignored.
    pub fn from_sequence(sequence: &[u8]) -> Self {
        let mut counts = [1.0f64; 4];
        for &b in sequence {
            match b.to_ascii_uppercase() {
                b'A' => counts[0] += 1.0,
                b'C' => counts[1] += 1.0,
                b'G' => counts[2] += 1.0,
                b'T' => counts[3] += 1.0,
                _ => {}
            }
        }
        let total: f64 = counts.iter().sum();
        Self {
            freqs: counts.map(|c| c / total),
        }
    }

    #[inline]
    pub fn freq(&self, base: usize) -> f64 {
        self.freqs[base]
    }

    pub fn freqs(&self) -> &[f64; 4] {
        &self.freqs
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Represents a Position Weight Matrix (PWM)
/// Stored as an (n x 4) matrix with columns A, C, G, T
#[derive(Debug, Clone, PartialEq)]
pub struct Pwm {
    matrix: Array2<f64>,
}

impl Pwm {
    /// Wraps a frequency matrix, checking its shape and entries.
    ///
    /// # Errors
    /// * `MotifError::InvalidPwm` if the matrix has no rows, does not have exactly
    ///   four columns, or holds a negative or non-finite entry
    pub fn new(matrix: Array2<f64>) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows == 0 {
            return Err(MotifError::invalid_pwm("PWM must have at least one row"));
        }
        if cols != 4 {
            return Err(MotifError::invalid_pwm(format!(
                "PWM must have 4 columns (A, C, G, T), got {}",
                cols
            )));
        }
        if let Some(((pos, base), f)) = matrix
            .indexed_iter()
            .find(|(_, f)| !f.is_finite() || **f < 0.0)
        {
            return Err(MotifError::invalid_pwm(format!(
                "invalid frequency {} for {} at position {}",
                f, BASES[base] as char, pos
            )));
        }
        Ok(Self { matrix })
    }

    pub fn from_rows(rows: &[[f64; 4]]) -> Result<Self> {
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let matrix = Array2::from_shape_vec((rows.len(), 4), flat)
            .map_err(|e| MotifError::invalid_pwm(e.to_string()))?;
        Self::new(matrix)
    }

    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }

    pub fn row(&self, pos: usize) -> ArrayView1<'_, f64> {
        self.matrix.row(pos)
    }

    /// Returns the PWM of the opposite strand: rows reversed, A<->T and C<->G swapped.
    ///
    /// With columns ordered A, C, G, T the base swap is a column reversal.
    pub fn reverse_complement(&self) -> Pwm {
        Pwm {
            matrix: self.matrix.slice(s![..;-1, ..;-1]).to_owned(),
        }
    }

    /// Most frequent base per position; ties resolve to the first column.
    pub fn consensus(&self) -> String {
        self.matrix
            .rows()
            .into_iter()
            .map(|row| {
                let best = (1..4).fold(0, |best, b| if row[b] > row[best] { b } else { best });
                BASES[best] as char
            })
            .collect()
    }
}

impl MotifMatrix for Pwm {
    #[inline]
    fn width(&self) -> usize {
        self.matrix.nrows()
    }

    #[inline]
    fn freq(&self, pos: usize, base: usize) -> f64 {
        self.matrix[[pos, base]]
    }
}

impl MotifMatrix for [[f64; 4]] {
    #[inline]
    fn width(&self) -> usize {
        self.len()
    }

    #[inline]
    fn freq(&self, pos: usize, base: usize) -> f64 {
        self[pos][base]
    }
}

/// Collection of PWMs indexed by motif ID
pub type PwmCollection = HashMap<String, Pwm>;
