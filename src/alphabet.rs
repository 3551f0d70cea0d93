//! DNA/IUPAC alphabet accepted by the scanners.

use crate::error::{MotifError, Result};
use phf::phf_map;

/// The 15 accepted symbols. A symbol's index here is its symbol code.
pub const SYMBOLS: [u8; 15] = *b"ACGTNVHDBMKWSYR";

/// Number of distinct symbol codes.
pub const SYMBOL_COUNT: usize = SYMBOLS.len();

/// Marker for bytes outside the alphabet in [`SYMBOL_CODES`].
pub const INVALID_CODE: u8 = u8::MAX;

/// Bases represented by each symbol, as a bit mask over A/C/G/T (bit 0 = A).
pub static IUPAC: phf::Map<u8, u8> = phf_map! {
    b'A' => 0b0001,
    b'C' => 0b0010,
    b'G' => 0b0100,
    b'T' => 0b1000,
    b'N' => 0b1111,
    b'V' => 0b0111,
    b'H' => 0b1011,
    b'D' => 0b1101,
    b'B' => 0b1110,
    b'M' => 0b0011,
    b'K' => 0b1100,
    b'W' => 0b1001,
    b'S' => 0b0110,
    b'Y' => 0b1010,
    b'R' => 0b0101,
};

/// Bases (0..4) represented by `symbol`, or `None` outside the alphabet.
pub fn bases_of(symbol: u8) -> Option<impl Iterator<Item = usize>> {
    IUPAC
        .get(&symbol)
        .map(|&mask| (0..4usize).filter(move |b| mask & (1u8 << *b) != 0))
}

/// Byte -> symbol code lookup for the scan loop.
pub static SYMBOL_CODES: [u8; 256] = build_symbol_codes();

const fn build_symbol_codes() -> [u8; 256] {
    let mut table = [INVALID_CODE; 256];
    let mut i = 0;
    while i < SYMBOLS.len() {
        table[SYMBOLS[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Checks that every byte of `sequence` is one of the 15 accepted symbols.
///
/// # Errors
/// * `MotifError::InvalidSymbol` naming the first offending position
pub fn validate(sequence: &[u8]) -> Result<()> {
    match sequence
        .iter()
        .position(|&b| SYMBOL_CODES[b as usize] == INVALID_CODE)
    {
        Some(position) => Err(MotifError::invalid_symbol(position, sequence[position])),
        None => Ok(()),
    }
}

/// Complement of a symbol, ambiguity codes included.
pub fn complement(symbol: u8) -> Option<u8> {
    let c = match symbol {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'N' => b'N',
        b'V' => b'B',
        b'B' => b'V',
        b'H' => b'D',
        b'D' => b'H',
        b'M' => b'K',
        b'K' => b'M',
        b'W' => b'W',
        b'S' => b'S',
        b'Y' => b'R',
        b'R' => b'Y',
        _ => return None,
    };
    Some(c)
}
