//! Fast transcription factor binding site search with look-ahead pruning, and
//! spacing analysis between the sites of two motifs

pub mod alphabet;
pub mod error;
pub mod fasta;
pub mod lookahead;
pub mod meme;
pub mod pvalue;
pub mod search;
pub mod spacing;
pub mod types;
