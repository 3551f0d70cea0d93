use crate::alphabet;
use crate::error::{MotifError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Reads sequences from a FASTA format file and converts them into a Polars DataFrame.
///
/// # Arguments
/// * `filename` - Path to the FASTA file to read
///
/// # Returns
/// * `Result<DataFrame>` - A DataFrame with two columns:
///   - "label": The sequence identifiers (without '>' prefix)
///   - "sequence": The corresponding DNA sequences in uppercase
///
/// # Errors
/// * Returns `MotifError::InvalidFileFormat` if no sequences are found
/// * Returns `MotifError::DataError` if DataFrame creation fails
/// * Returns `MotifError::Io` for file reading issues
pub fn read_fasta(filename: impl AsRef<Path>) -> Result<DataFrame> {
    let mut sequences: Vec<(String, String)> = Vec::new();
    let file = File::open(filename)?;
    let reader = BufReader::new(file);

    let mut current_header = String::new();
    let mut current_sequence = String::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if let Some(header) = line.strip_prefix('>') {
            if !current_header.is_empty() {
                sequences.push((current_header, current_sequence.to_uppercase()));
                current_sequence.clear();
            }
            current_header = header.trim().to_string();
        } else if !line.is_empty() {
            current_sequence.push_str(line);
        }
    }

    if !current_header.is_empty() {
        sequences.push((current_header, current_sequence.to_uppercase()));
    }

    if sequences.is_empty() {
        return Err(MotifError::InvalidFileFormat("No sequences found".into()));
    }

    let (labels, sequences): (Vec<String>, Vec<String>) = sequences.into_iter().unzip();
    let df = DataFrame::new(vec![
        Column::new("label".into(), labels),
        Column::new("sequence".into(), sequences),
    ])
    .map_err(|e| MotifError::DataError(e.to_string()))?;

    Ok(df)
}

fn string_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    df.column(name)
        .and_then(|c| c.str())
        .map_err(|e| MotifError::DataError(e.to_string()))
}

/// Writes sequences from a Polars DataFrame to a FASTA format file.
///
/// # Errors
/// * Returns `MotifError::DataError` if required columns are missing
/// * Returns `MotifError::Io` for file writing issues
pub fn write_fasta(df: &DataFrame, filename: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(filename)?;
    for (label, sequence) in records(df)? {
        writeln!(file, ">{}", label)?;
        writeln!(file, "{}", sequence)?;
    }
    Ok(())
}

/// Extracts (label, sequence) pairs from a DataFrame produced by [`read_fasta`].
///
/// Rows with a null label or sequence are skipped.
pub fn records(df: &DataFrame) -> Result<Vec<(String, String)>> {
    let labels = string_column(df, "label")?;
    let sequences = string_column(df, "sequence")?;

    Ok(labels
        .into_iter()
        .zip(sequences)
        .filter_map(|(label, sequence)| Some((label?.to_string(), sequence?.to_string())))
        .collect())
}

/// Returns `sequence[start..end]` of the record named `label` (0-based, half-open).
///
/// # Errors
/// * Returns `MotifError::InvalidParameter` if no record has that label, or the
///   range does not fit inside the sequence or splits a non-ASCII character
pub fn fetch_subsequence(df: &DataFrame, label: &str, start: usize, end: usize) -> Result<String> {
    let labels = string_column(df, "label")?;
    let sequences = string_column(df, "sequence")?;

    let sequence = labels
        .into_iter()
        .zip(sequences)
        .find_map(|(l, s)| if l == Some(label) { s } else { None })
        .ok_or_else(|| MotifError::invalid_parameter("label", label, "no such sequence"))?;

    sequence
        .get(start..end)
        .map(str::to_string)
        .ok_or_else(|| {
            MotifError::invalid_parameter(
                "range",
                format!("{}-{}", start, end),
                format!("must lie within 0-{} on character boundaries", sequence.len()),
            )
        })
}

/// Generates the reverse complement of a DNA sequence.
///
/// # Arguments
/// * `sequence` - Input DNA sequence string, IUPAC ambiguity codes allowed
///
/// # Returns
/// * `Result<String>` - The reverse complement sequence where:
///   - A ↔ T
///   - C ↔ G
///   - ambiguity codes map to the code of the complementary base set
///
/// # Errors
/// * Returns `MotifError::InvalidSymbol` for characters outside the DNA/IUPAC alphabet
pub fn reverse_complement(sequence: &str) -> Result<String> {
    let bytes = sequence.as_bytes();
    bytes
        .iter()
        .enumerate()
        .rev()
        .map(|(i, &b)| {
            alphabet::complement(b)
                .map(char::from)
                .ok_or_else(|| MotifError::invalid_symbol(i, b))
        })
        .collect()
}
