use crate::error::{MotifError, Result};
use crate::types::{Background, Pwm, PwmCollection};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::iter::Peekable;
use std::path::Path;

/// Advances the iterator until a MOTIF line is found
fn skip_until_motif<I>(lines: &mut Peekable<I>)
where
    I: Iterator<Item = std::io::Result<String>>,
{
    while let Some(Ok(line)) = lines.peek() {
        if line.starts_with("MOTIF") {
            break;
        }
        lines.next();
    }
}

/// A matrix row: only numbers, at least one of them
fn parse_row(line: &str) -> Option<Vec<f64>> {
    let values: Vec<f64> = line
        .split_whitespace()
        .map(|s| s.parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    (!values.is_empty()).then_some(values)
}

/// Parses a single PWM from the iterator, leaving the line after it unread
fn parse_pwm<I>(lines: &mut Peekable<I>) -> Result<Option<(String, Pwm)>>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    // Get motif ID from MOTIF line
    let motif_line = match lines.next() {
        Some(Ok(line)) if line.starts_with("MOTIF") => line,
        Some(Err(e)) => return Err(MotifError::Io(e)),
        _ => return Ok(None),
    };

    let motif_id = motif_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| MotifError::InvalidFileFormat("Missing motif ID".into()))?
        .to_string();

    // Skip blank and header lines up to the first matrix row
    while let Some(Ok(line)) = lines.peek() {
        if line.starts_with("MOTIF") || parse_row(line).is_some() {
            break;
        }
        lines.next();
    }

    let mut rows: Vec<[f64; 4]> = Vec::new();
    while let Some(Ok(line)) = lines.peek() {
        let Some(values) = parse_row(line) else {
            break;
        };
        if values.len() != 4 {
            return Err(MotifError::InvalidFileFormat(format!(
                "Motif {}: expected 4 values per row, got {}",
                motif_id,
                values.len()
            )));
        }
        rows.push([values[0], values[1], values[2], values[3]]);
        lines.next();
    }
    if let Some(Err(_)) = lines.peek() {
        if let Some(Err(e)) = lines.next() {
            return Err(MotifError::Io(e));
        }
    }

    if rows.is_empty() {
        return Err(MotifError::InvalidFileFormat(format!(
            "Empty PWM for motif {}",
            motif_id
        )));
    }

    Ok(Some((motif_id, Pwm::from_rows(&rows)?)))
}

/// Reads Position Weight Matrices (PWMs) from a MEME format file
///
/// Each PWM is preceded by a "MOTIF" line carrying the motif ID, followed by a
/// "letter-probability matrix" header and one row of A, C, G, T frequencies
/// per motif position.
///
/// # Arguments
/// * `filename` - Path to the MEME format file to read
///
/// # Returns
/// * `Result<PwmCollection>` - A HashMap where keys are motif IDs and values are their corresponding PWMs
///
/// # Errors
/// * `MotifError::Io` - If the file cannot be opened or read
/// * `MotifError::InvalidFileFormat` - If the file format is invalid or no PWMs are found
/// * `MotifError::InvalidPwm` - If a matrix holds negative or non-finite values
///
/// # Example
/// ```ignore
/// use tfbs_lookahead::meme::read_pwm_files;
///
/// let pwms = read_pwm_files("path/to/motifs.meme").unwrap();
/// for (motif_id, pwm) in pwms {
///     println!("Found motif: {} ({} bp)", motif_id, pwm.len());
/// }
/// ```
pub fn read_pwm_files(filename: impl AsRef<Path>) -> Result<PwmCollection> {
    let file = File::open(filename)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines().peekable();
    let mut pwms = HashMap::new();

    // Skip header until first MOTIF
    skip_until_motif(&mut lines);

    // Parse all PWMs
    while let Some((id, pwm)) = parse_pwm(&mut lines)? {
        pwms.insert(id, pwm);
        skip_until_motif(&mut lines);
    }

    if pwms.is_empty() {
        return Err(MotifError::InvalidFileFormat("No PWMs found".into()));
    }

    Ok(pwms)
}

/// Reads the "Background letter frequencies" section of a MEME file.
///
/// The frequencies are taken from the line following the section header, in
/// the form `A 0.3 C 0.2 G 0.2 T 0.3`. Files without the section yield a
/// uniform background.
///
/// # Errors
/// * `MotifError::Io` - If the file cannot be opened or read
/// * `MotifError::InvalidFileFormat` - If the frequency line is malformed
/// * `MotifError::InvalidBackground` - If a frequency is not positive
pub fn read_background(filename: impl AsRef<Path>) -> Result<Background> {
    let file = File::open(filename)?;
    let mut lines = BufReader::new(file).lines();

    while let Some(line) = lines.next() {
        if !line?.starts_with("Background letter frequencies") {
            continue;
        }
        let freq_line = lines
            .next()
            .transpose()?
            .ok_or_else(|| MotifError::InvalidFileFormat("Missing background frequencies".into()))?;
        return parse_background(&freq_line);
    }

    Ok(Background::uniform())
}

fn parse_background(line: &str) -> Result<Background> {
    let mut freqs = [None; 4];
    let mut tokens = line.split_whitespace();
    while let (Some(letter), Some(value)) = (tokens.next(), tokens.next()) {
        let idx = match letter {
            "A" => 0,
            "C" => 1,
            "G" => 2,
            "T" => 3,
            other => {
                return Err(MotifError::InvalidFileFormat(format!(
                    "Unexpected background letter: {}",
                    other
                )))
            }
        };
        let value = value.parse::<f64>().map_err(|e| {
            MotifError::InvalidFileFormat(format!("Invalid background value: {}", e))
        })?;
        freqs[idx] = Some(value);
    }

    match freqs {
        [Some(a), Some(c), Some(g), Some(t)] => Background::new(a, c, g, t),
        _ => Err(MotifError::InvalidFileFormat(format!(
            "Incomplete background frequencies: {}",
            line
        ))),
    }
}
