use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tfbs_lookahead::error::MotifError;
use tfbs_lookahead::fasta::{fetch_subsequence, read_fasta, records};
use tfbs_lookahead::lookahead::LookaheadScanner;
use tfbs_lookahead::meme::{read_background, read_pwm_files};
use tfbs_lookahead::pvalue::Threshold;
use tfbs_lookahead::search::max_match_score;
use tfbs_lookahead::spacing::SpacingParams;
use tfbs_lookahead::types::{Pwm, PwmCollection};

#[derive(thiserror::Error, Debug)]
pub enum ScannerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Motif(#[from] MotifError),

    #[error("Invalid region '{0}', expected LABEL:START-END")]
    InvalidRegion(String),

    #[error("Unsupported output format for '{0}', use .csv or .parquet")]
    UnsupportedOutput(String),
}

#[derive(Parser)]
#[command(
    name = "tfbs-scanner",
    about = "Finds transcription factor binding sites with look-ahead pruning and analyzes motif spacing",
    version,
    after_help = "Example usage:\n    \
                  tfbs-scanner scan genome.fa motifs.meme hits.parquet --pvalue 0.0001 --both-strands\n    \
                  tfbs-scanner max-score promoters.fa motifs.meme\n    \
                  tfbs-scanner spacing promoters.fa motifs.meme --motif1 SOX2 --motif2 POU5F1",
    color = clap::ColorChoice::Always
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbosity: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Report every binding site scoring above the threshold
    Scan(ScanArgs),
    /// Report the best achievable window score per sequence and motif
    MaxScore(MaxScoreArgs),
    /// Rank relative offsets at which two motifs co-occur
    Spacing(SpacingArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Path to input sequences (FASTA format)
    #[arg(value_name = "FASTA_FILE")]
    fasta_file: String,

    /// Path to .meme format file containing Position Weight Matrices (PWMs)
    /// for the motifs to be scanned
    #[arg(value_name = "PWM_FILE")]
    pwm_file: String,

    /// Path for output file (supports .csv or .parquet format)
    /// Will create output directory if it doesn't exist
    #[arg(value_name = "OUTPUT_FILE")]
    output_file: String,

    /// Log-likelihood-ratio score threshold; overrides --pvalue
    #[arg(long, conflicts_with = "pvalue")]
    threshold: Option<f64>,

    /// P-value converted to a score threshold for each motif
    #[arg(long, default_value = "0.0001")]
    pvalue: f64,

    /// Only scan the motif with this ID
    #[arg(long)]
    motif: Option<String>,

    /// Also scan the reverse strand; reverse hits are reported at their 3' end
    #[arg(long)]
    both_strands: bool,

    /// Restrict the scan to LABEL:START-END (0-based, half-open)
    #[arg(long)]
    region: Option<Region>,
}

#[derive(Args, Debug)]
struct MaxScoreArgs {
    /// Path to input sequences (FASTA format)
    #[arg(value_name = "FASTA_FILE")]
    fasta_file: String,

    /// Path to .meme format file containing PWMs
    #[arg(value_name = "PWM_FILE")]
    pwm_file: String,

    /// Only score the motif with this ID
    #[arg(long)]
    motif: Option<String>,
}

#[derive(Args, Debug)]
struct SpacingArgs {
    /// Path to input sequences (FASTA format)
    #[arg(value_name = "FASTA_FILE")]
    fasta_file: String,

    /// Path to .meme format file containing both PWMs
    #[arg(value_name = "PWM_FILE")]
    pwm_file: String,

    /// ID of the anchor motif
    #[arg(long)]
    motif1: String,

    /// ID of the partner motif
    #[arg(long)]
    motif2: String,

    /// P-value converted to a score threshold for each motif
    #[arg(long, default_value = "0.0001")]
    pvalue: f64,

    /// Half-width of each offset bin
    #[arg(long, default_value = "2")]
    bin_width: usize,

    /// Largest absolute offset examined
    #[arg(long, default_value = "100")]
    bin_bound: usize,
}

#[derive(Debug, Clone)]
struct Region {
    label: String,
    start: usize,
    end: usize,
}

impl FromStr for Region {
    type Err = ScannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScannerError::InvalidRegion(s.to_string());
        let (label, range) = s.rsplit_once(':').ok_or_else(invalid)?;
        let (start, end) = range.split_once('-').ok_or_else(invalid)?;
        Ok(Region {
            label: label.to_string(),
            start: start.parse().map_err(|_| invalid())?,
            end: end.parse().map_err(|_| invalid())?,
        })
    }
}

fn init_verbose(cli: &Cli) {
    let filter_level: LevelFilter = match cli.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

/// Motifs sorted by ID, optionally narrowed to one
fn select_motifs(
    pwms: &PwmCollection,
    motif: Option<&str>,
) -> Result<Vec<(String, Pwm)>, ScannerError> {
    let mut selected: Vec<(String, Pwm)> = match motif {
        Some(id) => {
            let pwm = pwms
                .get(id)
                .ok_or_else(|| MotifError::MotifNotFound(id.to_string()))?;
            vec![(id.to_string(), pwm.clone())]
        }
        None => pwms.iter().map(|(id, pwm)| (id.clone(), pwm.clone())).collect(),
    };
    selected.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(selected)
}

fn write_table(df: &mut DataFrame, output_file: &str) -> Result<(), ScannerError> {
    if let Some(parent) = Path::new(output_file).parent() {
        fs::create_dir_all(parent)?;
    }
    match Path::new(output_file).extension().and_then(|e| e.to_str()) {
        Some("csv") => {
            let mut file = File::create(output_file)?;
            CsvWriter::new(&mut file).finish(df)?;
        }
        Some("parquet") => {
            let file = File::create(output_file)?;
            ParquetWriter::new(file).finish(df)?;
        }
        _ => return Err(ScannerError::UnsupportedOutput(output_file.to_string())),
    }
    Ok(())
}

fn scan(args: ScanArgs) -> Result<(), ScannerError> {
    let df = read_fasta(&args.fasta_file)?;
    let background = read_background(&args.pwm_file)?;
    let pwms = select_motifs(&read_pwm_files(&args.pwm_file)?, args.motif.as_deref())?;
    let threshold = match args.threshold {
        Some(score) => Threshold::Score(score),
        None => Threshold::PValue(args.pvalue),
    };

    let (sequences, coordinate_offset) = match &args.region {
        Some(region) => {
            let sequence = fetch_subsequence(&df, &region.label, region.start, region.end)?;
            (vec![(region.label.clone(), sequence)], region.start)
        }
        None => (records(&df)?, 0),
    };
    log::info!(
        "{} sequences to scan with {} motifs",
        sequences.len(),
        pwms.len()
    );

    let mut labels: Vec<String> = Vec::new();
    let mut motifs: Vec<String> = Vec::new();
    let mut positions: Vec<u64> = Vec::new();
    let mut strands: Vec<&str> = Vec::new();
    let mut scores: Vec<f64> = Vec::new();

    for (motif_id, pwm) in &pwms {
        let cutoff = threshold.resolve(&background, pwm)?;
        log::info!("Scanning {} ({} bp) at score {:.3}", motif_id, pwm.len(), cutoff);

        let forward = LookaheadScanner::new(&background, pwm)?;
        let reverse = if args.both_strands {
            Some(LookaheadScanner::new(&background, &pwm.reverse_complement())?)
        } else {
            None
        };
        let shift = pwm.len() - 1;

        for (label, sequence) in &sequences {
            let before = labels.len();
            let sequence = sequence.as_bytes();
            for pos in forward.matches(sequence, cutoff)? {
                labels.push(label.clone());
                motifs.push(motif_id.clone());
                positions.push((coordinate_offset + pos) as u64);
                strands.push("+");
                scores.push(forward.score_at(sequence, pos)?);
            }
            if let Some(reverse) = &reverse {
                for pos in reverse.matches(sequence, cutoff)? {
                    labels.push(label.clone());
                    motifs.push(motif_id.clone());
                    positions.push((coordinate_offset + pos + shift) as u64);
                    strands.push("-");
                    scores.push(reverse.score_at(sequence, pos)?);
                }
            }
            log::info!(
                "{}: {} sites of {} in {} bp",
                label,
                labels.len() - before,
                motif_id,
                sequence.len()
            );
        }
    }
    log::info!("{} binding sites found", labels.len());

    let mut out = DataFrame::new(vec![
        Column::new("label".into(), labels),
        Column::new("motif".into(), motifs),
        Column::new("position".into(), positions),
        Column::new("strand".into(), strands),
        Column::new("score".into(), scores),
    ])?;
    write_table(&mut out, &args.output_file)
}

fn max_score(args: MaxScoreArgs) -> Result<(), ScannerError> {
    let df = read_fasta(&args.fasta_file)?;
    let background = read_background(&args.pwm_file)?;
    let pwms = select_motifs(&read_pwm_files(&args.pwm_file)?, args.motif.as_deref())?;

    println!("label\tmotif\tmax_score");
    for (label, sequence) in records(&df)? {
        for (motif_id, pwm) in &pwms {
            let best = max_match_score(&background, pwm, sequence.as_bytes())?;
            println!("{}\t{}\t{:.4}", label, motif_id, best);
        }
    }
    Ok(())
}

fn spacing(args: SpacingArgs) -> Result<(), ScannerError> {
    let df = read_fasta(&args.fasta_file)?;
    let background = read_background(&args.pwm_file)?;
    let pwms = read_pwm_files(&args.pwm_file)?;
    let pwm1 = pwms
        .get(&args.motif1)
        .ok_or_else(|| MotifError::MotifNotFound(args.motif1.clone()))?;
    let pwm2 = pwms
        .get(&args.motif2)
        .ok_or_else(|| MotifError::MotifNotFound(args.motif2.clone()))?;
    let params = SpacingParams {
        p_value: args.pvalue,
        bin_width: args.bin_width,
        bin_bound: args.bin_bound,
    };

    for (label, sequence) in records(&df)? {
        let report = params.analyze(pwm1, pwm2, &background, sequence.as_bytes())?;
        println!(
            "# {}: {} {} sites, {} {} sites, length {}",
            label,
            args.motif1,
            report.motif1_count,
            args.motif2,
            report.motif2_count,
            report.sequence_length
        );
        println!("orientation\toffset\tcount\tp_value");
        for bin in &report.bins {
            println!(
                "{:?}\t{}\t{}\t{:.3e}",
                bin.orientation,
                bin.offset,
                bin.count,
                report.bin_pvalue(bin)?
            );
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), ScannerError> {
    match cli.command {
        Command::Scan(args) => scan(args),
        Command::MaxScore(args) => max_score(args),
        Command::Spacing(args) => spacing(args),
    }
}

fn main() {
    let start_time = std::time::Instant::now();
    let cli = Cli::parse();
    init_verbose(&cli);
    log::info!("Running {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }

    let elapsed = start_time.elapsed();
    log::info!(
        "Total execution time: {:.4} minutes",
        elapsed.as_secs_f64() / 60.0
    );
}
