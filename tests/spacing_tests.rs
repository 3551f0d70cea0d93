use tfbs_lookahead::error::MotifError;
use tfbs_lookahead::pvalue::{pvalue_to_score, Threshold};
use tfbs_lookahead::spacing::{spacing_constraint, Orientation, SpacingParams, TOP_BINS};
use tfbs_lookahead::types::{Background, Pwm};

fn one_hot(motif: &str) -> Pwm {
    let rows: Vec<[f64; 4]> = motif
        .bytes()
        .map(|b| {
            let mut row = [0.0; 4];
            row[b"ACGT".iter().position(|&x| x == b).unwrap()] = 1.0;
            row
        })
        .collect();
    Pwm::from_rows(&rows).unwrap()
}

/// Ten A's, then `first`, ten A's, `second` and ten more A's
fn synthetic(first: &str, second: &str) -> Vec<u8> {
    let filler = "A".repeat(10);
    format!("{filler}{first}{filler}{second}{filler}").into_bytes()
}

#[test]
fn test_pvalue_to_score() {
    let background = Background::uniform();
    let pwm = one_hot("AAAC");

    // only the exact site (1/256) fits under 0.01; per-position scores are
    // floored to 1/1000 nat
    let threshold = pvalue_to_score(0.01, &background, &pwm).unwrap();
    assert!((threshold - 5.544).abs() < 1e-9);
    assert!(threshold <= 4.0 * 4f64.ln());

    // below the probability of the best site the best score is used
    let clamped = pvalue_to_score(1e-9, &background, &pwm).unwrap();
    assert_eq!(clamped, threshold);

    // everything passes at p = 1
    let lowest = pvalue_to_score(1.0, &background, &pwm).unwrap();
    assert!((lowest - 4.0 * -7.825).abs() < 1e-9);

    let relaxed = pvalue_to_score(0.1, &background, &pwm).unwrap();
    assert!(relaxed < threshold);

    assert!(matches!(
        pvalue_to_score(0.0, &background, &pwm),
        Err(MotifError::InvalidParameter { .. })
    ));
    assert!(pvalue_to_score(1.5, &background, &pwm).is_err());
    assert!(pvalue_to_score(f64::NAN, &background, &pwm).is_err());

    assert_eq!(Threshold::Score(2.5).resolve(&background, &pwm).unwrap(), 2.5);
    assert_eq!(
        Threshold::PValue(0.01).resolve(&background, &pwm).unwrap(),
        threshold
    );
}

#[test]
fn test_same_orientation_offset() {
    let background = Background::uniform();
    let sequence = synthetic("AAAC", "TGCT");
    let pwm1 = one_hot("AAAC");
    let pwm2 = one_hot("TGCT");

    let report = spacing_constraint(&pwm1, &pwm2, &background, 0.01, 0, 30, &sequence).unwrap();
    assert_eq!(report.motif1_count, 1);
    assert_eq!(report.motif2_count, 1);
    assert_eq!(report.sequence_length, 38);
    assert_eq!(report.bins.len(), TOP_BINS);

    let top = report.bins[0];
    assert_eq!(top.orientation, Orientation::Same);
    assert_eq!(top.offset, 14);
    assert_eq!(top.count, 1);
    assert!(report.bins[1..].iter().all(|b| b.count == 0));

    // bins 5 wide centered on multiples of 5
    let params = SpacingParams {
        p_value: 0.01,
        bin_width: 2,
        bin_bound: 30,
    };
    let report = params.analyze(&pwm1, &pwm2, &background, &sequence).unwrap();
    assert_eq!(report.bins[0].orientation, Orientation::Same);
    assert_eq!(report.bins[0].offset, 15);
    assert_eq!(report.bins[0].count, 1);
}

#[test]
fn test_opposite_orientation_offset() {
    let background = Background::uniform();
    // AGCA is TGCT on the other strand; its 3' end sits at 27
    let sequence = synthetic("AAAC", "AGCA");

    let report = spacing_constraint(
        &one_hot("AAAC"),
        &one_hot("TGCT"),
        &background,
        0.01,
        0,
        30,
        &sequence,
    )
    .unwrap();
    assert_eq!(report.motif2_count, 1);
    let top = report.bins[0];
    assert_eq!(top.orientation, Orientation::Opposite);
    assert_eq!(top.offset, 17);
    assert_eq!(top.count, 1);
}

#[test]
fn test_reverse_strand_pairs() {
    let background = Background::uniform();
    let pwm1 = one_hot("AAAC");
    let pwm2 = one_hot("TGCT");

    // both sites on the reverse strand: TGCT as AGCA, AAAC as GTTT
    let sequence = synthetic("AGCA", "GTTT");
    let report = spacing_constraint(&pwm1, &pwm2, &background, 0.01, 0, 30, &sequence).unwrap();
    assert_eq!(report.motif1_count, 1);
    assert_eq!(report.motif2_count, 1);
    let top = report.bins[0];
    assert_eq!(top.orientation, Orientation::Same);
    assert_eq!(top.offset, 14);
    assert_eq!(top.count, 1);
    assert!(report.bins[1..].iter().all(|b| b.count == 0));

    // motif 1 reverse, motif 2 forward
    let sequence = synthetic("TGCT", "GTTT");
    let report = spacing_constraint(&pwm1, &pwm2, &background, 0.01, 0, 30, &sequence).unwrap();
    assert_eq!(report.motif1_count, 1);
    assert_eq!(report.motif2_count, 1);
    let top = report.bins[0];
    assert_eq!(top.orientation, Orientation::Opposite);
    assert_eq!(top.offset, 17);
    assert_eq!(top.count, 1);
    assert!(report.bins[1..].iter().all(|b| b.count == 0));
}

#[test]
fn test_bin_pvalue() {
    let background = Background::uniform();
    let sequence = synthetic("AAAC", "TGCT");
    let report = spacing_constraint(
        &one_hot("AAAC"),
        &one_hot("TGCT"),
        &background,
        0.01,
        0,
        30,
        &sequence,
    )
    .unwrap();

    // one trial, window of one position, motif 2 density 1/38
    let p = report.bin_pvalue(&report.bins[0]).unwrap();
    assert!((p - 1.0 / 38.0).abs() < 1e-9);
    assert_eq!(report.bin_pvalue(&report.bins[1]).unwrap(), 1.0);
}

#[test]
fn test_spacing_edge_cases() {
    let background = Background::uniform();
    let pwm1 = one_hot("AAAC");
    let pwm2 = one_hot("TGCT");

    let report = spacing_constraint(&pwm1, &pwm2, &background, 0.01, 1, 10, b"AAA").unwrap();
    assert_eq!(report.motif1_count, 0);
    assert_eq!(report.motif2_count, 0);
    assert!(report.bins.iter().all(|b| b.count == 0));
    // offsets -9, -6, -3, 0, 3, 6, 9 in two orientations
    assert_eq!(report.bins.len(), TOP_BINS);

    assert!(matches!(
        spacing_constraint(&pwm1, &pwm2, &background, 0.01, 1, 10, b"AAACZTGCT"),
        Err(MotifError::InvalidSymbol { position: 4, .. })
    ));
    assert!(spacing_constraint(&pwm1, &pwm2, &background, 0.0, 1, 10, b"AAAC").is_err());

    // bins that cannot be expressed as signed offsets
    assert!(matches!(
        spacing_constraint(&pwm1, &pwm2, &background, 0.01, 0, usize::MAX, b"AAACTGCT"),
        Err(MotifError::InvalidParameter { .. })
    ));
    assert!(matches!(
        spacing_constraint(&pwm1, &pwm2, &background, 0.01, usize::MAX, 10, b"AAACTGCT"),
        Err(MotifError::InvalidParameter { .. })
    ));
    assert!(matches!(
        spacing_constraint(&pwm1, &pwm2, &background, 0.01, 1 << 62, 10, b"AAACTGCT"),
        Err(MotifError::InvalidParameter { .. })
    ));
}
