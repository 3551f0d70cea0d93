use polars::prelude::*;
use tfbs_lookahead::error::MotifError;
use tfbs_lookahead::fasta;

#[test]
fn test_read_fasta() {
    let path = "tests/data/test1.fasta";
    let df = fasta::read_fasta(path).unwrap();
    assert_eq!(df.height(), 3);
    assert_eq!(df.width(), 2);

    // multi-line records are joined and everything is upper-cased
    let records = fasta::records(&df).unwrap();
    assert_eq!(records[1].1, "TGCTTTTTTTTTGAGTCAGCAAAACTGAAGCCT");
    assert_eq!(records[2].1, "CGCTTTTTAATAGAGTCAGCAAAACTGAAGCCT");

    // test file does not exist
    let result = fasta::read_fasta("tests/data/nonexistent.fasta");
    assert!(matches!(result, Err(MotifError::Io(_))));
}

#[test]
fn test_write_fasta() {
    let path = std::env::temp_dir().join("tfbs_lookahead_test1_out.fasta");
    let df: DataFrame = df!(
        "label" => ["chr1-4357766-4357930_CPPP_WT", "chr1-4357733-4357765_CPPP_WT", "chr1-4357712-4357732_CPPP_WT"],
        "sequence" => ["AGCTTTTTAATAGAGTCAGCAAAACTGAAGCCT", "TGCTTTTTTTTTGAGTCAGCAAAACTGAAGCCT", "CGCTTTTTAATAGAGTCAGCAAAACTGAAGCCT"],
    )
    .unwrap();

    fasta::write_fasta(&df, &path).unwrap();

    let df_out = fasta::read_fasta(&path).unwrap();
    assert_eq!(df_out.height(), 3);
    assert_eq!(df_out.width(), 2);
    assert_eq!(fasta::records(&df_out).unwrap(), fasta::records(&df).unwrap());

    // clean up
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_fetch_subsequence() {
    let df = fasta::read_fasta("tests/data/test1.fasta").unwrap();
    let sub = fasta::fetch_subsequence(&df, "chr1-4357766-4357930_CPPP_WT", 12, 19).unwrap();
    assert_eq!(sub, "GAGTCAG");

    assert!(fasta::fetch_subsequence(&df, "chr1-4357766-4357930_CPPP_WT", 30, 40).is_err());
    assert!(fasta::fetch_subsequence(&df, "chrX", 0, 1).is_err());

    // byte offsets inside a multi-byte character are rejected
    let df = df!(
        "label" => &["odd"],
        "sequence" => &["AC\u{e9}GT"]
    )
    .unwrap();
    assert_eq!(fasta::fetch_subsequence(&df, "odd", 0, 2).unwrap(), "AC");
    assert_eq!(fasta::fetch_subsequence(&df, "odd", 4, 6).unwrap(), "GT");
    assert!(matches!(
        fasta::fetch_subsequence(&df, "odd", 0, 3),
        Err(MotifError::InvalidParameter { .. })
    ));
}

#[test]
fn test_reverse_complement() {
    // Test basic reverse complement
    let sequence = "ATCG";
    assert_eq!(fasta::reverse_complement(sequence).unwrap(), "CGAT");

    // Test longer sequence
    let sequence = "AATTCCGG";
    assert_eq!(fasta::reverse_complement(sequence).unwrap(), "CCGGAATT");

    // Test palindromic sequence
    let sequence = "GCGC";
    assert_eq!(fasta::reverse_complement(sequence).unwrap(), "GCGC");

    // Ambiguity codes complement to the code of the complementary set
    let sequence = "ANRYMKBV";
    assert_eq!(fasta::reverse_complement(sequence).unwrap(), "BVMKRYNT");

    // Test error case with invalid nucleotide
    let sequence = "ATCGX";
    assert!(matches!(
        fasta::reverse_complement(sequence),
        Err(MotifError::InvalidSymbol { position: 4, symbol: 'X' })
    ));
}
