//! GC content of pasted sequences and multi-record files written to disk

use seq_qc_tools::gc::{analyze_fasta, calculate_gc, GcRecord};
use seq_qc_tools::reporting::QcReporter;
use tempfile::TempDir;

#[test]
fn test_mixed_case_sequence() {
    let gc = calculate_gc("ggatccGATCGATCG");
    assert_eq!(gc.length, 15);
    assert_eq!((gc.g, gc.c, gc.a, gc.t), (5, 4, 3, 3));
    assert_eq!(gc.gc_percent, 60.0);
}

#[test]
fn test_fasta_file_export() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("genes.fasta");
    std::fs::write(&input, ">seq1 first\nGGCC\nAATT\n\n>seq2\nNNNN\n>\nACGT\n").unwrap();

    let content = std::fs::read_to_string(&input).unwrap();
    let records = analyze_fasta(&content);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "seq1 first");
    assert_eq!(records[0].sequence_length, 8);
    assert_eq!(records[0].gc.gc_percent, 50.0);
    // nothing left after filtering
    assert_eq!(records[1].gc.length, 0);
    assert_eq!(records[1].gc.gc_percent, 0.0);

    let output = temp_dir.path().join("gc.json");
    QcReporter::default().export_json(&records, &output).unwrap();
    let loaded: Vec<GcRecord> =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(loaded, records);
}
