//! Per-document failure isolation.

use crate::common::{Workspace, load_pdf, marked_pdf, page_markers, write_pdf};
use waybill::ItemOutcome;
use waybill::error::ErrorKind;
use waybill::scenario::{run_one_sided, run_two_sided};

#[tokio::test]
async fn test_corrupt_file_does_not_stop_the_batch() {
    let mut ws = Workspace::new();
    ws.background("BG");
    ws.railway("1.pdf", &["A"]);
    std::fs::write(ws.config.railway_dir.join("2.pdf"), b"%PDF-1.7 garbage").unwrap();
    ws.railway("3.pdf", &["C"]);

    let report = run_one_sided(&ws.config).await.unwrap();
    assert_eq!(report.written(), 2);
    assert_eq!(report.failed(), 1);

    match &report.outcomes[1] {
        ItemOutcome::Failed { inputs, error } => {
            assert!(inputs[0].ends_with("2.pdf"));
            assert_eq!(error.kind, ErrorKind::MalformedDocument);
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    assert_eq!(ws.listing(&ws.config.ready_dir), vec!["1.pdf", "3.pdf"]);
    let third = load_pdf(&ws.config.ready_dir.join("3.pdf"));
    assert_eq!(page_markers(&third), vec![vec!["BG", "C"]]);
}

#[tokio::test]
async fn test_zero_page_document_fails_alone() {
    let ws = Workspace::new();
    ws.template(&["T1", "T2"]);
    ws.railway("1.pdf", &["A"]);
    write_pdf(&ws.config.railway_dir.join("2.pdf"), marked_pdf(&[]));

    let report = run_two_sided(&ws.config).await.unwrap();
    assert_eq!(report.written(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(ws.listing(&ws.config.ready_dir), vec!["1.pdf"]);
}

#[tokio::test]
async fn test_unloadable_stamp_is_ignored() {
    let ws = Workspace::new();
    std::fs::write(ws.config.stamp_dir.join("1.pdf"), b"broken").unwrap();
    ws.railway("1.pdf", &["A"]);

    let report = run_one_sided(&ws.config).await.unwrap();
    assert_eq!(report.written(), 1);
    assert_eq!(report.skipped(), 1);
    match &report.outcomes[0] {
        ItemOutcome::Skipped { inputs, reason } => {
            assert_eq!(inputs, &vec![ws.config.stamp_dir.join("1.pdf")]);
            assert!(reason.starts_with("stamp not used"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let output = load_pdf(&ws.config.ready_dir.join("1.pdf"));
    assert_eq!(page_markers(&output), vec![vec!["A"]]);
}

#[tokio::test]
async fn test_duplicate_stamp_is_reported_as_skipped() {
    let ws = Workspace::new();
    ws.stamp("3.pdf", "FIRST");
    ws.stamp("Stamp 3.pdf", "SECOND");
    ws.railway("3.pdf", &["A"]);

    let report = run_one_sided(&ws.config).await.unwrap();
    assert_eq!(report.written(), 1);
    assert_eq!(report.skipped(), 1);
    assert!(report.outcomes[0].inputs()[0].ends_with("Stamp 3.pdf"));

    let output = load_pdf(&ws.config.ready_dir.join("3.pdf"));
    assert_eq!(page_markers(&output), vec![vec!["A", "FIRST"]]);
}

#[tokio::test]
async fn test_non_pdf_files_are_ignored() {
    let ws = Workspace::new();
    std::fs::write(ws.config.railway_dir.join("notes.txt"), b"hello").unwrap();
    ws.railway("4.PDF", &["UPPER"]);

    let report = run_one_sided(&ws.config).await.unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(ws.listing(&ws.config.ready_dir), vec!["4.PDF"]);
}

#[tokio::test]
async fn test_report_serialises_failures() {
    let ws = Workspace::new();
    std::fs::write(ws.config.railway_dir.join("8.pdf"), b"nope").unwrap();

    let report = run_one_sided(&ws.config).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["scenario"], "one-sided");
    assert_eq!(json["outcomes"][0]["status"], "failed");
    assert_eq!(json["outcomes"][0]["error"]["kind"], "malformedDocument");
}
