//! Bundling ready documents.

use crate::common::{Workspace, load_pdf, page_markers};
use waybill::ItemOutcome;
use waybill::scenario::run_merge;

fn ready_numbered(ws: &Workspace, keys: impl IntoIterator<Item = u64>) {
    for key in keys {
        let front = format!("{key}a");
        let back = format!("{key}b");
        ws.ready(&format!("{key}.pdf"), &[&front, &back]);
    }
}

fn flat(doc: &lopdf::Document) -> Vec<String> {
    page_markers(doc).into_iter().flatten().collect()
}

#[tokio::test]
async fn test_ten_documents_in_chunks_of_four() {
    let ws = Workspace::new();
    ready_numbered(&ws, 1..=10);

    let report = run_merge(&ws.config).await.unwrap();
    assert_eq!(report.written(), 3);
    assert_eq!(
        ws.listing(&ws.config.merged_dir),
        vec![
            "Railway 1-4 4 pcs.pdf",
            "Railway 5-8 4 pcs.pdf",
            "Railway 9-10 2 pcs.pdf",
        ]
    );

    let first = load_pdf(&ws.config.merged_dir.join("Railway 1-4 4 pcs.pdf"));
    assert_eq!(
        flat(&first),
        vec!["1a", "1b", "2a", "2b", "3a", "3b", "4a", "4b"]
    );
    let last = load_pdf(&ws.config.merged_dir.join("Railway 9-10 2 pcs.pdf"));
    assert_eq!(flat(&last), vec!["9a", "9b", "10a", "10b"]);
}

#[tokio::test]
async fn test_bundles_follow_numeric_not_lexical_order() {
    let ws = Workspace::new();
    ready_numbered(&ws, [100, 2, 11, 3]);

    run_merge(&ws.config).await.unwrap();

    let name = "Railway 2-3;11;100 4 pcs.pdf";
    assert_eq!(ws.listing(&ws.config.merged_dir), vec![name]);
    let bundle = load_pdf(&ws.config.merged_dir.join(name));
    assert_eq!(
        flat(&bundle),
        vec!["2a", "2b", "3a", "3b", "11a", "11b", "100a", "100b"]
    );
}

#[tokio::test]
async fn test_legacy_suffix() {
    let mut ws = Workspace::new();
    ws.config.legacy_bundle_suffix = true;
    ready_numbered(&ws, [5, 6]);

    run_merge(&ws.config).await.unwrap();
    assert_eq!(
        ws.listing(&ws.config.merged_dir),
        vec!["Railway 5-6 2 pcs..pdf"]
    );
}

#[tokio::test]
async fn test_custom_chunk_size() {
    let mut ws = Workspace::new();
    ws.config.chunk_size = 2;
    ready_numbered(&ws, 1..=5);

    let report = run_merge(&ws.config).await.unwrap();
    assert_eq!(report.written(), 3);
    assert_eq!(
        ws.listing(&ws.config.merged_dir),
        vec![
            "Railway 1-2 2 pcs.pdf",
            "Railway 3-4 2 pcs.pdf",
            "Railway 5 1 pcs.pdf",
        ]
    );
}

#[tokio::test]
async fn test_unkeyed_documents_are_reported_and_left_out() {
    let ws = Workspace::new();
    ready_numbered(&ws, [1]);
    ws.ready("cover.pdf", &["cover"]);

    let report = run_merge(&ws.config).await.unwrap();
    assert_eq!(report.written(), 1);
    assert_eq!(report.skipped(), 1);
    assert!(report.outcomes.iter().any(|o| matches!(
        o,
        ItemOutcome::Skipped { inputs, .. } if inputs[0].ends_with("cover.pdf")
    )));

    let bundle = load_pdf(&ws.config.merged_dir.join("Railway 1 1 pcs.pdf"));
    assert_eq!(flat(&bundle), vec!["1a", "1b"]);
}

#[tokio::test]
async fn test_corrupt_member_fails_only_its_bundle() {
    let ws = Workspace::new();
    ready_numbered(&ws, [1, 2, 3, 4, 5, 7, 8]);
    std::fs::write(ws.config.ready_dir.join("6.pdf"), b"not a pdf").unwrap();

    let report = run_merge(&ws.config).await.unwrap();
    assert_eq!(report.written(), 1);
    assert_eq!(report.failed(), 1);

    match &report.outcomes[1] {
        ItemOutcome::Failed { inputs, .. } => {
            assert_eq!(inputs.len(), 4);
            assert!(inputs[1].ends_with("6.pdf"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(
        ws.listing(&ws.config.merged_dir),
        vec!["Railway 1-4 4 pcs.pdf"]
    );
}

#[tokio::test]
async fn test_failed_bundle_members_remain_in_pool() {
    let ws = Workspace::new();
    ready_numbered(&ws, [1, 2, 3, 4, 5, 7, 8, 9]);
    std::fs::write(ws.config.ready_dir.join("6.pdf"), b"not a pdf").unwrap();

    let report = run_merge(&ws.config).await.unwrap();
    assert_eq!(report.written(), 2);
    assert_eq!(report.failed(), 1);

    let remaining: Vec<String> = report
        .remaining
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(remaining, vec!["5.pdf", "6.pdf", "7.pdf", "8.pdf"]);
}

#[tokio::test]
async fn test_successful_merge_leaves_nothing_remaining() {
    let ws = Workspace::new();
    ready_numbered(&ws, 1..=5);

    let report = run_merge(&ws.config).await.unwrap();
    assert_eq!(report.written(), 2);
    assert!(report.remaining.is_empty());
}

#[tokio::test]
async fn test_dry_run_writes_no_bundles() {
    let mut ws = Workspace::new();
    ws.config.dry_run = true;
    ready_numbered(&ws, 1..=3);

    let report = run_merge(&ws.config).await.unwrap();
    assert_eq!(report.written(), 1);
    assert_eq!(report.remaining.len(), 3);
    assert!(!ws.config.merged_dir.exists());
}
