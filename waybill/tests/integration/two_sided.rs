//! Duplex layout end to end.

use crate::common::{Workspace, load_pdf, page_markers};
use rstest::rstest;
use waybill::scenario::run_two_sided;

#[tokio::test]
async fn test_ten_page_waybill_layout() {
    let mut ws = Workspace::new();
    ws.background("BG");
    ws.stamp("1.pdf", "STAMP");
    ws.template(&["T1", "T2"]);
    let markers: Vec<String> = (1..=10).map(|i| format!("P{i}")).collect();
    let refs: Vec<&str> = markers.iter().map(String::as_str).collect();
    ws.railway("1.pdf", &refs);

    let report = run_two_sided(&ws.config).await.unwrap();
    assert_eq!(report.written(), 1);

    let output = load_pdf(&ws.config.ready_dir.join("1.pdf"));
    let pages = page_markers(&output);
    assert_eq!(pages.len(), 20);

    // 1-indexed positions of the composited source pages.
    let source_positions = [1, 3, 5, 7, 9, 11, 13, 15, 17, 19];
    for (number, position) in source_positions.iter().enumerate() {
        let expected = format!("P{}", number + 1);
        assert_eq!(pages[position - 1], ["BG", expected.as_str(), "STAMP"]);
    }

    // Source pages 3 and 6 are followed by a template page, the rest by a
    // blank.
    assert_eq!(pages[5], ["T1"]);
    assert_eq!(pages[11], ["T2"]);
    for blank in [2, 4, 8, 10, 14, 16, 18, 20] {
        assert!(pages[blank - 1].is_empty(), "page {blank} should be blank");
    }
}

#[rstest]
#[case(1, 2)]
#[case(3, 6)]
#[case(5, 10)]
#[tokio::test]
async fn test_short_waybills(#[case] source_pages: usize, #[case] expected: usize) {
    let ws = Workspace::new();
    ws.template(&["T1", "T2"]);
    let markers: Vec<String> = (1..=source_pages).map(|i| format!("P{i}")).collect();
    let refs: Vec<&str> = markers.iter().map(String::as_str).collect();
    ws.railway("2.pdf", &refs);

    run_two_sided(&ws.config).await.unwrap();

    let output = load_pdf(&ws.config.ready_dir.join("2.pdf"));
    assert_eq!(output.get_pages().len(), expected);
}

#[tokio::test]
async fn test_missing_template_aborts_run() {
    let ws = Workspace::new();
    ws.railway("1.pdf", &["P1"]);

    let err = run_two_sided(&ws.config).await.unwrap_err();
    assert!(!err.is_recoverable());
    assert!(ws.listing(&ws.config.ready_dir).is_empty());
}

#[tokio::test]
async fn test_single_page_template_aborts_run() {
    let ws = Workspace::new();
    ws.template(&["T1"]);
    ws.railway("1.pdf", &["P1"]);

    let err = run_two_sided(&ws.config).await.unwrap_err();
    assert!(err.to_string().contains("at least 2 pages"));
}

#[tokio::test]
async fn test_extra_template_pages_ignored() {
    let ws = Workspace::new();
    ws.template(&["T1", "T2", "T3"]);
    let markers: Vec<String> = (1..=6).map(|i| format!("P{i}")).collect();
    let refs: Vec<&str> = markers.iter().map(String::as_str).collect();
    ws.railway("9.pdf", &refs);

    run_two_sided(&ws.config).await.unwrap();

    let output = load_pdf(&ws.config.ready_dir.join("9.pdf"));
    let pages = page_markers(&output);
    assert!(pages.iter().all(|page| !page.contains(&"T3".to_string())));
    assert_eq!(pages[5], ["T1"]);
    assert_eq!(pages[11], ["T2"]);
}
