//! One-sided runs through the public scenario API.

use crate::common::{Workspace, load_pdf, marked_pdf, page_markers, write_pdf};
use lopdf::Object;
use waybill::ItemOutcome;
use waybill::compose::LayerKind;
use waybill::scenario::run_one_sided;

#[tokio::test]
async fn test_background_original_stamp_order() {
    let mut ws = Workspace::new();
    ws.background("BG");
    ws.stamp("Stamp 1001.pdf", "STAMP");
    ws.railway("Railway 1001.pdf", &["P1", "P2", "P3"]);

    let report = run_one_sided(&ws.config).await.unwrap();
    assert_eq!(report.written(), 1);
    assert_eq!(report.page_faults(), 0);

    let output = load_pdf(&ws.config.ready_dir.join("Railway 1001.pdf"));
    let markers = page_markers(&output);
    assert_eq!(markers.len(), 3);
    for (page, expected) in markers.iter().zip(["P1", "P2", "P3"]) {
        assert_eq!(page, &["BG", expected, "STAMP"]);
    }

    match &report.outcomes[0] {
        ItemOutcome::Written { stamp, pages, .. } => {
            assert_eq!(*pages, 3);
            assert!(stamp.as_ref().unwrap().ends_with("Stamp 1001.pdf"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn test_without_background_and_stamp_pages_unchanged() {
    let ws = Workspace::new();
    ws.railway("7.pdf", &["A", "B"]);

    run_one_sided(&ws.config).await.unwrap();

    let output = load_pdf(&ws.config.ready_dir.join("7.pdf"));
    assert_eq!(page_markers(&output), vec![vec!["A"], vec!["B"]]);
}

#[tokio::test]
async fn test_stamp_requires_exact_key() {
    let ws = Workspace::new();
    ws.stamp("10010.pdf", "WRONG");
    ws.stamp("100.pdf", "WRONG");
    ws.railway("1001.pdf", &["P1"]);

    let report = run_one_sided(&ws.config).await.unwrap();
    match &report.outcomes[0] {
        ItemOutcome::Written { stamp, .. } => assert!(stamp.is_none()),
        other => panic!("unexpected outcome {other:?}"),
    }

    let output = load_pdf(&ws.config.ready_dir.join("1001.pdf"));
    assert_eq!(page_markers(&output), vec![vec!["P1"]]);
}

#[tokio::test]
async fn test_each_document_gets_its_own_stamp() {
    let ws = Workspace::new();
    ws.stamp("S1.pdf", "STAMP1");
    ws.stamp("S2.pdf", "STAMP2");
    ws.railway("R1.pdf", &["A"]);
    ws.railway("R2.pdf", &["B"]);

    let report = run_one_sided(&ws.config).await.unwrap();
    assert_eq!(report.written(), 2);

    let first = load_pdf(&ws.config.ready_dir.join("R1.pdf"));
    let second = load_pdf(&ws.config.ready_dir.join("R2.pdf"));
    assert_eq!(page_markers(&first), vec![vec!["A", "STAMP1"]]);
    assert_eq!(page_markers(&second), vec![vec!["B", "STAMP2"]]);
}

#[tokio::test]
async fn test_broken_stamp_degrades_pages() {
    let mut ws = Workspace::new();
    ws.background("BG");

    let mut stamp = marked_pdf(&["STAMP"]);
    let page_id = stamp.get_pages()[&1];
    if let Ok(Object::Dictionary(dict)) = stamp.get_object_mut(page_id) {
        dict.set("Contents", Object::Integer(7));
    }
    write_pdf(&ws.config.stamp_dir.join("5.pdf"), stamp);
    ws.railway("5.pdf", &["P1", "P2"]);

    let report = run_one_sided(&ws.config).await.unwrap();
    assert_eq!(report.written(), 1);
    assert_eq!(report.page_faults(), 2);

    match &report.outcomes[0] {
        ItemOutcome::Written { faults, .. } => {
            assert!(faults.iter().all(|f| f.layer == LayerKind::Stamp));
            assert_eq!(faults[1].page, 2);
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let output = load_pdf(&ws.config.ready_dir.join("5.pdf"));
    assert_eq!(
        page_markers(&output),
        vec![vec!["BG", "P1"], vec!["BG", "P2"]]
    );
}

#[tokio::test]
async fn test_rerun_overwrites_output() {
    let ws = Workspace::new();
    ws.railway("3.pdf", &["OLD"]);
    run_one_sided(&ws.config).await.unwrap();

    ws.railway("3.pdf", &["NEW"]);
    run_one_sided(&ws.config).await.unwrap();

    let output = load_pdf(&ws.config.ready_dir.join("3.pdf"));
    assert_eq!(page_markers(&output), vec![vec!["NEW"]]);
    assert_eq!(ws.listing(&ws.config.ready_dir), vec!["3.pdf"]);
}

#[tokio::test]
async fn test_recompositing_finished_output_is_stable() {
    let mut first = Workspace::new();
    first.background("BG");
    first.stamp("1.pdf", "STAMP");
    first.railway("1.pdf", &["P1", "P2"]);

    run_one_sided(&first.config).await.unwrap();
    let finished = first.config.ready_dir.join("1.pdf");
    let expected = vec![vec!["BG", "P1", "STAMP"], vec!["BG", "P2", "STAMP"]];
    assert_eq!(page_markers(&load_pdf(&finished)), expected);

    // Second pass: no background, no stamps, the finished file as input.
    let second = Workspace::new();
    std::fs::copy(&finished, second.config.railway_dir.join("1.pdf")).unwrap();

    let report = run_one_sided(&second.config).await.unwrap();
    assert_eq!(report.written(), 1);
    assert_eq!(report.page_faults(), 0);

    let output = load_pdf(&second.config.ready_dir.join("1.pdf"));
    assert_eq!(page_markers(&output), expected);
}
