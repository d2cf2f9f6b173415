//! End-to-end tests: diff text in, projections and comment placements out,
//! with context fetched from a real directory tree.

use diffpane::DiffEngine;
use diffpane::context::{ContextOutcome, EdgeSide};
use diffpane::domain::{CommentAnchor, CommentRecord, ContextEdge, ViewMode, WhitespaceMode};
use diffpane::infra::LocalFiles;
use diffpane::layout::RowKind;

const TWO_FILE_DIFF: &str = r#"diff --git a/src/alpha.rs b/src/alpha.rs
--- a/src/alpha.rs
+++ b/src/alpha.rs
@@ -3,3 +3,3 @@
 three
-four old
+four new
 five
diff --git a/src/beta.rs b/src/beta.rs
--- a/src/beta.rs
+++ b/src/beta.rs
@@ -1,2 +1,3 @@
 top
+inserted
 bottom
"#;

fn comment(file: &str, left: Option<u32>, right: Option<u32>) -> CommentRecord {
    CommentRecord {
        id: format!("c-{file}"),
        author: "reviewer".into(),
        body: "note".into(),
        anchor: CommentAnchor {
            file: file.into(),
            left_line: left,
            right_line: right,
            content_context: vec![],
        },
    }
}

#[test]
fn multi_file_diff_builds_consistent_projections() {
    let mut engine = DiffEngine::new();
    assert!(engine.load_diff(TWO_FILE_DIFF).unwrap());
    assert_eq!(engine.files().len(), 2);

    for view in engine.files() {
        // Both columns of the sideways projection stay the same height
        assert_eq!(view.sideways.left.len(), view.sideways.right.len());
        // Line numbers on each side are strictly increasing
        let lefts: Vec<u32> = view
            .inline
            .rows
            .iter()
            .filter_map(|r| r.left_number)
            .collect();
        let mut sorted = lefts.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(lefts, sorted);
    }

    // The 1-delete/1-add edit chunk pairs without padding
    let alpha = &engine.files()[0];
    assert!(!alpha
        .sideways
        .left
        .iter()
        .any(|r| r.kind == RowKind::Padding));
    // The lone add in beta pads the left column once
    let beta = &engine.files()[1];
    assert_eq!(
        beta.sideways
            .left
            .iter()
            .filter(|r| r.kind == RowKind::Padding)
            .count(),
        1
    );
}

#[test]
fn comments_land_on_their_rows() {
    let mut engine = DiffEngine::new();
    engine.load_diff(TWO_FILE_DIFF).unwrap();
    engine.set_comments(vec![
        comment("src/alpha.rs", Some(5), Some(5)),
        comment("src/beta.rs", None, Some(2)),
    ]);

    let placements = engine.placements().to_vec();
    assert_eq!(placements.len(), 2);
    let alpha_row = placements[0].row.unwrap();
    assert_eq!(
        engine.files()[placements[0].file].inline.rows[alpha_row].text,
        "five"
    );
    let beta_row = placements[1].row.unwrap();
    assert_eq!(
        engine.files()[placements[1].file].inline.rows[beta_row].text,
        "inserted"
    );
}

#[test]
fn whitespace_toggle_keeps_comment_anchors() {
    let mut engine = DiffEngine::new();
    engine.load_diff(TWO_FILE_DIFF).unwrap();
    engine.set_comments(vec![comment("src/alpha.rs", Some(4), None)]);
    let before = engine.placements()[0];
    assert_eq!(
        engine.files()[before.file].inline.rows[before.row.unwrap()].text,
        "four old"
    );

    engine.set_whitespace_mode(WhitespaceMode::Ignore).unwrap();
    let after = engine.placements()[0];
    assert_eq!(
        engine.files()[after.file].inline.rows[after.row.unwrap()].text,
        "four old"
    );
}

#[tokio::test]
async fn context_expansion_shifts_placements_not_anchors() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(
        dir.path().join("src/alpha.rs"),
        "one\ntwo\nthree\nfour new\nfive\nsix\n",
    )
    .unwrap();
    let source = LocalFiles::new(dir.path());

    let mut engine = DiffEngine::new();
    engine.load_diff(TWO_FILE_DIFF).unwrap();
    engine.set_comments(vec![comment("src/alpha.rs", Some(5), Some(5))]);
    let meta = engine.files()[0].model.meta_indices()[0];

    let outcome = engine
        .request_more_context(0, meta, EdgeSide::Before, &source)
        .await
        .unwrap();
    assert_eq!(outcome, ContextOutcome::Expanded);

    let view = &engine.files()[0];
    // Lines 1-2 are now revealed above the hunk body
    assert_eq!(view.inline.rows[1].text, "one");
    assert!(view.inline.rows[1].is_additional_context);
    // The sideways projection was re-derived and stayed paired
    assert_eq!(view.sideways.left.len(), view.sideways.right.len());
    assert!(view.sideways.left.iter().any(|r| r.text == "one"));

    // The comment's row index moved, but it still points at the same line
    let placement = engine.placements()[0];
    assert_eq!(
        engine.files()[0].inline.rows[placement.row.unwrap()].text,
        "five"
    );
}

#[tokio::test]
async fn full_file_reveal_converges_every_edge() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(
        dir.path().join("src/alpha.rs"),
        "one\ntwo\nthree\nfour new\nfive\nsix\nseven\n",
    )
    .unwrap();
    let source = LocalFiles::new(dir.path());

    let mut engine = DiffEngine::new();
    engine.load_diff(TWO_FILE_DIFF).unwrap();

    let outcome = engine.request_full_file(0, &source).await.unwrap();
    assert_eq!(outcome, ContextOutcome::Expanded);
    let view = &engine.files()[0];
    let texts: Vec<&str> = view
        .inline
        .rows
        .iter()
        .filter(|r| r.is_content())
        .map(|r| r.text.as_str())
        .collect();
    assert_eq!(
        texts,
        vec!["one", "two", "three", "four old", "four new", "five", "six", "seven"]
    );
    for i in view.model.meta_indices() {
        let diffpane::domain::DiffChunk::Meta(meta) = &view.model.chunks[i] else {
            unreachable!()
        };
        assert_eq!(meta.before_edge, ContextEdge::Exhausted);
        assert_eq!(meta.after_edge, ContextEdge::Exhausted);
    }

    // A second request finds nothing left to reveal
    let again = engine.request_full_file(0, &source).await.unwrap();
    assert_eq!(again, ContextOutcome::AlreadyComplete);
}

#[test]
fn view_mode_switch_needs_no_rebuild() {
    let mut engine = DiffEngine::new();
    engine.load_diff(TWO_FILE_DIFF).unwrap();
    let epoch = engine.loader().epoch();
    engine.set_view_mode(ViewMode::Sideways);
    assert_eq!(engine.view_mode(), ViewMode::Sideways);
    assert_eq!(engine.loader().epoch(), epoch);
}
