//! Terminal front end: parses a diff and prints either projection.

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;

use diffpane::comments::CommentFeed;
use diffpane::domain::{FileModel, ViewMode, WhitespaceMode};
use diffpane::engine::{DiffEngine, FileView};
use diffpane::infra::{JsonComments, LocalFiles, ViewerPrefs, load_prefs, save_prefs};
use diffpane::layout::{RowKind, natural_width};

#[derive(Parser, Debug)]
#[command(name = "diffpane")]
#[command(version)]
#[command(about = "Render unified diffs inline or side by side", long_about = None)]
struct Args {
    /// Diff file to render; reads stdin when omitted
    #[arg()]
    input: Option<PathBuf>,

    /// Two-column layout instead of the inline one
    #[arg(short, long)]
    side_by_side: bool,

    /// Ignore leading/trailing whitespace in intra-line highlights
    #[arg(short = 'w', long)]
    ignore_whitespace: bool,

    /// Reveal the whole file around each hunk (needs --root)
    #[arg(long)]
    full_context: bool,

    /// Directory the diff paths are relative to
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// JSON file of saved review comments to place on the diff
    #[arg(long)]
    comments: Option<PathBuf>,

    /// Emit the file models as JSON instead of rendering
    #[arg(long)]
    json: bool,

    /// Persist the chosen view and whitespace modes as defaults
    #[arg(long)]
    remember: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let prefs = load_prefs();
    let view = if args.side_by_side {
        ViewMode::Sideways
    } else {
        prefs.view_mode
    };
    let whitespace = if args.ignore_whitespace {
        WhitespaceMode::Ignore
    } else {
        prefs.whitespace_mode
    };

    let text = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    let mut engine = DiffEngine::new();
    engine.set_whitespace_mode(whitespace)?;
    engine.set_view_mode(view);
    engine.load_diff(&text)?;

    if let Some(path) = &args.comments {
        let records = JsonComments::new(path)
            .fetch_comments()
            .await
            .context("loading comments")?;
        engine.set_comments(records);
    }

    if args.full_context {
        let source = LocalFiles::new(&args.root);
        for i in 0..engine.files().len() {
            if let Err(err) = engine.request_full_file(i, &source).await {
                warn!("full context unavailable for file {i}: {err}");
            }
        }
    }

    if args.remember {
        save_prefs(&ViewerPrefs {
            view_mode: view,
            whitespace_mode: whitespace,
        })
        .context("saving preferences")?;
    }

    if args.json {
        let models: Vec<&FileModel> = engine.files().iter().map(|v| &v.model).collect();
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    for i in 0..engine.files().len() {
        print_file(&engine, i);
    }
    Ok(())
}

/// Comments placed in file `file`, grouped by inline row. File-level
/// comments and anchors that resolved nowhere land under `None`.
fn comments_by_row<'a>(
    engine: &'a DiffEngine,
    file: usize,
) -> HashMap<Option<usize>, Vec<&'a str>> {
    let mut map: HashMap<Option<usize>, Vec<&str>> = HashMap::new();
    for placement in engine.placements() {
        if placement.file == file {
            let record = &engine.comments()[placement.comment];
            map.entry(placement.row)
                .or_default()
                .push(record.body.as_str());
        }
    }
    map
}

fn print_file(engine: &DiffEngine, file: usize) {
    let view = &engine.files()[file];
    println!(
        "{} | +{} -{}",
        display_path(&view.model),
        view.model.additions,
        view.model.deletions
    );
    let threads = comments_by_row(engine, file);
    if let Some(bodies) = threads.get(&None) {
        for body in bodies {
            println!("  ## {body}");
        }
    }
    match engine.view_mode() {
        ViewMode::Inline => print_inline(view, &threads),
        ViewMode::Sideways => print_sideways(view, &threads),
    }
    println!();
}

fn display_path(model: &FileModel) -> String {
    if !model.old_path.is_empty() && !model.new_path.is_empty() && model.old_path != model.new_path
    {
        format!("{} -> {}", model.old_path, model.new_path)
    } else {
        model.anchor_path().to_string()
    }
}

fn print_inline(view: &FileView, threads: &HashMap<Option<usize>, Vec<&str>>) {
    for (i, row) in view.inline.rows.iter().enumerate() {
        if row.kind == RowKind::Meta {
            println!("{}", row.text);
        } else {
            println!(
                "{:>5} {:>5} {}{}",
                column(row.left_number, view.inline.show_left),
                column(row.right_number, view.inline.show_right),
                row.marker.unwrap_or(' '),
                row.text
            );
        }
        if let Some(bodies) = threads.get(&Some(i)) {
            for body in bodies {
                println!("            ## {body}");
            }
        }
    }
}

fn print_sideways(view: &FileView, threads: &HashMap<Option<usize>, Vec<&str>>) {
    let width = natural_width(&view.sideways.left).clamp(20, 100);
    let mut by_pair: HashMap<usize, Vec<&str>> = HashMap::new();
    for (row, bodies) in threads {
        if let Some(i) = row.and_then(|r| sideways_row_for(view, r)) {
            by_pair.entry(i).or_default().extend(bodies);
        }
    }
    for (i, (left, right)) in view.sideways.left.iter().zip(&view.sideways.right).enumerate() {
        // Meta rows are carried on both sides; print them once, full width
        if left.kind == RowKind::Meta {
            println!("{}", left.text);
            continue;
        }
        println!(
            "{:>5} {:<width$} │ {:>5} {}",
            column(left.left_number, view.sideways.show_left),
            left.text,
            column(right.right_number, view.sideways.show_right),
            right.text,
        );
        if let Some(bodies) = by_pair.get(&i) {
            for body in bodies {
                println!("            ## {body}");
            }
        }
    }
}

/// The sideways index showing the same content as inline row `row`. A row
/// carrying a left number lands in the left column, anything else in the
/// right one.
fn sideways_row_for(view: &FileView, row: usize) -> Option<usize> {
    let inline = view.inline.rows.get(row)?;
    if let Some(l) = inline.left_number {
        view.sideways
            .left
            .iter()
            .position(|cell| cell.left_number == Some(l))
    } else {
        let r = inline.right_number?;
        view.sideways
            .right
            .iter()
            .position(|cell| cell.right_number == Some(r))
    }
}

fn column(number: Option<u32>, shown: bool) -> String {
    match number {
        Some(n) if shown => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffpane::domain::{CommentAnchor, CommentRecord};

    const DIFF: &str =
        "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1,3 +1,3 @@\n context\n-foo bar\n+foo baz\n tail\n";

    #[test]
    fn comment_rows_map_into_the_sideways_projection() {
        let mut engine = DiffEngine::new();
        engine.load_diff(DIFF).unwrap();
        engine.set_comments(vec![CommentRecord {
            id: "c1".into(),
            author: "reviewer".into(),
            body: "why baz".into(),
            anchor: CommentAnchor {
                file: "f".into(),
                right_line: Some(2),
                ..Default::default()
            },
        }]);

        let threads = comments_by_row(&engine, 0);
        let (&row, bodies) = threads.iter().find(|(row, _)| row.is_some()).unwrap();
        assert_eq!(bodies, &vec!["why baz"]);

        // The add lands in the right column, on the line where it pairs
        // with the delete it replaced
        let view = &engine.files()[0];
        let paired = sideways_row_for(view, row.unwrap()).unwrap();
        assert_eq!(view.sideways.right[paired].text, "foo baz");
        assert_eq!(view.sideways.left[paired].text, "foo bar");
    }
}
