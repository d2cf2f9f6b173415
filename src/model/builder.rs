//! Builds the typed chunk model from unified diff text.
//!
//! Parsing is hand-rolled and tolerant: a malformed hunk header degrades
//! only that hunk (it renders but cannot expand context), the rest of the
//! model builds normally.

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use crate::domain::{
    ContextEdge, DiffChunk, DiffError, DiffLine, DiffLineKind, EditChunk, FileDisposition,
    FileModel, HunkHeader, LineEnding, MetaChunk, WhitespaceMode,
};

use super::intraline::intraline;

lazy_static! {
    static ref HUNK_RE: Regex =
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("hunk header regex");
}

/// File metadata supplied alongside a server diff when the caller already
/// knows the file's role in the change.
#[derive(Debug, Clone, Default)]
pub struct FileMeta {
    pub is_add: bool,
    pub is_delete: bool,
    /// Set on the delete half of a rename: the path of the paired add.
    /// Such a file never computes a diff.
    pub moved_to: Option<String>,
}

/// Parses a full multi-file unified diff.
pub fn build(diff_text: &str, mode: WhitespaceMode) -> Result<Vec<FileModel>, DiffError> {
    let trimmed = diff_text.trim_start_matches('\u{feff}');
    if trimmed.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut lines: Vec<&str> = trimmed.split('\n').collect();
    // A trailing terminator is not an empty last row
    if lines.last() == Some(&"") {
        lines.pop();
    }
    let mut sections: Vec<(usize, usize)> = Vec::new();
    let mut start: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("diff --git ") {
            if let Some(s) = start.take() {
                sections.push((s, i));
            }
            start = Some(i);
        }
    }
    if let Some(s) = start {
        sections.push((s, lines.len()));
    }

    if sections.is_empty() {
        // Headerless fragment (the diff endpoint can serve a bare hunk table)
        if !lines
            .iter()
            .any(|l| l.starts_with("@@") || l.starts_with("--- ") || l.starts_with("+++ "))
        {
            return Err(DiffError::InvalidFormat(
                "no diff content found".to_string(),
            ));
        }
        sections.push((0, lines.len()));
    }

    let mut files = Vec::new();
    for (from, to) in sections {
        files.push(build_section(&lines[from..to], None, mode));
    }
    Ok(files)
}

/// Parses a single-file diff with caller-supplied metadata.
pub fn build_single(
    diff_text: &str,
    meta: FileMeta,
    mode: WhitespaceMode,
) -> Result<FileModel, DiffError> {
    let mut lines: Vec<&str> = diff_text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    Ok(build_section(&lines, Some(meta), mode))
}

fn build_section(lines: &[&str], meta: Option<FileMeta>, mode: WhitespaceMode) -> FileModel {
    let mut old_path = String::new();
    let mut new_path = String::new();
    let mut is_add = false;
    let mut is_delete = false;
    let mut rename_from: Option<String> = None;
    let mut rename_to: Option<String> = None;
    let mut binary = false;

    let mut rows: Vec<RowEvent> = Vec::new();
    let mut left = 1u32;
    let mut right = 1u32;
    let mut in_body = false;

    for raw in lines {
        let line = *raw;

        if !in_body {
            if let Some(rest) = line.strip_prefix("diff --git ") {
                let mut parts = rest.split_whitespace();
                old_path = strip_git_prefix(parts.next().unwrap_or(""), "a/");
                new_path = strip_git_prefix(parts.next().unwrap_or(""), "b/");
                continue;
            }
            if let Some(rest) = line.strip_prefix("--- ") {
                // `/dev/null` maps to the empty path
                old_path = strip_git_prefix(rest.trim_end_matches('\r').trim(), "a/");
                continue;
            }
            if let Some(rest) = line.strip_prefix("+++ ") {
                new_path = strip_git_prefix(rest.trim_end_matches('\r').trim(), "b/");
                continue;
            }
            if line.starts_with("new file") {
                is_add = true;
                continue;
            }
            if line.starts_with("deleted file") {
                is_delete = true;
                continue;
            }
            if let Some(rest) = line.strip_prefix("rename from ") {
                rename_from = Some(rest.trim().to_string());
                continue;
            }
            if let Some(rest) = line.strip_prefix("rename to ") {
                rename_to = Some(rest.trim().to_string());
                continue;
            }
            if line.starts_with("Binary files ") && line.trim_end().ends_with("differ") {
                binary = true;
                continue;
            }
            if line.starts_with("index ")
                || line.starts_with("similarity index")
                || line.starts_with("old mode")
                || line.starts_with("new mode")
                || line.starts_with("copy from")
                || line.starts_with("copy to")
            {
                continue;
            }
        }

        if line.starts_with("@@") {
            in_body = true;
            let header = parse_hunk_header(line);
            match header {
                Some(h) => {
                    left = h.left_start;
                    right = h.right_start;
                }
                None => {
                    // Numbers keep running from the previous hunk; the hunk
                    // renders but loses context expansion
                    warn!("unparsable hunk header, context expansion disabled: {line}");
                }
            }
            let edge = if header.is_some() {
                ContextEdge::Expandable
            } else {
                ContextEdge::Exhausted
            };
            rows.push(RowEvent::Meta(MetaChunk {
                line: DiffLine::meta(line.trim_end_matches('\r')),
                header,
                before_edge: edge,
                after_edge: edge,
            }));
            continue;
        }

        if !in_body {
            continue;
        }

        if line.starts_with('\\') {
            // "\ No newline at end of file" annotates the preceding row
            if let Some(RowEvent::Line(prev)) = rows.last_mut() {
                prev.line_ending = LineEnding::None;
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix('+') {
            let (text, ending) = detect_ending(rest);
            let mut row = DiffLine::add(right, text);
            row.line_ending = ending;
            rows.push(RowEvent::Line(row));
            right += 1;
        } else if let Some(rest) = line.strip_prefix('-') {
            let (text, ending) = detect_ending(rest);
            let mut row = DiffLine::delete(left, text);
            row.line_ending = ending;
            rows.push(RowEvent::Line(row));
            left += 1;
        } else if line.starts_with(' ') || line.is_empty() {
            let content = if line.is_empty() { line } else { &line[1..] };
            let (text, ending) = detect_ending(content);
            let mut row = DiffLine::same(left, right, text);
            row.line_ending = ending;
            rows.push(RowEvent::Line(row));
            left += 1;
            right += 1;
        }
    }

    if let Some(m) = &meta {
        is_add = is_add || m.is_add;
        is_delete = is_delete || m.is_delete;
    }

    let has_rows = rows.iter().any(|r| matches!(r, RowEvent::Line(_)));
    let moved_to = meta
        .and_then(|m| m.moved_to)
        .or_else(|| match (&rename_from, &rename_to) {
            (Some(_), Some(to)) if !has_rows => Some(to.clone()),
            _ => None,
        });

    if let Some(target) = moved_to {
        return FileModel {
            old_path,
            new_path: target.clone(),
            disposition: FileDisposition::MovedAway { target },
            chunks: Vec::new(),
            additions: 0,
            deletions: 0,
        };
    }

    if binary {
        return FileModel {
            old_path,
            new_path,
            disposition: FileDisposition::Binary,
            chunks: Vec::new(),
            additions: 0,
            deletions: 0,
        };
    }

    let chunks = group_chunks(rows, mode);

    let mut additions = 0u32;
    let mut deletions = 0u32;
    let mut sames = 0u32;
    for chunk in &chunks {
        for row in chunk.lines() {
            match row.kind {
                DiffLineKind::Add => additions += 1,
                DiffLineKind::Delete => deletions += 1,
                DiffLineKind::Same => sames += 1,
                DiffLineKind::Meta => {}
            }
        }
    }

    let disposition = if is_add || (additions > 0 && deletions == 0 && sames == 0) {
        FileDisposition::PureAdd
    } else if is_delete || (deletions > 0 && additions == 0 && sames == 0) {
        FileDisposition::PureDelete
    } else {
        FileDisposition::Modified
    };

    FileModel {
        old_path,
        new_path,
        disposition,
        chunks,
        additions,
        deletions,
    }
}

enum RowEvent {
    Meta(MetaChunk),
    Line(DiffLine),
}

fn group_chunks(rows: Vec<RowEvent>, mode: WhitespaceMode) -> Vec<DiffChunk> {
    let mut chunks: Vec<DiffChunk> = Vec::new();
    let mut iter = rows.into_iter().peekable();

    while let Some(event) = iter.next() {
        match event {
            RowEvent::Meta(meta) => chunks.push(DiffChunk::Meta(meta)),
            RowEvent::Line(first) => {
                let kind = first.kind;
                let mut run = vec![first];
                while let Some(RowEvent::Line(next)) = iter.peek() {
                    if next.kind != kind {
                        break;
                    }
                    let Some(RowEvent::Line(next)) = iter.next() else {
                        break;
                    };
                    run.push(next);
                }

                match kind {
                    DiffLineKind::Same => chunks.push(DiffChunk::Same(run)),
                    DiffLineKind::Add => chunks.push(DiffChunk::Add(run)),
                    DiffLineKind::Delete => {
                        // A delete run immediately followed by an add run is
                        // one edit chunk: collect the whole add run forward
                        // from the seam
                        let mut adds = Vec::new();
                        while let Some(RowEvent::Line(next)) = iter.peek() {
                            if next.kind != DiffLineKind::Add {
                                break;
                            }
                            let Some(RowEvent::Line(next)) = iter.next() else {
                                break;
                            };
                            adds.push(next);
                        }
                        if adds.is_empty() {
                            chunks.push(DiffChunk::Delete(run));
                        } else {
                            chunks.push(DiffChunk::Edit(finish_edit(run, adds, mode)));
                        }
                    }
                    DiffLineKind::Meta => {}
                }
            }
        }
    }

    chunks
}

fn finish_edit(mut deletes: Vec<DiffLine>, mut adds: Vec<DiffLine>, mode: WhitespaceMode) -> EditChunk {
    for i in 0..deletes.len().min(adds.len()) {
        if deletes[i].text == adds[i].text && deletes[i].line_ending != adds[i].line_ending {
            deletes[i].ending_changed = true;
            adds[i].ending_changed = true;
        }
    }

    let before: Vec<&str> = deletes.iter().map(|l| l.text.as_str()).collect();
    let after: Vec<&str> = adds.iter().map(|l| l.text.as_str()).collect();
    let spans = intraline(&before, &after, mode);

    for (row, line_spans) in deletes.iter_mut().zip(spans.before) {
        row.spans = Some(line_spans);
    }
    for (row, line_spans) in adds.iter_mut().zip(spans.after) {
        row.spans = Some(line_spans);
    }

    EditChunk::new(deletes, adds)
}

fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let caps = HUNK_RE.captures(line)?;
    let num = |i: usize, default: u32| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(default)
    };
    Some(HunkHeader {
        left_start: num(1, 1),
        left_len: num(2, 1),
        right_start: num(3, 1),
        right_len: num(4, 1),
    })
}

fn detect_ending(content: &str) -> (String, LineEnding) {
    match content.strip_suffix('\r') {
        Some(stripped) => (stripped.to_string(), LineEnding::CrLf),
        None => (content.to_string(), LineEnding::Lf),
    }
}

/// Drops the `a/` or `b/` operand prefix git puts on diff paths. Only the
/// leading component is the prefix; a file may live under a directory
/// literally named `a` or `b`.
fn strip_git_prefix(path: &str, prefix: &str) -> String {
    if path == "/dev/null" {
        return String::new();
    }
    path.strip_prefix(prefix).unwrap_or(path).to_string()
}
