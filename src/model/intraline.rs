//! Token-level intra-line highlighting for edit chunks.
//!
//! Both sides of an edit chunk are joined by newline, diffed as word tokens,
//! cleaned up so short equal islands inside otherwise-changed text are not
//! highlighted on their own, then re-split per line. Insertions land only on
//! `after` lines, deletions only on `before` lines, equal spans on both.
//! Identical input always produces byte-identical output: whitespace-mode
//! toggling re-runs this exact computation and relies on stable results.

use similar::{ChangeTag, TextDiff};

use crate::domain::{IntralineSpan, SpanOp, WhitespaceMode};

/// Sides longer than this skip span computation entirely.
const MAX_INTRALINE_LEN: usize = 10_000;

/// Per-line span buckets for one edit chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntralineResult {
    pub before: Vec<Vec<IntralineSpan>>,
    pub after: Vec<Vec<IntralineSpan>>,
}

#[derive(Debug)]
enum Piece {
    Equal(String),
    Edit { del: String, ins: String },
}

/// Computes aligned intra-line spans for the rows of one edit chunk.
///
/// Line texts are given without their `+`/`-` markers.
pub fn intraline(before: &[&str], after: &[&str], mode: WhitespaceMode) -> IntralineResult {
    if before.is_empty() || after.is_empty() {
        return whole_line_fallback(before, after);
    }

    let (before_parts, after_parts) = match mode {
        WhitespaceMode::Keep => (
            before.iter().map(|l| ("", *l, "")).collect::<Vec<_>>(),
            after.iter().map(|l| ("", *l, "")).collect::<Vec<_>>(),
        ),
        WhitespaceMode::Ignore => (
            before.iter().map(|l| split_edges(l)).collect(),
            after.iter().map(|l| split_edges(l)).collect(),
        ),
    };

    let joined_before = join_cores(&before_parts);
    let joined_after = join_cores(&after_parts);

    if joined_before.len() > MAX_INTRALINE_LEN || joined_after.len() > MAX_INTRALINE_LEN {
        return whole_line_fallback(before, after);
    }

    let pieces = cleanup(collect_pieces(&joined_before, &joined_after));
    let mut result = distribute(&pieces, before.len(), after.len());

    if mode == WhitespaceMode::Ignore {
        reattach_edges(&mut result.before, &before_parts);
        reattach_edges(&mut result.after, &after_parts);
    }

    result
}

fn split_edges(line: &str) -> (&str, &str, &str) {
    let trimmed_start = line.trim_start();
    let lead = &line[..line.len() - trimmed_start.len()];
    let core = trimmed_start.trim_end();
    let trail = &trimmed_start[core.len()..];
    (lead, core, trail)
}

fn join_cores(parts: &[(&str, &str, &str)]) -> String {
    parts
        .iter()
        .map(|(_, core, _)| *core)
        .collect::<Vec<_>>()
        .join("\n")
}

fn whole_line_fallback(before: &[&str], after: &[&str]) -> IntralineResult {
    IntralineResult {
        before: before
            .iter()
            .map(|l| vec![IntralineSpan::delete(*l)])
            .collect(),
        after: after
            .iter()
            .map(|l| vec![IntralineSpan::insert(*l)])
            .collect(),
    }
}

fn collect_pieces(before: &str, after: &str) -> Vec<Piece> {
    let diff = TextDiff::from_words(before, after);
    let mut pieces: Vec<Piece> = Vec::new();

    for change in diff.iter_all_changes() {
        let value = change.value();
        match change.tag() {
            ChangeTag::Equal => match pieces.last_mut() {
                Some(Piece::Equal(text)) => text.push_str(value),
                _ => pieces.push(Piece::Equal(value.to_string())),
            },
            ChangeTag::Delete => match pieces.last_mut() {
                Some(Piece::Edit { del, .. }) => del.push_str(value),
                _ => pieces.push(Piece::Edit {
                    del: value.to_string(),
                    ins: String::new(),
                }),
            },
            ChangeTag::Insert => match pieces.last_mut() {
                Some(Piece::Edit { ins, .. }) => ins.push_str(value),
                _ => pieces.push(Piece::Edit {
                    del: String::new(),
                    ins: value.to_string(),
                }),
            },
        }
    }

    pieces
}

/// Folds short equal runs sandwiched between edits into the surrounding
/// edit pair, merging the neighbors into one edit.
fn cleanup(mut pieces: Vec<Piece>) -> Vec<Piece> {
    let mut i = 1;
    while i + 1 < pieces.len() {
        let foldable = match (&pieces[i - 1], &pieces[i], &pieces[i + 1]) {
            (Piece::Edit { .. }, Piece::Equal(eq), Piece::Edit { .. }) => {
                is_foldable(eq, &pieces[i - 1], &pieces[i + 1])
            }
            _ => false,
        };

        if foldable {
            let Piece::Edit {
                del: next_del,
                ins: next_ins,
            } = pieces.remove(i + 1)
            else {
                unreachable!()
            };
            let Piece::Equal(eq) = pieces.remove(i) else {
                unreachable!()
            };
            let Piece::Edit { del, ins } = &mut pieces[i - 1] else {
                unreachable!()
            };
            del.push_str(&eq);
            del.push_str(&next_del);
            ins.push_str(&eq);
            ins.push_str(&next_ins);
            // The merged edit may now flank another small equality
            i = i.saturating_sub(1).max(1);
        } else {
            i += 1;
        }
    }
    pieces
}

fn is_foldable(eq: &str, prev: &Piece, next: &Piece) -> bool {
    if eq.contains('\n') || eq.chars().count() > 2 {
        return false;
    }
    if eq.chars().all(|c| !c.is_alphanumeric()) {
        return true;
    }
    let edit_weight = |piece: &Piece| match piece {
        Piece::Edit { del, ins } => del.len().max(ins.len()),
        Piece::Equal(_) => 0,
    };
    eq.len() < edit_weight(prev) && eq.len() < edit_weight(next)
}

fn distribute(pieces: &[Piece], before_lines: usize, after_lines: usize) -> IntralineResult {
    let mut before: Vec<Vec<IntralineSpan>> = vec![Vec::new()];
    let mut after: Vec<Vec<IntralineSpan>> = vec![Vec::new()];

    for piece in pieces {
        match piece {
            Piece::Equal(text) => {
                scatter(text, SpanOp::Equal, &mut before, &mut after);
            }
            Piece::Edit { del, ins } => {
                if !del.is_empty() {
                    scatter(del, SpanOp::Delete, &mut before, &mut after);
                }
                if !ins.is_empty() {
                    scatter(ins, SpanOp::Insert, &mut before, &mut after);
                }
            }
        }
    }

    // Joined input has exactly lines-1 newlines per side, so the bucket
    // counts must match the inputs.
    debug_assert_eq!(before.len(), before_lines);
    debug_assert_eq!(after.len(), after_lines);
    before.resize_with(before_lines, Vec::new);
    after.resize_with(after_lines, Vec::new);

    IntralineResult { before, after }
}

fn scatter(
    text: &str,
    op: SpanOp,
    before: &mut Vec<Vec<IntralineSpan>>,
    after: &mut Vec<Vec<IntralineSpan>>,
) {
    let mut rest = text;
    loop {
        match rest.find('\n') {
            Some(pos) => {
                emit(&rest[..pos], op, before, after);
                if op != SpanOp::Insert {
                    before.push(Vec::new());
                }
                if op != SpanOp::Delete {
                    after.push(Vec::new());
                }
                rest = &rest[pos + 1..];
            }
            None => {
                emit(rest, op, before, after);
                break;
            }
        }
    }
}

fn emit(
    segment: &str,
    op: SpanOp,
    before: &mut [Vec<IntralineSpan>],
    after: &mut [Vec<IntralineSpan>],
) {
    if segment.is_empty() {
        return;
    }
    let span = IntralineSpan {
        op,
        text: segment.to_string(),
    };
    if op != SpanOp::Insert
        && let Some(line) = before.last_mut()
    {
        push_merged(line, span.clone());
    }
    if op != SpanOp::Delete
        && let Some(line) = after.last_mut()
    {
        push_merged(line, span);
    }
}

fn push_merged(line: &mut Vec<IntralineSpan>, span: IntralineSpan) {
    match line.last_mut() {
        Some(last) if last.op == span.op => last.text.push_str(&span.text),
        _ => line.push(span),
    }
}

fn reattach_edges(lines: &mut [Vec<IntralineSpan>], parts: &[(&str, &str, &str)]) {
    for (spans, (lead, _, trail)) in lines.iter_mut().zip(parts.iter()) {
        if !lead.is_empty() {
            spans.insert(0, IntralineSpan::equal(*lead));
        }
        if !trail.is_empty() {
            spans.push(IntralineSpan::equal(*trail));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_changed_word_at_token_boundary() {
        let result = intraline(&["foo bar"], &["foo baz"], WhitespaceMode::Keep);

        assert_eq!(
            result.before,
            vec![vec![
                IntralineSpan::equal("foo "),
                IntralineSpan::delete("bar"),
            ]]
        );
        assert_eq!(
            result.after,
            vec![vec![
                IntralineSpan::equal("foo "),
                IntralineSpan::insert("baz"),
            ]]
        );
    }

    #[test]
    fn is_deterministic() {
        let a = intraline(&["let x = 1;", "call(a, b)"], &["let y = 2;", "call(a, c)"], WhitespaceMode::Keep);
        let b = intraline(&["let x = 1;", "call(a, b)"], &["let y = 2;", "call(a, c)"], WhitespaceMode::Keep);
        assert_eq!(a, b);
    }

    #[test]
    fn folds_short_equalities_between_edits() {
        let result = intraline(&["foo(a, b)"], &["bar(a, c)"], WhitespaceMode::Keep);

        // "foo(a," and "b)" both changed; the single-space equality between
        // them must not survive as an island.
        let has_equal_island = result.before[0]
            .iter()
            .any(|s| s.op == SpanOp::Equal && s.text.trim().is_empty() && !s.text.is_empty());
        assert!(!has_equal_island, "spans: {:?}", result.before[0]);
        assert_eq!(result.before[0], vec![IntralineSpan::delete("foo(a, b)")]);
        assert_eq!(result.after[0], vec![IntralineSpan::insert("bar(a, c)")]);
    }

    #[test]
    fn distributes_across_lines() {
        let result = intraline(&["same", "foo bar"], &["same", "foo baz"], WhitespaceMode::Keep);

        assert_eq!(result.before[0], vec![IntralineSpan::equal("same")]);
        assert_eq!(
            result.before[1],
            vec![IntralineSpan::equal("foo "), IntralineSpan::delete("bar")]
        );
        assert_eq!(
            result.after[1],
            vec![IntralineSpan::equal("foo "), IntralineSpan::insert("baz")]
        );
    }

    #[test]
    fn unbalanced_sides_keep_line_counts() {
        let result = intraline(&["only"], &["only", "extra", "more"], WhitespaceMode::Keep);
        assert_eq!(result.before.len(), 1);
        assert_eq!(result.after.len(), 3);
    }

    #[test]
    fn ignore_mode_diffs_trimmed_content() {
        let result = intraline(&["    foo bar  "], &["\tfoo baz"], WhitespaceMode::Ignore);

        assert_eq!(
            result.before,
            vec![vec![
                IntralineSpan::equal("    "),
                IntralineSpan::equal("foo "),
                IntralineSpan::delete("bar"),
                IntralineSpan::equal("  "),
            ]]
        );
        assert_eq!(
            result.after,
            vec![vec![
                IntralineSpan::equal("\t"),
                IntralineSpan::equal("foo "),
                IntralineSpan::insert("baz"),
            ]]
        );
    }

    #[test]
    fn empty_side_falls_back_to_whole_lines() {
        let result = intraline(&[], &["new line"], WhitespaceMode::Keep);
        assert!(result.before.is_empty());
        assert_eq!(result.after, vec![vec![IntralineSpan::insert("new line")]]);
    }
}
