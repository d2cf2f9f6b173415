//! Incremental and full-file context expansion around diff hunks.
//!
//! All model mutation happens on the caller's thread; the loader only
//! tracks fetch state, the file cache and the current epoch, so it can be
//! shared behind an `Arc`. A fetch whose epoch no longer matches the
//! loader's is discarded whole (`Stale`); a fetch for an edge that is
//! already in flight is refused (`Busy`). Splices are all-or-nothing: a
//! bounded range that comes back with holes changes nothing.

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use lru::LruCache;
use parking_lot::Mutex;

use crate::domain::{
    ContextEdge, ContextError, DiffChunk, DiffLine, FileModel, HunkHeader, MetaChunk,
};

use super::source::{LineSource, split_file_lines};

/// Lines requested per step when expanding past the last hunk, where no
/// neighbor bounds the range and the file length is still unknown.
pub const CONTEXT_STEP: u32 = 20;

const FILE_CACHE_SIZE: usize = 16;

/// Which boundary of a hunk to expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSide {
    Before,
    After,
}

/// What a context request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextOutcome {
    /// New rows were spliced into the model
    Expanded,
    /// Nothing left to reveal at this edge
    AlreadyComplete,
    /// A fetch for the same edge is still in flight
    Busy,
    /// The epoch changed while fetching; the result was discarded
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchState {
    Idle,
    InFlight,
    Loaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FetchKey {
    Edge { file: String, chunk: usize },
    File { file: String },
}

/// The gap of unchanged left-side lines at one hunk boundary, with the
/// offset that maps them to right-side numbers.
struct Gap {
    lo: u32,
    hi: u32,
    /// A neighbor or the file start closes this range; an unbounded gap is
    /// a probe past the last hunk and may come back short at EOF
    bounded: bool,
    delta: i64,
}

impl Gap {
    fn right(&self, left: u32) -> u32 {
        (left as i64 + self.delta) as u32
    }
}

pub struct ContextLoader {
    states: Mutex<HashMap<FetchKey, FetchState>>,
    files: Mutex<LruCache<String, Arc<Vec<String>>>>,
    epoch: AtomicU64,
}

impl Default for ContextLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextLoader {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            files: Mutex::new(LruCache::new(
                NonZeroUsize::new(FILE_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            )),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Invalidates every in-flight fetch. Called whenever the model set is
    /// rebuilt (mode toggles, new diff) so late results cannot splice into
    /// a model they were not computed for.
    pub fn bump_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Reveals the unchanged lines at one boundary of the hunk at
    /// `meta_index`.
    ///
    /// The range is bounded by the neighboring hunk or the file start; past
    /// the last hunk it probes [`CONTEXT_STEP`] lines at a time until EOF.
    /// Fetched rows are spliced as `Same` lines flagged
    /// `is_additional_context`, the hunk header grows to cover them, and a
    /// boundary that converged is marked `Exhausted` on both facing edges.
    pub async fn request_more_context(
        &self,
        model: &mut FileModel,
        meta_index: usize,
        side: EdgeSide,
        source: &dyn LineSource,
    ) -> Result<ContextOutcome, ContextError> {
        let file = model.anchor_path().to_string();
        let meta = meta_chunk(model, meta_index).ok_or_else(|| ContextError::NotExpandable {
            file: file.clone(),
            hunk: meta_index,
        })?;
        let edge = match side {
            EdgeSide::Before => meta.before_edge,
            EdgeSide::After => meta.after_edge,
        };
        if edge == ContextEdge::Exhausted {
            return Ok(ContextOutcome::AlreadyComplete);
        }

        let Some(gap) = compute_gap(model, meta_index, side, &file)? else {
            exhaust_edge(model, meta_index, side);
            return Ok(ContextOutcome::AlreadyComplete);
        };

        let key = FetchKey::Edge {
            file: file.clone(),
            chunk: meta_index,
        };
        if !self.begin_fetch(&key) {
            return Ok(ContextOutcome::Busy);
        }
        let epoch = self.epoch();
        let range = (gap.right(gap.lo), gap.right(gap.hi));
        let fetched = source.fetch_ranges(&file, &[range]).await;
        if self.epoch() != epoch {
            self.finish_fetch(&key, false);
            debug!("discarding stale context fetch for {file} (hunk {meta_index})");
            return Ok(ContextOutcome::Stale);
        }
        let map = match fetched {
            Ok(map) => map,
            Err(err) => {
                self.finish_fetch(&key, false);
                return Err(map_source_error(&file, err));
            }
        };
        let result = splice_edge(model, meta_index, side, &gap, &map);
        self.finish_fetch(&key, result.is_ok());
        result
    }

    /// Reveals the whole file around the hunks in one shot.
    ///
    /// Every gap bounded by parsable hunk headers plus the head and tail of
    /// the file is backfilled with `Same` lines flagged `is_full_context`,
    /// and every edge is marked `Exhausted`, so the call is idempotent. A
    /// hunk whose header did not parse is skipped; its edges were already
    /// exhausted at build time. The file text is kept in an LRU cache
    /// across calls.
    pub async fn request_full_file(
        &self,
        model: &mut FileModel,
        source: &dyn LineSource,
    ) -> Result<ContextOutcome, ContextError> {
        let file = model.anchor_path().to_string();
        let metas = model.meta_indices();
        if metas.is_empty() {
            return Ok(ContextOutcome::AlreadyComplete);
        }
        if metas
            .iter()
            .all(|&i| meta_chunk(model, i).is_some_and(MetaChunk::all_context_loaded))
        {
            return Ok(ContextOutcome::AlreadyComplete);
        }

        let key = FetchKey::File { file: file.clone() };
        if !self.begin_fetch(&key) {
            return Ok(ContextOutcome::Busy);
        }
        let epoch = self.epoch();
        let fetched = self.cached_file(&file, source).await;
        if self.epoch() != epoch {
            self.finish_fetch(&key, false);
            debug!("discarding stale full-file fetch for {file}");
            return Ok(ContextOutcome::Stale);
        }
        let lines = match fetched {
            Ok(lines) => lines,
            Err(err) => {
                self.finish_fetch(&key, false);
                return Err(map_source_error(&file, err));
            }
        };
        let outcome = splice_full(model, &lines);
        self.finish_fetch(&key, true);
        Ok(outcome)
    }

    async fn cached_file(
        &self,
        path: &str,
        source: &dyn LineSource,
    ) -> anyhow::Result<Arc<Vec<String>>> {
        if let Some(hit) = self.files.lock().get(path) {
            return Ok(hit.clone());
        }
        let text = source.fetch_file(path).await?;
        let lines = Arc::new(split_file_lines(&text));
        self.files.lock().put(path.to_string(), lines.clone());
        Ok(lines)
    }

    fn begin_fetch(&self, key: &FetchKey) -> bool {
        let mut states = self.states.lock();
        if matches!(states.get(key), Some(FetchState::InFlight)) {
            return false;
        }
        states.insert(key.clone(), FetchState::InFlight);
        true
    }

    fn finish_fetch(&self, key: &FetchKey, loaded: bool) {
        let state = if loaded {
            FetchState::Loaded
        } else {
            FetchState::Idle
        };
        self.states.lock().insert(key.clone(), state);
    }
}

fn meta_chunk(model: &FileModel, index: usize) -> Option<&MetaChunk> {
    match model.chunks.get(index) {
        Some(DiffChunk::Meta(meta)) => Some(meta),
        _ => None,
    }
}

fn meta_chunk_mut(model: &mut FileModel, index: usize) -> Option<&mut MetaChunk> {
    match model.chunks.get_mut(index) {
        Some(DiffChunk::Meta(meta)) => Some(meta),
        _ => None,
    }
}

fn neighbor(model: &FileModel, meta_index: usize, side: EdgeSide) -> Option<usize> {
    let metas = model.meta_indices();
    let pos = metas.iter().position(|&i| i == meta_index)?;
    match side {
        EdgeSide::Before => pos.checked_sub(1).map(|p| metas[p]),
        EdgeSide::After => metas.get(pos + 1).copied(),
    }
}

/// The still-hidden left-side line range at one edge of a hunk, or `None`
/// when the edge has already converged. A neighboring hunk without a
/// parsable header yields `None` too: there is no safe bound to expand to.
fn compute_gap(
    model: &FileModel,
    meta_index: usize,
    side: EdgeSide,
    file: &str,
) -> Result<Option<Gap>, ContextError> {
    let header = meta_chunk(model, meta_index)
        .and_then(|m| m.header)
        .ok_or_else(|| ContextError::NotExpandable {
            file: file.to_string(),
            hunk: meta_index,
        })?;
    let neighbor_header =
        neighbor(model, meta_index, side).map(|i| meta_chunk(model, i).and_then(|m| m.header));

    match side {
        EdgeSide::Before => {
            if header.left_start <= 1 {
                return Ok(None);
            }
            let hi = header.left_start - 1;
            let lo = match neighbor_header {
                Some(Some(prev)) => prev.left_end() + 1,
                Some(None) => return Ok(None),
                None => 1,
            };
            if lo > hi {
                return Ok(None);
            }
            Ok(Some(Gap {
                lo,
                hi,
                bounded: true,
                delta: header.right_start as i64 - header.left_start as i64,
            }))
        }
        EdgeSide::After => {
            let lo = header.left_end() + 1;
            let delta = header.right_end() as i64 - header.left_end() as i64;
            match neighbor_header {
                Some(Some(next)) => {
                    if next.left_start <= lo {
                        return Ok(None);
                    }
                    Ok(Some(Gap {
                        lo,
                        hi: next.left_start - 1,
                        bounded: true,
                        delta,
                    }))
                }
                Some(None) => Ok(None),
                None => Ok(Some(Gap {
                    lo,
                    hi: lo + CONTEXT_STEP - 1,
                    bounded: false,
                    delta,
                })),
            }
        }
    }
}

fn exhaust_edge(model: &mut FileModel, meta_index: usize, side: EdgeSide) {
    let facing = neighbor(model, meta_index, side);
    if let Some(meta) = meta_chunk_mut(model, meta_index) {
        match side {
            EdgeSide::Before => meta.before_edge = ContextEdge::Exhausted,
            EdgeSide::After => meta.after_edge = ContextEdge::Exhausted,
        }
    }
    if let Some(other) = facing
        && let Some(meta) = meta_chunk_mut(model, other)
    {
        match side {
            EdgeSide::Before => meta.after_edge = ContextEdge::Exhausted,
            EdgeSide::After => meta.before_edge = ContextEdge::Exhausted,
        }
    }
}

fn splice_edge(
    model: &mut FileModel,
    meta_index: usize,
    side: EdgeSide,
    gap: &Gap,
    map: &BTreeMap<u32, String>,
) -> Result<ContextOutcome, ContextError> {
    let requested = (gap.hi - gap.lo + 1) as usize;
    let mut rows = Vec::with_capacity(requested);
    for left in gap.lo..=gap.hi {
        match map.get(&gap.right(left)) {
            Some(text) => {
                let mut line = DiffLine::same(left, gap.right(left), text.clone());
                line.is_additional_context = true;
                rows.push(line);
            }
            None if gap.bounded => {
                return Err(ContextError::Transport {
                    file: model.anchor_path().to_string(),
                    message: format!("line {} missing from fetched range", gap.right(left)),
                });
            }
            // Unbounded probe ran past EOF; keep the contiguous prefix
            None => break,
        }
    }
    let n = rows.len();
    let eof = !gap.bounded && n < requested;
    let right_lo = gap.right(gap.lo);

    if n > 0 {
        debug!(
            "expanded {n} context lines {} hunk {meta_index} of {}",
            match side {
                EdgeSide::Before => "before",
                EdgeSide::After => "after",
            },
            model.anchor_path()
        );
        match side {
            EdgeSide::Before => prepend_rows_at(&mut model.chunks, meta_index + 1, rows),
            EdgeSide::After => {
                let at = neighbor(model, meta_index, EdgeSide::After)
                    .unwrap_or(model.chunks.len());
                append_rows_at(&mut model.chunks, at, rows);
            }
        }
        if let Some(meta) = meta_chunk_mut(model, meta_index)
            && let Some(header) = meta.header.as_mut()
        {
            if side == EdgeSide::Before {
                header.left_start = gap.lo;
                header.right_start = right_lo;
            }
            header.left_len += n as u32;
            header.right_len += n as u32;
            meta.line.text = rewrite_header_line(&meta.line.text, header);
        }
    }

    if gap.bounded || eof {
        exhaust_edge(model, meta_index, side);
    }
    Ok(if n > 0 {
        ContextOutcome::Expanded
    } else {
        ContextOutcome::AlreadyComplete
    })
}

fn splice_full(model: &mut FileModel, file_lines: &[String]) -> ContextOutcome {
    struct Slot {
        meta_index: usize,
        header: HunkHeader,
    }
    let slots: Vec<Slot> = model
        .meta_indices()
        .into_iter()
        .filter_map(|i| {
            meta_chunk(model, i).and_then(|m| {
                m.header.map(|header| Slot {
                    meta_index: i,
                    header,
                })
            })
        })
        .collect();
    let mut inserted = false;

    let full_rows = |lo_r: u32, hi_r: u32, delta: i64| -> Vec<DiffLine> {
        (lo_r..=hi_r)
            .filter_map(|right| {
                file_lines.get(right as usize - 1).map(|text| {
                    let mut line =
                        DiffLine::same((right as i64 - delta) as u32, right, text.clone());
                    line.is_full_context = true;
                    line
                })
            })
            .collect()
    };

    // Tail first, then gaps back to front, so chunk indices stay valid
    // while splicing.
    if let Some(last) = slots.last() {
        let delta = last.header.right_end() as i64 - last.header.left_end() as i64;
        let rows = full_rows(last.header.right_end() + 1, file_lines.len() as u32, delta);
        if !rows.is_empty() {
            let at = model.chunks.len();
            append_rows_at(&mut model.chunks, at, rows);
            inserted = true;
        }
    }
    for (k, slot) in slots.iter().enumerate().rev() {
        let lo_r = if k == 0 {
            1
        } else {
            slots[k - 1].header.right_end() + 1
        };
        let hi_r = slot.header.right_start.saturating_sub(1);
        if lo_r > hi_r {
            continue;
        }
        let delta = slot.header.right_start as i64 - slot.header.left_start as i64;
        let rows = full_rows(lo_r, hi_r, delta);
        if !rows.is_empty() {
            prepend_rows_at(&mut model.chunks, slot.meta_index + 1, rows);
            inserted = true;
        }
    }

    for i in model.meta_indices() {
        if let Some(meta) = meta_chunk_mut(model, i) {
            meta.before_edge = ContextEdge::Exhausted;
            meta.after_edge = ContextEdge::Exhausted;
        }
    }
    if inserted {
        ContextOutcome::Expanded
    } else {
        ContextOutcome::AlreadyComplete
    }
}

/// Inserts `rows` so they render just before `chunks[at]`, merging into an
/// adjacent `Same` run rather than leaving two runs side by side.
fn prepend_rows_at(chunks: &mut Vec<DiffChunk>, at: usize, rows: Vec<DiffLine>) {
    if let Some(DiffChunk::Same(existing)) = chunks.get_mut(at) {
        existing.splice(0..0, rows);
    } else {
        chunks.insert(at.min(chunks.len()), DiffChunk::Same(rows));
    }
}

/// Inserts `rows` so they render just before `chunks[at]`, merging into a
/// preceding `Same` run when one ends there.
fn append_rows_at(chunks: &mut Vec<DiffChunk>, at: usize, rows: Vec<DiffLine>) {
    if at > 0 && let Some(DiffChunk::Same(existing)) = chunks.get_mut(at - 1) {
        existing.extend(rows);
    } else {
        chunks.insert(at.min(chunks.len()), DiffChunk::Same(rows));
    }
}

fn rewrite_header_line(old: &str, header: &HunkHeader) -> String {
    // Keep any section heading the original header carried after its
    // second `@@`.
    let suffix = old.splitn(3, "@@").nth(2).unwrap_or("");
    format!(
        "@@ -{},{} +{},{} @@{}",
        header.left_start, header.left_len, header.right_start, header.right_len, suffix
    )
}

fn map_source_error(file: &str, err: anyhow::Error) -> ContextError {
    if let Some(io) = err.downcast_ref::<std::io::Error>()
        && io.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ContextError::NotPermitted {
            file: file.to_string(),
        };
    }
    ContextError::Transport {
        file: file.to_string(),
        message: format!("{err:#}"),
    }
}
