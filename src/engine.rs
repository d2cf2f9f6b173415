//! The engine owns the parsed models, both layout projections, the comment
//! placements and the context loader, and keeps them consistent across
//! reloads, mode toggles and context expansion.

use std::sync::Arc;

use log::{debug, info};

use crate::comments::{CommentStore, anchor_for_row, resolve};
use crate::context::{ContextLoader, ContextOutcome, EdgeSide, LineSource};
use crate::domain::{
    AnchorKey, CommentAnchor, CommentRecord, DiffChunk, EngineError, FileModel, PendingComment,
    ViewMode, WhitespaceMode,
};
use crate::infra::hash::hash64;
use crate::layout::{InlineLayout, SidewaysLayout};
use crate::model::build;

/// One file of the diff with both of its projections.
///
/// The sideways projection is always re-derived from the inline one, never
/// maintained independently, so the two can not drift apart.
pub struct FileView {
    pub model: FileModel,
    pub inline: InlineLayout,
    pub sideways: SidewaysLayout,
}

impl FileView {
    fn project(model: FileModel) -> Self {
        let inline = InlineLayout::project(&model);
        let sideways = SidewaysLayout::project(&inline);
        Self {
            model,
            inline,
            sideways,
        }
    }

    fn reproject(&mut self) {
        self.inline = InlineLayout::project(&self.model);
        self.sideways = SidewaysLayout::project(&self.inline);
    }
}

/// Where one comment landed after the latest rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentPlacement {
    pub comment: usize,
    pub file: usize,
    /// Inline row index; `None` for file-level comments and for anchors
    /// that resolved nowhere in the current model
    pub row: Option<usize>,
}

#[derive(Default)]
pub struct DiffEngine {
    raw: String,
    last_hash: Option<u64>,
    whitespace: WhitespaceMode,
    view: ViewMode,
    files: Vec<FileView>,
    comments: Vec<CommentRecord>,
    placements: Vec<CommentPlacement>,
    store: CommentStore,
    loader: Arc<ContextLoader>,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[FileView] {
        &self.files
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view
    }

    pub fn whitespace_mode(&self) -> WhitespaceMode {
        self.whitespace
    }

    pub fn comments(&self) -> &[CommentRecord] {
        &self.comments
    }

    pub fn placements(&self) -> &[CommentPlacement] {
        &self.placements
    }

    pub fn store(&self) -> &CommentStore {
        &self.store
    }

    pub fn loader(&self) -> &Arc<ContextLoader> {
        &self.loader
    }

    /// Parses `text` into per-file models and projects both layouts.
    ///
    /// Returns `false` without touching anything when `text` hashes the
    /// same as the diff already loaded. A rebuild invalidates in-flight
    /// context fetches and re-places every comment; comment drafts and
    /// collapse state survive, keyed by anchor.
    pub fn load_diff(&mut self, text: &str) -> Result<bool, EngineError> {
        let hash = hash64(text);
        if self.last_hash == Some(hash) {
            debug!("diff unchanged ({hash:#x}), keeping current models");
            return Ok(false);
        }
        let models = build(text, self.whitespace)?;
        for model in &models {
            validate(model)?;
        }
        info!("built diff models for {} file(s)", models.len());
        self.raw = text.to_string();
        self.last_hash = Some(hash);
        self.files = models.into_iter().map(FileView::project).collect();
        self.loader.bump_epoch();
        self.place_comments();
        Ok(true)
    }

    /// Recomputes intra-line spans under the new mode. Line-level rows and
    /// therefore anchors are unaffected.
    pub fn set_whitespace_mode(&mut self, mode: WhitespaceMode) -> Result<(), EngineError> {
        if self.whitespace == mode {
            return Ok(());
        }
        self.whitespace = mode;
        if self.last_hash.is_some() {
            self.last_hash = None;
            let raw = std::mem::take(&mut self.raw);
            self.load_diff(&raw)?;
        }
        Ok(())
    }

    /// Both projections are always up to date, so switching is only a
    /// matter of which one callers render.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view = mode;
    }

    pub fn set_comments(&mut self, comments: Vec<CommentRecord>) {
        self.comments = comments;
        self.place_comments();
    }

    /// Drops the loaded diff and all comment state.
    pub fn reset(&mut self) {
        self.raw.clear();
        self.last_hash = None;
        self.files.clear();
        self.comments.clear();
        self.placements.clear();
        self.store.clear();
        self.loader.bump_epoch();
    }

    /// The anchor a new comment on this inline row would store, with the
    /// content fingerprint captured from the current rows.
    pub fn anchor_at(&self, file: usize, row: usize) -> Option<CommentAnchor> {
        let view = self.files.get(file)?;
        anchor_for_row(view.model.anchor_path(), &view.inline.rows, row)
    }

    pub fn save_draft(&mut self, key: &AnchorKey, draft: PendingComment) {
        self.store.upsert_pending(key, draft);
    }

    pub fn take_draft(&mut self, key: &AnchorKey) -> Option<PendingComment> {
        let draft = self.store.take_pending(key);
        self.store.prune();
        draft
    }

    pub fn set_collapsed(&mut self, key: &AnchorKey, collapsed: bool) {
        self.store.set_collapsed(key, collapsed);
    }

    /// Expands unchanged lines at one hunk boundary, then re-projects the
    /// file and re-places comments if anything changed.
    pub async fn request_more_context(
        &mut self,
        file: usize,
        meta_index: usize,
        side: EdgeSide,
        source: &dyn LineSource,
    ) -> Result<ContextOutcome, EngineError> {
        let loader = self.loader.clone();
        let view = self
            .files
            .get_mut(file)
            .ok_or_else(|| EngineError::Invariant(format!("no file at index {file}")))?;
        let outcome = loader
            .request_more_context(&mut view.model, meta_index, side, source)
            .await?;
        if outcome == ContextOutcome::Expanded {
            view.reproject();
            self.place_comments();
        }
        Ok(outcome)
    }

    /// Reveals the whole file around the hunks of `file`.
    pub async fn request_full_file(
        &mut self,
        file: usize,
        source: &dyn LineSource,
    ) -> Result<ContextOutcome, EngineError> {
        let loader = self.loader.clone();
        let view = self
            .files
            .get_mut(file)
            .ok_or_else(|| EngineError::Invariant(format!("no file at index {file}")))?;
        let outcome = loader.request_full_file(&mut view.model, source).await?;
        if outcome == ContextOutcome::Expanded {
            view.reproject();
            self.place_comments();
        }
        Ok(outcome)
    }

    fn place_comments(&mut self) {
        self.placements.clear();
        for (ci, comment) in self.comments.iter().enumerate() {
            let Some(fi) = self
                .files
                .iter()
                .position(|v| v.model.anchor_path() == comment.anchor.file)
            else {
                continue;
            };
            let row = match comment.anchor.key() {
                AnchorKey::File => None,
                AnchorKey::Line { .. } => {
                    resolve(&comment.anchor, &self.files[fi].inline.rows)
                }
            };
            self.placements.push(CommentPlacement {
                comment: ci,
                file: fi,
                row,
            });
        }
    }
}

/// Model-level invariants the rest of the engine relies on.
fn validate(model: &FileModel) -> Result<(), EngineError> {
    for chunk in &model.chunks {
        if let DiffChunk::Edit(edit) = chunk
            && edit.deletes.is_empty()
            && edit.adds.is_empty()
        {
            return Err(EngineError::Invariant(format!(
                "edit chunk with no rows in {}",
                model.anchor_path()
            )));
        }
    }
    Ok(())
}
