//! Pane measurement and synchronized scrolling.
//!
//! Visible panes are measured for natural content width; in dual-pane mode
//! the proxy scrollbar spans the wider of the two. While a scroll is in
//! progress exactly one pane is the master and its offset is propagated to
//! the paired panes; another pane may only claim mastery after the current
//! one releases.

use super::LayoutRow;

/// Widest row text of a pane, in characters.
pub fn natural_width<'a>(rows: impl IntoIterator<Item = &'a LayoutRow>) -> usize {
    rows.into_iter()
        .map(|r| r.text.chars().count())
        .max()
        .unwrap_or(0)
}

/// Proxy scrollbar width for a dual-pane view.
pub fn proxy_scrollbar_width(left_width: usize, right_width: usize) -> usize {
    left_width.max(right_width)
}

/// Identifier of a scrollable pane.
pub type PaneId = usize;

/// One-master scroll propagation.
#[derive(Debug, Default)]
pub struct ScrollSync {
    master: Option<PaneId>,
    offset: f64,
}

impl ScrollSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims mastery for `pane`. Returns false while a different pane is
    /// still scrolling.
    pub fn begin(&mut self, pane: PaneId) -> bool {
        match self.master {
            None => {
                self.master = Some(pane);
                true
            }
            Some(current) => current == pane,
        }
    }

    /// Records the master's offset and returns the offset the paired panes
    /// must follow, or `None` when `pane` is not the master.
    pub fn scroll(&mut self, pane: PaneId, offset: f64) -> Option<f64> {
        if self.master == Some(pane) {
            self.offset = offset;
            Some(offset)
        } else {
            None
        }
    }

    /// Releases mastery; a no-op for non-masters.
    pub fn end(&mut self, pane: PaneId) {
        if self.master == Some(pane) {
            self.master = None;
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutRow, RowKind};

    fn row(text: &str) -> LayoutRow {
        LayoutRow {
            kind: RowKind::Same,
            marker: None,
            left_number: Some(1),
            right_number: Some(1),
            text: text.to_string(),
            spans: None,
            chunk: 0,
            is_full_context: false,
            is_additional_context: false,
        }
    }

    #[test]
    fn width_is_max_over_rows() {
        let rows = vec![row("ab"), row("abcdef"), row("abc")];
        assert_eq!(natural_width(&rows), 6);
        assert_eq!(proxy_scrollbar_width(natural_width(&rows), 3), 6);
    }

    #[test]
    fn only_one_master_at_a_time() {
        let mut sync = ScrollSync::new();
        assert!(sync.begin(0));
        assert!(!sync.begin(1));
        assert_eq!(sync.scroll(0, 42.0), Some(42.0));
        assert_eq!(sync.scroll(1, 7.0), None);

        sync.end(1); // non-master release is a no-op
        assert!(!sync.begin(1));

        sync.end(0);
        assert!(sync.begin(1));
    }
}
