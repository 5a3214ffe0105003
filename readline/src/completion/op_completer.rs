// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Modal completion engine.
//!
//! ```text
//!          trigger (fresh query,           trigger (buffer unchanged)
//!          several candidates)
//! ┌──────┐ ──────────────────▶ ┌──────────────┐ ─────────────────▶ ┌────────────────────┐
//! │ Idle │                      │ CompleteMode │                    │ CompleteSelectMode │
//! └──────┘ ◀────────────────── └──────────────┘ ◀───────────────── └────────────────────┘
//!          commit / abort /                       Backspace, other key
//!          zero candidates
//! ```
//!
//! The engine is driven by a single control context. It never reads keys on its own: the
//! dispatcher calls [`OpCompleter::on_complete`] for the completion key, and
//! [`OpCompleter::handle_complete_select`] for every key while
//! [`OpCompleter::is_in_complete_select_mode`] is true.

use crate::{CLEAR_TO_END_OF_SCREEN, DEFAULT_FG, DIM_FG_ON, InlineVec, LineBuffer, LogicalKey,
            REVERSE_VIDEO_ON, Runes, SGR_RESET, SafeAutoComplete, aggregate,
            cursor_right_str, cursor_up_and_home_str, runes_width};
use std::{fmt::{Debug, Formatter},
          io::Write};
use strum_macros::Display;

/// Used when the terminal size can't be queried.
pub const DEFAULT_TERMINAL_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CompletionMode {
    Idle,
    Complete,
    CompleteSelect,
}

/// What the dispatcher should do after handing a key to
/// [`OpCompleter::handle_complete_select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Key consumed, still selecting.
    Continue,
    /// Key consumed, completion is over (committed or aborted).
    Finished,
    /// Select mode was left. The key must be processed as a normal edit.
    Reprocess,
}

/// Read-only view of the engine's modal state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// In `CompleteMode` (or its select sub-mode).
    pub active: bool,
    /// In `CompleteSelectMode`. Implies `active`.
    pub selecting: bool,
    pub candidates: InlineVec<Runes>,
    /// Same length as `candidates`.
    pub comments: InlineVec<Runes>,
    /// Always a valid index into `candidates` when set.
    pub chosen_index: Option<usize>,
    /// The line as it was when the provider was last queried.
    pub source_snapshot: Option<Runes>,
    /// How many runes before the cursor the candidates share with the line.
    pub common_offset: usize,
    /// Grid columns from the last refresh. 0 if not even one column fits.
    pub columns: usize,
}

pub struct OpCompleter {
    provider: SafeAutoComplete,
    width: usize,
    state: SelectionState,
}

impl Debug for OpCompleter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpCompleter")
            .field("width", &self.width)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl OpCompleter {
    pub fn new(provider: SafeAutoComplete, width: usize) -> Self {
        Self {
            provider,
            width,
            state: SelectionState::default(),
        }
    }

    /// Uses the current width of the terminal.
    pub fn new_with_terminal_width(provider: SafeAutoComplete) -> Self {
        let width = crossterm::terminal::size()
            .map_or(DEFAULT_TERMINAL_WIDTH, |(columns, _rows)| usize::from(columns));
        Self::new(provider, width)
    }

    pub fn on_width_change(&mut self, new_width: usize) { self.width = new_width; }

    #[must_use]
    pub fn width(&self) -> usize { self.width }

    #[must_use]
    pub fn is_in_complete_mode(&self) -> bool { self.state.active }

    #[must_use]
    pub fn is_in_complete_select_mode(&self) -> bool { self.state.selecting }

    #[must_use]
    pub fn mode(&self) -> CompletionMode {
        match (self.state.active, self.state.selecting) {
            (_, true) => CompletionMode::CompleteSelect,
            (true, false) => CompletionMode::Complete,
            (false, false) => CompletionMode::Idle,
        }
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionState { &self.state }

    /// The completion key was pressed. Returns `false` (and does nothing) when the
    /// terminal width is unknown.
    ///
    /// Calling this while in `CompleteMode` after the line was edited re-queries the
    /// provider and refreshes the grid, without the single candidate and common prefix
    /// shortcuts.
    ///
    /// # Errors
    ///
    /// If writing the candidate grid to `out` fails.
    pub fn on_complete(
        &mut self,
        buf: &mut dyn LineBuffer,
        out: &mut dyn Write,
    ) -> std::io::Result<bool> {
        if self.width == 0 {
            return Ok(false);
        }

        if self.state.selecting {
            self.do_select(buf, out)?;
            return Ok(true);
        }

        let line = buf.runes();

        if self.state.active && self.state.source_snapshot.as_deref() == Some(line.as_slice()) {
            self.enter_complete_select_mode(buf, out)?;
            self.do_select(buf, out)?;
            return Ok(true);
        }

        self.exit_complete_select_mode();
        let mut completion = self.provider.complete(&line, buf.cursor_offset());
        completion.normalize_comments();
        self.state.source_snapshot = Some(line);

        if completion.candidates.is_empty() {
            self.exit_complete_mode(false);
            return Ok(true);
        }

        if !self.state.active {
            if let [single] = completion.candidates.as_slice() {
                buf.write_runes(single);
                self.exit_complete_mode(false);
                return Ok(true);
            }

            let same = aggregate(&completion.candidates);
            if !same.is_empty() {
                buf.write_runes(&same);
                self.exit_complete_mode(false);
                return Ok(true);
            }
        }

        self.enter_complete_mode(
            completion.offset,
            completion.candidates,
            completion.comments,
            buf,
            out,
        )?;
        Ok(true)
    }

    /// Handle a key while in `CompleteSelectMode`.
    ///
    /// # Errors
    ///
    /// If writing the candidate grid to `out` fails.
    #[allow(clippy::cast_possible_wrap)]
    pub fn handle_complete_select(
        &mut self,
        key: LogicalKey,
        buf: &mut dyn LineBuffer,
        out: &mut dyn Write,
    ) -> std::io::Result<SelectOutcome> {
        if !self.state.selecting {
            return Ok(SelectOutcome::Reprocess);
        }

        let len = self.state.candidates.len() as isize;
        let columns = self.state.columns.max(1) as isize;
        let chosen = self.state.chosen_index.unwrap_or(0) as isize;

        match key {
            LogicalKey::Enter | LogicalKey::CtrlJ => {
                if let Some(candidate) = self.chosen_candidate() {
                    buf.write_runes(&candidate);
                }
                self.exit_complete_mode(false);
                return Ok(SelectOutcome::Finished);
            }
            LogicalKey::LineStart => self.next_candidate(-(chosen % columns)),
            LogicalKey::LineEnd => {
                let row_end = chosen + columns - chosen % columns - 1;
                self.set_chosen(row_end.min(len - 1));
            }
            LogicalKey::Backspace => {
                self.exit_complete_select_mode();
                return Ok(SelectOutcome::Reprocess);
            }
            LogicalKey::Tab | LogicalKey::Forward => {
                self.do_select(buf, out)?;
                if !self.state.active {
                    return Ok(SelectOutcome::Finished);
                }
            }
            LogicalKey::Bell | LogicalKey::Interrupt => {
                self.exit_complete_mode(true);
                return Ok(SelectOutcome::Finished);
            }
            LogicalKey::Next => {
                let matrix = self.matrix_size() as isize;
                let mut target = chosen + columns;
                if target >= matrix {
                    target -= matrix;
                } else if target >= len {
                    target += columns - matrix;
                }
                self.set_chosen(target);
            }
            LogicalKey::Backward => self.next_candidate(-1),
            LogicalKey::Prev => {
                let matrix = self.matrix_size() as isize;
                let mut target = chosen - columns;
                if target < 0 {
                    target += matrix;
                    if target >= len {
                        target -= columns;
                    }
                }
                self.set_chosen(target);
            }
            _ => {
                self.exit_complete_select_mode();
                return Ok(SelectOutcome::Reprocess);
            }
        }

        self.complete_refresh(buf, out)?;
        Ok(SelectOutcome::Continue)
    }

    /// Redraw the candidate grid below the line, then put the cursor back where it was.
    /// No-op outside of `CompleteMode`.
    ///
    /// # Errors
    ///
    /// If writing to `out` fails.
    pub fn complete_refresh(
        &mut self,
        buf: &dyn LineBuffer,
        out: &mut dyn Write,
    ) -> std::io::Result<()> {
        if !self.state.active {
            return Ok(());
        }

        let line_count = buf.cursor_line_count();
        let same = buf.slice_before_cursor(self.state.common_offset);
        let same_width = runes_width(&same);

        let widest = self
            .state
            .candidates
            .iter()
            .zip(self.state.comments.iter())
            .map(|(candidate, comment)| runes_width(candidate) + runes_width(comment))
            .max()
            .unwrap_or(0);
        let mut column_width = widest + self.state.common_offset + 1;

        // Never write into the last column.
        let usable_width = self.width.saturating_sub(1);
        let columns = usable_width / column_width;
        if columns != 0 {
            column_width += (usable_width - column_width * columns) / columns;
        }
        self.state.columns = columns;

        let mut acc = "\n".repeat(line_count);
        acc.push_str(CLEAR_TO_END_OF_SCREEN);

        let mut column_index = 0;
        let mut lines = 1;
        for (index, (candidate, comment)) in self
            .state
            .candidates
            .iter()
            .zip(self.state.comments.iter())
            .enumerate()
        {
            let is_chosen = self.state.selecting && self.state.chosen_index == Some(index);
            if is_chosen {
                acc.push_str(REVERSE_VIDEO_ON);
            }
            acc.extend(same.iter());
            acc.extend(candidate.iter());
            if !comment.is_empty() {
                acc.push_str(DIM_FG_ON);
                acc.extend(comment.iter());
                acc.push_str(DEFAULT_FG);
            }
            let used = runes_width(candidate) + same_width + runes_width(comment);
            acc.push_str(&" ".repeat(column_width.saturating_sub(used)));
            if is_chosen {
                acc.push_str(SGR_RESET);
            }

            column_index += 1;
            if column_index == columns {
                acc.push('\n');
                lines += 1;
                column_index = 0;
            }
        }

        acc.push_str(&cursor_up_and_home_str((line_count + lines).saturating_sub(1)));
        acc.push_str(&cursor_right_str(
            buf.cursor_offset() + buf.prompt_display_width(),
        ));

        out.write_all(acc.as_bytes())?;
        out.flush()
    }

    /// # Errors
    ///
    /// If writing the candidate grid to `out` fails.
    pub fn enter_complete_mode(
        &mut self,
        offset: usize,
        candidates: InlineVec<Runes>,
        mut comments: InlineVec<Runes>,
        buf: &dyn LineBuffer,
        out: &mut dyn Write,
    ) -> std::io::Result<()> {
        comments.resize(candidates.len(), Runes::new());
        tracing::debug!(
            message = "enter complete mode",
            candidates = candidates.len(),
            offset = offset
        );
        self.state.active = true;
        self.state.candidates = candidates;
        self.state.comments = comments;
        self.state.common_offset = offset;
        self.complete_refresh(buf, out)
    }

    /// # Errors
    ///
    /// If writing the candidate grid to `out` fails.
    pub fn enter_complete_select_mode(
        &mut self,
        buf: &dyn LineBuffer,
        out: &mut dyn Write,
    ) -> std::io::Result<()> {
        tracing::debug!(message = "enter complete select mode");
        self.state.selecting = true;
        self.state.chosen_index = None;
        self.complete_refresh(buf, out)
    }

    /// Leave the select sub-mode. The grid stays (still in `CompleteMode`), but the
    /// next trigger will query the provider again.
    pub fn exit_complete_select_mode(&mut self) {
        self.state.selecting = false;
        self.state.chosen_index = None;
        self.state.source_snapshot = None;
    }

    /// Leave completion entirely. `is_abort` is only used for logging.
    pub fn exit_complete_mode(&mut self, is_abort: bool) {
        if self.state.active {
            tracing::debug!(message = "exit complete mode", is_abort = is_abort);
        }
        self.state = SelectionState::default();
    }

    fn do_select(&mut self, buf: &mut dyn LineBuffer, out: &mut dyn Write) -> std::io::Result<()> {
        if let [single] = self.state.candidates.as_slice() {
            let single = single.clone();
            buf.write_runes(&single);
            self.exit_complete_mode(false);
            return Ok(());
        }
        self.next_candidate(1);
        self.complete_refresh(buf, out)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn next_candidate(&mut self, delta: isize) {
        let len = self.state.candidates.len() as isize;
        if len == 0 {
            return;
        }
        let current = self.state.chosen_index.map_or(-1, |it| it as isize);
        self.set_chosen((current + delta).rem_euclid(len));
    }

    fn set_chosen(&mut self, index: isize) {
        let last = self.state.candidates.len().saturating_sub(1);
        self.state.chosen_index = Some(usize::try_from(index).unwrap_or(0).min(last));
    }

    fn chosen_candidate(&self) -> Option<Runes> {
        self.state
            .chosen_index
            .and_then(|index| self.state.candidates.get(index))
            .cloned()
    }

    /// Cells in the smallest `rows x columns` rectangle that holds every candidate.
    fn matrix_size(&self) -> usize {
        let columns = self.state.columns.max(1);
        self.state.candidates.len().div_ceil(columns) * columns
    }
}
