use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::model::Filter;
use crate::remote::RemoteClient;
use crate::service::CollectionService;
use crate::session::{ApplyOutcome, BatchOp, Session, execute};
use crate::workspace::Workspace;

use super::input::Input;
use super::log::{EntryKind, LogEntry, now_ts};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum InputMode {
    AddStep,
    NewCollection,
    EditStep,
}

impl InputMode {
    pub(super) fn title(self) -> &'static str {
        match self {
            InputMode::AddStep => "add step",
            InputMode::NewCollection => "new collection",
            InputMode::EditStep => "edit step",
        }
    }
}

pub(super) struct App {
    rt: tokio::runtime::Runtime,
    client: Option<RemoteClient>,
    pub(super) remote_url: Option<String>,
    pub(super) session: Session,
    pub(super) cursor: usize,
    pub(super) input: Input,
    pub(super) input_mode: Option<InputMode>,
    pub(super) log: Vec<LogEntry>,
    pub(super) refreshed_at: Option<String>,
    pub(super) stale: bool,
    pub(super) quit: bool,
}

pub(super) fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| super::render::draw(f, app)).context("draw")?;
        if app.quit {
            return Ok(());
        }

        if event::poll(Duration::from_millis(50)).context("poll")? {
            match event::read().context("read event")? {
                Event::Key(k) if k.kind == KeyEventKind::Press => app.handle_key(k),
                _ => {}
            }
        }
    }
}

impl App {
    pub(super) fn load(rt: tokio::runtime::Runtime) -> Self {
        let mut app = App {
            rt,
            client: None,
            remote_url: None,
            session: Session::new(),
            cursor: 0,
            input: Input::default(),
            input_mode: None,
            log: Vec::new(),
            refreshed_at: None,
            stale: false,
            quit: false,
        };

        match Workspace::open().and_then(|ws| ws.require_remote()) {
            Ok(remote) => match RemoteClient::new(remote.clone()) {
                Ok(client) => {
                    app.remote_url = Some(remote.base_url);
                    app.client = Some(client);
                    app.refresh();
                    app.select_first_if_unset();
                }
                Err(err) => app.push_error(vec![format!("{:#}", err)]),
            },
            Err(err) => app.push_error(vec![format!("{:#}", err)]),
        }
        app
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.input_mode.is_some() {
            self.handle_input_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,

            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                let max = self.session.steps().len().saturating_sub(1);
                self.cursor = (self.cursor + 1).min(max);
            }

            KeyCode::Char(' ') => self.toggle_at_cursor(),

            KeyCode::Tab => {
                self.session.flip_filter();
                self.cursor = 0;
                self.push_output(vec![format!(
                    "showing {} steps",
                    self.session.filter().label()
                )]);
            }

            KeyCode::Char('[') => self.cycle_collection(-1),
            KeyCode::Char(']') => self.cycle_collection(1),

            KeyCode::Char('a') => {
                if self.session.selected().is_none() {
                    self.push_error(vec!["no collection selected".to_string()]);
                } else {
                    self.input_mode = Some(InputMode::AddStep);
                }
            }

            KeyCode::Char('n') => self.input_mode = Some(InputMode::NewCollection),

            KeyCode::Char('e') => self.begin_edit(),

            KeyCode::Char('c') => {
                if self.session.filter() == Filter::Open {
                    self.run_batch(BatchOp::Complete);
                } else {
                    self.push_output(vec!["complete applies to the open view".to_string()]);
                }
            }

            KeyCode::Char('u') => {
                if self.session.filter() == Filter::Completed {
                    self.run_batch(BatchOp::Revert);
                } else {
                    self.push_output(vec!["revert applies to the completed view".to_string()]);
                }
            }

            KeyCode::Char('d') => self.run_batch(BatchOp::Delete),

            KeyCode::Char('r') => self.refresh(),

            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.cancel_input(),
            KeyCode::Enter => self.submit_input(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Char(c) => self.input.insert_char(c),
            _ => {}
        }
    }

    fn cancel_input(&mut self) {
        if self.input_mode == Some(InputMode::EditStep) {
            self.session.edit_cancel();
        }
        self.input.clear();
        self.input_mode = None;
    }

    fn submit_input(&mut self) {
        match self.input_mode {
            Some(InputMode::AddStep) => {
                let description = self.input.buf.clone();
                self.input.clear();
                self.input_mode = None;
                self.add_step(description);
            }
            Some(InputMode::NewCollection) => {
                let name = self.input.buf.clone();
                self.input.clear();
                self.input_mode = None;
                self.create_collection(name);
            }
            Some(InputMode::EditStep) => self.commit_edit(),
            None => {}
        }
    }

    pub(super) fn refresh(&mut self) {
        let Some(client) = &self.client else {
            self.push_error(vec![
                "no remote configured (run `stepwise login --url ...`)".to_string(),
            ]);
            return;
        };
        match self.rt.block_on(self.session.refresh(client)) {
            Ok(ApplyOutcome::Applied) => {
                self.stale = false;
                self.refreshed_at = Some(now_ts());
                self.clamp_cursor();
            }
            Ok(ApplyOutcome::Stale) => {
                self.push_output(vec!["discarded stale snapshot".to_string()]);
            }
            Err(err) => {
                // The previous snapshot stays on screen but is flagged, never
                // presented as current.
                self.stale = true;
                self.push_error(vec![format!("{:#}", err)]);
            }
        }
    }

    fn select_first_if_unset(&mut self) {
        if self.session.selected().is_some() {
            return;
        }
        let first = self
            .session
            .snapshot()
            .and_then(|s| s.collections.first())
            .map(|c| (c.id.clone(), c.name.clone()));
        if let Some((id, name)) = first {
            self.session.select_collection(Some(id));
            self.cursor = 0;
            self.push_output(vec![format!("collection: {}", name)]);
        }
    }

    fn cycle_collection(&mut self, delta: isize) {
        let Some(snapshot) = self.session.snapshot() else {
            return;
        };
        let n = snapshot.collections.len();
        if n == 0 {
            return;
        }
        let current = self
            .session
            .selected()
            .and_then(|sel| snapshot.collections.iter().position(|c| &c.id == sel));
        let next = match current {
            Some(i) => (i as isize + delta).rem_euclid(n as isize) as usize,
            None => 0,
        };
        let id = snapshot.collections[next].id.clone();
        let name = snapshot.collections[next].name.clone();

        self.session.select_collection(Some(id));
        self.cursor = 0;
        self.push_output(vec![format!("collection: {}", name)]);
    }

    fn toggle_at_cursor(&mut self) {
        let Some(v) = self.session.steps().get(self.cursor) else {
            return;
        };
        let id = v.id().clone();
        self.session.toggle(&id);
    }

    fn run_batch(&mut self, op: BatchOp) {
        let targets = self.session.checked_ids();
        if targets.is_empty() {
            self.push_output(vec![format!("no steps checked to {}", op.label())]);
            return;
        }
        let Some(client) = &self.client else {
            self.push_error(vec!["no remote configured".to_string()]);
            return;
        };

        let outcomes = self.rt.block_on(execute(client, op, &targets));
        self.session.absorb_outcomes(&outcomes);

        let mut lines = Vec::new();
        let mut failed = 0usize;
        for outcome in &outcomes {
            match (&outcome.result, &outcome.detail) {
                (Ok(()), Some(ack)) => {
                    lines.push(format!("{} {}: {}", op.label(), outcome.step_id.as_str(), ack));
                }
                (Ok(()), None) => {
                    lines.push(format!("{} {}: ok", op.label(), outcome.step_id.as_str()));
                }
                (Err(err), _) => {
                    failed += 1;
                    lines.push(format!(
                        "{} {}: {:#}",
                        op.label(),
                        outcome.step_id.as_str(),
                        err
                    ));
                }
            }
        }
        if failed > 0 {
            self.push_error(lines);
        } else {
            self.push_output(lines);
        }

        self.refresh();
    }

    fn add_step(&mut self, description: String) {
        let Some(id) = self.session.selected().cloned() else {
            self.push_error(vec!["no collection selected".to_string()]);
            return;
        };
        let Some(client) = &self.client else {
            self.push_error(vec!["no remote configured".to_string()]);
            return;
        };
        match self.rt.block_on(client.create_step(&id, &description)) {
            Ok(step) => {
                self.push_output(vec![format!(
                    "added step {} ({})",
                    step.step_number,
                    step.id.as_str()
                )]);
                self.refresh();
            }
            Err(err) => self.push_error(vec![format!("{:#}", err)]),
        }
    }

    fn create_collection(&mut self, name: String) {
        let Some(client) = &self.client else {
            self.push_error(vec!["no remote configured".to_string()]);
            return;
        };
        match self.rt.block_on(client.create_collection(&name)) {
            Ok(collection) => {
                self.push_output(vec![format!(
                    "created collection {} ({})",
                    collection.name,
                    collection.id.as_str()
                )]);
                self.refresh();
                self.session.select_collection(Some(collection.id));
                self.cursor = 0;
            }
            Err(err) => self.push_error(vec![format!("{:#}", err)]),
        }
    }

    fn begin_edit(&mut self) {
        match self.session.edit_begin() {
            Ok(()) => {
                let draft = self
                    .session
                    .edit()
                    .draft()
                    .unwrap_or_default()
                    .to_string();
                self.input.set(draft);
                self.input_mode = Some(InputMode::EditStep);
            }
            Err(err) => self.push_error(vec![err.to_string()]),
        }
    }

    fn commit_edit(&mut self) {
        if let Err(err) = self.session.edit_update_draft(self.input.buf.clone()) {
            self.push_error(vec![err.to_string()]);
            return;
        }
        let (step, draft) = match self.session.edit_start_commit() {
            Ok(pair) => pair,
            Err(err) => {
                self.push_error(vec![err.to_string()]);
                return;
            }
        };
        let Some(client) = &self.client else {
            self.session.edit_commit_failed().ok();
            self.push_error(vec!["no remote configured".to_string()]);
            return;
        };

        match self.rt.block_on(client.update_step(&step, &draft)) {
            Ok(updated) => {
                if let Err(err) = self.session.edit_commit_succeeded() {
                    self.push_error(vec![err.to_string()]);
                }
                self.push_output(vec![format!(
                    "updated step {}: {}",
                    updated.id.as_str(),
                    updated.description
                )]);
                self.input.clear();
                self.input_mode = None;
                self.refresh();
            }
            Err(err) => {
                // Draft and input stay put for a retry.
                self.session.edit_commit_failed().ok();
                self.push_error(vec![format!("update failed (draft kept): {:#}", err)]);
            }
        }
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self
            .cursor
            .min(self.session.steps().len().saturating_sub(1));
    }

    fn push_output(&mut self, lines: Vec<String>) {
        self.log.push(LogEntry {
            ts: now_ts(),
            kind: EntryKind::Output,
            lines,
        });
    }

    fn push_error(&mut self, lines: Vec<String>) {
        self.log.push(LogEntry {
            ts: now_ts(),
            kind: EntryKind::Error,
            lines,
        });
    }
}
