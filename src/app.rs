use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::action::{Action, Focus};
use crate::event::Event;
use crate::source::IssueSource;
use crate::state::AccumulatedState;
use crate::types::{FetchOutcome, IssueEdge};

/// The fetch whose completion will be applied.
#[derive(Debug)]
struct PendingFetch {
    path: String,
    /// Whether this fetch appends to the loaded page or starts over
    continues: bool,
}

pub struct App {
    pub focus: Focus,
    /// Text currently in the search line
    pub input: String,
    /// Path of the last submitted search
    pub active_path: String,
    pub state: AccumulatedState,
    pub issue_index: usize,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub should_quit: bool,
    /// Path the accumulated issues were fetched with; "fetch more" continues this one
    loaded_path: Option<String>,
    pending: Option<PendingFetch>,
    load_id: u64,
    source: Arc<dyn IssueSource>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        source: Arc<dyn IssueSource>,
        start_path: String,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            focus: Focus::default(),
            input: start_path.clone(),
            active_path: start_path,
            state: AccumulatedState::new(),
            issue_index: 0,
            loading: false,
            error: None,
            notice: None,
            should_quit: false,
            loaded_path: None,
            pending: None,
            load_id: 0,
            source,
            action_tx,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn selected_issue(&self) -> Option<&IssueEdge> {
        self.state
            .issues()
            .and_then(|issues| issues.edges.get(self.issue_index))
    }

    fn issue_count(&self) -> usize {
        self.state.issues().map(|i| i.edges.len()).unwrap_or(0)
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::SubmitSearch,
            Event::Key(key) => match self.focus {
                Focus::Search => self.handle_search_key(key),
                Focus::Issues => self.handle_issues_key(key),
            },
            Event::Paste(text) if self.focus == Focus::Search => Action::SearchPaste(text),
            _ => Action::None,
        }
    }

    fn handle_search_key(&self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('u') => Action::ClearSearch,
                _ => Action::None,
            };
        }

        match key.code {
            KeyCode::Enter => Action::SubmitSearch,
            KeyCode::Backspace => Action::SearchBackspace,
            KeyCode::Tab | KeyCode::Esc | KeyCode::Down => Action::ToggleFocus,
            KeyCode::Char(c) => Action::SearchInput(c),
            _ => Action::None,
        }
    }

    fn handle_issues_key(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Tab | KeyCode::Esc => Action::ToggleFocus,
            KeyCode::Char('/') | KeyCode::Char('i') => Action::FocusSearch,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
            KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
            KeyCode::Char('m') => Action::FetchMore,
            KeyCode::Char('o') | KeyCode::Enter => Action::OpenInBrowser,
            KeyCode::Char('y') => Action::YankUrl,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        if !matches!(
            action,
            Action::Quit | Action::None | Action::PageLoaded(..) | Action::FetchFailed(..)
        ) {
            self.error = None;
            self.notice = None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::ToggleFocus => {
                self.focus = match self.focus {
                    Focus::Search => Focus::Issues,
                    Focus::Issues => Focus::Search,
                };
            }
            Action::FocusSearch => {
                self.focus = Focus::Search;
            }

            // Search line
            Action::SearchInput(c) => {
                self.input.push(c);
            }
            Action::SearchPaste(text) => {
                self.input.extend(text.chars().filter(|c| !c.is_control()));
            }
            Action::SearchBackspace => {
                self.input.pop();
            }
            Action::ClearSearch => {
                self.input.clear();
            }
            Action::SubmitSearch => {
                self.active_path = self.input.trim().to_string();
                self.issue_index = 0;
                self.focus = Focus::Issues;
                self.spawn_fetch(self.active_path.clone(), None);
            }

            // Issue list
            Action::ScrollUp => {
                self.issue_index = self.issue_index.saturating_sub(1);
            }
            Action::ScrollDown => {
                if self.issue_index + 1 < self.issue_count() {
                    self.issue_index += 1;
                }
            }
            Action::GoToTop => {
                self.issue_index = 0;
            }
            Action::GoToBottom => {
                self.issue_index = self.issue_count().saturating_sub(1);
            }
            Action::FetchMore => self.fetch_more(),
            Action::OpenInBrowser => {
                if let Some(url) = self.selected_issue().map(|i| i.url.clone()) {
                    if let Err(e) = open::that(&url) {
                        self.error = Some(format!("Could not open {}: {}", url, e));
                    }
                }
            }
            Action::YankUrl => {
                if let Some(url) = self.selected_issue().map(|i| i.url.clone()) {
                    let copied = arboard::Clipboard::new().and_then(|mut c| c.set_text(url));
                    match copied {
                        Ok(()) => self.notice = Some("Copied issue URL".to_string()),
                        Err(e) => self.error = Some(format!("Clipboard error: {}", e)),
                    }
                }
            }

            // Fetch completion
            Action::PageLoaded(outcome, load_id) => {
                if load_id != self.load_id {
                    debug!(load_id, latest = self.load_id, "Discarding stale page");
                    return;
                }
                self.apply_page(outcome);
                self.issue_index = self.issue_index.min(self.issue_count().saturating_sub(1));
            }
            Action::FetchFailed(msg, load_id) => {
                if load_id != self.load_id {
                    debug!(load_id, latest = self.load_id, "Discarding stale failure");
                    return;
                }
                self.loading = false;
                self.pending = None;
                self.error = Some(msg);
            }

            Action::None => {}
        }
    }

    /// Continue the loaded repository. No-op while any fetch is in flight.
    fn fetch_more(&mut self) {
        if self.loading {
            debug!("Fetch in flight, ignoring fetch more");
            return;
        }
        if self.state.has_errors() {
            debug!("Errors shown, ignoring fetch more");
            return;
        }
        let Some(cursor) = self.state.next_cursor().map(str::to_string) else {
            debug!("No further page to fetch");
            return;
        };
        let Some(path) = self.loaded_path.clone() else {
            debug!("Nothing loaded to continue");
            return;
        };
        self.spawn_fetch(path, Some(cursor));
    }

    fn apply_page(&mut self, outcome: FetchOutcome) {
        self.loading = false;
        let pending = self.pending.take();
        let continues = pending.as_ref().is_some_and(|p| p.continues);
        if matches!(outcome, FetchOutcome::Page(_)) {
            if let Some(p) = pending {
                self.loaded_path = Some(p.path);
            }
        }

        let state = std::mem::take(&mut self.state);
        self.state = if continues {
            state.apply(outcome)
        } else {
            state.restart(outcome)
        };
    }

    fn spawn_fetch(&mut self, path: String, cursor: Option<String>) {
        self.load_id += 1;
        self.loading = true;
        self.pending = Some(PendingFetch {
            path: path.clone(),
            continues: cursor.is_some(),
        });

        let load_id = self.load_id;
        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            match source.fetch_issue_page(&path, cursor.as_deref()).await {
                Ok(outcome) => {
                    tx.send(Action::PageLoaded(outcome, load_id)).ok();
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Issue fetch failed");
                    tx.send(Action::FetchFailed(e.to_string(), load_id)).ok();
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{IssuedeckError, Result};
    use crate::merge::tests::page;

    #[derive(Debug)]
    struct FakeSource {
        responses: Mutex<VecDeque<Result<FetchOutcome>>>,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    impl FakeSource {
        fn with(responses: Vec<Result<FetchOutcome>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IssueSource for FakeSource {
        fn name(&self) -> &str {
            "Fake"
        }

        async fn fetch_issue_page(&self, path: &str, cursor: Option<&str>) -> Result<FetchOutcome> {
            self.calls
                .lock()
                .unwrap()
                .push((path.to_string(), cursor.map(str::to_string)));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(FetchOutcome::Errors(vec!["unexpected fetch".to_string()])))
        }
    }

    fn app_with(
        source: Arc<FakeSource>,
        path: &str,
    ) -> (App, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(source, path.to_string(), tx), rx)
    }

    async fn pump(app: &mut App, rx: &mut mpsc::UnboundedReceiver<Action>) {
        let action = rx.recv().await.unwrap();
        app.update(action);
    }

    fn edge_ids(app: &App) -> Vec<String> {
        app.state
            .issues()
            .map(|i| i.edges.iter().map(|e| e.id.clone()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn initial_load_fetches_start_path_without_cursor() {
        let source = FakeSource::with(vec![Ok(FetchOutcome::Page(page(
            "octocat",
            "hello-world",
            &["a", "b"],
            2,
            None,
            false,
        )))]);
        let (mut app, mut rx) = app_with(source.clone(), "octocat/hello-world");

        let action = app.handle_event(Event::Init);
        app.update(action);
        assert!(app.loading);
        pump(&mut app, &mut rx).await;

        assert!(!app.loading);
        assert_eq!(source.calls(), vec![("octocat/hello-world".to_string(), None)]);
        assert_eq!(edge_ids(&app), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn fetch_more_continues_with_end_cursor() {
        let source = FakeSource::with(vec![
            Ok(FetchOutcome::Page(page(
                "octocat",
                "hello-world",
                &["a", "b"],
                4,
                Some("X"),
                true,
            ))),
            Ok(FetchOutcome::Page(page(
                "octocat",
                "hello-world",
                &["c", "d"],
                4,
                Some("Y"),
                false,
            ))),
        ]);
        let (mut app, mut rx) = app_with(source.clone(), "octocat/hello-world");

        app.update(Action::SubmitSearch);
        pump(&mut app, &mut rx).await;

        // Editing the search line does not change what "more" continues
        app.input = "someone/else".to_string();
        app.update(Action::FetchMore);
        pump(&mut app, &mut rx).await;

        assert_eq!(
            source.calls(),
            vec![
                ("octocat/hello-world".to_string(), None),
                ("octocat/hello-world".to_string(), Some("X".to_string())),
            ]
        );
        assert_eq!(edge_ids(&app), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn fetch_more_without_next_page_is_a_no_op() {
        let source = FakeSource::with(vec![]);
        let (mut app, _rx) = app_with(source.clone(), "octocat/hello-world");
        app.update(Action::PageLoaded(
            FetchOutcome::Page(page("octocat", "hello-world", &["a"], 1, Some("X"), false)),
            0,
        ));

        app.update(Action::FetchMore);

        assert!(!app.loading);
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn stale_page_is_discarded() {
        let source = FakeSource::with(vec![]);
        let (mut app, _rx) = app_with(source, "octocat/hello-world");

        app.update(Action::SubmitSearch);
        app.update(Action::SubmitSearch);

        app.update(Action::PageLoaded(
            FetchOutcome::Page(page("octocat", "hello-world", &["old"], 1, None, false)),
            1,
        ));
        assert!(app.loading);
        assert!(app.state.organization.is_none());

        app.update(Action::PageLoaded(
            FetchOutcome::Page(page("octocat", "hello-world", &["new"], 1, None, false)),
            2,
        ));
        assert!(!app.loading);
        assert_eq!(edge_ids(&app), vec!["new"]);
    }

    #[tokio::test]
    async fn fetch_more_while_search_loads_is_ignored() {
        let source = FakeSource::with(vec![
            Ok(FetchOutcome::Page(page(
                "octocat",
                "hello-world",
                &["a", "b", "c", "d", "e"],
                12,
                Some("X"),
                true,
            ))),
            Ok(FetchOutcome::Page(page(
                "rust-lang",
                "rust",
                &["r1", "r2", "r3", "r4", "r5"],
                40,
                Some("R"),
                true,
            ))),
        ]);
        let (mut app, mut rx) = app_with(source.clone(), "octocat/hello-world");

        app.update(Action::SubmitSearch);
        pump(&mut app, &mut rx).await;

        app.input = "rust-lang/rust".to_string();
        app.update(Action::SubmitSearch);
        let searching = app.load_id;
        app.update(Action::FetchMore);
        assert_eq!(app.load_id, searching);
        pump(&mut app, &mut rx).await;

        assert_eq!(
            source.calls(),
            vec![
                ("octocat/hello-world".to_string(), None),
                ("rust-lang/rust".to_string(), None),
            ]
        );
        assert!(!app.loading);
        assert_eq!(edge_ids(&app), vec!["r1", "r2", "r3", "r4", "r5"]);
        assert_eq!(app.state.next_cursor(), Some("R"));
    }

    #[tokio::test]
    async fn search_during_fetch_more_discards_the_more_page() {
        let source = FakeSource::with(vec![Ok(FetchOutcome::Page(page(
            "octocat",
            "hello-world",
            &["a", "b"],
            4,
            Some("X"),
            true,
        )))]);
        let (mut app, mut rx) = app_with(source.clone(), "octocat/hello-world");

        app.update(Action::SubmitSearch);
        pump(&mut app, &mut rx).await;

        app.update(Action::FetchMore);
        let more = app.load_id;
        app.input = "rust-lang/rust".to_string();
        app.update(Action::SubmitSearch);
        let search = app.load_id;

        app.update(Action::PageLoaded(
            FetchOutcome::Page(page("octocat", "hello-world", &["c", "d"], 4, None, false)),
            more,
        ));
        assert!(app.loading);
        assert_eq!(edge_ids(&app), vec!["a", "b"]);

        app.update(Action::PageLoaded(
            FetchOutcome::Page(page("rust-lang", "rust", &["r"], 3, Some("R"), true)),
            search,
        ));
        assert!(!app.loading);
        assert_eq!(edge_ids(&app), vec!["r"]);
        assert_eq!(app.loaded_path.as_deref(), Some("rust-lang/rust"));
    }

    #[tokio::test]
    async fn resubmitting_same_path_replaces_issues() {
        let first = || -> Result<FetchOutcome> {
            Ok(FetchOutcome::Page(page(
                "octocat",
                "hello-world",
                &["a", "b"],
                4,
                Some("X"),
                true,
            )))
        };
        let source = FakeSource::with(vec![first(), first()]);
        let (mut app, mut rx) = app_with(source, "octocat/hello-world");

        app.update(Action::SubmitSearch);
        pump(&mut app, &mut rx).await;
        app.update(Action::SubmitSearch);
        pump(&mut app, &mut rx).await;

        assert_eq!(edge_ids(&app), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn fetch_more_is_ignored_while_errors_are_shown() {
        let source = FakeSource::with(vec![
            Ok(FetchOutcome::Page(page(
                "octocat",
                "hello-world",
                &["a"],
                4,
                Some("X"),
                true,
            ))),
            Ok(FetchOutcome::Errors(vec!["Not Found".to_string()])),
        ]);
        let (mut app, mut rx) = app_with(source.clone(), "octocat/hello-world");

        app.update(Action::SubmitSearch);
        pump(&mut app, &mut rx).await;
        app.input = "octocat/missing".to_string();
        app.update(Action::SubmitSearch);
        pump(&mut app, &mut rx).await;

        app.update(Action::FetchMore);

        assert!(!app.loading);
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn api_errors_keep_previous_results() {
        let source = FakeSource::with(vec![
            Ok(FetchOutcome::Page(page(
                "octocat",
                "hello-world",
                &["a"],
                1,
                None,
                false,
            ))),
            Ok(FetchOutcome::Errors(vec!["Not Found".to_string()])),
        ]);
        let (mut app, mut rx) = app_with(source, "octocat/hello-world");

        app.update(Action::SubmitSearch);
        pump(&mut app, &mut rx).await;
        let before = app.state.organization.clone();

        app.input = "octocat/missing".to_string();
        app.update(Action::SubmitSearch);
        pump(&mut app, &mut rx).await;

        assert_eq!(app.state.organization, before);
        assert_eq!(app.state.errors, vec!["Not Found"]);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_without_touching_state() {
        let source = FakeSource::with(vec![Err(IssuedeckError::Api(
            "GitHub API 401 Unauthorized".to_string(),
        ))]);
        let (mut app, mut rx) = app_with(source, "octocat/hello-world");

        app.update(Action::SubmitSearch);
        pump(&mut app, &mut rx).await;

        assert!(!app.loading);
        assert_eq!(app.state, AccumulatedState::new());
        assert_eq!(
            app.error.as_deref(),
            Some("API error: GitHub API 401 Unauthorized")
        );
    }

    #[test]
    fn search_focus_types_instead_of_quitting() {
        let (mut app, _rx) = app_with(FakeSource::with(vec![]), "");
        for c in "quit".chars() {
            let action = app.handle_event(Event::Key(KeyEvent::new(
                KeyCode::Char(c),
                KeyModifiers::NONE,
            )));
            app.update(action);
        }
        assert_eq!(app.input, "quit");
        assert!(!app.should_quit);

        let action = app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('u'),
            KeyModifiers::CONTROL,
        )));
        app.update(action);
        assert!(app.input.is_empty());
    }

    #[test]
    fn issues_focus_q_quits() {
        let (mut app, _rx) = app_with(FakeSource::with(vec![]), "octocat/hello-world");
        app.update(Action::ToggleFocus);
        let action = app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
        )));
        app.update(action);
        assert!(app.should_quit);
    }

    #[test]
    fn paste_strips_control_characters() {
        let (mut app, _rx) = app_with(FakeSource::with(vec![]), "");
        let action = app.handle_event(Event::Paste("octocat/hello-world\n".to_string()));
        app.update(action);
        assert_eq!(app.input, "octocat/hello-world");
    }

    #[test]
    fn selection_is_clamped_after_reset() {
        let (mut app, _rx) = app_with(FakeSource::with(vec![]), "octocat/hello-world");
        app.update(Action::PageLoaded(
            FetchOutcome::Page(page("octocat", "hello-world", &["a", "b", "c"], 3, None, false)),
            0,
        ));
        app.update(Action::GoToBottom);
        assert_eq!(app.issue_index, 2);

        app.update(Action::PageLoaded(
            FetchOutcome::Page(page("rust-lang", "rust", &["r"], 1, None, false)),
            0,
        ));
        assert_eq!(app.issue_index, 0);
        assert_eq!(app.selected_issue().map(|i| i.id.as_str()), Some("r"));
    }
}
