use crate::types::FetchOutcome;

/// Where keystrokes go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Search,
    Issues,
}

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    ToggleFocus,
    FocusSearch,

    // Search line
    SearchInput(char),
    SearchPaste(String),
    SearchBackspace,
    ClearSearch,
    SubmitSearch,

    // Issue list
    ScrollUp,
    ScrollDown,
    GoToTop,
    GoToBottom,
    FetchMore,
    OpenInBrowser,
    YankUrl,

    // Fetch completion, tagged with the load id it was issued under
    PageLoaded(FetchOutcome, u64),
    FetchFailed(String, u64),

    None,
}
