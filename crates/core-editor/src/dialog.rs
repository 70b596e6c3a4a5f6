//! Link dialog draft state and URL scheme rules.

use core_state::Selection;

/// Whether the link dialog is still open after a confirm attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Open,
    Closed,
}

/// Transient dialog state, alive only while the dialog is open. The captured
/// selection is restored on confirm so the link applies where the user was,
/// not where dialog focus left the caret.
#[derive(Debug, Clone)]
pub struct LinkDraft {
    pub url: String,
    pub text: String,
    pub selection: Selection,
}

impl LinkDraft {
    pub(crate) fn new(selection: Selection, text: String) -> Self {
        Self {
            url: String::new(),
            text,
            selection,
        }
    }
}

/// Scheme prefix of a URL: a leading ASCII letter followed by letters,
/// digits, `+`, or `-` up to a colon. A candidate containing `.` is treated
/// as a host name (`example.com:8080`), not a scheme, so it gets promoted.
pub(crate) fn scheme_of(url: &str) -> Option<&str> {
    let colon = url.find(':')?;
    let scheme = &url[..colon];
    let mut chars = scheme.chars();
    let leading = chars.next()?;
    if leading.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-'))
    {
        Some(scheme)
    } else {
        None
    }
}

/// Promote scheme-less input to `https://`.
pub(crate) fn ensure_scheme(url: &str) -> String {
    if scheme_of(url).is_some() {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
