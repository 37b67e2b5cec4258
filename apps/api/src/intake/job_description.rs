//! Job-description input: pasted text or a URL, selected by a mode flag.
//!
//! URL mode is a labelling hint for the prompt only. Nothing here fetches or
//! validates the URL.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JdMode {
    #[default]
    Text,
    Url,
}

/// Both strings are kept across mode switches; only the one selected by `mode`
/// is sent for analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptionInput {
    pub mode: JdMode,
    pub text: String,
    pub url: String,
}

/// Partial update from the client. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobDescriptionUpdate {
    pub mode: Option<JdMode>,
    pub text: Option<String>,
    pub url: Option<String>,
}

impl JobDescriptionInput {
    pub fn set_mode(&mut self, mode: JdMode) {
        self.mode = mode;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn apply(&mut self, update: JobDescriptionUpdate) {
        if let Some(text) = update.text {
            self.set_text(text);
        }
        if let Some(url) = update.url {
            self.set_url(url);
        }
        if let Some(mode) = update.mode {
            self.set_mode(mode);
        }
    }

    /// The content that would be analysed in the current mode.
    pub fn active_content(&self) -> &str {
        match self.mode {
            JdMode::Text => &self.text,
            JdMode::Url => &self.url,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.active_content().trim().is_empty()
    }
}
