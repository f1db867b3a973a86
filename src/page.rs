//! Page state: everything the user can see or edit, owned by the controller.

use crate::catalog::{LanguageCatalog, LanguageOption};
use crate::chat::ChatLog;

/// A language dropdown. An empty value means nothing is selected.
#[derive(Debug, Clone, Default)]
pub struct LanguageSelector {
    options: Vec<LanguageOption>,
    value: String,
}

impl LanguageSelector {
    /// Replace all options with the catalog, in catalog order.
    ///
    /// Like a freshly populated dropdown, the first option becomes selected.
    pub fn populate(&mut self, catalog: &LanguageCatalog) {
        self.options = catalog.iter().cloned().collect();
        self.value = self
            .options
            .first()
            .map(|option| option.code.clone())
            .unwrap_or_default();
    }

    pub fn has_option(&self, code: &str) -> bool {
        self.options.iter().any(|option| option.code == code)
    }

    /// Select a code. Codes that are not among the options are ignored.
    pub fn select(&mut self, code: &str) -> bool {
        if !self.has_option(code) {
            return false;
        }
        self.value = code.to_string();
        true
    }

    pub fn clear_selection(&mut self) {
        self.value.clear();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn options(&self) -> &[LanguageOption] {
        &self.options
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub input_text: String,
    pub source: LanguageSelector,
    pub target: LanguageSelector,
    pub chat: ChatLog,
    pub status: String,
}
