pub const DEFAULT_LOADING_LABEL: &str = "Chargement...";

/// Reference-counted busy indicator shared by every in-flight operation.
///
/// The count never goes below zero and the indicator is visible exactly
/// while the count is positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingIndicator {
    count: usize,
    label: String,
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self {
            count: 0,
            label: DEFAULT_LOADING_LABEL.to_string(),
        }
    }
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a span. Returns `true` when the indicator became visible.
    pub fn begin(&mut self, message: Option<&str>) -> bool {
        self.count += 1;
        if let Some(message) = message {
            self.label = message.to_string();
        }
        self.count == 1
    }

    /// Closes a span. Returns `true` when the indicator became hidden.
    pub fn end(&mut self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.count -= 1;
        self.count == 0
    }

    /// Drops every open span. Returns `true` if the indicator was visible.
    pub fn reset(&mut self) -> bool {
        let was_visible = self.is_visible();
        self.count = 0;
        was_visible
    }

    pub fn is_visible(&self) -> bool {
        self.count > 0
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}
