// Read/write context: collects non-fatal messages raised while restoring state

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadWriteMessage {
    pub text: String,
    pub level: MessageLevel,
}

/// Passed through every read/write call. Readers report recoverable problems
/// here instead of failing, so callers can surface them after a load.
#[derive(Debug, Clone, Default)]
pub struct ReadWriteContext {
    messages: Vec<ReadWriteMessage>,
    categories: Vec<String>,
}

impl ReadWriteContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message, prefixed with the current category path.
    pub fn push_message(&mut self, text: impl Into<String>, level: MessageLevel) {
        let text = text.into();
        let text = if self.categories.is_empty() {
            text
        } else {
            format!("{}: {}", self.categories.join(" / "), text)
        };

        match level {
            MessageLevel::Info => log::info!("{}", text),
            MessageLevel::Warning => log::warn!("{}", text),
            MessageLevel::Critical => log::error!("{}", text),
        }

        self.messages.push(ReadWriteMessage { text, level });
    }

    pub fn enter_category(&mut self, category: impl Into<String>) {
        self.categories.push(category.into());
    }

    pub fn leave_category(&mut self) {
        self.categories.pop();
    }

    pub fn messages(&self) -> &[ReadWriteMessage] {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Vec<ReadWriteMessage> {
        std::mem::take(&mut self.messages)
    }
}
