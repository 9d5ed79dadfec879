use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-visible message produced while handling one interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

/// Messages for the rendering surface, in the order they were raised.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Notices(Vec<Notice>);

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        self.0.push(Notice { level, message: message.into() });
    }
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message);
    }
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }
    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Level::Warning, message);
    }
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message);
    }
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.0.iter()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|n| n.level == Level::Error)
    }
    pub fn last_error(&self) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|n| n.level == Level::Error)
            .map(|n| n.message.as_str())
    }
}
