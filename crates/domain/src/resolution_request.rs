use std::sync::Arc;

/// One client resolution request, as extracted from the form parameters.
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
    pub name: Arc<str>,
    /// Raw type token exactly as the client sent it.
    pub qtype: Arc<str>,
    pub content_type: Option<String>,
    pub pretty: bool,
}

impl ResolutionRequest {
    pub fn new(name: impl Into<Arc<str>>, qtype: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            qtype: qtype.into(),
            content_type: None,
            pretty: false,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// The override if one was sent, otherwise `default`.
    pub fn effective_content_type<'a>(&'a self, default: &'a str) -> &'a str {
        match self.content_type.as_deref() {
            Some(ct) if !ct.is_empty() => ct,
            _ => default,
        }
    }
}
