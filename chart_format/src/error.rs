use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartErrorKind {
    Parse,
    IO,
    Validation,
}

impl ChartErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            "E1001" | "E1002" | "E1003" | "E1004" | "E1005" | "E1006" => Self::Parse,
            "E2001" | "E2002" => Self::IO,
            "E4001" | "E4002" | "E4003" => Self::Validation,
            _ => Self::Parse,
        }
    }
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message} (line {line})")]
pub struct ChartError {
    pub code: &'static str,
    pub kind: ChartErrorKind,
    pub message: String,
    /// 1-based source line, 0 when the error is not tied to one.
    pub line: usize,

    pub file: Option<String>,
    pub section: Option<String>,
    pub context: Option<String>,
}

impl ChartError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>, line: usize) -> Self {
        Self {
            code,
            kind: ChartErrorKind::from_code(code),
            message: message.into(),
            line,

            file: None,
            section: None,
            context: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}
