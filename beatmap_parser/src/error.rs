use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    Io,
    Syntax,
}

impl ParseErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            "E2001" => Self::Io,
            _ => Self::Syntax,
        }
    }
}

/// A beatmap that could not be turned into a model at all.
///
/// Per-field damage never produces one of these; it is reserved for unreadable
/// files and native documents that are not JSON.
#[derive(Debug, Error, Clone)]
#[error("{code}: {message} (line {line})")]
pub struct ParseError {
    pub code: &'static str,
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: usize,
    pub file: Option<String>,
}

impl ParseError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>, line: usize) -> Self {
        Self {
            code,
            kind: ParseErrorKind::from_code(code),
            message: message.into(),
            line,
            file: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Why a parsed beatmap cannot be played.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("beatmap has no metadata")]
    MissingMetadata,
    #[error("beatmap has no hit objects")]
    NoHitObjects,
    #[error("beatmap names no audio file")]
    MissingAudioFilename,
}
