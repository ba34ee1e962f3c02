use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    /// The token stream and the fragment sequence disagree on structure.
    /// This indicates a grammar or tokenizer defect; the pass that hit it
    /// has been aborted before corrupting the document.
    #[error("parser out of sync: expected {expected}")]
    ParserOutOfSync { expected: &'static str },

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("line has no indentation state yet; highlight it first")]
    MissingIndentation,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results with EditorError
pub type Result<T> = std::result::Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EditorError::UnknownLanguage("brainfuck".to_string());
        assert_eq!(err.to_string(), "unknown language: brainfuck");

        let err = EditorError::ParserOutOfSync {
            expected: "line break",
        };
        assert!(err.to_string().contains("line break"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EditorError = io_err.into();
        assert!(matches!(err, EditorError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}
