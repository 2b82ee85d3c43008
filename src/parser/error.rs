use thiserror::Error;

/// A recoverable problem in the input. Routed to [`super::Handler::on_parsing_error`] first;
/// only raised from `parse`/`flush` if the handler does not take it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Malformed WebVTT signature.")]
    BadSignature,

    #[error("{0}")]
    BadTimeStamp(String),
}

impl ParsingError {
    /// Numeric code of this error kind.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::BadSignature => 0,
            Self::BadTimeStamp(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// A recoverable error that no handler took care of.
    #[error("WebVTT parsing error (code {code}): {0}", code = .0.code())]
    Parsing(#[from] ParsingError),

    /// The event handler failed. Never recovered from.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_messages() {
        assert_eq!(ParsingError::BadSignature.code(), 0);
        let error = ParsingError::BadTimeStamp("Malformed timestamp: 0:00.000".to_owned());
        assert_eq!(error.code(), 1);
        assert_eq!(error.to_string(), "Malformed timestamp: 0:00.000");
        assert_eq!(
            Error::from(error).to_string(),
            "WebVTT parsing error (code 1): Malformed timestamp: 0:00.000"
        );
        assert_eq!(
            Error::from(ParsingError::BadSignature).to_string(),
            "WebVTT parsing error (code 0): Malformed WebVTT signature."
        );
    }
}
