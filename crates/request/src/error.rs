use std::io;

use http::StatusCode;
use thiserror::Error;

/// Errors raised while a request travels through the stage pipeline.
///
/// A stage returning one of these aborts the remaining stages for that request.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("unsupported media type: {content_type}")]
    UnsupportedMediaType { content_type: String },

    #[error("unsupported content encoding: {encoding}")]
    UnsupportedContentEncoding { encoding: String },

    #[error("payload too large, size {size} exceed the limit {limit}")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("invalid content: {reason}")]
    InvalidContent { reason: String },

    #[error("invalid query string: {reason}")]
    InvalidQuery { reason: String },

    #[error("request body has been consumed")]
    BodyConsumed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl RequestError {
    pub fn unsupported_media_type<S: ToString>(content_type: S) -> Self {
        Self::UnsupportedMediaType { content_type: content_type.to_string() }
    }

    pub fn unsupported_content_encoding<S: ToString>(encoding: S) -> Self {
        Self::UnsupportedContentEncoding { encoding: encoding.to_string() }
    }

    pub fn payload_too_large(size: u64, limit: u64) -> Self {
        Self::PayloadTooLarge { size, limit }
    }

    pub fn invalid_content<S: ToString>(str: S) -> Self {
        Self::InvalidContent { reason: str.to_string() }
    }

    pub fn invalid_query<S: ToString>(str: S) -> Self {
        Self::InvalidQuery { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The response status a server should answer with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::UnsupportedMediaType { .. } | RequestError::UnsupportedContentEncoding { .. } => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            RequestError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RequestError::InvalidContent { .. } | RequestError::InvalidQuery { .. } | RequestError::Io { .. } => {
                StatusCode::BAD_REQUEST
            }
            RequestError::BodyConsumed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_media_type_names_the_type() {
        let err = RequestError::unsupported_media_type("text/plain");
        assert_eq!(err.to_string(), "unsupported media type: text/plain");
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn status_codes() {
        assert_eq!(RequestError::payload_too_large(10, 5).status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(RequestError::invalid_content("bad json").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(RequestError::unsupported_content_encoding("br").status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(RequestError::BodyConsumed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let io_err = RequestError::io(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
        assert_eq!(io_err.status_code(), StatusCode::BAD_REQUEST);
    }
}
