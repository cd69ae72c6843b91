/// Errors from talking to the ingestion API, downloading pages and calling the chat model.
#[derive(Debug)]
pub enum Error {
    /// A configured or scraped URL couldn't be parsed.
    InvalidUrl(url::ParseError),

    /// The HTTP request itself failed (connect, timeout, body decode).
    Http(reqwest::Error),

    /// The ingestion API answered with a status the caller didn't expect.
    UnexpectedStatus { status: u16, body: String },

    /// Error calling the chat-completion endpoint.
    ChatCompletion(async_openai::error::OpenAIError),

    /// The chat model answered without any message content.
    EmptyCompletion,

    /// A provider that isn't backed by a real model refused the request (used by the mock).
    ProviderUnavailable(String),

    /// An environment variable is set to something unusable.
    InvalidConfig { var: String, reason: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidUrl(err) => write!(f, "Not a valid URL: {}", err),
            Error::Http(err) => write!(f, "HTTP error: {}", err),
            Error::UnexpectedStatus { status, body } => write!(f, "Unexpected status {}: {}", status, body),
            Error::ChatCompletion(err) => write!(f, "Error calling chat completion endpoint: {}", err),
            Error::EmptyCompletion => write!(f, "Chat completion returned no content"),
            Error::ProviderUnavailable(msg) => write!(f, "LLM provider unavailable: {}", msg),
            Error::InvalidConfig { var, reason } => write!(f, "Invalid value for {}: {}", var, reason),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// The HTTP status of an `UnexpectedStatus` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UnexpectedStatus { status, .. } => Some(*status),
            Error::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err)
    }
}

impl From<async_openai::error::OpenAIError> for Error {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Error::ChatCompletion(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnexpectedStatus {
            status: 409,
            body: "already annotated".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected status 409: already annotated");
        assert_eq!(err.status(), Some(409));

        let err = Error::InvalidConfig {
            var: "PORT".to_string(),
            reason: "not a number".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value for PORT: not a number");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_from_url_parse_error() {
        let url_error = url::Url::parse("not a valid url").unwrap_err();
        let error: Error = url_error.into();
        assert!(matches!(error, Error::InvalidUrl(_)));
    }
}
