#[derive(Debug)]
pub enum Error {
    /// Downloading a listing or detail page failed.
    PageFetch { url: String, reason: String },
    /// The page downloaded but lacks something every article of the site has.
    MissingField { url: String, field: &'static str },
    InvalidUrl(url::ParseError),
    HttpError(reqwest::Error),
    CoreError(core_twn::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PageFetch { url, reason } => write!(f, "Failed to fetch {}: {}", url, reason),
            Self::MissingField { url, field } => write!(f, "No {} found on {}", field, url),
            Self::InvalidUrl(e) => write!(f, "Invalid URL: {}", e),
            Self::HttpError(e) => write!(f, "HTTP error: {}", e),
            Self::CoreError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidUrl(error)
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::HttpError(error)
    }
}

impl From<core_twn::Error> for Error {
    fn from(error: core_twn::Error) -> Self {
        Self::CoreError(error)
    }
}
