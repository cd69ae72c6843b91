#[derive(Debug)]
pub enum Error {
    /// The model's reply has no JSON object in it.
    NoJsonInReply,
    /// The JSON the model produced doesn't have the annotation's shape.
    InvalidJson(serde_json::Error),
    CoreError(core_twn::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoJsonInReply => write!(f, "Model reply contains no JSON block"),
            Self::InvalidJson(json_error) => write!(f, "Model reply is not a valid annotation: {}", json_error),
            Self::CoreError(core_error) => write!(f, "{}", core_error),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidJson(error)
    }
}

impl From<core_twn::Error> for Error {
    fn from(error: core_twn::Error) -> Self {
        Self::CoreError(error)
    }
}
