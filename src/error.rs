use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("team not found: {0}")]
    TeamNotFound(i32),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("text generation failed: {0}")]
    Generation(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("chat delivery failed with status {status}: {body}")]
    Delivery { status: u16, body: String },

    #[error(transparent)]
    Database(#[from] diesel::result::Error),

    #[error(transparent)]
    Connection(#[from] diesel::ConnectionError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use crate::error::Error;

    #[test]
    fn json_errors_convert() {
        let e: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();

        assert!(matches!(e, Error::Json(_)));
        assert!(e.to_string().contains("EOF"));
    }
}
