#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("Http error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Remote store returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid endpoint {0:?}")]
    InvalidEndpoint(String),

    #[error("Io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("No endpoint configured")]
    NotConfigured,

    #[error("Session is closed")]
    SessionClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_cause() {
        let e: IndexerError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        let message = e.to_string();
        assert!(message.starts_with("Json error: "));
        assert!(message.len() > "Json error: ".len());

        let e: IndexerError = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err()
            .into();
        assert!(e.to_string().starts_with("Http error: "));
        assert!(e.to_string().len() > "Http error: ".len());
    }
}
