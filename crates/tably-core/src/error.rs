use thiserror::Error;

/// Failure talking to the analysis service: unreachable, non-2xx, timed out,
/// or a body that does not decode.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request timed out")]
    Timeout,

    #[error("analysis service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Http(#[source] reqwest::Error),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Http(err)
        }
    }
}

/// A query response that decoded fine but cannot be turned into a report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IncompleteResult {
    #[error("response carried no dataset")]
    MissingData,
}
