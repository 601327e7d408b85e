use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("no backend base URL is configured"))]
    MissingBaseUrl { stage: &'static str },
    #[snafu(display("chat request failed on `{stage}`: {source}"))]
    ChatRequest {
        stage: &'static str,
        source: reqwest::Error,
    },
    // Display carries only the derived detail so the surface can show it verbatim.
    #[snafu(display("{detail}"))]
    ChatRejected { status: u16, detail: String },
}

pub type ApiResult<T> = Result<T, ApiError>;
