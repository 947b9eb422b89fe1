use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("record store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("record store unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}
