use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid total count: {0}")]
    InvalidTotalCount(String),

    #[error("Record has no usable `{0}` field")]
    MissingRecordId(String),
}

pub type Result<T> = std::result::Result<T, Error>;
