use std::io;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("store error: {0}")]
    Db(#[from] meter_db::DbError),
}

pub type Result<T> = std::result::Result<T, JobError>;
