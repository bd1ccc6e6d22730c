use meter_core::Level;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("{0} is not a rollup level")]
    NotARollupLevel(Level),
}

pub type Result<T> = std::result::Result<T, DbError>;
