use std::path::PathBuf;

use thiserror::Error;

use crate::domain::course::Course;

pub mod catalog;

pub use catalog::CsvCatalogRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to open catalog {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read catalog header: {0}")]
    Header(#[source] csv::Error),
    #[error("catalog is missing required column `{0}`")]
    MissingColumn(&'static str),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

pub trait CatalogReader {
    /// Every readable catalog row, in file order.
    fn list_courses(&self) -> RepositoryResult<Vec<Course>>;
}
