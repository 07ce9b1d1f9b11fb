use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Error parsing line {line}: {reason}")]
    ParseError { line: usize, reason: String },

    #[error("Chromosome {0} is listed more than once")]
    DuplicateChromosome(String),

    #[error("Catalog contains no chromosomes")]
    EmptyCatalog,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
