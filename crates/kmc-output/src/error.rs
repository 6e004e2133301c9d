use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed edge list at line {line}: {text}")]
    MalformedEdgeList { line: usize, text: String },
}

pub type OutputResult<T> = Result<T, OutputError>;
