use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{}:{line}: malformed recording entry: {source}", path.display())]
    Recording {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
