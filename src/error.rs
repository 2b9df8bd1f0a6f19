use thiserror::Error;

/// Errors surfaced by grammar extraction.
///
/// Pruning and coverage collisions are not errors; they never reach this type.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// An alignment link points outside the sentence pair.
    #[error("alignment link {source_index}-{target_index} out of range for sentence pair of length {source_len}/{target_len}")]
    LinkOutOfRange {
        source_index: usize,
        target_index: usize,
        source_len: usize,
        target_len: usize,
    },

    /// Malformed input or rule line.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A failure tied to one sentence pair of a corpus.
    #[error("sentence pair {line}: {source}")]
    Sentence {
        line: usize,
        #[source]
        source: Box<ExtractError>,
    },

    /// Malformed or out-of-range configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
