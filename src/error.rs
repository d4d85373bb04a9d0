use thiserror::Error;

#[derive(Error, Debug)]
pub enum SectionError {
    #[error("section has no stations")]
    EmptySection,

    #[error("station '{station}' has no variable '{variable}'")]
    MissingVariable { station: String, variable: String },

    #[error("length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        what: String,
        expected: usize,
        got: usize,
    },

    #[error("{axis} axis is not increasing at index {index}")]
    NonMonotonicAxis { axis: String, index: usize },

    #[error("grid is {rows}x{cols} but axes are {depth_len} levels x {distance_len} stations")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        depth_len: usize,
        distance_len: usize,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("unknown interpolation kind '{0}'")]
    UnknownInterpolationKind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SectionError>;
