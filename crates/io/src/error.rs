use std::fmt;

#[derive(Debug)]
pub enum IoError {
    /// Malformed or unexpected XML in an OAI page or snapshot.
    Xml(String),
    /// N-Triples syntax error, 1-based line number.
    NTriples { line: usize, message: String },
    Json(String),
    /// Malformed ISO 2709 record.
    Marc(String),
    Csv(String),
    Io(std::io::Error),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml(msg) => write!(f, "XML parse error: {msg}"),
            Self::NTriples { line, message } => {
                write!(f, "N-Triples parse error at line {line}: {message}")
            }
            Self::Json(msg) => write!(f, "JSON error: {msg}"),
            Self::Marc(msg) => write!(f, "MARC parse error: {msg}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl IoError {
    /// Parse-class errors (bad input) as opposed to filesystem failures.
    pub fn is_parse(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            return Self::Io(e.into());
        }
        Self::Json(e.to_string())
    }
}

impl From<csv::Error> for IoError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            if let csv::ErrorKind::Io(io) = e.into_kind() {
                return Self::Io(io);
            }
            return Self::Csv("I/O error".to_string());
        }
        Self::Csv(e.to_string())
    }
}
