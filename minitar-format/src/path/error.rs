use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntoTarPathError {
    UnrepresentableStr,
    NonCanonical,
    EmptyPath,
    TooLong(usize),
}

impl std::error::Error for IntoTarPathError {}

impl fmt::Display for IntoTarPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntoTarPathError::TooLong(len) => write!(
                f,
                "{} ({} bytes, at most {} allowed)",
                self.as_str(),
                len,
                super::NAME_MAX
            ),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

impl IntoTarPathError {
    pub fn as_str(&self) -> &str {
        match self {
            IntoTarPathError::NonCanonical => "path escapes the extraction directory",
            IntoTarPathError::UnrepresentableStr => "unrepresentable string found in path",
            IntoTarPathError::EmptyPath => "no path provided",
            IntoTarPathError::TooLong(_) => "path too long for a ustar name field",
        }
    }
}
