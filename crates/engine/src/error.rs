use std::fmt;

use funclib_io::FetchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    /// Fetching or parsing a tab failed.
    Fetch(FetchError),
    /// The index tab came back with no rows at all.
    EmptyIndex,
    /// No column of the index tab has a name below the header row.
    NoUsableColumn,
    /// The chosen index column has no non-empty names.
    AllRowsEmpty,
}

impl LibraryError {
    /// True for the failures that mean "the index tab itself is unusable".
    pub fn is_index_problem(&self) -> bool {
        matches!(self, Self::EmptyIndex | Self::NoUsableColumn | Self::AllRowsEmpty)
    }
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "{e}"),
            Self::EmptyIndex => write!(f, "index tab is empty"),
            Self::NoUsableColumn => write!(f, "index tab has no column with names from row 2 down"),
            Self::AllRowsEmpty => write!(f, "index tab lists no tab names"),
        }
    }
}

impl std::error::Error for LibraryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FetchError> for LibraryError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}
