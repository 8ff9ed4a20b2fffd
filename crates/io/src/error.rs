/// Error type for fetching and parsing a tab export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure (DNS, connect, timeout, body read)
    Network(String),
    /// Non-2xx status with a short body excerpt
    Http(u16, String),
    /// Body is not well-formed delimited text
    Parse(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::Http(code, msg) if msg.is_empty() => write!(f, "HTTP {}", code),
            FetchError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            FetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}
