use std::fmt;

/// Machine-readable error codes for the load, compute and write boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputNotFound,
    InputUnreadable,
    MalformedEdgeLine,
    DatasetParseError,
    ConfigParseError,
    UnknownNode,
    OutputWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputNotFound => "E1001",
            Self::InputUnreadable => "E1002",
            Self::MalformedEdgeLine => "E1003",
            Self::DatasetParseError => "E1004",
            Self::ConfigParseError => "E1005",
            Self::UnknownNode => "E2001",
            Self::OutputWriteFailed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputNotFound => "Input file not found",
            Self::InputUnreadable => "Input file could not be read",
            Self::MalformedEdgeLine => "Malformed edge line",
            Self::DatasetParseError => "Artist dataset parse error",
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownNode => "Node not present in the index",
            Self::OutputWriteFailed => "Output write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputNotFound => Some("Check the input path and retry."),
            Self::InputUnreadable => Some("Check read permissions and that the file is UTF-8 text."),
            Self::MalformedEdgeLine => {
                Some("Every line must hold exactly two whitespace-separated node ids.")
            }
            Self::DatasetParseError => {
                Some("The artist dataset must be a plain JSON object keyed by artist id.")
            }
            Self::ConfigParseError => Some("Fix syntax in cdindex.toml and retry."),
            Self::UnknownNode => None,
            Self::OutputWriteFailed => Some("Check disk space and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
