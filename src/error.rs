//! Error types for netcontext.
//!
//! Unrecognised configuration lines are never errors: the parser skips them.
//! The variants here cover the cases where carrying on would silently
//! corrupt the tree handed to the diffing layer, plus the failures of the
//! surrounding tool (settings, I/O, serialisation).

use thiserror::Error;

/// Result type alias for netcontext operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for netcontext.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Grammar Errors
    // ========================================================================
    /// A command pattern failed to compile when it was registered.
    #[error("Invalid pattern for context '{context}': {pattern}")]
    InvalidPattern {
        /// Context the command was being registered into
        context: String,
        /// The uncompiled pattern
        pattern: String,
        /// Source error
        #[source]
        source: regex::Error,
    },

    // ========================================================================
    // Rule Errors
    // ========================================================================
    /// An access-list rule body did not match the detailed rule syntax.
    #[error("Failed to parse {kind} ACL rule: {rule}")]
    AclRule {
        /// Which rule dialect was expected
        kind: &'static str,
        /// The rule text
        rule: String,
    },

    /// A port token that is neither a known service name nor a number.
    #[error("Unknown service or port: '{0}'")]
    UnknownService(String),

    /// An address or mask that cannot be turned into an address range.
    #[error("Invalid address '{value}': {message}")]
    InvalidAddress {
        /// The offending text
        value: String,
        /// Error message
        message: String,
    },

    /// A VLAN tag list such as `1,3-5` with an item that is not a number.
    #[error("Invalid tag list '{0}'")]
    InvalidTagList(String),

    // ========================================================================
    // Tree Errors
    // ========================================================================
    /// An attribute already holds a value of a different shape.
    #[error("Attribute '{key}' holds a {found}, expected a {expected}")]
    TypeConflict {
        /// Attribute key
        key: String,
        /// Shape the caller needed
        expected: &'static str,
        /// Shape actually stored
        found: &'static str,
    },

    /// An action asked for a capture group its pattern does not define.
    #[error("Capture group '{0}' not present in match")]
    MissingGroup(String),

    /// An action needed an enclosing object but the context carries none.
    #[error("No enclosing {0} for this command")]
    MissingFocus(&'static str),

    /// A failure raised while handling one input line.
    #[error("Line {line_no}: {source} (in '{line}')")]
    Line {
        /// 1-based line number
        line_no: usize,
        /// The line as read
        line: String,
        /// What went wrong
        #[source]
        source: Box<Error>,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Settings error.
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // IO and Serialization Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Creates a new ACL rule error.
    pub fn acl_rule(kind: &'static str, rule: impl Into<String>) -> Self {
        Self::AclRule {
            kind,
            rule: rule.into(),
        }
    }

    /// Creates a new invalid address error.
    pub fn invalid_address(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Wraps this error with the line it was raised on.
    pub fn at_line(self, line_no: usize, line: impl Into<String>) -> Self {
        Self::Line {
            line_no,
            line: line.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through line wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Line { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the line number the error was raised on, if known.
    pub fn line_no(&self) -> Option<usize> {
        match self {
            Error::Line { line_no, .. } => Some(*line_no),
            _ => None,
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self.root() {
            Error::Config(_) | Error::TomlParse(_) => 2,
            Error::Io(_) => 3,
            Error::AclRule { .. }
            | Error::UnknownService(_)
            | Error::InvalidAddress { .. }
            | Error::InvalidTagList(_)
            | Error::TypeConflict { .. } => 4,
            _ => 1,
        }
    }
}
