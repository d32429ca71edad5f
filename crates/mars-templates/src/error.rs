use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    // Compile errors
    #[error("SYNTAX: {message} (line {line})")]
    Syntax { message: String, line: usize },

    #[error("EMPTY_TEMPLATE_NAME: directive has an empty template name (line {line})")]
    EmptyTemplateName { line: usize },

    #[error("INCLUDE_NOT_FOUND: @include('{name}') resolved to missing file {path}")]
    IncludeNotFound { name: String, path: PathBuf },

    #[error("TEMPLATE_NOT_FOUND: template '{name}' not found at {path}")]
    TemplateNotFound { name: String, path: PathBuf },

    #[error("TEMPLATE_PATH_ESCAPE: template name '{name}' is not a safe relative path: {reason}")]
    TemplatePathEscape { name: String, reason: String },

    #[error("UNKNOWN_MODIFIER: '{name}' is not a registered modifier (line {line})")]
    UnknownModifier { name: String, line: usize },

    #[error("RESERVED_MODIFIER: '{name}' cannot be registered")]
    ReservedModifier { name: String },

    // File errors
    #[error("SOURCE_READ_FAILED: failed to read {path}: {reason}")]
    SourceRead { path: PathBuf, reason: String },

    #[error("CACHE_WRITE_FAILED: failed to write {path}: {reason}")]
    CacheWrite { path: PathBuf, reason: String },

    // Render errors
    #[error("UNDEFINED_VALUE: '{name}' is not defined (line {line})")]
    UndefinedValue { name: String, line: usize },

    #[error("ARRAY_IN_VALUE: '{expr}' is an array; iterate it with @foreach (line {line})")]
    ArrayInValue { expr: String, line: usize },

    #[error("TABLE_IN_VALUE: '{expr}' is a table; interpolate one of its keys instead (line {line})")]
    TableInValue { expr: String, line: usize },

    #[error("NOT_ITERABLE: '{expr}' is not an array or table (line {line})")]
    NotIterable { expr: String, line: usize },

    #[error("TYPE_MISMATCH: operator '{op}': {reason} (line {line})")]
    TypeMismatch {
        op: String,
        reason: String,
        line: usize,
    },

    #[error("MODIFIER_FAILED: '{name}': {reason} (line {line})")]
    Modifier {
        name: String,
        reason: String,
        line: usize,
    },

    #[error("INCLUDE_DEPTH: include depth exceeded {depth} while rendering {path}")]
    IncludeDepth { path: PathBuf, depth: usize },

    // Anything else from the filesystem
    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
