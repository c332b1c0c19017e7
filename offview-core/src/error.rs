/// Error types for mesh loading, normal derivation and configuration
use thiserror::Error;

/// Why a line of mesh text was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatReason {
    #[error("bad magic")]
    BadMagic,
    #[error("bad token count")]
    BadTokenCount,
    #[error("bad number")]
    BadNumber,
    #[error("non-finite value")]
    NonFinite,
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("trailing data")]
    TrailingData,
    #[error("face has fewer than three vertices")]
    FaceTooSmall,
}

/// Malformed mesh text. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct FormatError {
    pub line: usize,
    pub reason: FormatReason,
}

impl FormatError {
    pub fn new(line: usize, reason: FormatReason) -> Self {
        Self { line, reason }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NormalReason {
    #[error("orphan vertex {vertex}")]
    OrphanVertex { vertex: usize },
    #[error("degenerate face {triangle}")]
    DegenerateFace { triangle: usize },
    #[error("non-finite normal at vertex {vertex}")]
    NonFinite { vertex: usize },
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Normals could not be derived without producing NaN or garbage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("normal error: {reason}")]
pub struct NormalError {
    pub reason: NormalReason,
}

impl From<NormalReason> for NormalError {
    fn from(reason: NormalReason) -> Self {
        Self { reason }
    }
}

/// A packed mesh would violate one of its invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshBuildError {
    #[error("triangle index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("{array} holds {actual} floats, expected {expected}")]
    LengthMismatch {
        array: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{len} triangle indices is not a multiple of three")]
    PartialTriangle { len: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Unified error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    #[error(transparent)]
    Normal(#[from] NormalError),
    #[error("mesh build error: {0}")]
    MeshBuild(#[from] MeshBuildError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
