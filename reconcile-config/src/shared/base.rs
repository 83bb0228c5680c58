use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
    /// A required string field is empty.
    #[error("`{0}` cannot be empty")]
    EmptyField(String),
    /// A field holds a value outside of its allowed range.
    #[error("Invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// No column mapping was configured.
    #[error("`sync.column_mappings` must contain at least one mapping")]
    EmptyColumnMappings,
    /// Two source columns are mapped onto the same destination column.
    #[error("destination column `{0}` is the target of more than one column mapping")]
    DuplicateDestinationColumn(String),
    /// The destination primary key is populated from the source or from a constant.
    #[error("destination primary key `{0}` cannot be a mapping or constant target")]
    PrimaryKeyWritten(String),
    /// The destination primary key is also configured as the join key.
    #[error("destination primary key `{0}` cannot also be the join key")]
    PrimaryKeyIsJoinKey(String),
    /// The destination primary key is given a storage encoding.
    #[error("destination primary key `{0}` cannot be transcoded")]
    PrimaryKeyTranscoded(String),
    /// A constant targets a column that is already populated by a mapping.
    #[error("constant for `{0}` collides with a mapped destination column")]
    ConstantShadowsMapping(String),
}
