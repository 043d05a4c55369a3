use thiserror::Error;

/// Request-level failures raised before flattening runs. The engine
/// itself is total: missing fields resolve to absence, never to an
/// error, so a conversion either fails up front or produces every row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("input batch contains no records")]
    EmptyBatch,

    #[error("no fields selected")]
    NoFields,

    #[error("invalid fields: {}", .0.join(", "))]
    InvalidFields(Vec<String>),
}
