use thiserror::Error;

use crate::types::AiId;

/// Failures raised by the registry, the wish operations and the codec.
///
/// Load failures are reported per record; a failing record never stops its
/// siblings from loading.
#[derive(Debug, Error)]
pub enum WishError {
    /// The identifier is already bound to a live object.
    #[error("identifier {0} is already bound to a live object")]
    DuplicateIdentifier(AiId),

    /// A wish was created with a negative priority.
    #[error("priority must be non-negative, got {0}")]
    InvalidPriority(i64),

    /// A reference attribute names an object that is not live.
    #[error("{field} reference {id:?} does not resolve")]
    MissingReference { field: &'static str, id: String },

    /// A numeric or boolean attribute failed to parse.
    #[error("malformed {field} attribute: {value:?}")]
    MalformedField { field: &'static str, value: String },

    /// A required attribute is absent from the record.
    #[error("record is missing required attribute {0}")]
    MissingField(&'static str),

    #[error("unknown record tag {0:?}")]
    UnknownTag(String),

    #[error("no wish registered as {0}")]
    UnknownWish(AiId),

    #[error("no carrier registered as {0}")]
    UnknownCarrier(AiId),

    /// A save document claims the same carrier for two wishes.
    #[error("carrier {carrier} is already assigned to {wish}")]
    ConflictingAssignment { carrier: AiId, wish: AiId },

    /// The id counter has no values left to issue.
    #[error("no identifiers left to issue under prefix {0:?}")]
    IdsExhausted(String),

    #[error("save document: {0}")]
    Json(#[from] serde_json::Error),
}
