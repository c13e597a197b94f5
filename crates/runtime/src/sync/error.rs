use stat_core::{ErrorSeverity, Identifier, OwnerId, StatError, ValueError};

/// Failure of one owner's reconciliation pass.
///
/// Batch passes log these and move on; the owner is retried next pass.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error("owner {owner} reports non-positive native max {value}")]
    NonPositiveNativeMax { owner: OwnerId, value: f64 },

    #[error("owner {owner} reports non-finite native values (max {max}, current {current})")]
    NonFiniteNative {
        owner: OwnerId,
        max: f64,
        current: f64,
    },

    #[error("attribute {id} is not registered")]
    MissingDefinition { id: Identifier },

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl StatError for SyncError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NonPositiveNativeMax { .. } | Self::NonFiniteNative { .. } => {
                ErrorSeverity::Recoverable
            }
            Self::MissingDefinition { .. } => ErrorSeverity::Internal,
            Self::Value(error) => error.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveNativeMax { .. } => "SYNC_NON_POSITIVE_NATIVE_MAX",
            Self::NonFiniteNative { .. } => "SYNC_NON_FINITE_NATIVE",
            Self::MissingDefinition { .. } => "SYNC_MISSING_DEFINITION",
            Self::Value(error) => error.error_code(),
        }
    }
}
