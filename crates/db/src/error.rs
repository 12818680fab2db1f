use hof_core::error::CoreError;

/// Postgres SQLSTATE codes that mean "another transaction got there first".
const LOCK_NOT_AVAILABLE: &str = "55P03";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Failure of a multi-statement store operation.
///
/// Single-query repository methods return `sqlx::Error` directly; operations
/// that also enforce domain rules (merges, allow-listing, engagement) return
/// this instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if let Some(code) = db_err.code() {
                if matches!(
                    &*code,
                    LOCK_NOT_AVAILABLE | SERIALIZATION_FAILURE | DEADLOCK_DETECTED
                ) {
                    return StoreError::Core(CoreError::TransactionConflict(
                        db_err.message().to_string(),
                    ));
                }
            }
        }
        StoreError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn core_errors_pass_through() {
        let err: StoreError = CoreError::NoEligibleContent.into();
        assert_matches!(err, StoreError::Core(CoreError::NoEligibleContent));
    }

    #[test]
    fn non_database_sqlx_errors_stay_database_errors() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert_matches!(err, StoreError::Database(sqlx::Error::RowNotFound));
    }
}
