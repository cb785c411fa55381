use crate::application::repos::RepoError;

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Duplicate {
            constraint: db.constraint().unwrap_or("unknown").to_string(),
        },
        sqlx::Error::Database(db) if db.message().contains("invalid input syntax") => {
            RepoError::InvalidInput {
                message: db.message().to_string(),
            }
        }
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to user request") =>
        {
            RepoError::Timeout
        }
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        other => RepoError::from_persistence(other),
    }
}

pub(crate) fn convert_count(count: i64) -> Result<u64, RepoError> {
    u64::try_from(count).map_err(|_| RepoError::InvalidInput {
        message: format!("negative row count {count}"),
    })
}

pub(crate) fn to_limit(limit: u32) -> i64 {
    i64::from(limit)
}

pub(crate) fn to_offset(offset: u64) -> Result<i64, RepoError> {
    i64::try_from(offset).map_err(|_| RepoError::InvalidInput {
        message: format!("offset {offset} out of range"),
    })
}
