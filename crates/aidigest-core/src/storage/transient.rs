//! Classification of database errors that may clear up on their own
//!
//! Lock contention, interrupted I/O and a saturated pool are worth another attempt by the
//! caller; constraint violations and SQL errors are not.

/// SQLite extended result codes (as reported by sqlx) treated as transient:
/// - SQLITE_BUSY (5): Database locked by another connection
/// - SQLITE_LOCKED (6): Database table is locked
/// - SQLITE_IOERR (10): Base I/O error
/// - SQLITE_IOERR_READ (266): I/O error during read
/// - SQLITE_IOERR_SHORT_READ (522): Read returned fewer bytes than expected
/// - SQLITE_BUSY_SNAPSHOT (1032): Busy due to WAL snapshot
/// - SQLITE_IOERR_WRITE (2314): I/O error during write
/// - SQLITE_IOERR_FSYNC (3338): I/O error during fsync
/// - SQLITE_IOERR_LOCK (5386): I/O error getting file lock
const SQLITE_TRANSIENT_CODES: &[&str] = &["5", "6", "10", "266", "522", "1032", "2314", "3338", "5386"];

/// PostgreSQL SQLSTATE codes treated as transient:
/// - 40001 serialization_failure
/// - 40P01 deadlock_detected
/// - 53300 too_many_connections
/// - 57P03 cannot_connect_now
const POSTGRES_TRANSIENT_CODES: &[&str] = &["40001", "40P01", "53300", "57P03"];

/// Check if a database error is transient and the operation could be retried
pub fn is_transient_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => is_transient_code(&code),
            None => false,
        },
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}

fn is_transient_code(code: &str) -> bool {
    SQLITE_TRANSIENT_CODES.contains(&code) || POSTGRES_TRANSIENT_CODES.contains(&code)
}
