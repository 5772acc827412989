// src/services/mod.rs

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::AppError;

pub mod course;
pub mod document;
pub mod enrollment;
pub mod learning_item;
pub mod mail;
pub mod question;
pub mod quiz_attempt;
pub mod quiz_bank;
pub mod storage;
pub mod user;
pub mod week;

/// Starts a transaction that holds SQLite's write lock from `BEGIN` on.
///
/// A deferred transaction that reads first and writes later fails with
/// SQLITE_BUSY when another writer got in between. An immediate one waits
/// for the lock instead, then sees the other writer's rows.
pub(crate) async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, AppError> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}
