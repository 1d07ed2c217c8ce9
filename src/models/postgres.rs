//! The PostgreSQL content store.

use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::{delete, insert_into, prelude::*};

use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::models::*;
use crate::{Error, Result};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Open a pool of connections to the database and bring its schema up to
/// date.
pub fn open_pool<S>(url: S) -> Result<PgPool>
where
    S: AsRef<str>,
{
    let pool = Pool::new(ConnectionManager::new(url.as_ref()))?;

    let mut pooled = pool.get()?;
    let conn: &mut PgConnection = &mut pooled;

    for version in conn.run_pending_migrations(MIGRATIONS)? {
        log::info!("Ran database migration {}", version);
    }

    Ok(pool)
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a thread.
fn conv_thread_error(
    thread_id: ThreadId,
) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e: diesel::result::Error| match e {
        diesel::result::Error::NotFound => Error::ThreadNotFound { thread_id },
        _ => Error::from(e),
    }
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for the threads of a board.
fn conv_board_error(
    board_id: BoardId,
) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e: diesel::result::Error| match e {
        diesel::result::Error::NotFound => Error::BoardEmpty { board_id },
        _ => Error::from(e),
    }
}

impl Gateway for PgConnection {
    fn count_threads(&mut self, board: BoardId) -> Result<i64> {
        use crate::schema::thread::columns::board_id;
        use crate::schema::thread::dsl::thread;

        Ok(thread
            .filter(board_id.eq(board))
            .count()
            .get_result(self)?)
    }

    fn count_replies(&mut self, tid: ThreadId) -> Result<i64> {
        use crate::schema::reply::columns::thread_id;
        use crate::schema::reply::dsl::reply;

        Ok(reply.filter(thread_id.eq(tid)).count().get_result(self)?)
    }

    fn oldest_thread(&mut self, board: BoardId) -> Result<Thread> {
        use crate::schema::thread::columns::{board_id, id, time_stamp};
        use crate::schema::thread::dsl::thread;

        thread
            .filter(board_id.eq(board))
            .order_by(time_stamp.asc())
            .then_order_by(id.asc())
            .first(self)
            .map_err(conv_board_error(board))
    }

    fn create_thread(&mut self, new_thread: NewThread) -> Result<Thread> {
        use crate::schema::thread::dsl::thread;

        Ok(insert_into(thread).values(&new_thread).get_result(self)?)
    }

    fn delete_thread(&mut self, tid: ThreadId) -> Result<()> {
        use crate::schema::thread::columns::id;
        use crate::schema::thread::dsl::thread;

        // Replies go with it through the foreign key's ON DELETE CASCADE.
        let deleted = delete(thread.filter(id.eq(tid))).execute(self)?;

        if deleted == 0 {
            return Err(Error::ThreadNotFound { thread_id: tid });
        }

        Ok(())
    }

    fn create_reply(&mut self, new_reply: NewReply) -> Result<Reply> {
        use crate::schema::reply::dsl::reply;

        Ok(insert_into(reply).values(&new_reply).get_result(self)?)
    }

    fn recent_threads(&mut self, limit: u32) -> Result<Vec<Thread>> {
        use crate::schema::thread::columns::{id, time_stamp};
        use crate::schema::thread::dsl::thread;

        Ok(thread
            .order_by(time_stamp.desc())
            .then_order_by(id.desc())
            .limit(limit.into())
            .load(self)?)
    }

    fn board_threads(&mut self, board: BoardId) -> Result<Vec<Thread>> {
        use crate::schema::thread::columns::{board_id, id, time_stamp};
        use crate::schema::thread::dsl::thread;

        Ok(thread
            .filter(board_id.eq(board))
            .order_by(time_stamp.desc())
            .then_order_by(id.desc())
            .load(self)?)
    }

    fn thread(&mut self, thread_id: ThreadId) -> Result<Thread> {
        use crate::schema::thread::columns::id;
        use crate::schema::thread::dsl::thread;

        thread
            .filter(id.eq(thread_id))
            .limit(1)
            .first(self)
            .map_err(conv_thread_error(thread_id))
    }

    fn replies(&mut self, tid: ThreadId) -> Result<Vec<Reply>> {
        use crate::schema::reply::columns::{id, thread_id};
        use crate::schema::reply::dsl::reply;

        Ok(reply
            .filter(thread_id.eq(tid))
            .order(id.asc())
            .load(self)?)
    }

    fn lock(&mut self, lock: Lock) -> Result<()> {
        use diesel::sql_types::Integer;

        let (kind, id) = lock.key();

        diesel::sql_query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind::<Integer, _>(kind)
            .bind::<Integer, _>(id)
            .execute(self)?;

        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        Ok(AnsiTransactionManager::begin_transaction(self)?)
    }

    fn commit(&mut self) -> Result<()> {
        Ok(AnsiTransactionManager::commit_transaction(self)?)
    }

    fn rollback(&mut self) -> Result<()> {
        Ok(AnsiTransactionManager::rollback_transaction(self)?)
    }
}
