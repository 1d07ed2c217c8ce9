//! Models and types related to the content store.

use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard};

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};

use serde::Serialize;

use crate::schema::{reply, thread};
use crate::{Error, Result};

pub mod board;
pub mod memory;
pub mod postgres;

pub use board::{Board, Registry};
pub use memory::MemoryStore;

/// A board ID.
pub type BoardId = i32;
/// A thread ID.
pub type ThreadId = i32;
/// A reply ID.
pub type ReplyId = i32;

/// A top-level post on a board.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Serialize)]
pub struct Thread {
    /// The ID of the thread.
    pub id: ThreadId,
    /// When the thread was created, in seconds since the epoch.
    pub time_stamp: i64,
    /// The title of the thread.
    pub title: String,
    /// The body of the thread.
    pub comment: String,
    /// The board that this thread was created on.
    pub board_id: BoardId,
}

/// A follow-up post on a thread.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Serialize)]
pub struct Reply {
    /// The ID of the reply.
    pub id: ReplyId,
    /// When the reply was created, in seconds since the epoch.
    pub time_stamp: i64,
    /// The body of the reply.
    pub comment: String,
    /// The thread that this reply was posted on.
    pub thread_id: ThreadId,
}

/// A new thread to be inserted in the store.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = thread)]
pub struct NewThread {
    pub time_stamp: i64,
    pub title: String,
    pub comment: String,
    pub board_id: BoardId,
}

/// A new reply to be inserted in the store.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reply)]
pub struct NewReply {
    pub time_stamp: i64,
    pub comment: String,
    pub thread_id: ThreadId,
}

/// Something a lifecycle operation holds exclusively for the length of its
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lock {
    /// Thread creation on a board.
    Board(BoardId),
    /// Reply creation on a thread.
    Thread(ThreadId),
}

impl Lock {
    /// The lock as a pair of keys, the first telling boards from threads.
    pub fn key(self) -> (i32, i32) {
        match self {
            Lock::Board(board_id) => (1, board_id),
            Lock::Thread(thread_id) => (2, thread_id),
        }
    }
}

/// The operations the board needs from its content store.
///
/// Deleting a thread also deletes its replies. Lists of threads are ordered
/// newest first (creation time, then ID); replies are ordered oldest first.
pub trait Gateway {
    /// The number of threads on a board.
    fn count_threads(&mut self, board_id: BoardId) -> Result<i64>;

    /// The number of replies on a thread.
    fn count_replies(&mut self, thread_id: ThreadId) -> Result<i64>;

    /// The thread on a board with the earliest creation time, the lowest ID
    /// winning ties.
    fn oldest_thread(&mut self, board_id: BoardId) -> Result<Thread>;

    /// Insert a new thread.
    fn create_thread(&mut self, new_thread: NewThread) -> Result<Thread>;

    /// Delete a thread and all of its replies.
    fn delete_thread(&mut self, thread_id: ThreadId) -> Result<()>;

    /// Insert a new reply.
    fn create_reply(&mut self, new_reply: NewReply) -> Result<Reply>;

    /// Up to `limit` of the most recent threads across all boards.
    fn recent_threads(&mut self, limit: u32) -> Result<Vec<Thread>>;

    /// All threads on a board.
    fn board_threads(&mut self, board_id: BoardId) -> Result<Vec<Thread>>;

    /// Get a thread.
    fn thread(&mut self, thread_id: ThreadId) -> Result<Thread>;

    /// All replies on a thread.
    fn replies(&mut self, thread_id: ThreadId) -> Result<Vec<Reply>>;

    /// Wait for and take `lock`. It is released when the open transaction
    /// commits or rolls back.
    fn lock(&mut self, lock: Lock) -> Result<()>;

    /// Open a transaction.
    fn begin(&mut self) -> Result<()>;

    /// Commit the open transaction.
    fn commit(&mut self) -> Result<()>;

    /// Abandon the open transaction.
    fn rollback(&mut self) -> Result<()>;
}

/// Run `f` inside one transaction of the gateway, committing if it succeeds
/// and rolling back if it fails.
pub fn transaction<G, T, F>(gateway: &mut G, f: F) -> Result<T>
where
    G: Gateway + ?Sized,
    F: FnOnce(&mut G) -> Result<T>,
{
    gateway.begin()?;

    match f(gateway) {
        Ok(value) => {
            gateway.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = gateway.rollback() {
                log::error!("Couldn't roll back transaction: {}", rollback_err);
            }
            Err(err)
        }
    }
}

/// A pool of PostgreSQL connections.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// The content store shared by every request.
pub enum Store {
    Postgres(PgPool),
    Memory(Mutex<MemoryStore>),
}

impl Debug for Store {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Store::Postgres(pool) => {
                let state = pool.state();

                write!(
                    fmt,
                    "<#Store postgres connections={} idle_connections={}>",
                    state.connections, state.idle_connections,
                )
            }
            Store::Memory(_) => write!(fmt, "<#Store memory>"),
        }
    }
}

impl Store {
    /// The database URL that selects the in-memory store.
    pub const MEMORY_URL: &'static str = "memory";

    /// Open the store named by a database URL.
    pub fn open<S>(database_url: S) -> Result<Store>
    where
        S: AsRef<str>,
    {
        let database_url = database_url.as_ref();

        if database_url == Store::MEMORY_URL {
            log::info!("Using the in-memory store; content will not persist");
            return Ok(Store::Memory(Mutex::new(MemoryStore::default())));
        }

        Ok(Store::Postgres(postgres::open_pool(database_url)?))
    }

    /// Check out a connection to the store for one request.
    pub fn connect(&self) -> Result<StoreConnection<'_>> {
        match self {
            Store::Postgres(pool) => Ok(StoreConnection::Postgres(pool.get()?)),
            Store::Memory(store) => Ok(StoreConnection::Memory(
                store.lock().map_err(|_| Error::StorePoisoned)?,
            )),
        }
    }
}

/// A connection to the store, held for the length of one request.
pub enum StoreConnection<'a> {
    Postgres(PooledConnection<ConnectionManager<PgConnection>>),
    Memory(MutexGuard<'a, MemoryStore>),
}

impl StoreConnection<'_> {
    /// The gateway behind this connection.
    pub fn gateway(&mut self) -> &mut dyn Gateway {
        match self {
            StoreConnection::Postgres(conn) => &mut **conn,
            StoreConnection::Memory(store) => &mut **store,
        }
    }
}
