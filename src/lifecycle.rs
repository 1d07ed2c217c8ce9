//! Creating threads and replies within the capacity of boards and threads.
//!
//! A full board makes room for a new thread by deleting its oldest thread. A
//! full thread is deleted outright when someone tries to reply to it, and the
//! reply is thrown away.
//!
//! Each operation runs in one store transaction that first locks the board or
//! thread it changes. Concurrent posts to one board take turns, so the count
//! they read is the count they act on.

use log::{debug, info, warn};

use crate::models::{
    transaction, BoardId, Gateway, Lock, NewReply, NewThread, Reply, Thread,
    ThreadId,
};
use crate::{Error, Result};

/// How much a board and a thread can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// The most threads a board holds.
    pub max_threads: u32,
    /// The most replies a thread holds.
    pub max_replies: u32,
}

impl Limits {
    /// Create limits, rejecting a board or thread that could hold nothing.
    pub fn new(max_threads: u32, max_replies: u32) -> Result<Limits> {
        if max_threads == 0 {
            return Err(Error::ZeroLimit {
                name: "thread_limit",
            });
        }

        if max_replies == 0 {
            return Err(Error::ZeroLimit { name: "reply_limit" });
        }

        Ok(Limits {
            max_threads,
            max_replies,
        })
    }
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            max_threads: 20,
            max_replies: 20,
        }
    }
}

/// What became of a submitted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The reply was stored.
    Created(Reply),
    /// The thread was full, so it was deleted along with its replies. The
    /// submitted reply was not stored.
    Killed(ThreadId),
}

/// Create a thread on a board, first evicting the board's oldest thread if
/// the board is full.
pub fn create_thread<G>(
    db: &mut G,
    limits: Limits,
    board_id: BoardId,
    title: &str,
    comment: &str,
    time_stamp: i64,
) -> Result<Thread>
where
    G: Gateway + ?Sized,
{
    transaction(db, |db| {
        db.lock(Lock::Board(board_id))?;

        if db.count_threads(board_id)? >= i64::from(limits.max_threads) {
            let oldest = db.oldest_thread(board_id)?;

            match db.delete_thread(oldest.id) {
                Ok(()) => {
                    info!("Evicted thread #{} from board #{}", oldest.id, board_id)
                }
                // Gone already, which is all eviction needs.
                Err(Error::ThreadNotFound { .. }) => {
                    debug!("Thread #{} was already deleted", oldest.id)
                }
                Err(err) => return Err(err),
            }
        }

        let thread = db.create_thread(NewThread {
            time_stamp,
            title: title.to_string(),
            comment: comment.to_string(),
            board_id,
        })?;

        info!("Created thread #{} on board #{}", thread.id, board_id);

        Ok(thread)
    })
}

/// Reply to a thread, or delete the thread if it's already full.
pub fn create_reply<G>(
    db: &mut G,
    limits: Limits,
    thread_id: ThreadId,
    comment: &str,
    time_stamp: i64,
) -> Result<ReplyOutcome>
where
    G: Gateway + ?Sized,
{
    transaction(db, |db| {
        db.lock(Lock::Thread(thread_id))?;

        // A deleted thread stays deleted; don't count zero replies on it.
        db.thread(thread_id)?;

        if db.count_replies(thread_id)? >= i64::from(limits.max_replies) {
            db.delete_thread(thread_id)?;

            warn!("Thread #{} was killed by reply overflow", thread_id);

            return Ok(ReplyOutcome::Killed(thread_id));
        }

        let reply = db.create_reply(NewReply {
            time_stamp,
            comment: comment.to_string(),
            thread_id,
        })?;

        info!("Created reply #{} on thread #{}", reply.id, thread_id);

        Ok(ReplyOutcome::Created(reply))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::MemoryStore;

    fn fill_board(db: &mut MemoryStore, board_id: BoardId, n: i64) -> Vec<Thread> {
        (0..n)
            .map(|i| {
                create_thread(db, Limits::default(), board_id, "t", "c", 100 + i)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn board_never_exceeds_limit() {
        let mut db = MemoryStore::default();

        for i in 0..45 {
            create_thread(&mut db, Limits::default(), 1, "t", "c", i).unwrap();
            assert!(db.count_threads(1).unwrap() <= 20);
        }

        assert_eq!(db.count_threads(1).unwrap(), 20);
    }

    #[test]
    fn twenty_first_thread_evicts_oldest() {
        let mut db = MemoryStore::default();

        let threads = fill_board(&mut db, 1, 20);
        let other_board = fill_board(&mut db, 2, 1);

        let newest =
            create_thread(&mut db, Limits::default(), 1, "new", "c", 500).unwrap();

        let remaining: Vec<ThreadId> =
            db.board_threads(1).unwrap().iter().map(|t| t.id).collect();

        assert_eq!(remaining.len(), 20);
        assert!(!remaining.contains(&threads[0].id));
        assert!(remaining.contains(&threads[1].id));
        assert!(remaining.contains(&newest.id));
        assert!(db.thread(other_board[0].id).is_ok());
    }

    #[test]
    fn eviction_breaks_ties_by_lowest_id() {
        let mut db = MemoryStore::default();

        // Two threads share a time stamp; the oldest one was created last.
        let limits = Limits {
            max_threads: 3,
            max_replies: 20,
        };
        let a = create_thread(&mut db, limits, 1, "a", "c", 10).unwrap();
        let b = create_thread(&mut db, limits, 1, "b", "c", 10).unwrap();
        let c = create_thread(&mut db, limits, 1, "c", "c", 5).unwrap();

        create_thread(&mut db, limits, 1, "d", "c", 20).unwrap();
        assert!(matches!(db.thread(c.id), Err(Error::ThreadNotFound { .. })));

        create_thread(&mut db, limits, 1, "e", "c", 20).unwrap();
        assert!(db.thread(a.id).is_err());
        assert!(db.thread(b.id).is_ok());
    }

    #[test]
    fn twenty_first_reply_kills_thread() {
        let mut db = MemoryStore::default();
        let thread =
            create_thread(&mut db, Limits::default(), 1, "t", "c", 1).unwrap();

        for i in 0..20 {
            let outcome =
                create_reply(&mut db, Limits::default(), thread.id, "r", i).unwrap();
            assert!(matches!(outcome, ReplyOutcome::Created(_)));
        }

        let outcome =
            create_reply(&mut db, Limits::default(), thread.id, "last", 99).unwrap();

        assert_eq!(outcome, ReplyOutcome::Killed(thread.id));
        assert!(db.thread(thread.id).unwrap_err().is_not_found());
        assert_eq!(db.count_replies(thread.id).unwrap(), 0);
    }

    #[test]
    fn reply_to_deleted_thread_is_not_found() {
        let mut db = MemoryStore::default();

        let res = create_reply(&mut db, Limits::default(), 7, "hello", 1);

        assert!(res.unwrap_err().is_not_found());
        assert_eq!(db.count_replies(7).unwrap(), 0);
    }

    /// Where a `Faulty` store goes wrong.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Fault {
        Nothing,
        /// Another poster deletes the thread first.
        DeletedElsewhere,
        CreateThread,
        CountReplies,
    }

    /// A memory store that fails on purpose and records the locks it's asked
    /// for.
    struct Faulty {
        store: MemoryStore,
        fault: Fault,
        locks: Vec<Lock>,
    }

    impl Faulty {
        fn new() -> Faulty {
            Faulty {
                store: MemoryStore::default(),
                fault: Fault::Nothing,
                locks: Vec::new(),
            }
        }

        fn broken() -> Error {
            Error::DatabaseError(diesel::result::Error::RollbackTransaction)
        }
    }

    impl Gateway for Faulty {
        fn count_threads(&mut self, board_id: BoardId) -> Result<i64> {
            self.store.count_threads(board_id)
        }

        fn count_replies(&mut self, thread_id: ThreadId) -> Result<i64> {
            if self.fault == Fault::CountReplies {
                return Err(Faulty::broken());
            }
            self.store.count_replies(thread_id)
        }

        fn oldest_thread(&mut self, board_id: BoardId) -> Result<Thread> {
            self.store.oldest_thread(board_id)
        }

        fn create_thread(&mut self, new_thread: NewThread) -> Result<Thread> {
            if self.fault == Fault::CreateThread {
                return Err(Faulty::broken());
            }
            self.store.create_thread(new_thread)
        }

        fn delete_thread(&mut self, thread_id: ThreadId) -> Result<()> {
            self.store.delete_thread(thread_id)?;

            if self.fault == Fault::DeletedElsewhere {
                return Err(Error::ThreadNotFound { thread_id });
            }
            Ok(())
        }

        fn create_reply(&mut self, new_reply: NewReply) -> Result<Reply> {
            self.store.create_reply(new_reply)
        }

        fn recent_threads(&mut self, limit: u32) -> Result<Vec<Thread>> {
            self.store.recent_threads(limit)
        }

        fn board_threads(&mut self, board_id: BoardId) -> Result<Vec<Thread>> {
            self.store.board_threads(board_id)
        }

        fn thread(&mut self, thread_id: ThreadId) -> Result<Thread> {
            self.store.thread(thread_id)
        }

        fn replies(&mut self, thread_id: ThreadId) -> Result<Vec<Reply>> {
            self.store.replies(thread_id)
        }

        fn lock(&mut self, lock: Lock) -> Result<()> {
            self.locks.push(lock);
            Ok(())
        }

        fn begin(&mut self) -> Result<()> {
            self.store.begin()
        }

        fn commit(&mut self) -> Result<()> {
            self.store.commit()
        }

        fn rollback(&mut self) -> Result<()> {
            self.store.rollback()
        }
    }

    fn fill_faulty_board(db: &mut Faulty, n: i64) -> Vec<Thread> {
        (0..n)
            .map(|i| create_thread(db, Limits::default(), 1, "t", "c", 100 + i).unwrap())
            .collect()
    }

    #[test]
    fn operations_lock_what_they_change() {
        let mut db = Faulty::new();

        let thread = create_thread(&mut db, Limits::default(), 2, "t", "c", 1).unwrap();
        create_reply(&mut db, Limits::default(), thread.id, "r", 2).unwrap();

        assert_eq!(db.locks, vec![Lock::Board(2), Lock::Thread(thread.id)]);
    }

    #[test]
    fn eviction_of_a_thread_deleted_elsewhere_still_posts() {
        let mut db = Faulty::new();
        let threads = fill_faulty_board(&mut db, 20);

        db.fault = Fault::DeletedElsewhere;
        let newest = create_thread(&mut db, Limits::default(), 1, "new", "c", 500).unwrap();

        assert_eq!(db.count_threads(1).unwrap(), 20);
        assert!(db.thread(newest.id).is_ok());
        assert!(db.thread(threads[0].id).is_err());
    }

    #[test]
    fn failed_insert_restores_evicted_thread() {
        let mut db = Faulty::new();
        let threads = fill_faulty_board(&mut db, 20);

        db.fault = Fault::CreateThread;
        let err = create_thread(&mut db, Limits::default(), 1, "new", "c", 500).unwrap_err();

        assert!(!err.is_not_found());
        assert_eq!(db.count_threads(1).unwrap(), 20);
        assert_eq!(db.thread(threads[0].id).unwrap(), threads[0]);
    }

    #[test]
    fn failed_count_keeps_thread_and_reply_out() {
        let mut db = Faulty::new();
        let thread = create_thread(&mut db, Limits::default(), 1, "t", "c", 1).unwrap();

        db.fault = Fault::CountReplies;
        let err = create_reply(&mut db, Limits::default(), thread.id, "r", 2).unwrap_err();

        assert!(!err.is_not_found());
        assert!(db.thread(thread.id).is_ok());
        assert!(db.replies(thread.id).unwrap().is_empty());
    }
}
