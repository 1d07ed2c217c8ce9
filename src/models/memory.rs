//! A content store that lives in process memory.
//!
//! Nothing written here outlives the process. It backs `database_url: memory`
//! and the test suite.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::models::*;
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
struct Tables {
    threads: BTreeMap<ThreadId, Thread>,
    replies: BTreeMap<ReplyId, Reply>,
    last_thread_id: ThreadId,
    last_reply_id: ReplyId,
}

/// An in-memory content store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
    /// The state to return to if the open transaction is rolled back.
    snapshot: Option<Tables>,
}

impl MemoryStore {
    fn threads_newest_first<'a, I>(threads: I) -> Vec<Thread>
    where
        I: Iterator<Item = &'a Thread>,
    {
        let mut threads: Vec<Thread> = threads.cloned().collect();
        threads.sort_by_key(|thread| Reverse((thread.time_stamp, thread.id)));
        threads
    }
}

impl Gateway for MemoryStore {
    fn count_threads(&mut self, board_id: BoardId) -> Result<i64> {
        Ok(self
            .tables
            .threads
            .values()
            .filter(|thread| thread.board_id == board_id)
            .count() as i64)
    }

    fn count_replies(&mut self, thread_id: ThreadId) -> Result<i64> {
        Ok(self
            .tables
            .replies
            .values()
            .filter(|reply| reply.thread_id == thread_id)
            .count() as i64)
    }

    fn oldest_thread(&mut self, board_id: BoardId) -> Result<Thread> {
        self.tables
            .threads
            .values()
            .filter(|thread| thread.board_id == board_id)
            .min_by_key(|thread| (thread.time_stamp, thread.id))
            .cloned()
            .ok_or(Error::BoardEmpty { board_id })
    }

    fn create_thread(&mut self, new_thread: NewThread) -> Result<Thread> {
        self.tables.last_thread_id += 1;

        let thread = Thread {
            id: self.tables.last_thread_id,
            time_stamp: new_thread.time_stamp,
            title: new_thread.title,
            comment: new_thread.comment,
            board_id: new_thread.board_id,
        };

        self.tables.threads.insert(thread.id, thread.clone());

        Ok(thread)
    }

    fn delete_thread(&mut self, thread_id: ThreadId) -> Result<()> {
        if self.tables.threads.remove(&thread_id).is_none() {
            return Err(Error::ThreadNotFound { thread_id });
        }

        self.tables
            .replies
            .retain(|_, reply| reply.thread_id != thread_id);

        Ok(())
    }

    fn create_reply(&mut self, new_reply: NewReply) -> Result<Reply> {
        let thread_id = new_reply.thread_id;

        // Mirrors the foreign key on the reply table.
        if !self.tables.threads.contains_key(&thread_id) {
            return Err(Error::ThreadNotFound { thread_id });
        }

        self.tables.last_reply_id += 1;

        let reply = Reply {
            id: self.tables.last_reply_id,
            time_stamp: new_reply.time_stamp,
            comment: new_reply.comment,
            thread_id,
        };

        self.tables.replies.insert(reply.id, reply.clone());

        Ok(reply)
    }

    fn recent_threads(&mut self, limit: u32) -> Result<Vec<Thread>> {
        let mut threads =
            MemoryStore::threads_newest_first(self.tables.threads.values());
        threads.truncate(limit as usize);
        Ok(threads)
    }

    fn board_threads(&mut self, board_id: BoardId) -> Result<Vec<Thread>> {
        Ok(MemoryStore::threads_newest_first(
            self.tables
                .threads
                .values()
                .filter(|thread| thread.board_id == board_id),
        ))
    }

    fn thread(&mut self, thread_id: ThreadId) -> Result<Thread> {
        self.tables
            .threads
            .get(&thread_id)
            .cloned()
            .ok_or(Error::ThreadNotFound { thread_id })
    }

    fn replies(&mut self, thread_id: ThreadId) -> Result<Vec<Reply>> {
        // Keys are IDs, so this is already oldest first.
        Ok(self
            .tables
            .replies
            .values()
            .filter(|reply| reply.thread_id == thread_id)
            .cloned()
            .collect())
    }

    fn lock(&mut self, _lock: Lock) -> Result<()> {
        // Connections hold the store's mutex for the whole request.
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.snapshot.take().map(drop).ok_or(Error::NoTransaction)
    }

    fn rollback(&mut self) -> Result<()> {
        self.tables = self.snapshot.take().ok_or(Error::NoTransaction)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_thread(board_id: BoardId, time_stamp: i64) -> NewThread {
        NewThread {
            time_stamp,
            title: format!("title {}", time_stamp),
            comment: format!("comment {}", time_stamp),
            board_id,
        }
    }

    #[test]
    fn ids_are_assigned_in_order() {
        let mut store = MemoryStore::default();

        let a = store.create_thread(new_thread(1, 10)).unwrap();
        let b = store.create_thread(new_thread(1, 10)).unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.thread(2).unwrap(), b);
    }

    #[test]
    fn oldest_thread_breaks_ties_by_id() {
        let mut store = MemoryStore::default();

        store.create_thread(new_thread(1, 50)).unwrap();
        let tied_low = store.create_thread(new_thread(1, 20)).unwrap();
        store.create_thread(new_thread(1, 20)).unwrap();
        store.create_thread(new_thread(2, 5)).unwrap();

        assert_eq!(store.oldest_thread(1).unwrap(), tied_low);
        assert!(matches!(
            store.oldest_thread(3),
            Err(Error::BoardEmpty { board_id: 3 })
        ));
    }

    #[test]
    fn delete_thread_cascades() {
        let mut store = MemoryStore::default();

        let thread = store.create_thread(new_thread(1, 1)).unwrap();
        let other = store.create_thread(new_thread(1, 2)).unwrap();

        for (tid, comment) in [(thread.id, "a"), (other.id, "b")] {
            store
                .create_reply(NewReply {
                    time_stamp: 3,
                    comment: comment.into(),
                    thread_id: tid,
                })
                .unwrap();
        }

        store.delete_thread(thread.id).unwrap();

        assert!(store.thread(thread.id).is_err());
        assert_eq!(store.count_replies(thread.id).unwrap(), 0);
        assert_eq!(store.count_replies(other.id).unwrap(), 1);
        assert!(store.delete_thread(thread.id).is_err());
    }

    #[test]
    fn reply_needs_a_thread() {
        let mut store = MemoryStore::default();

        let res = store.create_reply(NewReply {
            time_stamp: 1,
            comment: "orphan".into(),
            thread_id: 99,
        });

        assert!(matches!(res, Err(Error::ThreadNotFound { thread_id: 99 })));
    }

    #[test]
    fn recent_threads_are_newest_first() {
        let mut store = MemoryStore::default();

        for (board_id, time_stamp) in [(1, 10), (2, 30), (3, 20), (1, 30)] {
            store.create_thread(new_thread(board_id, time_stamp)).unwrap();
        }

        let ids: Vec<ThreadId> = store
            .recent_threads(3)
            .unwrap()
            .into_iter()
            .map(|thread| thread.id)
            .collect();

        assert_eq!(ids, vec![4, 2, 3]);

        let board_ids: Vec<ThreadId> = store
            .board_threads(1)
            .unwrap()
            .into_iter()
            .map(|thread| thread.id)
            .collect();

        assert_eq!(board_ids, vec![4, 1]);
    }

    #[test]
    fn commit_without_begin() {
        let mut store = MemoryStore::default();
        assert!(matches!(store.commit(), Err(Error::NoTransaction)));
        store.begin().unwrap();
        assert!(store.commit().is_ok());
    }
}
