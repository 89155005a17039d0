//! In-memory store
//!
//! Used on its own for sessions that need no durability, and as the fast-path
//! cache inside [`FileStore`](super::FileStore).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::types::SessionId;
use crate::utils::time;

use super::counter::{check_seq_num, next_seq_num};
use super::error::StoreResult;
use super::traits::{MessageStore, MessageStoreFactory, MessageVisitor};

#[derive(Debug)]
struct MemoryState {
    next_sender_msg_seq_num: u64,
    next_target_msg_seq_num: u64,
    creation_time: DateTime<Utc>,
    messages: BTreeMap<u64, Vec<u8>>,
}

impl MemoryState {
    fn fresh() -> Self {
        Self {
            next_sender_msg_seq_num: 1,
            next_target_msg_seq_num: 1,
            creation_time: time::now(),
            messages: BTreeMap::new(),
        }
    }
}

/// Message store that keeps everything in memory
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::fresh()),
        }
    }

    /// Number of saved messages
    pub fn message_count(&self) -> usize {
        self.state.read().messages.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore for MemoryStore {
    fn next_sender_msg_seq_num(&self) -> u64 {
        self.state.read().next_sender_msg_seq_num
    }

    fn next_target_msg_seq_num(&self) -> u64 {
        self.state.read().next_target_msg_seq_num
    }

    fn set_next_sender_msg_seq_num(&self, next: u64) -> StoreResult<()> {
        self.state.write().next_sender_msg_seq_num = check_seq_num(next)?;
        Ok(())
    }

    fn set_next_target_msg_seq_num(&self, next: u64) -> StoreResult<()> {
        self.state.write().next_target_msg_seq_num = check_seq_num(next)?;
        Ok(())
    }

    fn incr_next_sender_msg_seq_num(&self) -> StoreResult<()> {
        let mut state = self.state.write();
        state.next_sender_msg_seq_num = next_seq_num(state.next_sender_msg_seq_num)?;
        Ok(())
    }

    fn incr_next_target_msg_seq_num(&self) -> StoreResult<()> {
        let mut state = self.state.write();
        state.next_target_msg_seq_num = next_seq_num(state.next_target_msg_seq_num)?;
        Ok(())
    }

    fn creation_time(&self) -> DateTime<Utc> {
        self.state.read().creation_time
    }

    fn set_creation_time(&self, creation_time: DateTime<Utc>) {
        self.state.write().creation_time = creation_time;
    }

    fn save_message(&self, seq_num: u64, msg: &[u8]) -> StoreResult<()> {
        self.state.write().messages.insert(seq_num, msg.to_vec());
        Ok(())
    }

    fn iterate_messages(
        &self,
        begin_seq_num: u64,
        end_seq_num: u64,
        visit: &mut MessageVisitor<'_>,
    ) -> StoreResult<()> {
        if begin_seq_num > end_seq_num {
            return Ok(());
        }

        // Copy out so the visitor runs without holding the lock
        let msgs: Vec<Vec<u8>> = self
            .state
            .read()
            .messages
            .range(begin_seq_num..=end_seq_num)
            .map(|(_, msg)| msg.clone())
            .collect();

        for msg in &msgs {
            visit(msg)?;
        }
        Ok(())
    }

    fn refresh(&self) -> StoreResult<()> {
        // Nothing to reload from
        Ok(())
    }

    fn reset(&self) -> StoreResult<()> {
        *self.state.write() = MemoryState::fresh();
        Ok(())
    }

    fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Factory for [`MemoryStore`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStoreFactory;

impl MemoryStoreFactory {
    pub fn new() -> Self {
        Self
    }
}

impl MessageStoreFactory for MemoryStoreFactory {
    fn create(&self, _session_id: &SessionId) -> StoreResult<Box<dyn MessageStore>> {
        Ok(Box::new(MemoryStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use chrono::TimeZone;

    #[test]
    fn test_fresh_store() {
        let store = MemoryStore::new();
        assert_eq!(store.next_sender_msg_seq_num(), 1);
        assert_eq!(store.next_target_msg_seq_num(), 1);
        assert_eq!(store.message_count(), 0);
    }

    #[test]
    fn test_set_and_incr() {
        let store = MemoryStore::new();
        store.set_next_sender_msg_seq_num(10).unwrap();
        store.set_next_target_msg_seq_num(20).unwrap();
        store.incr_next_sender_msg_seq_num().unwrap();
        store.incr_next_target_msg_seq_num().unwrap();

        assert_eq!(store.next_sender_msg_seq_num(), 11);
        assert_eq!(store.next_target_msg_seq_num(), 21);
    }

    #[test]
    fn test_rejects_zero() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.set_next_sender_msg_seq_num(0),
            Err(StoreError::InvalidSeqNum(0))
        ));
        assert!(matches!(
            store.set_next_target_msg_seq_num(0),
            Err(StoreError::InvalidSeqNum(0))
        ));
        assert_eq!(store.next_sender_msg_seq_num(), 1);
    }

    #[test]
    fn test_incr_at_max_leaves_counter_unchanged() {
        let store = MemoryStore::new();
        store.set_next_sender_msg_seq_num(u64::MAX).unwrap();
        store.set_next_target_msg_seq_num(u64::MAX).unwrap();

        assert!(matches!(
            store.incr_next_sender_msg_seq_num(),
            Err(StoreError::SeqNumOverflow(u64::MAX))
        ));
        assert!(matches!(
            store.incr_next_target_msg_seq_num(),
            Err(StoreError::SeqNumOverflow(u64::MAX))
        ));
        assert_eq!(store.next_sender_msg_seq_num(), u64::MAX);
        assert_eq!(store.next_target_msg_seq_num(), u64::MAX);
    }

    #[test]
    fn test_set_creation_time_is_honored() {
        let store = MemoryStore::new();
        let t = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        store.set_creation_time(t);
        assert_eq!(store.creation_time(), t);
    }

    #[test]
    fn test_messages_in_range() {
        let store = MemoryStore::new();
        for seq in 1..=5u64 {
            store.save_message(seq, format!("msg{}", seq).as_bytes()).unwrap();
        }

        let msgs = store.get_messages(2, 4).unwrap();
        assert_eq!(msgs, vec![b"msg2".to_vec(), b"msg3".to_vec(), b"msg4".to_vec()]);
        assert!(store.get_messages(6, 9).unwrap().is_empty());
        assert!(store.get_messages(4, 2).unwrap().is_empty());
    }

    #[test]
    fn test_save_and_incr() {
        let store = MemoryStore::new();
        store
            .save_message_and_incr_next_sender_msg_seq_num(1, b"hello")
            .unwrap();

        assert_eq!(store.next_sender_msg_seq_num(), 2);
        assert_eq!(store.get_messages(1, 1).unwrap(), vec![b"hello".to_vec()]);
    }

    #[test]
    fn test_visitor_error_stops_iteration() {
        let store = MemoryStore::new();
        for seq in 1..=3u64 {
            store.save_message(seq, b"x").unwrap();
        }

        let mut seen = 0;
        let result = store.iterate_messages(1, 3, &mut |_msg: &[u8]| {
            seen += 1;
            if seen == 2 {
                return Err(StoreError::visitor("enough"));
            }
            Ok(())
        });

        assert!(matches!(result, Err(StoreError::Visitor(_))));
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_reset() {
        let store = MemoryStore::new();
        let before = store.creation_time();
        store.set_next_sender_msg_seq_num(5).unwrap();
        store.save_message(1, b"x").unwrap();

        store.reset().unwrap();

        assert_eq!(store.next_sender_msg_seq_num(), 1);
        assert_eq!(store.next_target_msg_seq_num(), 1);
        assert_eq!(store.message_count(), 0);
        assert!(store.creation_time() >= before);
    }

    #[test]
    fn test_factory() {
        let store = MemoryStoreFactory::new()
            .create(&SessionId::new("FIX.4.4", "A", "B"))
            .unwrap();
        assert_eq!(store.next_sender_msg_seq_num(), 1);
    }
}
