//! Store contract consumed by the session layer

use chrono::{DateTime, Utc};

use crate::types::SessionId;

use super::error::StoreResult;

/// Visitor called once per replayed message, in ascending sequence order.
///
/// Returning an error stops the replay and the error is propagated.
pub type MessageVisitor<'a> = dyn FnMut(&[u8]) -> StoreResult<()> + 'a;

/// Persistence for one session's outbound messages and sequence numbers.
///
/// Sequence numbers start at 1. Readers of the `next_*` counters and of the
/// creation time never block on writers.
pub trait MessageStore: Send + Sync {
    /// Next sequence number to send
    fn next_sender_msg_seq_num(&self) -> u64;

    /// Next sequence number expected from the counterparty
    fn next_target_msg_seq_num(&self) -> u64;

    fn set_next_sender_msg_seq_num(&self, next: u64) -> StoreResult<()>;

    fn set_next_target_msg_seq_num(&self, next: u64) -> StoreResult<()>;

    fn incr_next_sender_msg_seq_num(&self) -> StoreResult<()>;

    fn incr_next_target_msg_seq_num(&self) -> StoreResult<()>;

    /// Start of the current sequence-number epoch
    fn creation_time(&self) -> DateTime<Utc>;

    /// Implementations may ignore this; the file store does.
    fn set_creation_time(&self, creation_time: DateTime<Utc>);

    /// Record an outbound message for later replay
    fn save_message(&self, seq_num: u64, msg: &[u8]) -> StoreResult<()>;

    /// Save then increment the sender counter.
    ///
    /// Not atomic: when the increment fails the message stays saved.
    fn save_message_and_incr_next_sender_msg_seq_num(
        &self,
        seq_num: u64,
        msg: &[u8],
    ) -> StoreResult<()> {
        self.save_message(seq_num, msg)?;
        self.incr_next_sender_msg_seq_num()
    }

    /// Visit saved messages with `begin <= seq_num <= end`
    fn iterate_messages(
        &self,
        begin_seq_num: u64,
        end_seq_num: u64,
        visit: &mut MessageVisitor<'_>,
    ) -> StoreResult<()>;

    /// Collect saved messages with `begin <= seq_num <= end`
    fn get_messages(&self, begin_seq_num: u64, end_seq_num: u64) -> StoreResult<Vec<Vec<u8>>> {
        let mut msgs = Vec::new();
        self.iterate_messages(begin_seq_num, end_seq_num, &mut |msg: &[u8]| {
            msgs.push(msg.to_vec());
            Ok(())
        })?;
        Ok(msgs)
    }

    /// Reload state from durable storage
    fn refresh(&self) -> StoreResult<()>;

    /// Drop all messages, return both counters to 1 and start a new epoch
    fn reset(&self) -> StoreResult<()>;

    /// Release any held resources
    fn close(&self) -> StoreResult<()>;
}

/// Creates a store per session
pub trait MessageStoreFactory: Send + Sync {
    fn create(&self, session_id: &SessionId) -> StoreResult<Box<dyn MessageStore>>;
}
