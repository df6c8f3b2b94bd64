//! Store-and-forward delivery of queued messages.
//!
//! One scheduler invocation runs the retry sweeper first (so backlog does
//! not compound), then the new-work pass. Each pass claims its candidates
//! under a transaction-scoped row lock, hands them to the channel sender
//! one at a time, and records the outcome in the same transaction.

pub mod processor;
pub mod reviews;
pub mod store;
pub mod sweeper;
