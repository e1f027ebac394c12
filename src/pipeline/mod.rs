//! Stages of a single decode call.
//!
//! Each submodule implements one step, so each can be tested without the
//! others or the network.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ submit ──▶ wait ──▶ reshape
//! (path/bytes/reader)  (service)  (poll)  (pages → sections)
//! ```
//!
//! 1. [`input`]   — turn a path, a byte buffer, or a reader into the document
//!    bytes, observing cancellation while reading
//! 2. submit      — [`crate::service::AnalysisService::begin_analyze`]
//! 3. [`wait`]    — poll the started operation until it resolves or the
//!    caller cancels
//! 4. [`reshape`] — join each page's lines into one [`crate::FileSection`]

pub mod input;
pub mod reshape;
pub mod wait;
