//! awsfind - find an AWS resource across all locally configured accounts.
//!
//! Fans the same read-only lookup out to every configured account in
//! parallel and prints the first match as JSON. The interesting part is the
//! dispatcher: first result wins, a global timeout bounds the whole search,
//! and everything still in flight is cancelled once the outcome is decided.
//!
//! # Module Structure
//!
//! - [`aws`] - credential sources, per-account sessions, query execution
//! - [`dispatch`] - the fan-out dispatcher (first-wins, timeout, cancellation)
//! - [`output`] - payload serialization to stdout

pub mod aws;
pub mod dispatch;
pub mod output;
