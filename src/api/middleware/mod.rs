//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Rate limiter, rejects early
//! 2. Session resolver, turns the bearer token into a `Caller`
//! 3. Audit logger, back-office routes only
//! 4. Page gate, back-office routes only

pub mod audit;
pub mod auth;
pub mod gate;
pub mod rate;
