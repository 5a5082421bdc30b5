//! Recurrence rules
//!
//! A recurring task is never duplicated: completing it moves its own dates
//! forward by the rule's interval, and reverting moves them back.

pub mod rule;

pub use rule::*;
