//! tasktree - a nested to-do list for the terminal
//!
//! Items carry a description, optional do and due dates and an optional
//! daily/weekly/monthly recurrence, and each item owns a sublist of further
//! items. A parent shows the earliest dates and most frequent recurrence
//! found among its direct children. This library provides:
//! - Date token resolution and recurrence rules
//! - The task tree (items, lists, navigator) with sorting and visibility
//! - JSON persistence of the tree and a SQLite backup ledger
//! - Settings, localized strings and the interactive shell
//!
//! # Example
//!
//! ```no_run
//! use tasktree::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod models;
pub mod recur;
pub mod repo;
pub mod store;
pub mod strings;
pub mod utils;
