pub mod abbrev;
pub mod commands;
pub mod error;
pub mod output;
pub mod parser;
pub mod prompt;
pub mod session;

pub use commands::*;
pub use parser::*;
pub use session::*;
