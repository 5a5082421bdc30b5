// Core task tree: items, lists and the navigator over them

pub mod backup;
pub mod error;
pub mod item;
pub mod list;
pub mod navigator;
pub mod prompt;
pub mod row;

pub use backup::*;
pub use error::*;
pub use item::*;
pub use list::*;
pub use navigator::*;
pub use prompt::*;
pub use row::*;
