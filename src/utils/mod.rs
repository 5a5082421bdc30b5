pub mod date;
pub mod fuzzy;
pub mod natural;

pub use date::*;
pub use natural::natural_cmp;
