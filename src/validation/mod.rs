pub mod sql_guard;

pub use sql_guard::*;
