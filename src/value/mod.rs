//! Element model: dynamically typed values and their lookup keys

pub mod datum;
pub mod key;

pub use datum::{Func, Kind, Record, Value};
pub use key::Key;
