//! linkq: Lazy, fused query chains over in-memory sequences
//!
//! Operators are recorded when chained and executed in one traversal when a
//! terminal operator is called, with adjacent filter/map stages fused.

pub mod error;
pub mod value;
pub mod pipeline;

pub use error::{LinkError, Result};
pub use value::{Func, Key, Kind, Record, Value};
pub use pipeline::{link, Chain, Counts, Groups, LinkOptions, RunStats};
