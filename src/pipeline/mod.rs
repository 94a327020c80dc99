//! Fused query pipeline
//!
//! This module turns a sequence of chained operators into a short list of
//! execution nodes and drives a single traversal of the source through them:
//!
//! 1. **Nodes**: a closed family of forwarding stages (filter, map, take, ...)
//! 2. **Fusion**: adjacent filter/map nodes merge into one node at build time
//! 3. **Sinks**: terminal nodes that accumulate a result for one run
//! 4. **Runner**: resets the shared [`Env`], walks the source, hands the result back
//!
//! ## Architecture
//!
//! ```text
//! link(&xs).filter(p).map(m).reject(r).take(3).collect()
//!     ↓ build (fusion)
//! nodes: [FilterMap(p, m), Reject(r), Take(3)]
//!     ↓ run(Collect)
//! for x in xs (until Env::stop): FilterMap → Reject → Take → Collect
//!     ↓
//! Vec<Value>, nodes unchanged for the next terminal
//! ```
//!
//! ## Traversal
//!
//! - **Tight loop** when no node can stop early
//! - **Checked loop** (stop flag tested per element) otherwise
//! - **Bulk scan** when a collect/index_of/invoke terminal is the only node
//!
//! ## Limitations
//!
//! - Single-threaded; a chain must not be run reentrantly
//! - No memoization: every terminal call re-traverses the source

pub mod env;
pub mod options;
pub mod node;
pub mod fusion;
pub mod sink;
pub mod runner;
pub mod chain;

pub use env::Env;
pub use options::LinkOptions;
pub use node::{Flow, Node};
pub use fusion::{fuse, FusibleOp};
pub use sink::{Counts, Groups, Matcher, Pick, Sink};
pub use runner::{RunStats, Runner};
pub use chain::{link, Chain};
