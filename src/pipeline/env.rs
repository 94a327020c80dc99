//! Shared control block for one chain

/// Flags shared by every node of a chain to coordinate early termination.
///
/// One `Env` lives as long as its chain. It is reinitialized, never
/// reallocated, at the start of each run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Env {
    /// Some node in the chain can request early exit; selects the checked
    /// traversal loop.
    pub take: bool,

    /// Set by a node to halt traversal before the next element.
    pub stop: bool,

    /// Number of elements dropped so far by skip nodes.
    pub skip: usize,
}

impl Env {
    /// Create a cleared control block.
    pub fn new() -> Self {
        Env::default()
    }

    /// Clear per-run state. `take` is recomputed by the runner.
    pub fn reset(&mut self) {
        self.stop = false;
        self.skip = 0;
    }
}
