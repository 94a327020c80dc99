//! Chain configuration

/// Build and run switches for a chain.
///
/// Both switches only affect how a chain is executed, never what it
/// produces, which makes them useful for comparing the optimized and
/// plain paths against each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkOptions {
    /// Merge adjacent filter/map nodes at build time.
    pub fuse: bool,

    /// Let single-purpose terminals scan the source directly when no
    /// other node precedes them.
    pub bulk: bool,
}

impl LinkOptions {
    /// Every node standalone, every run through the per-element loop.
    pub fn unoptimized() -> Self {
        LinkOptions { fuse: false, bulk: false }
    }
}

impl Default for LinkOptions {
    fn default() -> Self {
        LinkOptions { fuse: true, bulk: true }
    }
}
