//! Build-time fusion of adjacent filter/map nodes
//!
//! When a filter or map is appended and the current tail is a single
//! unfused filter or map, the two are replaced by one combined node:
//!
//! ```text
//! tail    new      fused
//! filter  filter   FilterFilter   forward iff p1(x) && p2(x)
//! filter  map      FilterMap      forward m(x) iff p(x)
//! map     filter   MapFilter      forward m(x) iff p(m(x))
//! map     map      MapMap         forward m2(m1(x))
//! ```
//!
//! Reject never fuses. A fused node produces exactly the stream of the two
//! nodes it replaces.

use super::node::{Node, Predicate, Transform};

/// An operator that may fuse with the tail of a chain.
pub enum FusibleOp<'a> {
    Filter(Predicate<'a>),
    Map(Transform<'a>),
}

impl<'a> FusibleOp<'a> {
    /// Standalone node for this operator.
    pub fn into_node(self) -> Node<'a> {
        match self {
            FusibleOp::Filter(pred) => Node::Filter(pred),
            FusibleOp::Map(map) => Node::Map(map),
        }
    }
}

/// Try to merge `op` into `tail`.
///
/// Returns the fused node, or hands both back unchanged when the pair does
/// not fuse.
pub fn fuse<'a>(tail: Node<'a>, op: FusibleOp<'a>) -> Result<Node<'a>, (Node<'a>, FusibleOp<'a>)> {
    match (tail, op) {
        (Node::Filter(first), FusibleOp::Filter(second)) => Ok(Node::FilterFilter(first, second)),
        (Node::Filter(pred), FusibleOp::Map(map)) => Ok(Node::FilterMap(pred, map)),
        (Node::Map(map), FusibleOp::Filter(pred)) => Ok(Node::MapFilter(map, pred)),
        (Node::Map(first), FusibleOp::Map(second)) => Ok(Node::MapMap(first, second)),
        (tail, op) => Err((tail, op)),
    }
}
