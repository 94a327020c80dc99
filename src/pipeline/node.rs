//! Forwarding execution nodes
//!
//! A node consumes one element and either forwards it (possibly transformed)
//! to the next node or drops it. Nodes live in an append-only vector owned
//! by the runner; the successor of node `i` is node `i + 1`.

use std::collections::HashSet;
use std::fmt;

use super::env::Env;
use crate::error::Result;
use crate::value::{Key, Kind, Value};

/// Fallible element predicate.
pub type Predicate<'a> = Box<dyn Fn(&Value) -> Result<bool> + 'a>;

/// Fallible element transform.
pub type Transform<'a> = Box<dyn Fn(Value) -> Result<Value> + 'a>;

/// Fallible equality used by `uniq_by` for reference-typed elements.
pub type Equality<'a> = Box<dyn Fn(&Value, &Value) -> Result<bool> + 'a>;

/// Outcome of a single node step.
#[derive(Debug)]
pub enum Flow {
    Forward(Value),
    Drop,
}

/// Elements already forwarded by a uniq node.
///
/// Value-typed elements go into a keyed table; reference-typed elements are
/// kept in a list and compared one by one.
#[derive(Default)]
pub struct Seen {
    keys: HashSet<Key>,
    refs: Vec<Value>,
}

impl Seen {
    fn clear(&mut self) {
        self.keys.clear();
        self.refs.clear();
    }

    /// Record `item`, returning `false` if it was already present.
    fn insert(&mut self, item: &Value, eq: Option<&Equality<'_>>) -> Result<bool> {
        if let Some(key) = Key::from_value(item) {
            return Ok(self.keys.insert(key));
        }

        for seen in &self.refs {
            let dup = match eq {
                Some(eq) => eq(seen, item)?,
                None => seen.same(item),
            };
            if dup {
                return Ok(false);
            }
        }

        self.refs.push(item.clone());
        Ok(true)
    }
}

/// One stage of a chain.
pub enum Node<'a> {
    Filter(Predicate<'a>),
    Reject(Predicate<'a>),
    FilterByField { field: String, value: Value },
    Map(Transform<'a>),

    /// Both predicates, short-circuit left to right.
    FilterFilter(Predicate<'a>, Predicate<'a>),
    /// Predicate on the incoming value, then transform.
    FilterMap(Predicate<'a>, Transform<'a>),
    /// Transform, then predicate on the transformed value.
    MapFilter(Transform<'a>, Predicate<'a>),
    MapMap(Transform<'a>, Transform<'a>),

    Zip { other: &'a [Value], pos: usize },
    Skip { count: usize },
    Slice { start: usize, end: usize, pos: usize },
    First(Option<Predicate<'a>>),
    Take { limit: usize, taken: usize },
    Get { index: usize, pos: usize },
    Is(String),
    TypeOf(Kind),
    Uniq { eq: Option<Equality<'a>>, seen: Seen },

    /// Drops everything and stops at once. Built from malformed slice/get
    /// arguments.
    Halt,
}

impl<'a> Node<'a> {
    /// Uniq node with an empty seen table.
    pub fn uniq(eq: Option<Equality<'a>>) -> Self {
        Node::Uniq { eq, seen: Seen::default() }
    }

    /// Consume one element.
    pub fn step(&mut self, env: &mut Env, item: Value) -> Result<Flow> {
        let flow = match self {
            Node::Filter(pred) => forward_if(pred(&item)?, item),
            Node::Reject(pred) => forward_if(!pred(&item)?, item),
            Node::FilterByField { field, value } => {
                let matched = item.get(field).same(value);
                forward_if(matched, item)
            }
            Node::Map(map) => Flow::Forward(map(item)?),

            Node::FilterFilter(first, second) => {
                let matched = first(&item)? && second(&item)?;
                forward_if(matched, item)
            }
            Node::FilterMap(pred, map) => {
                if pred(&item)? {
                    Flow::Forward(map(item)?)
                } else {
                    Flow::Drop
                }
            }
            Node::MapFilter(map, pred) => {
                let mapped = map(item)?;
                let matched = pred(&mapped)?;
                forward_if(matched, mapped)
            }
            Node::MapMap(first, second) => Flow::Forward(second(first(item)?)?),

            Node::Zip { other, pos } => {
                let paired = other.get(*pos).cloned().unwrap_or(Value::Undefined);
                *pos += 1;
                Flow::Forward(Value::list(vec![item, paired]))
            }
            Node::Skip { count } => {
                if env.skip < *count {
                    env.skip += 1;
                    Flow::Drop
                } else {
                    Flow::Forward(item)
                }
            }
            Node::Slice { start, end, pos } => {
                let at = *pos;
                *pos += 1;
                if at >= *end {
                    env.stop = true;
                    Flow::Drop
                } else {
                    if *pos >= *end {
                        env.stop = true;
                    }
                    forward_if(at >= *start, item)
                }
            }
            Node::First(None) => {
                env.stop = true;
                Flow::Forward(item)
            }
            Node::First(Some(pred)) => {
                if pred(&item)? {
                    env.stop = true;
                    Flow::Forward(item)
                } else {
                    Flow::Drop
                }
            }
            Node::Take { limit, taken } => {
                if *taken >= *limit {
                    env.stop = true;
                    Flow::Drop
                } else {
                    *taken += 1;
                    if *taken == *limit {
                        env.stop = true;
                    }
                    Flow::Forward(item)
                }
            }
            Node::Get { index, pos } => {
                let at = *pos;
                *pos += 1;
                if at == *index {
                    env.stop = true;
                    Flow::Forward(item)
                } else {
                    Flow::Drop
                }
            }
            Node::Is(class) => {
                let matched = item.class() == Some(class.as_str());
                forward_if(matched, item)
            }
            Node::TypeOf(kind) => {
                let matched = item.kind() == *kind;
                forward_if(matched, item)
            }
            Node::Uniq { eq, seen } => {
                let fresh = seen.insert(&item, eq.as_ref())?;
                forward_if(fresh, item)
            }
            Node::Halt => {
                env.stop = true;
                Flow::Drop
            }
        };
        Ok(flow)
    }

    /// Clear per-run counters and tables.
    pub fn reset(&mut self) {
        match self {
            Node::Zip { pos, .. } | Node::Slice { pos, .. } | Node::Get { pos, .. } => *pos = 0,
            Node::Take { taken, .. } => *taken = 0,
            Node::Uniq { seen, .. } => seen.clear(),
            _ => {}
        }
    }

    /// Whether this node may set `Env::stop`.
    pub fn can_stop(&self) -> bool {
        matches!(
            self,
            Node::Slice { .. } | Node::First(_) | Node::Take { .. } | Node::Get { .. } | Node::Halt
        )
    }

    /// Whether this node is a fused pair.
    pub fn is_fused(&self) -> bool {
        matches!(
            self,
            Node::FilterFilter(..) | Node::FilterMap(..) | Node::MapFilter(..) | Node::MapMap(..)
        )
    }

    /// Short name used in plans and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Node::Filter(_) => "filter",
            Node::Reject(_) => "reject",
            Node::FilterByField { .. } => "filter_by",
            Node::Map(_) => "map",
            Node::FilterFilter(..) => "filter+filter",
            Node::FilterMap(..) => "filter+map",
            Node::MapFilter(..) => "map+filter",
            Node::MapMap(..) => "map+map",
            Node::Zip { .. } => "zip",
            Node::Skip { .. } => "skip",
            Node::Slice { .. } => "slice",
            Node::First(_) => "first",
            Node::Take { .. } => "take",
            Node::Get { .. } => "get",
            Node::Is(_) => "is",
            Node::TypeOf(_) => "type_of",
            Node::Uniq { .. } => "uniq",
            Node::Halt => "halt",
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn forward_if(cond: bool, item: Value) -> Flow {
    if cond {
        Flow::Forward(item)
    } else {
        Flow::Drop
    }
}
