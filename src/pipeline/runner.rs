//! Chain runner
//!
//! Owns the node list and the shared [`Env`] for one source sequence, applies
//! fusion as nodes are appended, and drives one traversal per terminal call.

use tracing::{debug, trace};

use super::env::Env;
use super::fusion::{fuse, FusibleOp};
use super::node::{Flow, Node};
use super::options::LinkOptions;
use super::sink::Sink;
use crate::error::Result;
use crate::value::Value;

/// Statistics for the most recent run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Nodes ahead of the terminal, after fusion.
    pub nodes: usize,

    /// How many of those nodes are fused pairs.
    pub fused: usize,

    /// Source elements dispatched into the chain.
    pub visited: usize,

    /// Traversal ended before the source was exhausted.
    pub stopped_early: bool,

    /// The terminal scanned the source directly.
    pub bulk: bool,
}

/// Node list, shared env and options for one borrowed source.
pub struct Runner<'a> {
    source: &'a [Value],
    nodes: Vec<Node<'a>>,
    env: Env,
    options: LinkOptions,
    stats: RunStats,
}

impl<'a> Runner<'a> {
    /// Create a runner with no nodes.
    pub fn new(source: &'a [Value], options: LinkOptions) -> Self {
        Runner {
            source,
            nodes: Vec::new(),
            env: Env::new(),
            options,
            stats: RunStats::default(),
        }
    }

    /// Append a node that never fuses.
    pub fn push(&mut self, node: Node<'a>) {
        trace!(node = node.name(), position = self.nodes.len(), "appended node");
        self.nodes.push(node);
    }

    /// Append a filter or map, fusing it into the tail when possible.
    pub fn push_fusible(&mut self, op: FusibleOp<'a>) {
        if !self.options.fuse {
            self.push(op.into_node());
            return;
        }

        let Some(tail) = self.nodes.pop() else {
            self.push(op.into_node());
            return;
        };

        match fuse(tail, op) {
            Ok(fused) => {
                trace!(node = fused.name(), position = self.nodes.len(), "fused tail node");
                self.nodes.push(fused);
            }
            Err((tail, op)) => {
                self.nodes.push(tail);
                self.push(op.into_node());
            }
        }
    }

    /// Run the chain once into `sink`.
    ///
    /// The sink is attached for this traversal only; afterwards the chain is
    /// back to its pre-run shape and may be extended or run again.
    pub fn run<S: Sink>(&mut self, mut sink: S) -> Result<S::Output> {
        self.env.reset();
        self.env.take = sink.can_stop() || self.nodes.iter().any(Node::can_stop);
        for node in &mut self.nodes {
            node.reset();
        }

        let mut bulk = false;
        let visited = match self.bulk_scan(&mut sink)? {
            Some(visited) => {
                bulk = true;
                visited
            }
            None => self.traverse(&mut sink)?,
        };

        self.stats = RunStats {
            nodes: self.nodes.len(),
            fused: self.nodes.iter().filter(|n| n.is_fused()).count(),
            visited,
            stopped_early: visited < self.source.len(),
            bulk,
        };
        debug!(
            terminal = sink.name(),
            nodes = self.stats.nodes,
            take = self.env.take,
            visited,
            stopped_early = self.stats.stopped_early,
            bulk,
            "chain run complete"
        );

        sink.finish()
    }

    fn bulk_scan<S: Sink>(&mut self, sink: &mut S) -> Result<Option<usize>> {
        if self.options.bulk && self.nodes.is_empty() {
            sink.bulk(self.source)
        } else {
            Ok(None)
        }
    }

    fn traverse<S: Sink>(&mut self, sink: &mut S) -> Result<usize> {
        let Runner { source, nodes, env, .. } = self;

        if !env.take {
            for item in source.iter() {
                dispatch(nodes, env, sink, item.clone())?;
            }
            return Ok(source.len());
        }

        let mut visited = 0;
        for item in source.iter() {
            if env.stop {
                break;
            }
            visited += 1;
            dispatch(nodes, env, sink, item.clone())?;
        }
        Ok(visited)
    }

    /// Nodes in chain order, after fusion.
    pub fn nodes(&self) -> &[Node<'a>] {
        &self.nodes
    }

    /// Control block as left by the most recent run.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Options the runner was built with.
    pub fn options(&self) -> LinkOptions {
        self.options
    }

    /// Statistics of the most recent run.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }
}

/// Push one element through every node and into the sink.
fn dispatch<S: Sink>(nodes: &mut [Node<'_>], env: &mut Env, sink: &mut S, mut item: Value) -> Result<()> {
    for node in nodes.iter_mut() {
        match node.step(env, item)? {
            Flow::Forward(next) => item = next,
            Flow::Drop => return Ok(()),
        }
    }
    sink.accept(env, item)
}
