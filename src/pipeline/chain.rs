//! Public chain facade
//!
//! Builder operators consume and return the chain; terminal operators borrow
//! it mutably, run it once, and leave it ready for further operators.
//!
//! ```
//! use linkq::{link, Value};
//!
//! let data: Vec<Value> = (1..=10).map(Value::from).collect();
//! let evens = link(&data)
//!     .filter(|v| v.as_f64().map_or(false, |n| n % 2.0 == 0.0))
//!     .map(|v| Value::from(v.as_f64().unwrap_or(0.0) * 10.0))
//!     .take(2)
//!     .collect()
//!     .unwrap();
//! assert_eq!(evens, vec![Value::from(20), Value::from(40)]);
//! ```

use std::cmp::Ordering;

use rand::seq::SliceRandom;
use rand::Rng;

use super::fusion::FusibleOp;
use super::node::Node;
use super::options::LinkOptions;
use super::runner::{RunStats, Runner};
use super::sink::{
    Collect, Contains, Count, Counts, Each, Every, Extremum, GroupBy, Groups, Head, IndexOf, Invoke, Length,
    Matcher, Pick, Reduce,
};
use crate::error::Result;
use crate::value::{Kind, Value};

/// Wrap a source sequence into a new chain with default options.
pub fn link(source: &[Value]) -> Chain<'_> {
    Chain::new(source)
}

/// A lazily evaluated query over one borrowed source sequence.
pub struct Chain<'a> {
    runner: Runner<'a>,
}

impl<'a> Chain<'a> {
    /// Create a chain with fusion and the bulk path enabled.
    pub fn new(source: &'a [Value]) -> Self {
        Chain::with_options(source, LinkOptions::default())
    }

    /// Create a chain with explicit options.
    pub fn with_options(source: &'a [Value], options: LinkOptions) -> Self {
        Chain {
            runner: Runner::new(source, options),
        }
    }

    // Builders

    /// Keep elements satisfying `pred`.
    pub fn filter<F>(self, pred: F) -> Self
    where
        F: Fn(&Value) -> bool + 'a,
    {
        self.try_filter(move |v: &Value| Ok(pred(v)))
    }

    /// Like [`Chain::filter`] with a fallible predicate.
    pub fn try_filter<F>(mut self, pred: F) -> Self
    where
        F: Fn(&Value) -> Result<bool> + 'a,
    {
        self.runner.push_fusible(FusibleOp::Filter(Box::new(pred)));
        self
    }

    /// Alias of [`Chain::filter`].
    pub fn where_<F>(self, pred: F) -> Self
    where
        F: Fn(&Value) -> bool + 'a,
    {
        self.filter(pred)
    }

    /// Keep elements the predicate rejects. Never fused.
    pub fn reject<F>(self, pred: F) -> Self
    where
        F: Fn(&Value) -> bool + 'a,
    {
        self.try_reject(move |v: &Value| Ok(pred(v)))
    }

    /// Like [`Chain::reject`] with a fallible predicate.
    pub fn try_reject<F>(mut self, pred: F) -> Self
    where
        F: Fn(&Value) -> Result<bool> + 'a,
    {
        self.runner.push(Node::Reject(Box::new(pred)));
        self
    }

    /// Keep records whose `field` is the same as `value`.
    pub fn filter_by(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.runner.push(Node::FilterByField {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    /// Alias of [`Chain::filter_by`].
    pub fn where_by(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter_by(field, value)
    }

    /// Replace each element with `f(element)`.
    pub fn map<F>(self, f: F) -> Self
    where
        F: Fn(Value) -> Value + 'a,
    {
        self.try_map(move |v: Value| Ok(f(v)))
    }

    /// Like [`Chain::map`] with a fallible transform.
    pub fn try_map<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + 'a,
    {
        self.runner.push_fusible(FusibleOp::Map(Box::new(f)));
        self
    }

    /// Pair each element with the element of `other` at the same position.
    ///
    /// When `other` runs out, the second slot is `Undefined`; the primary
    /// traversal is never truncated.
    pub fn zip(mut self, other: &'a [Value]) -> Self {
        self.runner.push(Node::Zip { other, pos: 0 });
        self
    }

    /// Drop the first `n` elements.
    pub fn skip(mut self, n: usize) -> Self {
        self.runner.push(Node::Skip { count: n });
        self
    }

    /// Elements at positions `[start, end)`; `end = None` runs to the end.
    ///
    /// Negative bounds produce an empty chain.
    pub fn slice(mut self, start: i64, end: Option<i64>) -> Self {
        if start < 0 || end.is_some_and(|e| e < 0) {
            self.runner.push(Node::Halt);
            return self;
        }
        if start == 0 && end.is_none() {
            return self;
        }
        self.runner.push(Node::Slice {
            start: start as usize,
            end: end.map_or(usize::MAX, |e| e as usize),
            pos: 0,
        });
        self
    }

    /// Only the first element.
    pub fn first(mut self) -> Self {
        self.runner.push(Node::First(None));
        self
    }

    /// Only the first element satisfying `pred`.
    pub fn first_where<F>(self, pred: F) -> Self
    where
        F: Fn(&Value) -> bool + 'a,
    {
        self.try_first_where(move |v: &Value| Ok(pred(v)))
    }

    /// Like [`Chain::first_where`] with a fallible predicate.
    pub fn try_first_where<F>(mut self, pred: F) -> Self
    where
        F: Fn(&Value) -> Result<bool> + 'a,
    {
        self.runner.push(Node::First(Some(Box::new(pred))));
        self
    }

    /// At most the first `n` elements.
    pub fn take(mut self, n: usize) -> Self {
        self.runner.push(Node::Take { limit: n, taken: 0 });
        self
    }

    /// Only the element at position `n`. Negative positions yield nothing.
    pub fn get(mut self, n: i64) -> Self {
        let node = match n {
            n if n < 0 => Node::Halt,
            0 => Node::First(None),
            n => Node::Get { index: n as usize, pos: 0 },
        };
        self.runner.push(node);
        self
    }

    /// Records whose class name is `class`.
    pub fn is(mut self, class: &str) -> Self {
        self.runner.push(Node::Is(class.to_string()));
        self
    }

    /// Elements of the given kind.
    pub fn type_of(mut self, kind: Kind) -> Self {
        self.runner.push(Node::TypeOf(kind));
        self
    }

    /// Drop repeated elements. Reference-typed elements repeat only when
    /// they are the same allocation.
    pub fn uniq(mut self) -> Self {
        self.runner.push(Node::uniq(None));
        self
    }

    /// Alias of [`Chain::uniq`].
    pub fn unique(self) -> Self {
        self.uniq()
    }

    /// Like [`Chain::uniq`], comparing reference-typed elements with `eq`.
    pub fn uniq_by<F>(self, eq: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + 'a,
    {
        self.try_uniq_by(move |a: &Value, b: &Value| Ok(eq(a, b)))
    }

    /// Like [`Chain::uniq_by`] with a fallible equality.
    pub fn try_uniq_by<F>(mut self, eq: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<bool> + 'a,
    {
        self.runner.push(Node::uniq(Some(Box::new(eq))));
        self
    }

    // Terminals

    /// All elements reaching the end of the chain, in order.
    pub fn collect(&mut self) -> Result<Vec<Value>> {
        self.runner.run(Collect::default())
    }

    /// Alias of [`Chain::collect`].
    pub fn to_vec(&mut self) -> Result<Vec<Value>> {
        self.collect()
    }

    /// The first element to reach the end of the chain, `Undefined` if none.
    pub fn value(&mut self) -> Result<Value> {
        self.runner.run(Head::default())
    }

    /// Call `f` on every element.
    pub fn each<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&Value),
    {
        self.try_each(move |v: &Value| {
            f(v);
            Ok(())
        })
    }

    /// Like [`Chain::each`]; the first error ends the run.
    pub fn try_each<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(&Value) -> Result<()>,
    {
        self.runner.run(Each::new(f))
    }

    /// Total elements and how many of them satisfy `pred`.
    pub fn count<F>(&mut self, pred: F) -> Result<Counts>
    where
        F: Fn(&Value) -> bool,
    {
        self.try_count(move |v: &Value| Ok(pred(v)))
    }

    /// Like [`Chain::count`] with a fallible predicate.
    pub fn try_count<F>(&mut self, pred: F) -> Result<Counts>
    where
        F: Fn(&Value) -> Result<bool>,
    {
        self.runner.run(Count::new(pred))
    }

    /// Number of elements.
    pub fn length(&mut self) -> Result<usize> {
        self.runner.run(Length::default())
    }

    /// Alias of [`Chain::length`].
    pub fn size(&mut self) -> Result<usize> {
        self.length()
    }

    /// Whether some element is the same as `value`.
    pub fn contains(&mut self, value: impl Into<Value>) -> Result<bool> {
        self.runner.run(Contains::new(Matcher::Value(value.into())))
    }

    /// Whether some element satisfies `pred`.
    pub fn contains_where<F>(&mut self, pred: F) -> Result<bool>
    where
        F: Fn(&Value) -> bool,
    {
        self.try_contains_where(move |v: &Value| Ok(pred(v)))
    }

    /// Like [`Chain::contains_where`] with a fallible predicate.
    pub fn try_contains_where<F>(&mut self, pred: F) -> Result<bool>
    where
        F: Fn(&Value) -> Result<bool>,
    {
        self.runner.run(Contains::new(Matcher::Predicate(Box::new(pred))))
    }

    /// Alias of [`Chain::contains`].
    pub fn some(&mut self, value: impl Into<Value>) -> Result<bool> {
        self.contains(value)
    }

    /// Alias of [`Chain::contains_where`].
    pub fn some_where<F>(&mut self, pred: F) -> Result<bool>
    where
        F: Fn(&Value) -> bool,
    {
        self.contains_where(pred)
    }

    /// Alias of [`Chain::contains`].
    pub fn exists(&mut self, value: impl Into<Value>) -> Result<bool> {
        self.contains(value)
    }

    /// Alias of [`Chain::contains_where`].
    pub fn exists_where<F>(&mut self, pred: F) -> Result<bool>
    where
        F: Fn(&Value) -> bool,
    {
        self.contains_where(pred)
    }

    /// Whether every element satisfies `pred`; true on an empty chain.
    pub fn every<F>(&mut self, pred: F) -> Result<bool>
    where
        F: Fn(&Value) -> bool,
    {
        self.try_every(move |v: &Value| Ok(pred(v)))
    }

    /// Like [`Chain::every`] with a fallible predicate.
    pub fn try_every<F>(&mut self, pred: F) -> Result<bool>
    where
        F: Fn(&Value) -> Result<bool>,
    {
        self.runner.run(Every::new(pred))
    }

    /// Position of the first element equal to `value`, or -1.
    pub fn index_of(&mut self, value: impl Into<Value>) -> Result<isize> {
        self.runner.run(IndexOf::new(Matcher::Value(value.into())))
    }

    /// Position of the first record whose `field` equals `value`, or -1.
    pub fn index_of_field(&mut self, field: &str, value: impl Into<Value>) -> Result<isize> {
        self.runner.run(IndexOf::new(Matcher::Field {
            field: field.to_string(),
            value: value.into(),
        }))
    }

    /// Position of the first element satisfying `pred`, or -1.
    pub fn index_of_where<F>(&mut self, pred: F) -> Result<isize>
    where
        F: Fn(&Value) -> bool,
    {
        self.try_index_of_where(move |v: &Value| Ok(pred(v)))
    }

    /// Like [`Chain::index_of_where`] with a fallible predicate.
    pub fn try_index_of_where<F>(&mut self, pred: F) -> Result<isize>
    where
        F: Fn(&Value) -> Result<bool>,
    {
        self.runner.run(IndexOf::new(Matcher::Predicate(Box::new(pred))))
    }

    /// Elements grouped by `key(element)`, keys in first-seen order.
    pub fn group_by<F>(&mut self, key: F) -> Result<Groups>
    where
        F: Fn(&Value) -> Value,
    {
        self.try_group_by(move |v: &Value| Ok(key(v)))
    }

    /// Like [`Chain::group_by`] with a fallible key function.
    pub fn try_group_by<F>(&mut self, key: F) -> Result<Groups>
    where
        F: Fn(&Value) -> Result<Value>,
    {
        self.runner.run(GroupBy::new(key))
    }

    /// Element with the lowest rank, `None` on an empty chain.
    ///
    /// Elements ranked NaN are never picked.
    pub fn min<F>(&mut self, rank: F) -> Result<Option<Value>>
    where
        F: Fn(&Value) -> f64,
    {
        self.try_min(move |v: &Value| Ok(rank(v)))
    }

    /// Like [`Chain::min`] with a fallible rank.
    pub fn try_min<F>(&mut self, rank: F) -> Result<Option<Value>>
    where
        F: Fn(&Value) -> Result<f64>,
    {
        self.runner.run(Extremum::new(rank, Pick::Min))
    }

    /// Element with the highest rank, `None` on an empty chain.
    ///
    /// Elements ranked NaN are never picked.
    pub fn max<F>(&mut self, rank: F) -> Result<Option<Value>>
    where
        F: Fn(&Value) -> f64,
    {
        self.try_max(move |v: &Value| Ok(rank(v)))
    }

    /// Like [`Chain::max`] with a fallible rank.
    pub fn try_max<F>(&mut self, rank: F) -> Result<Option<Value>>
    where
        F: Fn(&Value) -> Result<f64>,
    {
        self.runner.run(Extremum::new(rank, Pick::Max))
    }

    /// Fold starting from the first element. Fails on an empty chain.
    pub fn reduce<F>(&mut self, mut f: F) -> Result<Value>
    where
        F: FnMut(Value, Value) -> Value,
    {
        self.try_reduce(move |acc, item| Ok(f(acc, item)), None)
    }

    /// Fold starting from `seed`.
    pub fn fold<F>(&mut self, seed: impl Into<Value>, mut f: F) -> Result<Value>
    where
        F: FnMut(Value, Value) -> Value,
    {
        self.try_reduce(move |acc, item| Ok(f(acc, item)), Some(seed.into()))
    }

    /// Fold with a fallible function, from `seed` or the first element.
    pub fn try_reduce<F>(&mut self, f: F, seed: Option<Value>) -> Result<Value>
    where
        F: FnMut(Value, Value) -> Result<Value>,
    {
        self.runner.run(Reduce::new(f, seed))
    }

    /// Call the zero-argument func stored under `method` on every element.
    pub fn invoke(&mut self, method: &str) -> Result<()> {
        self.runner.run(Invoke::new(Some(method.to_string())))
    }

    /// Call every element, each of which must be a func.
    pub fn call_each(&mut self) -> Result<()> {
        self.runner.run(Invoke::new(None))
    }

    /// The last element, `None` on an empty chain.
    pub fn last(&mut self) -> Result<Option<Value>> {
        Ok(self.collect()?.pop())
    }

    /// Up to `n` distinct elements picked uniformly at random.
    pub fn sample(&mut self, n: usize) -> Result<Vec<Value>> {
        self.sample_with(&mut rand::thread_rng(), n)
    }

    /// Alias of [`Chain::sample`].
    pub fn random(&mut self, n: usize) -> Result<Vec<Value>> {
        self.sample(n)
    }

    /// Like [`Chain::sample`] with a caller-supplied generator.
    pub fn sample_with<R>(&mut self, rng: &mut R, n: usize) -> Result<Vec<Value>>
    where
        R: Rng + ?Sized,
    {
        let items = self.collect()?;
        Ok(items.choose_multiple(rng, n).cloned().collect())
    }

    /// Elements in natural order (see [`Value::total_cmp`]).
    pub fn sort(&mut self) -> Result<Vec<Value>> {
        self.sort_by(Value::total_cmp)
    }

    /// Elements ordered by `cmp`. The sort is stable.
    pub fn sort_by<F>(&mut self, cmp: F) -> Result<Vec<Value>>
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        let mut items = self.collect()?;
        items.sort_by(cmp);
        Ok(items)
    }

    // Inspection

    /// Node names in chain order, after fusion.
    pub fn plan(&self) -> Vec<&'static str> {
        self.runner.nodes().iter().map(Node::name).collect()
    }

    /// Options the chain was built with.
    pub fn options(&self) -> LinkOptions {
        self.runner.options()
    }

    /// Statistics of the most recent terminal call.
    pub fn last_stats(&self) -> &RunStats {
        self.runner.stats()
    }
}
