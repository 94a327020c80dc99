//! Terminal nodes
//!
//! A sink sits at the end of a chain for exactly one run. It accumulates the
//! elements that reach it and produces the run's result in [`Sink::finish`].
//! Failing runs drop the sink, discarding any partial accumulation.

use indexmap::IndexMap;

use super::env::Env;
use super::node::Predicate;
use crate::error::{LinkError, Result};
use crate::value::{Key, Value};

/// Groups produced by `group_by`, in first-seen key order.
pub type Groups = IndexMap<Key, Vec<Value>>;

/// Result of `count`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counts {
    /// Elements that reached the counter.
    pub total: usize,
    /// Elements that satisfied the predicate.
    pub num: usize,
}

/// Terminal node interface.
pub trait Sink {
    type Output;

    fn name(&self) -> &'static str;

    /// Whether this sink may set `Env::stop`.
    fn can_stop(&self) -> bool {
        false
    }

    fn accept(&mut self, env: &mut Env, item: Value) -> Result<()>;

    /// Scan the source directly when the sink is the only node of the chain.
    ///
    /// Returns the number of elements visited, or `None` if the sink has no
    /// bulk path. Must agree exactly with driving `accept` per element.
    fn bulk(&mut self, _source: &[Value]) -> Result<Option<usize>> {
        Ok(None)
    }

    fn finish(self) -> Result<Self::Output>;
}

/// What `contains` and `index_of` look for.
pub enum Matcher<'t> {
    Value(Value),
    Field { field: String, value: Value },
    Predicate(Predicate<'t>),
}

impl Matcher<'_> {
    pub fn matches(&self, item: &Value) -> Result<bool> {
        match self {
            Matcher::Value(value) => Ok(item.same(value)),
            Matcher::Field { field, value } => Ok(item.get(field).same(value)),
            Matcher::Predicate(pred) => pred(item),
        }
    }
}

#[derive(Default)]
pub struct Collect {
    items: Vec<Value>,
}

impl Sink for Collect {
    type Output = Vec<Value>;

    fn name(&self) -> &'static str {
        "collect"
    }

    fn accept(&mut self, _env: &mut Env, item: Value) -> Result<()> {
        self.items.push(item);
        Ok(())
    }

    fn bulk(&mut self, source: &[Value]) -> Result<Option<usize>> {
        self.items.extend_from_slice(source);
        Ok(Some(source.len()))
    }

    fn finish(self) -> Result<Vec<Value>> {
        Ok(self.items)
    }
}

/// First element to arrive, `Undefined` if none does.
#[derive(Default)]
pub struct Head {
    value: Option<Value>,
}

impl Sink for Head {
    type Output = Value;

    fn name(&self) -> &'static str {
        "value"
    }

    fn can_stop(&self) -> bool {
        true
    }

    fn accept(&mut self, env: &mut Env, item: Value) -> Result<()> {
        self.value = Some(item);
        env.stop = true;
        Ok(())
    }

    fn finish(self) -> Result<Value> {
        Ok(self.value.unwrap_or_default())
    }
}

pub struct Each<F> {
    f: F,
}

impl<F> Each<F>
where
    F: FnMut(&Value) -> Result<()>,
{
    pub fn new(f: F) -> Self {
        Each { f }
    }
}

impl<F> Sink for Each<F>
where
    F: FnMut(&Value) -> Result<()>,
{
    type Output = ();

    fn name(&self) -> &'static str {
        "each"
    }

    fn accept(&mut self, _env: &mut Env, item: Value) -> Result<()> {
        (self.f)(&item)
    }

    fn finish(self) -> Result<()> {
        Ok(())
    }
}

pub struct Count<P> {
    pred: P,
    counts: Counts,
}

impl<P> Count<P>
where
    P: Fn(&Value) -> Result<bool>,
{
    pub fn new(pred: P) -> Self {
        Count { pred, counts: Counts::default() }
    }
}

impl<P> Sink for Count<P>
where
    P: Fn(&Value) -> Result<bool>,
{
    type Output = Counts;

    fn name(&self) -> &'static str {
        "count"
    }

    fn accept(&mut self, _env: &mut Env, item: Value) -> Result<()> {
        self.counts.total += 1;
        if (self.pred)(&item)? {
            self.counts.num += 1;
        }
        Ok(())
    }

    fn finish(self) -> Result<Counts> {
        Ok(self.counts)
    }
}

#[derive(Default)]
pub struct Length {
    n: usize,
}

impl Sink for Length {
    type Output = usize;

    fn name(&self) -> &'static str {
        "length"
    }

    fn accept(&mut self, _env: &mut Env, _item: Value) -> Result<()> {
        self.n += 1;
        Ok(())
    }

    fn finish(self) -> Result<usize> {
        Ok(self.n)
    }
}

pub struct Contains<'t> {
    matcher: Matcher<'t>,
    found: bool,
}

impl<'t> Contains<'t> {
    pub fn new(matcher: Matcher<'t>) -> Self {
        Contains { matcher, found: false }
    }
}

impl Sink for Contains<'_> {
    type Output = bool;

    fn name(&self) -> &'static str {
        "contains"
    }

    fn can_stop(&self) -> bool {
        true
    }

    fn accept(&mut self, env: &mut Env, item: Value) -> Result<()> {
        if self.matcher.matches(&item)? {
            self.found = true;
            env.stop = true;
        }
        Ok(())
    }

    fn finish(self) -> Result<bool> {
        Ok(self.found)
    }
}

pub struct Every<P> {
    pred: P,
    pass: bool,
}

impl<P> Every<P>
where
    P: Fn(&Value) -> Result<bool>,
{
    pub fn new(pred: P) -> Self {
        Every { pred, pass: true }
    }
}

impl<P> Sink for Every<P>
where
    P: Fn(&Value) -> Result<bool>,
{
    type Output = bool;

    fn name(&self) -> &'static str {
        "every"
    }

    fn can_stop(&self) -> bool {
        true
    }

    fn accept(&mut self, env: &mut Env, item: Value) -> Result<()> {
        if !(self.pred)(&item)? {
            self.pass = false;
            env.stop = true;
        }
        Ok(())
    }

    fn finish(self) -> Result<bool> {
        Ok(self.pass)
    }
}

/// Position of the first match among the elements reaching the sink.
pub struct IndexOf<'t> {
    matcher: Matcher<'t>,
    pos: usize,
    found: Option<usize>,
}

impl<'t> IndexOf<'t> {
    pub fn new(matcher: Matcher<'t>) -> Self {
        IndexOf { matcher, pos: 0, found: None }
    }
}

impl Sink for IndexOf<'_> {
    type Output = isize;

    fn name(&self) -> &'static str {
        "index_of"
    }

    fn can_stop(&self) -> bool {
        true
    }

    fn accept(&mut self, env: &mut Env, item: Value) -> Result<()> {
        if self.matcher.matches(&item)? {
            self.found = Some(self.pos);
            env.stop = true;
        }
        self.pos += 1;
        Ok(())
    }

    fn bulk(&mut self, source: &[Value]) -> Result<Option<usize>> {
        for (i, item) in source.iter().enumerate() {
            if self.matcher.matches(item)? {
                self.found = Some(i);
                return Ok(Some(i + 1));
            }
        }
        Ok(Some(source.len()))
    }

    fn finish(self) -> Result<isize> {
        Ok(self.found.map_or(-1, |i| i as isize))
    }
}

pub struct GroupBy<F> {
    key: F,
    groups: Groups,
}

impl<F> GroupBy<F>
where
    F: Fn(&Value) -> Result<Value>,
{
    pub fn new(key: F) -> Self {
        GroupBy { key, groups: Groups::new() }
    }
}

impl<F> Sink for GroupBy<F>
where
    F: Fn(&Value) -> Result<Value>,
{
    type Output = Groups;

    fn name(&self) -> &'static str {
        "group_by"
    }

    fn accept(&mut self, _env: &mut Env, item: Value) -> Result<()> {
        let key = (self.key)(&item)?;
        let key = Key::from_value(&key).ok_or(LinkError::UnhashableKey { kind: key.kind() })?;
        self.groups.entry(key).or_default().push(item);
        Ok(())
    }

    fn finish(self) -> Result<Groups> {
        Ok(self.groups)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pick {
    Min,
    Max,
}

/// Running extremum by rank; yields the element, not its rank.
///
/// Ties keep the earliest element. Elements whose rank is NaN are skipped.
pub struct Extremum<R> {
    rank: R,
    pick: Pick,
    best: Option<(f64, Value)>,
}

impl<R> Extremum<R>
where
    R: Fn(&Value) -> Result<f64>,
{
    pub fn new(rank: R, pick: Pick) -> Self {
        Extremum { rank, pick, best: None }
    }
}

impl<R> Sink for Extremum<R>
where
    R: Fn(&Value) -> Result<f64>,
{
    type Output = Option<Value>;

    fn name(&self) -> &'static str {
        match self.pick {
            Pick::Min => "min",
            Pick::Max => "max",
        }
    }

    fn accept(&mut self, _env: &mut Env, item: Value) -> Result<()> {
        let rank = (self.rank)(&item)?;
        if rank.is_nan() {
            return Ok(());
        }
        let better = match &self.best {
            None => true,
            Some((best, _)) => match self.pick {
                Pick::Min => rank < *best,
                Pick::Max => rank > *best,
            },
        };
        if better {
            self.best = Some((rank, item));
        }
        Ok(())
    }

    fn finish(self) -> Result<Option<Value>> {
        Ok(self.best.map(|(_, item)| item))
    }
}

/// Left fold. Without a seed the first element becomes the accumulator.
pub struct Reduce<F> {
    fold: F,
    acc: Option<Value>,
}

impl<F> Reduce<F>
where
    F: FnMut(Value, Value) -> Result<Value>,
{
    pub fn new(fold: F, seed: Option<Value>) -> Self {
        Reduce { fold, acc: seed }
    }
}

impl<F> Sink for Reduce<F>
where
    F: FnMut(Value, Value) -> Result<Value>,
{
    type Output = Value;

    fn name(&self) -> &'static str {
        "reduce"
    }

    fn accept(&mut self, _env: &mut Env, item: Value) -> Result<()> {
        self.acc = Some(match self.acc.take() {
            Some(acc) => (self.fold)(acc, item)?,
            None => item,
        });
        Ok(())
    }

    fn finish(self) -> Result<Value> {
        self.acc.ok_or(LinkError::EmptyReduce)
    }
}

/// Calls a zero-argument method on every element.
///
/// With no method name, each element must itself be a func.
pub struct Invoke {
    method: Option<String>,
}

impl Invoke {
    pub fn new(method: Option<String>) -> Self {
        Invoke { method }
    }

    fn call(&self, item: &Value) -> Result<()> {
        let target = match &self.method {
            Some(name) => item.get(name),
            None => item.clone(),
        };
        match target {
            Value::Func(f) => f.call(&[]).map(|_| ()),
            _ => Err(LinkError::NotInvocable {
                method: self.method.clone().unwrap_or_else(|| "<self>".to_string()),
            }),
        }
    }
}

impl Sink for Invoke {
    type Output = ();

    fn name(&self) -> &'static str {
        "invoke"
    }

    fn accept(&mut self, _env: &mut Env, item: Value) -> Result<()> {
        self.call(&item)
    }

    fn bulk(&mut self, source: &[Value]) -> Result<Option<usize>> {
        for item in source {
            self.call(item)?;
        }
        Ok(Some(source.len()))
    }

    fn finish(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;
    use std::cell::Cell;
    use std::rc::Rc;

    fn feed<S: Sink>(mut sink: S, items: &[Value]) -> (Result<S::Output>, Env) {
        let mut env = Env::new();
        for item in items {
            if env.stop {
                break;
            }
            if let Err(e) = sink.accept(&mut env, item.clone()) {
                return (Err(e), env);
            }
        }
        (sink.finish(), env)
    }

    fn nums(ns: &[i32]) -> Vec<Value> {
        ns.iter().map(|&n| Value::from(n)).collect()
    }

    fn is_even(v: &Value) -> Result<bool> {
        Ok(v.as_f64().map_or(false, |n| n % 2.0 == 0.0))
    }

    #[test]
    fn test_count() {
        let (counts, _) = feed(Count::new(is_even), &nums(&[1, 2, 3, 4]));
        assert_eq!(counts.unwrap(), Counts { total: 4, num: 2 });
    }

    #[test]
    fn test_contains_stops_on_match() {
        let (found, env) = feed(Contains::new(Matcher::Value(3.into())), &nums(&[1, 3, 5]));
        assert!(found.unwrap());
        assert!(env.stop);

        let (found, _) = feed(Contains::new(Matcher::Value(9.into())), &nums(&[1, 3, 5]));
        assert!(!found.unwrap());
    }

    #[test]
    fn test_every_flips_on_failure() {
        let (pass, env) = feed(Every::new(is_even), &nums(&[2, 3, 4]));
        assert!(!pass.unwrap());
        assert!(env.stop);

        let (pass, _) = feed(Every::new(is_even), &[]);
        assert!(pass.unwrap());
    }

    #[test]
    fn test_index_of_generic_and_bulk_agree() {
        let items = nums(&[5, 3, 8, 3]);
        let (idx, _) = feed(IndexOf::new(Matcher::Value(3.into())), &items);
        assert_eq!(idx.unwrap(), 1);

        let mut sink = IndexOf::new(Matcher::Value(3.into()));
        assert_eq!(sink.bulk(&items).unwrap(), Some(2));
        assert_eq!(sink.finish().unwrap(), 1);

        let mut sink = IndexOf::new(Matcher::Value(9.into()));
        assert_eq!(sink.bulk(&items).unwrap(), Some(4));
        assert_eq!(sink.finish().unwrap(), -1);
    }

    #[test]
    fn test_index_of_field() {
        let items = vec![
            Value::record(Record::new().field("id", 1)),
            Value::record(Record::new().field("id", 2)),
        ];
        let matcher = Matcher::Field { field: "id".into(), value: 2.into() };
        let (idx, _) = feed(IndexOf::new(matcher), &items);
        assert_eq!(idx.unwrap(), 1);
    }

    #[test]
    fn test_group_by_preserves_order() {
        let key = |v: &Value| Ok(Value::from(v.as_f64().unwrap_or(0.0) % 2.0));
        let (groups, _) = feed(GroupBy::new(key), &nums(&[1, 2, 3, 4, 5]));
        let groups = groups.unwrap();
        let keys: Vec<&Key> = groups.keys().collect();
        assert_eq!(keys, vec![&Key::from(1), &Key::from(0)]);
        assert_eq!(groups[&Key::from(1)], nums(&[1, 3, 5]));
        assert_eq!(groups[&Key::from(0)], nums(&[2, 4]));
    }

    #[test]
    fn test_group_by_rejects_reference_keys() {
        let key = |v: &Value| Ok(Value::list(vec![v.clone()]));
        let (groups, _) = feed(GroupBy::new(key), &nums(&[1]));
        assert!(matches!(groups, Err(LinkError::UnhashableKey { .. })));
    }

    #[test]
    fn test_extremum_returns_item() {
        let people = vec![
            Value::record(Record::new().field("name", "a").field("age", 30)),
            Value::record(Record::new().field("name", "b").field("age", 20)),
            Value::record(Record::new().field("name", "c").field("age", 40)),
        ];
        let age = |v: &Value| Ok(v.get("age").as_f64().unwrap_or(0.0));

        let (min, _) = feed(Extremum::new(age, Pick::Min), &people);
        assert_eq!(min.unwrap().unwrap().get("name"), Value::from("b"));

        let (max, _) = feed(Extremum::new(age, Pick::Max), &people);
        assert_eq!(max.unwrap().unwrap().get("name"), Value::from("c"));

        let (none, _) = feed(Extremum::new(age, Pick::Max), &[]);
        assert!(none.unwrap().is_none());
    }

    #[test]
    fn test_extremum_skips_nan_ranks() {
        let items = vec![Value::from(f64::NAN), Value::from(1), Value::from(2)];
        let rank = |v: &Value| Ok(v.as_f64().unwrap_or(f64::NAN));

        let (min, _) = feed(Extremum::new(rank, Pick::Min), &items);
        assert_eq!(min.unwrap(), Some(Value::from(1)));

        let (max, _) = feed(Extremum::new(rank, Pick::Max), &items);
        assert_eq!(max.unwrap(), Some(Value::from(2)));

        let (none, _) = feed(Extremum::new(rank, Pick::Min), &[Value::from(f64::NAN)]);
        assert!(none.unwrap().is_none());
    }

    #[test]
    fn test_reduce_seeded_and_unseeded() {
        let add = |a: Value, b: Value| Ok(Value::from(a.as_f64().unwrap() + b.as_f64().unwrap()));

        let (sum, _) = feed(Reduce::new(add, None), &nums(&[1, 2, 3]));
        assert_eq!(sum.unwrap(), Value::from(6));

        let (sum, _) = feed(Reduce::new(add, Some(10.into())), &nums(&[1, 2, 3]));
        assert_eq!(sum.unwrap(), Value::from(16));

        let (sum, _) = feed(Reduce::new(add, Some(0.into())), &[]);
        assert_eq!(sum.unwrap(), Value::from(0));

        let (sum, _) = feed(Reduce::new(add, None), &[]);
        assert!(matches!(sum, Err(LinkError::EmptyReduce)));
    }

    #[test]
    fn test_invoke_calls_method() {
        let hits = Rc::new(Cell::new(0));
        let make = |hits: Rc<Cell<i32>>| {
            Value::record(Record::new().field(
                "ping",
                Value::func(move |_| {
                    hits.set(hits.get() + 1);
                    Ok(Value::Undefined)
                }),
            ))
        };
        let items = vec![make(hits.clone()), make(hits.clone())];

        let (res, _) = feed(Invoke::new(Some("ping".into())), &items);
        res.unwrap();
        assert_eq!(hits.get(), 2);

        let mut sink = Invoke::new(Some("ping".into()));
        assert_eq!(sink.bulk(&items).unwrap(), Some(2));
        assert_eq!(hits.get(), 4);
    }

    #[test]
    fn test_invoke_missing_method() {
        let (res, _) = feed(Invoke::new(Some("nope".into())), &nums(&[1]));
        match res {
            Err(LinkError::NotInvocable { method }) => assert_eq!(method, "nope"),
            other => panic!("expected NotInvocable, got {other:?}"),
        }
    }

    #[test]
    fn test_head_sentinel() {
        let (v, _) = feed(Head::default(), &[]);
        assert!(v.unwrap().is_undefined());

        let (v, env) = feed(Head::default(), &nums(&[7, 8]));
        assert_eq!(v.unwrap(), Value::from(7));
        assert!(env.stop);
    }
}
