//! Equivalence tests for pipeline fusion
//!
//! Verifies that fused execution produces identical results to unfused
//! execution, and that the bulk scan agrees with the per-element loop.

use linkq::{Chain, LinkOptions, Record, Value};

fn num(v: &Value) -> f64 {
    v.as_f64().unwrap_or(f64::NAN)
}

fn nums(ns: &[i32]) -> Vec<Value> {
    ns.iter().map(|&n| Value::from(n)).collect()
}

fn fused(data: &[Value]) -> Chain<'_> {
    Chain::with_options(data, LinkOptions::default())
}

fn unfused(data: &[Value]) -> Chain<'_> {
    Chain::with_options(data, LinkOptions::unoptimized())
}

/// Build the same operator sequence over both chains and compare the streams.
fn assert_equivalent<F>(data: &[Value], build: F)
where
    F: for<'a> Fn(Chain<'a>) -> Chain<'a>,
{
    let mut a = build(fused(data));
    let mut b = build(unfused(data));
    assert_eq!(a.collect().unwrap(), b.collect().unwrap());
    assert!(a.last_stats().nodes <= b.last_stats().nodes);
}

#[test]
fn test_filter_then_map_matches_unfused() {
    let data = nums(&[1, 2, 3, 4, 5, 6]);
    assert_equivalent(&data, |c| {
        c.filter(|v| num(v) % 2.0 == 0.0)
            .map(|v| Value::from(num(&v) + 1.0))
    });

    let mut c = fused(&data)
        .filter(|v| num(v) % 2.0 == 0.0)
        .map(|v| Value::from(num(&v) + 1.0));
    assert_eq!(c.plan(), vec!["filter+map"]);
    assert_eq!(c.collect().unwrap(), nums(&[3, 5, 7]));
}

#[test]
fn test_map_then_filter_checks_mapped_value() {
    let data = nums(&[1, 2, 3, 4]);
    let mut c = fused(&data)
        .map(|v| Value::from(num(&v) + 1.0))
        .filter(|v| num(v) % 2.0 == 0.0);
    assert_eq!(c.plan(), vec!["map+filter"]);
    // 1+1 and 3+1 are even
    assert_eq!(c.collect().unwrap(), nums(&[2, 4]));

    assert_equivalent(&data, |c| {
        c.map(|v| Value::from(num(&v) + 1.0))
            .filter(|v| num(v) % 2.0 == 0.0)
    });
}

#[test]
fn test_filter_filter_and_map_map() {
    let data: Vec<Value> = (0..50).map(Value::from).collect();
    assert_equivalent(&data, |c| {
        c.filter(|v| num(v) > 10.0)
            .filter(|v| num(v) % 3.0 == 0.0)
            .map(|v| Value::from(num(&v) * 2.0))
            .map(|v| Value::from(num(&v) - 1.0))
    });

    let c = fused(&data)
        .filter(|v| num(v) > 10.0)
        .filter(|v| num(v) % 3.0 == 0.0)
        .map(|v| Value::from(num(&v) * 2.0))
        .map(|v| Value::from(num(&v) - 1.0));
    assert_eq!(c.plan(), vec!["filter+filter", "map+map"]);
}

#[test]
fn test_reject_interleaved_with_fusible_ops() {
    let data: Vec<Value> = (0..30).map(Value::from).collect();
    assert_equivalent(&data, |c| {
        c.filter(|v| num(v) > 2.0)
            .reject(|v| num(v) % 5.0 == 0.0)
            .filter(|v| num(v) % 2.0 == 1.0)
            .map(|v| Value::from(num(&v) * num(&v)))
    });
}

#[test]
fn test_early_exit_nodes_agree() {
    let data: Vec<Value> = (0..100).map(Value::from).collect();
    assert_equivalent(&data, |c| {
        c.filter(|v| num(v) % 7.0 == 0.0)
            .map(|v| Value::from(num(&v) / 7.0))
            .take(4)
    });
    assert_equivalent(&data, |c| c.skip(3).slice(2, Some(6)).map(|v| v));
    assert_equivalent(&data, |c| c.map(|v| Value::from(num(&v) * 3.0)).get(5));
    assert_equivalent(&data, |c| c.first_where(|v| num(v) > 42.0));
}

#[test]
fn test_bulk_and_generic_paths_agree() {
    let data = nums(&[5, 3, 8, 3]);

    let mut bulk = fused(&data);
    let mut generic = unfused(&data);

    assert_eq!(bulk.collect().unwrap(), generic.collect().unwrap());
    assert!(bulk.last_stats().bulk);
    assert!(!generic.last_stats().bulk);

    assert_eq!(bulk.index_of(3).unwrap(), 1);
    assert_eq!(generic.index_of(3).unwrap(), 1);
    assert_eq!(bulk.index_of(9).unwrap(), -1);
    assert_eq!(generic.index_of(9).unwrap(), -1);

    let people = vec![
        Value::record(Record::new().field("id", 1)),
        Value::record(Record::new().field("id", 2)),
    ];
    assert_eq!(fused(&people).index_of_field("id", 2).unwrap(), 1);
    assert_eq!(unfused(&people).index_of_field("id", 2).unwrap(), 1);
}

#[test]
fn test_index_of_counts_positions_after_upstream_nodes() {
    let data = nums(&[1, 2, 3, 4, 5, 6]);
    let mut c = fused(&data).filter(|v| num(v) % 2.0 == 0.0);
    // Stream is [2, 4, 6]
    assert_eq!(c.index_of(6).unwrap(), 2);
}

fn doubled_skipping_triples(c: Chain<'_>) -> Chain<'_> {
    c.map(|v| Value::from(num(&v) * 2.0))
        .filter(|v| num(v) % 3.0 != 0.0)
}

#[test]
fn test_fused_terminals_match_unfused() {
    let data: Vec<Value> = (1..=20).map(Value::from).collect();
    let mut a = doubled_skipping_triples(fused(&data));
    let mut b = doubled_skipping_triples(unfused(&data));

    assert_eq!(a.length().unwrap(), b.length().unwrap());
    assert_eq!(
        a.count(|v| num(v) > 10.0).unwrap(),
        b.count(|v| num(v) > 10.0).unwrap()
    );
    assert_eq!(
        a.group_by(|v| Value::from(num(v) % 4.0)).unwrap(),
        b.group_by(|v| Value::from(num(v) % 4.0)).unwrap()
    );
    assert_eq!(
        a.fold(0, |acc, v| Value::from(num(&acc) + num(&v))).unwrap(),
        b.fold(0, |acc, v| Value::from(num(&acc) + num(&v))).unwrap()
    );
}
