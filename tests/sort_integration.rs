//! # External Sort Integration Tests
//!
//! These tests drive `SortOperator` through the public API against tables
//! that span many pages, with buffer budgets small enough to force several
//! merge passes.
//!
//! ## Test Coverage
//!
//! 1. Ordering
//!    - Output is non-decreasing under the comparator
//!    - Output is a permutation of the input (same multiset)
//!    - Works for Int, Text and mixed keys with NULLs
//!
//! 2. Budget Handling
//!    - Every budget from the minimum (3 pages) upward sorts correctly
//!    - Runs left behind after sorting: only the final run
//!
//! 3. Edge Cases
//!    - Empty table sorts to an empty result
//!    - Single record, all-equal keys
//!
//! 4. Operator Behavior
//!    - Iterating twice yields the same records
//!    - Source table is unchanged
//!
//! ## Usage
//!
//! ```sh
//! cargo test --test sort_integration
//! ```

use spillway::config::ExecutionConfig;
use spillway::query::{by_column, QueryOperator, SortOperator};
use spillway::records::{Record, Schema};
use spillway::types::{ColumnDef, DataType, Value};
use spillway::ExecutionContext;

fn context(memory_pages: usize) -> ExecutionContext {
    ExecutionContext::with_config(
        ExecutionConfig::builder()
            .memory_pages(memory_pages)
            .page_size(128)
            .build()
            .unwrap(),
    )
}

fn create_pairs(ctx: &ExecutionContext, name: &str, rows: impl IntoIterator<Item = (Value, Value)>) {
    ctx.store()
        .create_table(
            name,
            Schema::new(vec![
                ColumnDef::new("k", DataType::Int),
                ColumnDef::text("tag", 8),
            ]),
        )
        .unwrap();
    for (k, tag) in rows {
        ctx.add_record(name, vec![k, tag]).unwrap();
    }
}

/// Deterministic pseudo-random sequence.
fn scrambled(n: i64, modulo: i64) -> Vec<i64> {
    let mut state: i64 = 17;
    (0..n)
        .map(|_| {
            state = (state * 1_103_515_245 + 12_345) % 2_147_483_648;
            state % modulo
        })
        .collect()
}

fn sorted_output(ctx: &ExecutionContext, table: &str) -> Vec<Record> {
    let mut op = SortOperator::new(ctx, table, by_column(0)).unwrap();
    op.iterator().unwrap().collect()
}

fn is_sorted_on_key(records: &[Record]) -> bool {
    records.windows(2).all(|w| w[0].get(0) <= w[1].get(0))
}

#[test]
fn sorts_many_pages_with_minimum_budget() {
    let ctx = context(3);
    let keys = scrambled(1_000, 500);
    create_pairs(
        &ctx,
        "t",
        keys.iter().map(|k| (Value::Int(*k), Value::from(format!("r{}", k % 7)))),
    );
    assert!(ctx.stats("t").unwrap().num_pages > 20);

    let out = sorted_output(&ctx, "t");

    assert_eq!(out.len(), 1_000);
    assert!(is_sorted_on_key(&out));

    let mut expected: Vec<Record> = ctx.record_iterator("t").unwrap().collect();
    let mut actual = out.clone();
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);
}

#[test]
fn every_budget_produces_same_order() {
    let keys = scrambled(300, 1_000);
    let mut reference: Option<Vec<Value>> = None;

    for budget in 3..=10 {
        let ctx = context(budget);
        create_pairs(
            &ctx,
            "t",
            keys.iter().map(|k| (Value::Int(*k), Value::from("x"))),
        );

        let out = sorted_output(&ctx, "t");
        assert!(is_sorted_on_key(&out), "budget {}", budget);

        let keys_out: Vec<Value> = out.iter().map(|r| r.get(0).cloned().unwrap()).collect();
        match &reference {
            Some(expected) => assert_eq!(&keys_out, expected, "budget {}", budget),
            None => reference = Some(keys_out),
        }
    }
}

#[test]
fn nulls_sort_first() {
    let ctx = context(3);
    create_pairs(
        &ctx,
        "t",
        vec![
            (Value::Int(5), Value::from("a")),
            (Value::Null, Value::from("b")),
            (Value::Int(-2), Value::from("c")),
            (Value::Null, Value::from("d")),
        ],
    );

    let out = sorted_output(&ctx, "t");
    let keys: Vec<Value> = out.iter().map(|r| r.get(0).cloned().unwrap()).collect();

    assert_eq!(
        keys,
        vec![Value::Null, Value::Null, Value::Int(-2), Value::Int(5)]
    );
}

#[test]
fn sorts_on_text_column() {
    let ctx = context(4);
    let words = ["pear", "apple", "fig", "kiwi", "banana", "apple"];
    create_pairs(
        &ctx,
        "t",
        words
            .iter()
            .enumerate()
            .map(|(i, w)| (Value::Int(i as i64), Value::from(*w))),
    );

    let mut op = SortOperator::new(&ctx, "t", by_column(1)).unwrap();
    let out: Vec<String> = op
        .iterator()
        .unwrap()
        .map(|r| r.get(1).and_then(Value::as_text).unwrap().to_string())
        .collect();

    assert_eq!(out, vec!["apple", "apple", "banana", "fig", "kiwi", "pear"]);
}

#[test]
fn concrete_three_record_sort() {
    let ctx = context(3);
    create_pairs(
        &ctx,
        "t",
        [3, 1, 2].map(|k| (Value::Int(k), Value::from("v"))),
    );

    let keys: Vec<i64> = sorted_output(&ctx, "t")
        .iter()
        .map(|r| r.get(0).and_then(Value::as_int).unwrap())
        .collect();

    assert_eq!(keys, vec![1, 2, 3]);
}

#[test]
fn empty_table_sorts_to_nothing() {
    let ctx = context(3);
    create_pairs(&ctx, "t", Vec::new());
    assert!(sorted_output(&ctx, "t").is_empty());
}

#[test]
fn single_record_and_equal_keys() {
    let ctx = context(3);
    create_pairs(&ctx, "one", vec![(Value::Int(9), Value::from("only"))]);
    assert_eq!(sorted_output(&ctx, "one").len(), 1);

    create_pairs(
        &ctx,
        "same",
        (0..200).map(|i| (Value::Int(4), Value::from(format!("{}", i)))),
    );
    let out = sorted_output(&ctx, "same");
    assert_eq!(out.len(), 200);
    assert!(out.iter().all(|r| r.get(0) == Some(&Value::Int(4))));
}

#[test]
fn iterating_twice_is_stable() {
    let ctx = context(3);
    create_pairs(
        &ctx,
        "t",
        scrambled(150, 40)
            .into_iter()
            .map(|k| (Value::Int(k), Value::from("x"))),
    );
    let mut op = SortOperator::new(&ctx, "t", by_column(0)).unwrap();

    let first: Vec<Record> = op.iterator().unwrap().collect();
    let second: Vec<Record> = op.iterator().unwrap().collect();

    assert_eq!(first, second);
}

#[test]
fn only_final_run_survives() {
    let ctx = context(3);
    create_pairs(
        &ctx,
        "t",
        scrambled(400, 400)
            .into_iter()
            .map(|k| (Value::Int(k), Value::from("x"))),
    );
    let before: Vec<Record> = ctx.record_iterator("t").unwrap().collect();

    let op = SortOperator::new(&ctx, "t", by_column(0)).unwrap();
    let sorted = op.sort().unwrap();

    assert_eq!(ctx.store().temp_table_names(), vec![sorted]);
    let after: Vec<Record> = ctx.record_iterator("t").unwrap().collect();
    assert_eq!(before, after);
}
