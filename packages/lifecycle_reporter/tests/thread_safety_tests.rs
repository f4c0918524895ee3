//! Thread safety integration tests for `lifecycle_reporter`.
//!
//! These tests verify that reporters can be created, called, moved and dropped from many
//! threads at once without duplicate ids or garbled output.

#![allow(clippy::indexing_slicing, reason = "panic is fine in tests")]

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use lifecycle_reporter::{MemorySink, Registry, Reporter, WriterSink};

const THREAD_COUNT: usize = 16;

/// Checks the fixed line format and returns the id.
fn well_formed_id(line: &str) -> u64 {
    let (record, operation) = line.split_once("]: ").expect("line has an operation");
    assert!(operation.starts_with("Reporter::"), "malformed line: {line}");
    assert!(!line.contains('\n'), "line contains a terminator: {line}");

    let fields: Vec<&str> = record
        .strip_prefix('[')
        .expect("line starts with a bracket")
        .split(", ")
        .collect();
    assert_eq!(fields.len(), 5, "malformed line: {line}");
    assert_eq!(fields[0].len(), 5, "type hash is not fixed-width: {line}");
    assert_eq!(fields[1].len(), 5, "thread hash is not fixed-width: {line}");
    assert!(fields[3].starts_with("0x"), "address is not hexadecimal: {line}");

    fields[2].parse().expect("id is numeric")
}

fn setup() -> (Registry<u64>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let registry = Registry::builder().default_sink(sink.clone()).build();
    (registry, sink)
}

#[test]
fn concurrent_construction_produces_one_line_per_reporter() {
    let (registry, sink) = setup();
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));

    let reporters: Vec<Reporter> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREAD_COUNT)
            .map(|_| {
                let registry = registry.clone();
                let barrier = Arc::clone(&barrier);
                s.spawn(move || {
                    barrier.wait();
                    registry.reporter()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("thread does not panic"))
            .collect()
    });

    let lines = sink.lines();
    assert_eq!(lines.len(), THREAD_COUNT);

    let ids: HashSet<u64> = lines.iter().map(|l| well_formed_id(l)).collect();
    assert_eq!(ids.len(), THREAD_COUNT);
    assert_eq!(ids, (1..=THREAD_COUNT as u64).collect::<HashSet<u64>>());

    let owned: HashSet<u64> = reporters.iter().map(Reporter::id).collect();
    assert_eq!(owned, ids);
}

#[test]
fn concurrent_lifecycles_never_duplicate_ids() {
    const ROUNDS: usize = 50;

    let (registry, sink) = setup();

    thread::scope(|s| {
        for _ in 0..THREAD_COUNT {
            s.spawn(|| {
                for _ in 0..ROUNDS {
                    let mut a = registry.reporter();
                    let b = a.clone();
                    let c = a.take();
                    a.call(());
                    b.call(());
                    c.call_once(());
                }
            });
        }
    });

    // Per round: new, clone, take, 3 calls, 3 drops.
    let expected_lines = THREAD_COUNT * ROUNDS * 9;
    let lines = sink.lines();
    assert_eq!(lines.len(), expected_lines);

    let constructed: Vec<u64> = lines
        .iter()
        .filter(|l| {
            l.ends_with("Reporter::new()")
                || l.ends_with("Reporter::clone(&self)")
                || l.ends_with("Reporter::take(&mut self)")
        })
        .map(|l| well_formed_id(l))
        .collect();

    let unique: HashSet<u64> = constructed.iter().copied().collect();
    assert_eq!(constructed.len(), THREAD_COUNT * ROUNDS * 3);
    assert_eq!(unique.len(), constructed.len());
    assert_eq!(registry.issued(), constructed.len() as u64);
}

#[test]
fn reporter_can_be_moved_between_threads() {
    let (registry, sink) = setup();
    let reporter = registry.reporter();

    let handle = thread::spawn(move || {
        reporter.call(("from", "another", "thread"));
        reporter
    });

    let reporter = handle.join().expect("thread does not panic");
    drop(reporter);

    assert_eq!(sink.len(), 3);
}

#[test]
fn reporter_can_be_shared_across_threads() {
    let (registry, sink) = setup();
    let reporter = Arc::new(registry.reporter());

    thread::scope(|s| {
        for _ in 0..THREAD_COUNT {
            let reporter = Arc::clone(&reporter);
            s.spawn(move || reporter.call(()));
        }
    });

    assert_eq!(sink.len(), THREAD_COUNT + 1);
    assert!(sink.lines().iter().all(|l| well_formed_id(l) == 1));
}

#[test]
fn writer_sink_lines_are_not_interleaved() {
    let sink = Arc::new(WriterSink::new(Vec::<u8>::new()));
    let registry = Registry::<u32>::new();

    thread::scope(|s| {
        for _ in 0..THREAD_COUNT {
            s.spawn(|| {
                let reporter = registry.reporter_with_sink(sink.clone());
                reporter.call(());
            });
        }
    });

    let sink = Arc::into_inner(sink).expect("all reporters have been dropped");
    let output = String::from_utf8(sink.into_inner()).expect("output is UTF-8");

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), THREAD_COUNT * 3);
    for line in lines {
        well_formed_id(line);
    }
}
