use std::hint::black_box;

use divan::{AllocProfiler, Bencher};
use kea_bench::{list_length, nested_option, wide_scope};
use kea_synth::{SearchConfig, SearchOutcome, synthesize};
use kea_tactics::{TacticRegistry, auto};

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

fn solution_count<E>(outcome: &SearchOutcome<E>) -> usize {
    outcome.found().map_or(0, |result| result.other_solutions.len() + 1)
}

#[divan::bench(args = [4, 16, 64])]
fn assumption_in_wide_scope(bencher: Bencher, width: usize) {
    let (context, root) = wide_scope(width);
    let config = SearchConfig::default();
    let tactic = auto(3);
    bencher.bench(|| {
        let outcome = synthesize(&context, &config, black_box(root.clone()), &tactic)
            .unwrap_or_else(|err| panic!("malformed benchmark judgment: {err}"));
        black_box(solution_count(&outcome))
    });
}

#[divan::bench(args = [3, 4, 5])]
fn list_length_by_depth(bencher: Bencher, depth: usize) {
    let (context, root) = list_length();
    let config = SearchConfig::default()
        .with_max_nodes(1_000_000)
        .with_max_solutions(usize::MAX);
    let tactic = auto(depth);
    bencher.bench(|| {
        let outcome = synthesize(&context, &config, black_box(root.clone()), &tactic)
            .unwrap_or_else(|err| panic!("malformed benchmark judgment: {err}"));
        black_box(solution_count(&outcome))
    });
}

#[divan::bench(args = [1, 2, 3])]
fn split_nested_options(bencher: Bencher, depth: usize) {
    let (context, root) = nested_option(depth);
    let config = SearchConfig::default();
    let tactic = TacticRegistry::standard()
        .get("auto")
        .cloned()
        .unwrap_or_else(|| panic!("standard registry has no auto"));
    bencher.bench(|| {
        let outcome = synthesize(&context, &config, black_box(root.clone()), &tactic)
            .unwrap_or_else(|err| panic!("malformed benchmark judgment: {err}"));
        black_box(solution_count(&outcome))
    });
}

#[divan::bench]
fn cutoff_at_small_budget(bencher: Bencher) {
    let (context, root) = list_length();
    let config = SearchConfig::default().with_max_nodes(64);
    let tactic = auto(6);
    bencher.bench(|| {
        let outcome = synthesize(&context, &config, black_box(root.clone()), &tactic)
            .unwrap_or_else(|err| panic!("malformed benchmark judgment: {err}"));
        assert!(outcome.timed_out());
        black_box(solution_count(&outcome))
    });
}
