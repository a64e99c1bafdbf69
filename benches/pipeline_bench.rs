// benches/pipeline_bench.rs
//! Benchmarks for the local, model-free parts of the pipeline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trinity_journal::pipeline::{
    introduced_entities, normalize_completion, parse_classification, RefinementPolicy,
};
use trinity_journal::prompts::extract_json;

/// A spoken-style response of roughly `words` words.
fn create_sample_response(words: usize) -> String {
    const FILLER: &[&str] = &[
        "um", "so", "today", "I", "walked", "to", "the", "market", "with", "my", "brother",
        "and", "we", "found", "fresh", "figs", "which", "made", "me", "really", "happy",
    ];
    FILLER.iter().cycle().take(words).copied().collect::<Vec<_>>().join(" ")
}

fn bench_reply_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("reply_parsing");

    let replies = vec![
        (
            "bare_json",
            r#"{"prompt": "desire", "confidence": 0.82, "explanation": "Looks forward to travel"}"#
                .to_string(),
        ),
        (
            "fenced_json",
            "Here you go:\n```json\n{\"prompt\": \"brag\", \"confidence\": \"high\"}\n```\n"
                .to_string(),
        ),
        ("bare_label", "Gratitude.".to_string()),
    ];

    for (name, reply) in &replies {
        group.bench_with_input(
            BenchmarkId::new("parse_classification", name),
            reply,
            |b, reply| b.iter(|| parse_classification(black_box(reply))),
        );
        group.bench_with_input(BenchmarkId::new("extract_json", name), reply, |b, reply| {
            b.iter(|| extract_json(black_box(reply)).len())
        });
    }

    group.finish();
}

fn bench_local_checks(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_checks");
    let policy = RefinementPolicy::default();

    for (words, name) in [(5, "short"), (40, "medium"), (400, "long")] {
        let response = create_sample_response(words);
        let formatted = format!("\"{}. We met Laura at 9.\"", response);

        group.bench_with_input(BenchmarkId::new("assess", name), &response, |b, text| {
            b.iter(|| policy.assess(black_box(text)))
        });
        group.bench_with_input(
            BenchmarkId::new("introduced_entities", name),
            &(response.clone(), formatted.clone()),
            |b, (source, candidate)| {
                b.iter(|| introduced_entities(black_box(source), black_box(candidate)))
            },
        );
        group.bench_with_input(
            BenchmarkId::new("normalize_completion", name),
            &formatted,
            |b, raw| b.iter(|| normalize_completion(black_box(raw))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_reply_parsing, bench_local_checks);
criterion_main!(benches);
