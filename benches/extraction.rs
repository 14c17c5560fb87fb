//! Benchmarks for issue/insight extraction.
//!
//! Extraction runs after every successful turn; it should remain cheap
//! relative to the model call it follows.

use atrium::extract::extract;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const STRUCTURED_ANSWER: &str = r#"Here is my assessment of the situation.

```json
{
  "issue_title": "Lunch rush understaffing",
  "issue_description": "Two stations unmanned between 12:00 and 13:00",
  "issue_topic": "staffing",
  "insight_title": "Stagger shift starts",
  "insight_content": "Shift one starter to 11:30 to cover the ramp",
  "insight_type": "improvement",
  "insight_score": 72
}
```"#;

fn heuristic_answer() -> String {
    let mut answer = String::from("There is a risk that the current supplier cannot keep up. ");
    for _ in 0..20 {
        answer.push_str("I recommend reviewing the order schedule and considering a backup. ");
    }
    answer
}

fn bench_extract(c: &mut Criterion) {
    let heuristic = heuristic_answer();

    c.bench_function("extract/structured_block", |b| {
        b.iter(|| {
            extract(
                black_box(STRUCTURED_ANSWER),
                black_box("We keep running short-handed at lunch"),
            )
        })
    });

    c.bench_function("extract/heuristic_long_answer", |b| {
        b.iter(|| {
            extract(
                black_box(heuristic.as_str()),
                black_box("Is our supplier a problem?"),
            )
        })
    });

    c.bench_function("extract/no_match", |b| {
        b.iter(|| extract(black_box("We open at nine."), black_box("Opening hours?")))
    });
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
