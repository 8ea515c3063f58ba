use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use beam_viterbi::{BeamConfig, DecoderBuilder, Graph, ScoreMatrix, Transition};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sysinfo::{get_current_pid, ProcessRefreshKind, System};

fn word_loop(words: u32) -> Graph {
    let phones = 3;
    let end = 1 + words * phones;
    let mut g = Graph::new(end as usize + 1).unwrap();
    let enter = -(words as f64).ln();
    for w in 0..words {
        let first = 1 + w * phones;
        g.add_arc(0, Transition::epsilon(first, enter)).unwrap();
        g.add_arc(end, Transition::emitting(first, enter).with_class(first - 1))
            .unwrap();
        for p in 0..phones {
            let s = first + p;
            g.add_arc(s, Transition::emitting(s, 0.6f64.ln()).with_class(s - 1))
                .unwrap();
            let exit = if p + 1 < phones {
                Transition::emitting(s + 1, 0.4f64.ln()).with_class(s - 1)
            } else {
                Transition::epsilon(end, 0.4f64.ln()).with_word(w)
            };
            g.add_arc(s, exit).unwrap();
        }
    }
    g.set_final(end, 0.0).unwrap();
    g
}

fn random_scores(rng: &mut StdRng, frames: usize, columns: usize) -> ScoreMatrix {
    let data = (0..frames * columns)
        .map(|_| rng.gen_range(-10.0..0.0))
        .collect();
    ScoreMatrix::new(columns, data)
}

fn rss_kib() -> u64 {
    let mut sys = System::new();
    sys.refresh_processes_specifics(ProcessRefreshKind::new());
    if let Some(p) = sys.process(get_current_pid().unwrap()) {
        p.memory()
    } else {
        0
    }
}

fn bench_decode_perf(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_word_loop");
    group.sample_size(20);
    for &words in &[100u32, 1_000, 10_000] {
        let graph = word_loop(words);
        for (label, beam) in [
            ("log_beam", BeamConfig::new(10.0, 0)),
            ("rank_beam", BeamConfig::new(12.0, 500)),
        ] {
            group.bench_function(format!("{label}_words_{words}"), |b| {
                b.iter_batched(
                    || {
                        let mut rng = StdRng::seed_from_u64(44);
                        random_scores(&mut rng, 300, (words * 3) as usize)
                    },
                    |scores| {
                        let before = rss_kib();
                        let mut decoder =
                            DecoderBuilder::new(&graph).with_beam(beam).build().unwrap();
                        let out = decoder.decode(&scores);
                        let after = rss_kib();
                        criterion::black_box(out.map(|o| o.log_prob).ok());
                        eprintln!(
                            "RSS KiB delta ({label} {words}): {}",
                            after.saturating_sub(before)
                        );
                    },
                    BatchSize::PerIteration,
                )
            });
        }
    }
    group.finish();
}

fn bench_session_reuse(c: &mut Criterion) {
    let graph = word_loop(1_000);
    let mut rng = StdRng::seed_from_u64(45);
    let utts: Vec<ScoreMatrix> = (0..8)
        .map(|_| random_scores(&mut rng, 200, 3_000))
        .collect();
    let mut decoder = DecoderBuilder::new(&graph)
        .with_log_prob_beam(10.0)
        .with_rank_beam(500)
        .build()
        .unwrap();

    c.bench_function("decode_reused_session_8_utts", |b| {
        b.iter(|| {
            for scores in &utts {
                criterion::black_box(decoder.decode(scores).ok());
            }
        })
    });
}

criterion_group!(benches, bench_decode_perf, bench_session_reuse);
criterion_main!(benches);
