use std::collections::HashMap;
use std::env;
use std::time::Instant;

use beam_viterbi::{
    AcousticScores, BeamConfig, DecoderBuilder, DecodingGraph, Emission, Graph, ScoreMatrix,
    Transition,
};
use sysinfo::{get_current_pid, ProcessRefreshKind, System};

const PHONES: u32 = 3;

fn main() {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("scale_probe: {err}");
            Options::print_help();
            std::process::exit(2);
        }
    };

    eprintln!("\n{}", "=".repeat(80));
    eprintln!("Beam Viterbi Scaling Probe");
    eprintln!("{}", "=".repeat(80));
    eprintln!();
    eprintln!("Decodes synthetic word-loop graphs of increasing size and checks:");
    eprintln!(
        "  • Unpruned scores match a dense frame-by-state table (up to {} states or frames)",
        options.verify_limit
    );
    eprintln!("  • Pruned scores never exceed the unpruned optimum");
    eprintln!();
    eprintln!("Metrics:");
    eprintln!("  • wall_s: wall-clock time of the decode in seconds");
    eprintln!("  • rss_delta_kib: resident memory delta in KiB");
    eprintln!("  • status: 'passed' = checked against the baseline, 'not_checked' = too large");
    eprintln!();
    eprintln!("{}", "=".repeat(80));
    eprintln!();

    let mut sys = System::new();
    let mut measurements = Vec::new();

    eprintln!("[1/4] Unpruned search, growing vocabulary...");
    measurements.extend(run_vocabulary(
        &options,
        &mut sys,
        "unpruned",
        BeamConfig::disabled(),
    ));
    eprintln!();

    eprintln!("[2/4] Log-probability beam, growing vocabulary...");
    measurements.extend(run_vocabulary(
        &options,
        &mut sys,
        "log_beam",
        BeamConfig::new(10.0, 0),
    ));
    eprintln!();

    eprintln!("[3/4] Log-probability and rank beams, growing vocabulary...");
    measurements.extend(run_vocabulary(
        &options,
        &mut sys,
        "log_and_rank_beam",
        BeamConfig::new(12.0, 256),
    ));
    eprintln!();

    eprintln!("[4/4] Fixed vocabulary, growing utterance length...");
    measurements.extend(run_frames(&options, &mut sys));
    eprintln!();

    print_summary(&measurements, &options);

    if let Err(err) = options.format.write(&measurements) {
        eprintln!("scale_probe output error: {err}");
        std::process::exit(1);
    }
}

struct Options {
    format: OutputFormat,
    verify_limit: usize,
}

impl Options {
    fn parse<I, T>(mut args: I) -> Result<Self, String>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let mut format = OutputFormat::Csv;
        let mut verify_limit = 512usize;

        while let Some(arg) = args.next() {
            let arg = arg.into();
            if arg == "--help" || arg == "-h" {
                Options::print_help();
                std::process::exit(0);
            } else if let Some(value) = arg.strip_prefix("--format=") {
                format = OutputFormat::from_str(value)?;
            } else if arg == "--format" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --format".to_string())?
                    .into();
                format = OutputFormat::from_str(&value)?;
            } else if let Some(value) = arg.strip_prefix("--verify-limit=") {
                verify_limit = parse_limit(value)?;
            } else if arg == "--verify-limit" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --verify-limit".to_string())?
                    .into();
                verify_limit = parse_limit(&value)?;
            } else {
                return Err(format!("unrecognized argument '{arg}'"));
            }
        }

        Ok(Self {
            format,
            verify_limit,
        })
    }

    fn print_help() {
        println!(
            "\
Usage: cargo run --bin scale_probe [-- <options>]

Options:
  --format <csv|table|json>     Output format (default: csv)
  --verify-limit <N>            Largest state or frame count checked against the dense baseline (default: 512)
  -h, --help                    Print this help message

Examples:
  cargo run --release --bin scale_probe
  cargo run --release --bin scale_probe -- --format table --verify-limit 2048
"
        );
    }
}

fn parse_limit(value: &str) -> Result<usize, String> {
    value
        .parse::<usize>()
        .map_err(|_| "verify limit must be a positive integer".to_string())
}

#[derive(Copy, Clone)]
enum OutputFormat {
    Csv,
    Table,
    Json,
}

impl OutputFormat {
    fn from_str(value: &str) -> Result<Self, String> {
        match value {
            "csv" => Ok(Self::Csv),
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}'")),
        }
    }

    fn write(self, measurements: &[Measurement]) -> Result<(), String> {
        match self {
            OutputFormat::Csv => write_csv(measurements),
            OutputFormat::Table => write_table(measurements),
            OutputFormat::Json => write_json(measurements),
        }
    }
}

#[derive(Clone)]
struct Measurement {
    scenario: &'static str,
    size_desc: String,
    wall_s: f64,
    rss_delta_kib: u64,
    verification_status: VerificationStatus,
    verification_detail: Option<String>,
}

#[derive(Clone, Copy)]
enum VerificationStatus {
    NotChecked,
    Passed,
    Failed,
}

impl VerificationStatus {
    fn label(&self) -> &'static str {
        match self {
            VerificationStatus::NotChecked => "not_checked",
            VerificationStatus::Passed => "passed",
            VerificationStatus::Failed => "failed",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            VerificationStatus::Passed => "✓",
            VerificationStatus::Failed => "✗",
            VerificationStatus::NotChecked => "○",
        }
    }
}

/// Decode one utterance and compare it with the dense table when `check`.
///
/// Unpruned runs must match the table; pruned runs must not beat it.
fn decode_and_verify(
    graph: &Graph,
    scores: &ScoreMatrix,
    beam: BeamConfig,
    check: bool,
    result: &mut (f64, usize, usize),
) -> (VerificationStatus, Option<String>) {
    let decoded = DecoderBuilder::new(graph)
        .with_beam(beam)
        .build()
        .map_err(|err| err.to_string())
        .and_then(|mut decoder| {
            let out = decoder.decode(scores).map_err(|err| err.to_string())?;
            Ok((out, decoder.history().len()))
        });
    let (out, nodes) = match decoded {
        Ok(pair) => pair,
        Err(err) => return (VerificationStatus::Failed, Some(err)),
    };
    *result = (out.log_prob, out.words.len(), nodes);

    if !check {
        return (VerificationStatus::NotChecked, None);
    }
    let baseline = dense_baseline(graph, scores);
    let ok = if beam.is_enabled() {
        out.log_prob <= baseline + 1e-6
    } else {
        (out.log_prob - baseline).abs() <= 1e-6
    };
    if ok {
        (VerificationStatus::Passed, None)
    } else {
        (
            VerificationStatus::Failed,
            Some(format!(
                "baseline log_prob={baseline:.6}, got={:.6}",
                out.log_prob
            )),
        )
    }
}

fn run_vocabulary(
    options: &Options,
    sys: &mut System,
    scenario: &'static str,
    beam: BeamConfig,
) -> Vec<Measurement> {
    const WORDS: &[u32] = &[8, 32, 128, 512, 2048, 8192];
    const FRAMES: usize = 400;
    let total = WORDS.len();

    WORDS
        .iter()
        .enumerate()
        .map(|(idx, &words)| {
            eprint!("      [{}/{}] Testing words={}... ", idx + 1, total, words);
            let mut result = (0.0, 0, 0);
            let m = measure(scenario, format!("words={words},frames={}", FRAMES), sys, || {
                let graph = word_loop(words);
                let scores = deterministic_scores(FRAMES, graph.emission_columns(), words);
                let check = graph.state_count() <= options.verify_limit;
                decode_and_verify(&graph, &scores, beam, check, &mut result)
            });
            report(&m, result);
            m
        })
        .collect()
}

fn run_frames(options: &Options, sys: &mut System) -> Vec<Measurement> {
    const FRAMES: &[usize] = &[128, 512, 2048, 8192, 32768];
    const WORDS: u32 = 64;
    let graph = word_loop(WORDS);
    let beam = BeamConfig::new(10.0, 128);
    let total = FRAMES.len();

    FRAMES
        .iter()
        .enumerate()
        .map(|(idx, &frames)| {
            eprint!("      [{}/{}] Testing frames={}... ", idx + 1, total, frames);
            let mut result = (0.0, 0, 0);
            let m = measure("utterance_length", format!("words={},frames={frames}", WORDS), sys, || {
                let scores = deterministic_scores(frames, graph.emission_columns(), 7);
                let check = frames <= options.verify_limit;
                decode_and_verify(&graph, &scores, beam, check, &mut result)
            });
            report(&m, result);
            m
        })
        .collect()
}

fn report(m: &Measurement, (log_prob, words, nodes): (f64, usize, usize)) {
    eprintln!(
        "{} log_prob={:.3}, words={}, history_nodes={}, time={:.3}s, status={}",
        m.verification_status.icon(),
        log_prob,
        words,
        nodes,
        m.wall_s,
        m.verification_status.label()
    );
}

fn print_summary(measurements: &[Measurement], options: &Options) {
    eprintln!("{}", "=".repeat(80));
    eprintln!();

    let mut passed = 0;
    let mut failed = 0;
    let mut not_checked = 0;
    for m in measurements {
        match m.verification_status {
            VerificationStatus::Passed => passed += 1,
            VerificationStatus::Failed => failed += 1,
            VerificationStatus::NotChecked => not_checked += 1,
        }
    }

    let total = measurements.len().max(1);
    eprintln!("Verification Results:");
    eprintln!("  Total runs: {}", measurements.len());
    eprintln!("  ✓ Passed: {} ({:.1}%)", passed, 100.0 * passed as f64 / total as f64);
    eprintln!("  ✗ Failed: {} ({:.1}%)", failed, 100.0 * failed as f64 / total as f64);
    eprintln!(
        "  ○ Not checked (size > {}): {} ({:.1}%)",
        options.verify_limit,
        not_checked,
        100.0 * not_checked as f64 / total as f64
    );
    eprintln!();

    if failed > 0 {
        eprintln!("Failed Runs:");
        for m in measurements {
            if matches!(m.verification_status, VerificationStatus::Failed) {
                eprintln!("  ✗ {} ({})", m.scenario, m.size_desc);
                if let Some(ref detail) = m.verification_detail {
                    eprintln!("     Error: {}", detail);
                }
            }
        }
        eprintln!();
    }

    eprintln!("Performance Statistics by Scenario:");
    eprintln!();

    let mut order = Vec::new();
    let mut by_scenario: HashMap<&str, Vec<&Measurement>> = HashMap::new();
    for m in measurements {
        by_scenario
            .entry(m.scenario)
            .or_insert_with(|| {
                order.push(m.scenario);
                Vec::new()
            })
            .push(m);
    }

    for scenario in order {
        let ms = &by_scenario[scenario];
        let min_time = ms.iter().map(|m| m.wall_s).fold(f64::INFINITY, f64::min);
        let max_time = ms.iter().map(|m| m.wall_s).fold(0.0, f64::max);
        let avg_time = ms.iter().map(|m| m.wall_s).sum::<f64>() / ms.len() as f64;
        let max_mem = ms.iter().map(|m| m.rss_delta_kib).max().unwrap_or(0);

        eprintln!("  {}:", scenario);
        eprintln!("    Runs: {}", ms.len());
        eprintln!(
            "    Time: min={:.3}s, max={:.3}s, avg={:.3}s",
            min_time, max_time, avg_time
        );
        eprintln!("    Memory: max_delta={} KiB", max_mem);
        if let (Some(first), Some(last)) = (ms.first(), ms.last()) {
            if ms.len() >= 2 && first.wall_s > 0.0 {
                eprintln!(
                    "    Scaling: {:.1}x slower from smallest to largest",
                    last.wall_s / first.wall_s
                );
            }
        }
        eprintln!();
    }

    eprintln!("{}", "=".repeat(80));
    if failed == 0 {
        eprintln!("✓ All verified runs passed.");
    } else {
        eprintln!("✗ {} run(s) failed. Please review the errors above.", failed);
    }
    eprintln!();
    eprintln!("Interpretation:");
    eprintln!("  • Unpruned time grows with the vocabulary; beamed time should level off");
    eprintln!("  • With a rank beam, time per frame stays flat as utterances grow");
    eprintln!("  • history_nodes tracks word ends that survive pruning, not graph size");
    eprintln!("{}", "=".repeat(80));
    eprintln!();
}

fn measure<F>(
    scenario: &'static str,
    size_desc: String,
    sys: &mut System,
    compute: F,
) -> Measurement
where
    F: FnOnce() -> (VerificationStatus, Option<String>),
{
    let before = rss_kib(sys);
    let start = Instant::now();
    let (status, detail) = compute();
    let duration = start.elapsed();
    let after = rss_kib(sys);

    Measurement {
        scenario,
        size_desc,
        wall_s: duration.as_secs_f64(),
        rss_delta_kib: after.saturating_sub(before),
        verification_status: status,
        verification_detail: detail,
    }
}

fn write_csv(measurements: &[Measurement]) -> Result<(), String> {
    println!("scenario,size_desc,wall_s,rss_delta_kib,verification_status,verification_detail");
    for m in measurements {
        let detail = m
            .verification_detail
            .as_ref()
            .map(|s| s.replace('"', "'"))
            .unwrap_or_default();
        println!(
            "{},\"{}\",{:.3},{},{},\"{}\"",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.verification_status.label(),
            detail
        );
    }
    Ok(())
}

fn write_table(measurements: &[Measurement]) -> Result<(), String> {
    let col1 = measurements
        .iter()
        .map(|m| m.scenario.len())
        .fold("scenario".len(), usize::max);
    let col2 = measurements
        .iter()
        .map(|m| m.size_desc.len())
        .fold("size".len(), usize::max);

    println!(
        "{:<col1$}  {:<col2$}  {:>10}  {:>14}  {:>12}  detail",
        "scenario", "size", "wall_s", "rss_delta_kib", "status",
    );
    println!(
        "{:-<col1$}  {:-<col2$}  {:-<10}  {:-<14}  {:-<12}  {:-<12}",
        "", "", "", "", "", "",
    );
    for m in measurements {
        println!(
            "{:<col1$}  {:<col2$}  {:>10.3}  {:>14}  {:>12}  {}",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.verification_status.label(),
            m.verification_detail.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

fn write_json(measurements: &[Measurement]) -> Result<(), String> {
    println!("[");
    for (idx, m) in measurements.iter().enumerate() {
        let detail = m.verification_detail.as_ref().map(|s| s.replace('"', "'"));
        println!(
            "  {{\"scenario\":\"{}\",\"size\":\"{}\",\"wall_s\":{:.3},\"rss_delta_kib\":{},\"verification\":{{\"status\":\"{}\",\"detail\":{}}}}}{}",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.verification_status.label(),
            match detail {
                Some(ref d) => format!("\"{d}\""),
                None => "null".to_string(),
            },
            if idx + 1 == measurements.len() { "" } else { "," }
        );
    }
    println!("]");
    Ok(())
}

fn rss_kib(sys: &mut System) -> u64 {
    sys.refresh_processes_specifics(ProcessRefreshKind::new());
    if let Some(process) = get_current_pid().ok().and_then(|pid| sys.process(pid)) {
        process.memory()
    } else {
        0
    }
}

/// Word loop over `words` three-phone words: hub 0 fans out to every word,
/// words end in a shared state that loops back and is final.
fn word_loop(words: u32) -> Graph {
    let end = 1 + words * PHONES;
    let mut g = Graph::new(end as usize + 1).expect("word loop has states");
    let enter = -(words as f64).ln();
    let stay = 0.6f64.ln();
    let leave = 0.4f64.ln();
    for w in 0..words {
        let first = 1 + w * PHONES;
        let arcs = (0..PHONES).flat_map(|p| {
            let s = first + p;
            let exit = if p + 1 < PHONES {
                Transition::emitting(s + 1, leave).with_class(s - 1)
            } else {
                Transition::epsilon(end, leave).with_word(w)
            };
            [
                (s, Transition::emitting(s, stay).with_class(s - 1)),
                (s, exit),
            ]
        });
        let entries = [
            (0, Transition::epsilon(first, enter)),
            (end, Transition::emitting(first, enter).with_class(first - 1)),
        ];
        for (src, arc) in entries.into_iter().chain(arcs) {
            g.add_arc(src, arc).expect("word loop arcs are well formed");
        }
    }
    g.set_final(end, 0.0).expect("end state exists");
    g
}

/// Scores in `[-8, 0)` from a splitmix-style hash of `(t, column, salt)`.
fn deterministic_scores(frames: usize, columns: usize, salt: u32) -> ScoreMatrix {
    let mut m = ScoreMatrix::filled(frames, columns.max(1), 0.0);
    for t in 0..frames {
        for (c, v) in m.frame_mut(t).iter_mut().enumerate() {
            let mut x = (t as u64) << 32 ^ (c as u64) << 8 ^ u64::from(salt);
            x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
            x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            x ^= x >> 31;
            *v = -8.0 * (x >> 11) as f64 / (1u64 << 53) as f64;
        }
    }
    m
}

/// Dense frame-by-state Viterbi, relaxing every arc of every state.
fn dense_baseline(graph: &Graph, scores: &ScoreMatrix) -> f64 {
    let n = graph.state_count();
    let close = |delta: &mut Vec<f64>| {
        for s in 0..n {
            if delta[s] == f64::NEG_INFINITY {
                continue;
            }
            for arc in graph.arcs(s as u32) {
                if arc.emission.is_epsilon() {
                    let cand = delta[s] + arc.log_prob;
                    let d = &mut delta[arc.dst as usize];
                    *d = d.max(cand);
                }
            }
        }
    };
    let mut delta = vec![f64::NEG_INFINITY; n];
    delta[graph.start_state() as usize] = 0.0;
    for t in 0..scores.num_frames() {
        close(&mut delta);
        let frame = scores.frame(t);
        let mut next = vec![f64::NEG_INFINITY; n];
        for s in 0..n {
            if delta[s] == f64::NEG_INFINITY {
                continue;
            }
            for arc in graph.arcs(s as u32) {
                let column = match arc.emission {
                    Emission::Epsilon => continue,
                    Emission::Source => s,
                    Emission::Class(c) => c as usize,
                };
                let cand = delta[s] + frame[column] + arc.log_prob;
                let d = &mut next[arc.dst as usize];
                *d = d.max(cand);
            }
        }
        delta = next;
    }
    close(&mut delta);
    graph
        .final_states()
        .iter()
        .map(|&(s, w)| delta[s as usize] + w)
        .fold(f64::NEG_INFINITY, f64::max)
}
