//! Example: decoding a tiny two-word loop.
//!
//! Run with:
//! `cargo run --example decode`

use beam_viterbi::{DecoderBuilder, Graph, ScoreMatrix, Transition};

fn main() {
    // Words "yes" (0) and "no" (1), one phone each:
    //
    //   0 -eps-> 1 (yes) -eps:yes-> 3 (end, final)
    //   0 -eps-> 2 (no)  -eps:no--> 3
    //   3 loops back into both words.
    //
    // Score columns: 0 = "yes" phone, 1 = "no" phone.
    let mut graph = Graph::new(4).unwrap();
    graph
        .add_arc(0, Transition::epsilon(1, 0.5f64.ln()))
        .unwrap()
        .add_arc(0, Transition::epsilon(2, 0.5f64.ln()))
        .unwrap()
        .add_arc(1, Transition::emitting(1, 0.8f64.ln()).with_class(0))
        .unwrap()
        .add_arc(2, Transition::emitting(2, 0.8f64.ln()).with_class(1))
        .unwrap()
        .add_arc(1, Transition::epsilon(3, 0.2f64.ln()).with_word(0))
        .unwrap()
        .add_arc(2, Transition::epsilon(3, 0.2f64.ln()).with_word(1))
        .unwrap()
        .add_arc(3, Transition::emitting(1, 0.5f64.ln()).with_class(0))
        .unwrap()
        .add_arc(3, Transition::emitting(2, 0.5f64.ln()).with_class(1))
        .unwrap()
        .set_final(3, 0.0)
        .unwrap();

    // Three frames that sound like "yes", then three like "no".
    let scores = ScoreMatrix::from_rows(&[
        vec![-0.1, -3.0],
        vec![-0.2, -2.5],
        vec![-0.1, -3.0],
        vec![-3.0, -0.1],
        vec![-2.0, -0.3],
        vec![-3.0, -0.2],
    ]);

    let mut decoder = DecoderBuilder::new(graph)
        .with_log_prob_beam(10.0)
        .with_rank_beam(8)
        .build()
        .unwrap();

    match decoder.decode(&scores) {
        Ok(out) => {
            let names = ["yes", "no"];
            let words: Vec<&str> = out.words.iter().map(|&w| names[w as usize]).collect();
            println!("Best word sequence: {}", words.join(" "));
            println!("Log-probability: {:.4}", out.log_prob);
            println!("History nodes: {}", decoder.history().len());
        }
        Err(err) => println!("Decoding failed: {err}"),
    }
}
