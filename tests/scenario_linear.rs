use beam_viterbi::{
    BeamConfig, DecodeError, DecoderBuilder, DecoderConfig, FrameChart, Graph, Pruner, Transition,
    ViterbiDecoder, ViterbiStepper, WordHistoryTree,
};

fn three_state_linear() -> Graph {
    let mut g = Graph::new(3).unwrap();
    g.add_arc(0, Transition::emitting(1, 0.5f64.ln()).with_word(5))
        .unwrap()
        .add_arc(1, Transition::emitting(2, 0.5f64.ln()).with_word(7))
        .unwrap()
        .set_final(2, 0.0)
        .unwrap();
    g
}

#[test]
fn linear_graph_two_frames() {
    let scores = vec![vec![0.0, -1.0, -100.0], vec![-100.0, 0.0, -1.0]];
    let mut decoder = ViterbiDecoder::new(three_state_linear(), DecoderConfig::default()).unwrap();
    let out = decoder.decode(&scores).unwrap();
    assert_eq!(out.words, vec![5, 7]);
    let expected = 0.5f64.ln() + 0.0 + 0.5f64.ln() + 0.0;
    assert!((out.log_prob - expected).abs() < 1e-12);
    assert!((out.log_prob - -1.386).abs() < 1e-3);
}

#[test]
fn linear_graph_is_deterministic() {
    let scores = vec![vec![0.0, -1.0, -100.0], vec![-100.0, 0.0, -1.0]];
    let first = ViterbiDecoder::new(three_state_linear(), DecoderConfig::default())
        .unwrap()
        .decode(&scores)
        .unwrap();
    for _ in 0..5 {
        let again = ViterbiDecoder::new(three_state_linear(), DecoderConfig::default())
            .unwrap()
            .decode(&scores)
            .unwrap();
        assert_eq!(first, again);
        assert_eq!(first.log_prob.to_bits(), again.log_prob.to_bits());
    }
}

/// 0 -> 1 (p=0.6) and 0 -> 2 (p=0.4) in the same frame, both continuing to 3.
fn competing_paths() -> Graph {
    let mut g = Graph::new(4).unwrap();
    g.add_arc(0, Transition::emitting(1, 0.6f64.ln()).with_word(1))
        .unwrap()
        .add_arc(0, Transition::emitting(2, 0.4f64.ln()).with_word(2))
        .unwrap()
        .add_arc(1, Transition::emitting(3, 0.0))
        .unwrap()
        .add_arc(2, Transition::emitting(3, 0.0))
        .unwrap()
        .set_final(3, 0.0)
        .unwrap();
    g
}

#[test]
fn rank_beam_of_one_drops_weaker_path() {
    let g = competing_paths();
    let mut tree = WordHistoryTree::new();
    let mut cur = FrameChart::new(4);
    let mut next = FrameChart::new(4);
    cur.insert_or_get(0).assign(0.0, tree.root());

    let stats = ViterbiStepper::new(&g, 1.0)
        .step(
            0,
            &[0.0; 4],
            &mut cur,
            &mut next,
            &mut tree,
            &mut Pruner::new(),
            &BeamConfig::new(0.0, 1),
        )
        .unwrap();
    assert_eq!(stats.before, 2);
    assert_eq!(stats.after, 1);
    assert!(next.has_cell(1));
    assert!(!next.has_cell(2));

    let mut decoder = DecoderBuilder::new(g).with_rank_beam(1).build().unwrap();
    let out = decoder.decode(&vec![vec![0.0; 4]; 2]).unwrap();
    assert_eq!(out.words, vec![1]);
}

#[test]
fn acoustic_weight_scales_only_acoustics() {
    let scores = vec![vec![-2.0, -1.0, -100.0], vec![-100.0, -4.0, -1.0]];
    let mut decoder = DecoderBuilder::new(three_state_linear())
        .with_acoustic_weight(0.5)
        .build()
        .unwrap();
    let out = decoder.decode(&scores).unwrap();
    let expected = 0.5f64.ln() + 0.5 * -2.0 + 0.5f64.ln() + 0.5 * -4.0;
    assert!((out.log_prob - expected).abs() < 1e-12);
}

#[test]
fn all_cells_below_sentinel_fail_the_frame() {
    let scores = vec![vec![0.0, -1.0, -100.0], vec![f64::NEG_INFINITY; 3]];
    let mut decoder = ViterbiDecoder::new(three_state_linear(), DecoderConfig::default()).unwrap();
    assert_eq!(
        decoder.decode(&scores).unwrap_err(),
        DecodeError::SearchFailed { frame: 1 }
    );
}
