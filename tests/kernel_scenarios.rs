use posehead::error::HeadError;
use posehead::head::{forward, HeadConfig, HeadKernel, Phase};
use posehead::stream::{channel, ChannelReader};
use pretty_assertions::assert_eq;
use std::time::Duration;

const T: Duration = Duration::from_millis(100);

struct Run {
    out: Vec<i16>,
    features_left: usize,
    weights_left: usize,
    weights_read: u64,
}

fn drain(rx: &mut ChannelReader<i16>) -> Vec<i16> {
    let mut v = Vec::new();
    while rx.available() > 0 { v.push(rx.read().unwrap()); }
    v
}

// Single-threaded: channels are deep enough to hold the whole invocation.
fn run_kernel(cfg: HeadConfig, feats: &[i16], weights: &[i16]) -> Run {
    let depth = 1 + feats.len().max(weights.len()).max(cfg.out_ch_pad);
    let (mut ftx, mut frx) = channel::<i16>("feat", depth, T).unwrap();
    let (mut wtx, mut wrx) = channel::<i16>("w", depth, T).unwrap();
    let (mut otx, mut orx) = channel::<i16>("out", depth, T).unwrap();
    for &f in feats { ftx.write(f).unwrap(); }
    for &w in weights { wtx.write(w).unwrap(); }
    let mut k = HeadKernel::new(cfg).unwrap();
    let stats = k.run(&mut frx, &mut wrx, &mut otx).unwrap();
    assert_eq!(k.phase(), Phase::Done);
    Run { out: drain(&mut orx), features_left: frx.available(), weights_left: wrx.available(), weights_read: stats.weights_read }
}

#[test]
fn known_vector() {
    let cfg = HeadConfig { in_ch: 2, out_ch: 1, out_ch_pad: 2, shift: 0 };
    let r = run_kernel(cfg, &[10, 20], &[100, 2, 3]);
    assert_eq!(r.out, vec![180, 0]);
    assert_eq!(r.weights_read, 3);
}

#[test]
fn saturating_vector() {
    let cfg = HeadConfig { in_ch: 2, out_ch: 1, out_ch_pad: 2, shift: 0 };
    let r = run_kernel(cfg, &[2, 2], &[0, 30000, 30000]);
    assert_eq!(r.out, vec![32767, 0]);
}

#[test]
fn zero_width_head_passes_biases_through() {
    let cfg = HeadConfig { in_ch: 0, out_ch: 3, out_ch_pad: 3, shift: 0 };
    let r = run_kernel(cfg, &[], &[5, -7, 32767]);
    assert_eq!(r.out, vec![5, -7, 32767]);

    let cfg = HeadConfig { in_ch: 0, out_ch: 3, out_ch_pad: 3, shift: 2 };
    let r = run_kernel(cfg, &[], &[5, -7, 32767]);
    assert_eq!(r.out, vec![1, -2, 8191]);
}

#[test]
fn padding_invariant_and_exact_consumption() {
    // Trailing sentinel values must survive: the kernel consumes exactly
    // in_ch features and out_ch * (1 + in_ch) weights, whatever the padding.
    for (out_ch, out_ch_pad) in [(3usize, 3usize), (3, 8), (1, 8), (0, 4)] {
        let cfg = HeadConfig { in_ch: 4, out_ch, out_ch_pad, shift: 3 };
        let feats = [100i16, -200, 300, -400, 7777];
        let mut weights: Vec<i16> = (0..cfg.weight_len()).map(|i| (i as i16 % 11) - 5).collect();
        weights.extend_from_slice(&[1111, 2222]);
        let r = run_kernel(cfg, &feats, &weights);
        assert_eq!(r.out.len(), out_ch_pad);
        assert!(r.out[out_ch..].iter().all(|&v| v == 0), "padding must be zero");
        assert_eq!(r.out, forward(&cfg, &feats, &weights).unwrap());
        assert_eq!(r.features_left, 1);
        assert_eq!(r.weights_left, 2);
        assert_eq!(r.weights_read as usize, cfg.weight_len());
    }
}

#[test]
fn negative_accumulator_shift_is_arithmetic() {
    let cfg = HeadConfig { in_ch: 1, out_ch: 2, out_ch_pad: 2, shift: 15 };
    // -32768 * 32767 >> 15 = -32767 ; bias -1 >> 15 = -1
    let r = run_kernel(cfg, &[-32768], &[0, 32767, -1, 0]);
    assert_eq!(r.out, vec![-32767, -1]);
}

#[test]
fn missing_weights_time_out_instead_of_hanging() {
    let cfg = HeadConfig { in_ch: 2, out_ch: 2, out_ch_pad: 4, shift: 0 };
    let (mut ftx, mut frx) = channel::<i16>("feat", 8, T).unwrap();
    let (mut wtx, mut wrx) = channel::<i16>("w", 8, Duration::from_millis(30)).unwrap();
    let (mut otx, _orx) = channel::<i16>("out", 8, T).unwrap();
    ftx.write(1).unwrap();
    ftx.write(1).unwrap();
    for w in [1, 1, 1, 9] { wtx.write(w).unwrap(); }
    let mut k = HeadKernel::new(cfg).unwrap();
    match k.run(&mut frx, &mut wrx, &mut otx) {
        Err(HeadError::Starved { channel, after, .. }) => {
            assert_eq!(channel, "w");
            assert_eq!(after, 4);
        }
        other => panic!("expected Starved, got {:?}", other),
    }
    assert_eq!(k.phase(), Phase::Compute { oc: 1 });
    assert_eq!(otx.produced(), 1);
}

#[test]
fn closed_feature_channel_is_reported() {
    let cfg = HeadConfig { in_ch: 3, out_ch: 1, out_ch_pad: 1, shift: 0 };
    let (mut ftx, mut frx) = channel::<i16>("feat", 8, T).unwrap();
    let (_wtx, mut wrx) = channel::<i16>("w", 8, T).unwrap();
    let (mut otx, _orx) = channel::<i16>("out", 8, T).unwrap();
    ftx.write(1).unwrap();
    drop(ftx);
    let mut k = HeadKernel::new(cfg).unwrap();
    assert!(matches!(k.run(&mut frx, &mut wrx, &mut otx), Err(HeadError::ProducerGone { after: 1, .. })));
    assert_eq!(k.phase(), Phase::Load);
}

#[test]
fn invalid_geometry_rejected() {
    let cfg = HeadConfig { in_ch: 2, out_ch: 4, out_ch_pad: 3, shift: 0 };
    assert!(matches!(HeadKernel::new(cfg), Err(HeadError::InvalidConfig(_))));
    let cfg = HeadConfig { in_ch: 2, out_ch: 1, out_ch_pad: 1, shift: 64 };
    assert!(matches!(HeadKernel::new(cfg), Err(HeadError::InvalidConfig(_))));
}

#[test]
fn kernel_is_reusable_across_invocations() {
    let cfg = HeadConfig { in_ch: 2, out_ch: 1, out_ch_pad: 2, shift: 0 };
    let (mut ftx, mut frx) = channel::<i16>("feat", 8, T).unwrap();
    let (mut wtx, mut wrx) = channel::<i16>("w", 8, T).unwrap();
    let (mut otx, mut orx) = channel::<i16>("out", 8, T).unwrap();
    let mut k = HeadKernel::new(cfg).unwrap();
    for (feats, expect) in [([10i16, 20i16], 180i16), ([1, 1], 105)] {
        for f in feats { ftx.write(f).unwrap(); }
        for w in [100, 2, 3] { wtx.write(w).unwrap(); }
        k.run(&mut frx, &mut wrx, &mut otx).unwrap();
        assert_eq!(drain(&mut orx), vec![expect, 0]);
    }
}

#[test]
fn starved_row_resumes_without_losing_weights() {
    let cfg = HeadConfig { in_ch: 2, out_ch: 2, out_ch_pad: 2, shift: 0 };
    let (mut ftx, mut frx) = channel::<i16>("feat", 8, T).unwrap();
    let (mut wtx, mut wrx) = channel::<i16>("w", 8, Duration::from_millis(20)).unwrap();
    let (mut otx, mut orx) = channel::<i16>("out", 8, T).unwrap();
    let mut k = HeadKernel::new(cfg).unwrap();
    k.reset();
    for f in [1, 1] { ftx.write(f).unwrap(); }
    assert_eq!(k.step(&mut frx, &mut wrx, &mut otx).unwrap(), Phase::Compute { oc: 0 });

    // Row 0 is [100, 1, 1] but only two values have arrived.
    for w in [100, 1] { wtx.write(w).unwrap(); }
    assert!(matches!(k.step(&mut frx, &mut wrx, &mut otx), Err(HeadError::Starved { after: 2, .. })));
    assert_eq!(k.phase(), Phase::Compute { oc: 0 });
    assert_eq!(otx.produced(), 0);

    for w in [1, 10, 1, 1] { wtx.write(w).unwrap(); }
    while k.phase() != Phase::Done {
        k.step(&mut frx, &mut wrx, &mut otx).unwrap();
    }
    assert_eq!(drain(&mut orx), vec![102, 12]);
    assert_eq!(wrx.available(), 0);
}

#[test]
fn starved_load_resumes_into_the_same_buffer() {
    let cfg = HeadConfig { in_ch: 3, out_ch: 1, out_ch_pad: 1, shift: 0 };
    let (mut ftx, mut frx) = channel::<i16>("feat", 8, Duration::from_millis(20)).unwrap();
    let (mut wtx, mut wrx) = channel::<i16>("w", 8, T).unwrap();
    let (mut otx, mut orx) = channel::<i16>("out", 8, T).unwrap();
    let mut k = HeadKernel::new(cfg).unwrap();
    k.reset();
    ftx.write(2).unwrap();
    assert!(matches!(k.step(&mut frx, &mut wrx, &mut otx), Err(HeadError::Starved { after: 1, .. })));
    assert_eq!(k.phase(), Phase::Load);

    // More features than the head needs: the extra one must stay queued.
    for f in [3, 4, 99] { ftx.write(f).unwrap(); }
    for w in [1, 1, 1, 1] { wtx.write(w).unwrap(); }
    while k.phase() != Phase::Done {
        k.step(&mut frx, &mut wrx, &mut otx).unwrap();
    }
    assert_eq!(drain(&mut orx), vec![10]);
    assert_eq!(frx.available(), 1);
}
