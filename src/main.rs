use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use posehead::blob::{load_i16_bin, write_i16_txt};
use posehead::golden::compare;
use posehead::head::{forward, HeadTable};
use posehead::overlay::{jobs_for, run_heads, OverlayParams};
use posehead::synth::Synth;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "posehead", version, about = "Run the pose3d/world/flag Q15 heads over stream movers")]
struct Args {
    /// Directory holding posehead_input_q15.bin and <head>_fc_q15.bin
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Where <head>_out.txt files are written (defaults to data dir)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// JSON head table overriding the built-in pose3d/world/flag geometry
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Generate random features and weights from this seed instead of reading blobs
    #[arg(long)]
    synthetic: Option<u64>,

    /// Channel depth in values (env POSEHEAD_CHANNEL_DEPTH)
    #[arg(long)]
    channel_depth: Option<usize>,

    /// Read timeout in milliseconds (env POSEHEAD_READ_TIMEOUT_MS)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Run heads one after another instead of in parallel
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Cross-check every head against direct in-memory evaluation
    #[arg(long, default_value_t = false)]
    verify: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let table = match &args.manifest {
        Some(p) => HeadTable::load(p).with_context(|| format!("load manifest: {}", p.display()))?,
        None => HeadTable::default(),
    };
    let mut params = OverlayParams::from_env();
    if let Some(d) = args.channel_depth { params.depth = d; }
    if let Some(ms) = args.timeout_ms { params.timeout = Duration::from_millis(ms); }
    params.parallel = !args.sequential;

    let feat_dim = table.feature_dim();
    let (features, weights): (Vec<i16>, Vec<(String, Vec<i16>)>) = if let Some(seed) = args.synthetic {
        info!("generating synthetic inputs (seed={})", seed);
        let mut syn = Synth::new(seed);
        let features = syn.features(feat_dim);
        let weights = table.heads.iter().map(|h| (h.name.clone(), syn.weights(&h.config, 64))).collect();
        (features, weights)
    } else {
        let feat_path = args.data_dir.join("posehead_input_q15.bin");
        let features = load_i16_bin(&feat_path, feat_dim)
            .with_context(|| format!("load features: {}", feat_path.display()))?;
        let mut weights = Vec::with_capacity(table.heads.len());
        for h in &table.heads {
            let p = args.data_dir.join(format!("{}_fc_q15.bin", h.name));
            let w = load_i16_bin(&p, h.config.weight_len())
                .with_context(|| format!("load {} weights: {}", h.name, p.display()))?;
            weights.push((h.name.clone(), w));
        }
        (features, weights)
    };

    let jobs = jobs_for(&table, &weights)?;
    let t0 = Instant::now();
    let outputs = run_heads(&jobs, &features, &params).context("run heads")?;
    let dt = t0.elapsed();

    let out_dir = args.out_dir.clone().unwrap_or_else(|| args.data_dir.clone());
    std::fs::create_dir_all(&out_dir).with_context(|| format!("create {}", out_dir.display()))?;
    let mut failed = false;
    for (job, out) in jobs.iter().zip(&outputs) {
        let path = out_dir.join(format!("{}_out.txt", out.name));
        write_i16_txt(&path, &out.values).with_context(|| format!("write {}", path.display()))?;
        print!("head={} outputs={} real={} saturated={} elapsed={:.3}ms -> {}",
            out.name, out.values.len(), job.config.out_ch, out.stats.saturated,
            out.elapsed.as_secs_f64() * 1000.0, path.display());
        if args.verify {
            let expect = forward(&job.config, &features, job.weights)?;
            let cmp = compare(&out.values, &expect, expect.len(), 0);
            print!(" verify={}", if cmp.passed() { "ok" } else { "MISMATCH" });
            failed |= !cmp.passed();
        }
        println!();
    }
    println!("summary: heads={} elapsed={:.3}s parallel={} depth={}", outputs.len(), dt.as_secs_f64(), params.parallel, params.depth);
    if failed {
        eprintln!("verification failed");
        std::process::exit(1);
    }
    Ok(())
}
