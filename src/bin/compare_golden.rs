use anyhow::{Context, Result};
use clap::Parser;
use posehead::blob::{read_f32_txt, read_i16_txt};
use posehead::golden::{compare, padding_is_zero, quantize_golden};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "posehead-compare", about = "Compare head output text against a golden Q15 stream")]
struct Args {
    /// Produced output, one value per line
    #[arg(long)]
    produced: PathBuf,

    /// Golden Q15 stream
    #[arg(long)]
    golden: PathBuf,

    /// The golden file holds real values; quantize them to Q15 before comparing
    #[arg(long, default_value_t = false)]
    float_golden: bool,

    /// Number of real (unpadded) outputs; defaults to the golden length
    #[arg(long)]
    real_len: Option<usize>,

    /// Largest absolute difference still counted as a match
    #[arg(long, default_value_t = 0)]
    tolerance: i32,
}

fn main() -> Result<()> {
    env_logger::init();
    let a = Args::parse();
    let produced = read_i16_txt(&a.produced).with_context(|| format!("read {}", a.produced.display()))?;
    let golden = if a.float_golden {
        quantize_golden(&read_f32_txt(&a.golden).with_context(|| format!("read {}", a.golden.display()))?)
    } else {
        read_i16_txt(&a.golden).with_context(|| format!("read {}", a.golden.display()))?
    };
    let real_len = a.real_len.unwrap_or(golden.len());
    let cmp = compare(&produced, &golden, real_len, a.tolerance);
    let pad_ok = padding_is_zero(&produced, real_len);
    println!("compared={} max_abs={} mean_abs={:.3} mismatches={} length_mismatch={} padding_zero={}",
        cmp.compared, cmp.max_abs, cmp.mean_abs, cmp.mismatches, cmp.length_mismatch, pad_ok);
    if !cmp.passed() || !pad_ok {
        println!("FAIL");
        std::process::exit(1);
    }
    println!("PASS");
    Ok(())
}
