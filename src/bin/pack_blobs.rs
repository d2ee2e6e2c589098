use anyhow::{Context, Result};
use clap::Parser;
use posehead::blob::{pack_fc, read_i16_txt, write_i16_bin, write_lane_txt};
use posehead::head::HeadTable;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "posehead-pack", about = "Pack text weight/bias/feature streams into Q15 memory blobs")]
struct Args {
    /// Directory holding the *_stream.txt inputs; outputs are written next to them
    #[arg(long, default_value = "weights/streams")]
    stream_dir: PathBuf,

    /// JSON head table (defaults to built-in pose3d/world/flag)
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Do not check the inferred out_ch against the head table
    #[arg(long, default_value_t = false)]
    infer_out_ch: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let a = Args::parse();
    let table = match &a.manifest {
        Some(p) => HeadTable::load(p).with_context(|| format!("load manifest: {}", p.display()))?,
        None => HeadTable::default(),
    };
    let dir = &a.stream_dir;

    let in_path = dir.join("posehead_input_stream.txt");
    let x = read_i16_txt(&in_path).with_context(|| format!("read {}", in_path.display()))?;
    eprintln!("input stream: {} values", x.len());
    if x.len() != table.feature_dim() {
        anyhow::bail!("input stream has {} values, heads expect {}", x.len(), table.feature_dim());
    }
    write_i16_bin(dir.join("posehead_input_q15.bin"), &x)?;

    for h in &table.heads {
        let w_path = dir.join(format!("{}_head_weights_stream.txt", h.name));
        let b_path = dir.join(format!("{}_head_bias_stream.txt", h.name));
        let w = read_i16_txt(&w_path).with_context(|| format!("read {}", w_path.display()))?;
        let b = read_i16_txt(&b_path).with_context(|| format!("read {}", b_path.display()))?;
        let expected = if a.infer_out_ch { None } else { Some(h.config.out_ch) };
        let (fc, out_ch) = pack_fc(&w, &b, h.config.in_ch, expected).with_context(|| format!("pack {} head", h.name))?;
        write_i16_bin(dir.join(format!("{}_fc_q15.bin", h.name)), &fc)?;
        write_lane_txt(dir.join(format!("{}_w.txt", h.name)), &fc)?;
        write_lane_txt(dir.join(format!("{}_feat.txt", h.name)), &x)?;
        eprintln!("{}: in_ch={} out_ch={} -> {} packed values", h.name, h.config.in_ch, out_ch, fc.len());
    }
    eprintln!("blobs written to {}", dir.display());
    Ok(())
}
