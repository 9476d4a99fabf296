//! Synthetic density field for the CCPH workflow
//!
//! Writes a sum of random Gaussian halos as `i j k value` rows to
//! `<data-dir>/<dataset>/snap_0<s>/preprocessed/densities_C<c>.txt`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use subhalo_persistence::{CropPercent, Dataset, DensityField, Snapshot, SnapshotKey};

#[derive(Parser, Debug)]
#[command(name = "synth_density")]
#[command(about = "Write a synthetic Gaussian-halo density field")]
struct Args {
    #[arg(short, long)]
    dataset: Dataset,

    #[arg(short, long)]
    snapshot: Snapshot,

    #[arg(short, long)]
    crop: CropPercent,

    /// Voxels per axis
    #[arg(short, long, default_value_t = 32)]
    grid: usize,

    /// Number of halos
    #[arg(long, default_value_t = 20)]
    halos: usize,

    /// Halo width in box units
    #[arg(long, default_value_t = 0.05)]
    width: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
    let args = Args::parse();

    let key = SnapshotKey::new(&args.data_dir, args.dataset, args.snapshot);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let field = DensityField::gaussian_halos(args.grid, args.halos, args.width, &mut rng)
        .context("invalid halo parameters")?;

    let dir = key.preprocessed_dir();
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = key.densities_path(args.crop);
    field.save(&path).context("writing density field")?;

    log::info!(
        "{} halos on a {}^3 grid -> {}",
        args.halos,
        args.grid,
        path.display()
    );
    Ok(())
}
