//! Persistent homology of IllustrisTNG subhalos
//!
//! ## Usage
//!
//! ```bash
//! # Point-cloud preprocessing: download (once), filter, crop, normalise
//! halo_persistence -a PP -d TNG50-1-Dark -s 99 -c 12 -m 1.0
//!
//! # Cubical persistence of data/<dataset>/snap_0<s>/preprocessed/densities_C<c>.txt
//! halo_persistence -a CCPH -d TNG50-1-Dark -s 99 -c 12
//! ```
//!
//! The archive API key is read from `--api-key` or `TNG_API_KEY`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use subhalo_persistence::{
    Algorithm, ArchiveClient, ArchiveConfig, CropPercent, CubicalStage, Dataset, FilterConfig,
    PreprocessStage, Snapshot, SnapshotKey,
};
use subhalo_persistence::config::{API_KEY_ENV, DEFAULT_HOST};

#[derive(Parser, Debug)]
#[command(name = "halo_persistence")]
#[command(about = "Run persistent homology analysis for IllustrisTNG subhalo catalogs")]
struct Args {
    /// Workflow: "PP" (point-cloud preprocessing) or "CCPH" (cubical persistence)
    #[arg(short, long)]
    algorithm: Algorithm,

    /// TNG simulation, e.g. TNG50-1-Dark
    #[arg(short, long)]
    dataset: Dataset,

    /// Snapshot index (0 to 99)
    #[arg(short, long)]
    snapshot: Snapshot,

    /// Minimum subhalo mass kept (10^10 M_sun/h)
    #[arg(short, long, default_value_t = 0.0)]
    masses: f64,

    /// Percent of the largest extent kept around the median position (1 to 100)
    #[arg(short, long)]
    crop: CropPercent,

    /// Root of the on-disk cache
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// TNG archive API key
    #[arg(long, env = API_KEY_ENV, default_value = "", hide_env_values = true)]
    api_key: String,

    /// Archive host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Also compute Rips persistence of the normalised cloud up to this scale (PP only)
    #[arg(long)]
    rips_epsilon: Option<f64>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();

    let key = SnapshotKey::new(&args.data_dir, args.dataset, args.snapshot);
    log::info!(
        "{} on {} snapshot {} (crop {}%, data in {})",
        args.algorithm,
        args.dataset,
        args.snapshot,
        args.crop,
        args.data_dir.display()
    );

    match args.algorithm {
        Algorithm::Pp => run_point_cloud(&args, key),
        Algorithm::Ccph => run_cubical(&args, key),
    }
}

fn run_point_cloud(args: &Args, key: SnapshotKey) -> Result<()> {
    let filter = FilterConfig::new(args.masses, args.crop, true).context("invalid mass threshold")?;
    let client = ArchiveClient::new(ArchiveConfig::new(&args.host, &args.api_key))
        .context("failed to set up archive client")?;

    let stage = PreprocessStage::new(key, filter)
        .with_rips_epsilon(args.rips_epsilon)
        .with_progress(!args.no_progress);
    let out = stage.run(&client).context("point-cloud preprocessing failed")?;

    println!("{} subhalos in crop", out.n_points);
    println!("  normalised:   {}", out.normalized_path.display());
    println!("  unnormalised: {}", out.unnormalized_path.display());
    for path in &out.rips_paths {
        println!("  rips:         {}", path.display());
    }
    Ok(())
}

fn run_cubical(args: &Args, key: SnapshotKey) -> Result<()> {
    if args.rips_epsilon.is_some() {
        log::warn!("--rips-epsilon only applies to PP; ignored");
    }

    let stage = CubicalStage::new(key, args.crop).with_progress(!args.no_progress);
    let out = stage.run().context("cubical persistence failed")?;

    println!("density grid {0}x{0}x{0}", out.grid_size);
    for (dim, path) in out.diagram_paths.iter().enumerate() {
        println!(
            "  H{dim}: {:>6} finite, {} essential -> {}",
            out.diagram.finite_intervals(dim).len(),
            out.diagram.essential_count(dim),
            path.display()
        );
    }
    Ok(())
}
