//! Converts a MovieLens 100k download into the `movies.csv` and `ratings.csv`
//! tables the server loads.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use movie_recs::services::convert::convert_dataset;

/// MovieLens 100k converter
#[derive(Parser, Debug)]
#[command(name = "convert_movielens")]
#[command(author, version, about = "Convert MovieLens 100k files to CSV", long_about = None)]
struct Cli {
    /// Directory holding u.item, u.genre and u.data
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Directory the CSV files are written to
    #[arg(short, long, default_value = "data", env = "DATA_DIR")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let summary = convert_dataset(&cli.input_dir, &cli.out_dir)?;

    println!(
        "Wrote {} movies to {}",
        summary.movies,
        summary.movies_path.display()
    );
    println!(
        "Wrote {} ratings to {}",
        summary.ratings,
        summary.ratings_path.display()
    );

    Ok(())
}
