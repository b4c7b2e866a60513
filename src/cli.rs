//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Dengue Viewer - surveillance dashboard for dengue cases in Peru
///
/// Opens the dashboard on a case file with the columns ano, semana,
/// departamento, provincia, distrito, sexo and tipo_edad.
///
/// Examples:
///   dengue-viewer
///   dengue-viewer data/datos_dengue.csv
///   dengue-viewer cases.parquet --config dengue-viewer.toml --seed 7
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Case file to open at startup (.csv, .parquet or .json)
    #[arg(value_name = "FILE", default_value = "datos_dengue.csv")]
    pub data: PathBuf,

    /// Path to configuration file
    ///
    /// If not specified, looks for dengue-viewer.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "DENGUE_VIEWER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seed for the synthetic indicators (overrides the config file)
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_csv() {
        let args = Args::parse_from(["dengue-viewer"]);
        assert_eq!(args.data, PathBuf::from("datos_dengue.csv"));
        assert!(args.seed.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn accepts_file_and_seed() {
        let args = Args::parse_from(["dengue-viewer", "cases.parquet", "--seed", "7", "-v"]);
        assert_eq!(args.data, PathBuf::from("cases.parquet"));
        assert_eq!(args.seed, Some(7));
        assert!(args.verbose);
    }
}
