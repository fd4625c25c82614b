/// lakeprep: regularize the historical lake monitoring datasets.
///
/// Usage: `lakeprep [config.toml]`
///
/// The config path falls back to `LAKEPREP_CONFIG` (environment or `.env`)
/// and then to `./lakeprep.toml`.

use std::env;
use std::process::ExitCode;

use lakeprep::config::{load_config, StudyConfig};
use lakeprep::export::write_json;
use lakeprep::ingest::table::load_datasets;
use lakeprep::logging::{self, init_logger, Stage};
use lakeprep::model::PrepError;
use lakeprep::pipeline;

const DEFAULT_CONFIG: &str = "lakeprep.toml";

fn config_path() -> String {
    env::args()
        .nth(1)
        .or_else(|| env::var("LAKEPREP_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string())
}

fn run(config: &StudyConfig) -> Result<(), PrepError> {
    let datasets = load_datasets(&config.datasets)?;
    let series = pipeline::run(config, &datasets)?;
    write_json(&series, &config.output.path)
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let path = config_path();
    let config = match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("lakeprep: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.timestamps,
    );
    logging::info(Stage::System, None, &format!("Using study config {}", path));

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::error(Stage::System, None, &e.to_string());
            ExitCode::FAILURE
        }
    }
}
