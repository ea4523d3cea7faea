use clap::Parser;
use hokusai::cli::{Cli, Commands, ConfigAction};
use hokusai::config::Config;
use hokusai::logging;
use hokusai::store::{SearchExperimentsRequest, TrackingStore};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Doctor(opts) => {
            info!("Running diagnostics...");
            let config = Config::load(opts.config.as_deref())?;
            hokusai::infra::doctor::run_diagnostics(&config).await?;
        }
        Commands::Experiments(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            hokusai::config::validate_config_object(&config)?;

            let store = TrackingStore::new(&config);
            let page = store
                .search_experiments(SearchExperimentsRequest {
                    max_results: Some(opts.limit),
                    ..Default::default()
                })
                .await?;

            if page.experiments.is_empty() {
                println!("No experiments visible");
            }
            for experiment in page.experiments {
                println!("{}\t{}", experiment.experiment_id, experiment.name);
            }
        }
        Commands::Config(opts) => {
            match opts.action {
                ConfigAction::Show => {
                    let config = Config::load(opts.config.as_deref())?;
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                ConfigAction::Validate => {
                    let config = Config::load(opts.config.as_deref())?;
                    hokusai::config::validate_config_object(&config)?;
                    info!("Configuration is valid");
                }
                ConfigAction::Init => {
                    Config::write_default(opts.config.as_deref().unwrap_or("hokusai.json"))?;
                    info!("Configuration file created");
                }
            }
        }
        Commands::Version => {
            println!("hokusai {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
