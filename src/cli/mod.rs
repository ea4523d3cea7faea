use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hokusai", version, about = "Authenticated MLflow registry client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Doctor(DoctorOpts),
    Experiments(ExperimentsOpts),
    Config(ConfigOpts),
    Version,
}

#[derive(clap::Args)]
pub struct DoctorOpts {
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(clap::Args)]
pub struct ExperimentsOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[arg(short, long, default_value_t = 20)]
    pub limit: i64,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
    Init,
}
