use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "logging-server", about = "Log ingestion service over a shared distributed map")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Join the store cluster and serve AddLog/GetLogs.
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Instance number, used as the store cluster member id.
    pub num: u32,

    /// Path to TOML config file. Defaults apply when omitted.
    #[arg(long, env = "LOGGING_CONFIG")]
    pub config: Option<String>,
}
