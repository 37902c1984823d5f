use clap::Parser;

#[derive(Parser)]
#[command(name = "loki-ingest-probe")]
#[command(about = "Measure how long new Kubernetes pods take to get their first log line into Loki")]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short = 'f', long, default_value = "config.yaml")]
    pub config: String,

    /// Run a single discovery and drain cycle, then exit
    #[arg(long)]
    pub once: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
