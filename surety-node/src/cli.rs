use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "surety-node")]
#[command(about = "Flight delay insurance node with a simulated oracle fleet")]
pub struct Args {
    /// Node config, created with defaults if missing
    #[arg(short, long, default_value = "config.json")]
    pub config: String,

    /// Directory of the audit log
    #[arg(long, default_value = "logs")]
    pub log_dir: String,

    /// Flights to run through the demo cycle
    #[arg(short, long, default_value_t = 1)]
    pub flights: usize,

    /// Seconds to wait for each flight to be finalized
    #[arg(long, default_value_t = 10)]
    pub timeout_s: u64,
}
