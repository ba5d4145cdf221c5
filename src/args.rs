use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Update Cloudflare DNS record with your current IP address", long_about = None)]
pub struct Args {
    /// Config file to use (default: ~/.config/cloudflare-ddns.json)
    #[arg(short = 'c', long, env = "CLOUDFLARE_DDNS_CONFIG")]
    pub config: Option<String>,

    /// State file to use (default: ~/.config/cloudflare-ddns-state.json)
    #[arg(short = 't', long, env = "CLOUDFLARE_DDNS_STATE_FILE")]
    pub state_file: Option<String>,

    /// Setup wizard
    #[arg(short = 's', long, default_value = "false")]
    pub setup: bool,

    /// Force update Cloudflare even if IP hasn't changed
    #[arg(short = 'f', long, default_value = "false")]
    pub force: bool,

    /// Only print errors
    #[arg(short = 'q', long, default_value = "false")]
    pub quiet: bool,

    /// Print a lot more info
    #[arg(short = 'v', long, default_value = "false")]
    pub verbose: bool,

    /// Debug output
    #[arg(short = 'd', long, default_value = "false")]
    pub debug: bool,
}

impl Args {
    pub fn new() -> Self {
        Self::parse()
    }
}
