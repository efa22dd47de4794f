// maas-link - resilient MAAS WebSocket client
use clap::Parser;
use maas_link::cli::args::Args;
use maas_link::cli::commands::execute_command;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = execute_command(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
