use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = cf_realip::cli::Cli::parse();
    if let Err(e) = cf_realip::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
