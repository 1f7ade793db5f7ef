use anyhow::Result;
use clap::Parser;
use testherd::cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    match cli::run(args).await {
        // A completed run with failing tests exits 1 without an error trace.
        Ok(success) => {
            if !success {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}
