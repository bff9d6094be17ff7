// src/main.rs

use sitewatch::errors::SitewatchError;
use sitewatch::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        // A failed one-shot site build mirrors the generator's exit code.
        if let SitewatchError::SiteBuild { code } = err {
            eprintln!("sitewatch: {err}");
            std::process::exit(if code > 0 { code } else { 1 });
        }
        eprintln!("sitewatch error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> sitewatch::errors::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
