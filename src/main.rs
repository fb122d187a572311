use std::process::ExitCode;

use clap::Parser;
use consul_s3_snapshot::{app, cli::Cli, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match app::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", app::diagnostic(&e));
            ExitCode::FAILURE
        }
    }
}
