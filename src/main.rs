use clap::Parser;
use std::process::ExitCode;

use secure_letters::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    secure_letters::init_logging(&cli);

    match secure_letters::run(&cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}
