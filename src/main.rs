use bucket_mirror::cli::Cli;
use bucket_mirror::config::MirrorConfig;
use bucket_mirror::mirror::MirrorOptions;
use clap::Parser;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Exits with usage text before anything is acquired
    let cli = Cli::parse();
    let config = MirrorConfig::from_env(cli);

    match bucket_mirror::run(&config, &MirrorOptions::default()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:?}", anyhow::Error::new(err));
            ExitCode::FAILURE
        }
    }
}
