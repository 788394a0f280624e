use clap::Parser;
use clap::error::ErrorKind;
use tracing::level_filters::LevelFilter;

use descan::cli::{Cli, resolve};
use descan::pipeline::runner::run;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let exit = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(exit);
        }
    };

    let level = if cli.quiet {
        LevelFilter::ERROR
    } else {
        match cli.verbosity() {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let result = resolve(cli).and_then(|(options, files)| run(&options, files));
    if let Err(err) = result {
        eprintln!("descan: {err}");
        std::process::exit(1);
    }
}
