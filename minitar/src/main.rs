mod cli;
mod commands;
mod error;
mod util;

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use cli::{CliOpts, Operation};

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(opts: CliOpts) -> anyhow::Result<()> {
    match opts.operation() {
        Operation::Create => commands::create(&opts.archive, &opts.files)?,
        Operation::Append => commands::append(&opts.archive, &opts.files)?,
        Operation::Update => commands::update(&opts.archive, &opts.files)?,
        Operation::List => commands::list(&opts.archive, opts.verbose)?,
        Operation::Extract => commands::extract(&opts.archive, opts.directory.as_deref())?,
    };

    Ok(())
}

fn main() {
    let opts = CliOpts::from_iter(wild::args_os());
    init_logging(opts.verbose);

    if let Err(e) = run(opts) {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
