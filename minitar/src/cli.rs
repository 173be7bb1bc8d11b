use std::path::PathBuf;

use structopt::clap::{AppSettings::*, ArgGroup};
use structopt::StructOpt;

/// The archive operation selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Append,
    Update,
    List,
    Extract,
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "minitar",
    about = "Create, modify, list and extract ustar archives.",
    settings = &[ArgRequiredElseHelp, UnifiedHelpMessage],
    usage = "minitar (-c|-a|-u|-t|-x) -f <archive> [-v] [-C <dir>] [files]...",
    group = ArgGroup::with_name("operation").required(true)
)]
pub struct CliOpts {
    #[structopt(short = "c", long, group = "operation", help = "Create a new archive")]
    create: bool,

    #[structopt(
        short = "a",
        long,
        group = "operation",
        help = "Append files to the end of an existing archive"
    )]
    append: bool,

    #[structopt(
        short = "u",
        long,
        group = "operation",
        help = "Append files, superseding members of the same name"
    )]
    update: bool,

    #[structopt(short = "t", long, group = "operation", help = "List the members of an archive")]
    list: bool,

    #[structopt(
        short = "x",
        long,
        group = "operation",
        help = "Extract all members of an archive"
    )]
    extract: bool,

    #[structopt(
        short = "f",
        long = "file",
        name = "archive",
        parse(from_os_str),
        help = "Path to the archive"
    )]
    pub archive: PathBuf,

    #[structopt(short, long, help = "Show verbose output")]
    pub verbose: bool,

    #[structopt(
        short = "C",
        long,
        name = "dir",
        parse(from_os_str),
        help = "Extract into this directory instead of the current one"
    )]
    pub directory: Option<PathBuf>,

    #[structopt(
        name = "files",
        parse(from_os_str),
        help = "Files to add to the archive, stored under the names given"
    )]
    pub files: Vec<PathBuf>,
}

impl CliOpts {
    /// The one operation flag that was set. clap enforces that exactly one is.
    pub fn operation(&self) -> Operation {
        if self.create {
            Operation::Create
        } else if self.append {
            Operation::Append
        } else if self.update {
            Operation::Update
        } else if self.list {
            Operation::List
        } else {
            Operation::Extract
        }
    }
}
