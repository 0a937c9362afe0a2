use std::process::ExitCode;

use clap::Parser;

use exctree::cmd::parser::ToolOpts;
use exctree::cmd::runner::run;
use exctree::logging::init_logging;

fn main() -> ExitCode {
    init_logging();
    let opts = ToolOpts::parse();
    run(&opts)
}
