mod cli;
mod commands;
mod paths;
mod run;
mod simulate;

use anyhow::Result;

fn main() -> Result<()> {
    let args = cli::parse();
    run::run(args)
}
