use std::process::ExitCode;

use anyhow::Context;
use crystalnets::{identify_file, identify_genome, Archive, Options};

mod cli;
mod display;

fn main() -> ExitCode {
    let cli = cli::parse();

    let default_level = if cli.quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            display::print_error(&e);
            ExitCode::from(2)
        }
    }
}

/// Runs the lookup; `Ok(true)` means every subnet was recognized.
fn run(cli: &cli::Cli) -> anyhow::Result<bool> {
    let archive = match &cli.archive {
        Some(path) => Archive::load(path)
            .with_context(|| format!("failed to load archive '{}'", path.display()))?,
        None => Archive::builtin(),
    };

    if let Some(genome) = &cli.genome {
        let result = identify_genome(genome, &archive)?;
        println!("{}", result.display_id());
        return Ok(result.id.is_some());
    }

    let path = cli
        .input
        .as_ref()
        .expect("clap requires FILE when -g is absent");
    let options = Options::for_structure(cli.structure.into());
    let result = identify_file(path, &options, &archive)
        .with_context(|| format!("failed to identify '{}'", path.display()))?;

    if result.subnets.len() > 1 {
        for subnet in &result.subnets {
            println!("{}", subnet.display_id());
        }
    }
    println!("{}", result.composite());
    Ok(result.recognized())
}
