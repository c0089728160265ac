use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use gesturectl::app::{RunOptions, load_config, run_replay, run_trace};
use gesturectl::cli::{Cli, Commands, ConfigAction};
use gesturectl::config::Config;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let options = RunOptions {
        quiet: cli.quiet,
        verbosity: cli.verbose,
        repeat_interval: cli.repeat_interval,
    };

    match cli.command {
        Commands::Replay {
            script,
            fps,
            frames,
        } => {
            let config = load_config(cli.config.as_deref())?;
            run_replay(&config, &script, fps, frames, &options)
                .await
                .with_context(|| format!("replay of {} failed", script.display()))?;
        }
        Commands::Trace { script, tail } => {
            let config = load_config(cli.config.as_deref())?;
            run_trace(&config, &script, tail, &options)
                .with_context(|| format!("trace of {} failed", script.display()))?;
        }
        Commands::Config { action } => handle_config_command(action, cli.config.as_deref())?,
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "gesturectl",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            let path = custom_path.map(Path::to_path_buf).or_else(Config::default_path);
            match path {
                Some(path) => println!("{}", path.display()),
                None => anyhow::bail!("no configuration directory on this system"),
            }
        }
    }
    Ok(())
}
