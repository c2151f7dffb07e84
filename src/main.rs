use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use subcue::transcribe::{
    ConfigCommands, TranscribeCommands, handle_config_command, handle_transcribe_command,
};
use subcue::ui::{self, OutputFormat, prelude::*};

/// subcue main parser
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for messages
    #[arg(long, value_enum, default_value = "text", global = true)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Use this configuration file instead of the default location
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Transcribe(TranscribeCommands),

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    ui::set_debug_mode(cli.debug);
    ui::init(cli.output, !cli.no_color);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Transcribe(command) => handle_transcribe_command(command, config),
        Commands::Config { command } => handle_config_command(command, config),
    };

    if let Err(err) = result {
        emit(
            Level::Error,
            "subcue.error",
            &format!("Error: {err:#}"),
            None,
        );
        std::process::exit(1);
    }
}
