use crate::demo::{run_demo, run_id_preview, DemoArgs, IdPreviewArgs};
use crate::server;
use campus_transfers::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Campus Transfer Desk",
    about = "Run and demonstrate the campus transfer desk from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect display identifiers without touching any records
    Id {
        #[command(subcommand)]
        command: IdCommand,
    },
    /// Run an end-to-end CLI demo covering the transfer workflows
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum IdCommand {
    /// Show the identifier a transfer destination would produce
    Preview(IdPreviewArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Id {
            command: IdCommand::Preview(args),
        } => run_id_preview(args),
        Command::Demo(args) => run_demo(args),
    }
}
