use crate::demo::{run_demo, run_quote, run_sanitize, QuoteArgs, SanitizeArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use conditional_discount::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Conditional Product Discounts",
    about = "Serve and exercise threshold-based product discount rules",
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
    /// Preview the discounts a CSV cart would receive under a rule file
    Quote(QuoteArgs),
    /// Print the sanitized form of a JSON rule submission
    Sanitize(SanitizeArgs),
    /// Walk through the overlapping-rule example under both selection policies
    Demo,
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
        Command::Quote(args) => run_quote(args),
        Command::Sanitize(args) => run_sanitize(args),
        Command::Demo => run_demo(),
    }
}
