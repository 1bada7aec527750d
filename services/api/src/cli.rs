use crate::demo::{run_demo, run_verification, DemoArgs, VerifyTarget};
use crate::server;
use clap::{Args, Parser, Subcommand};
use merchant_onboarding::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Merchant Onboarding Portal",
    about = "Run and demonstrate the merchant onboarding service from the command line",
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
    /// Check a single identifier with the same validators the portal uses
    Verify {
        #[command(subcommand)]
        command: VerifyCommand,
    },
    /// Walk a sample merchant through draft, update, submission, and screening
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum VerifyCommand {
    /// Validate a federal Employer Identification Number
    Ein { value: String },
    /// Validate a Social Security Number
    Ssn { value: String },
    /// Validate a North American phone number
    Phone {
        value: String,
        /// Confirm with the configured carrier lookup after the local check
        #[arg(long)]
        remote: bool,
    },
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
        Command::Verify { command } => {
            let target = match command {
                VerifyCommand::Ein { value } => VerifyTarget::Ein(value),
                VerifyCommand::Ssn { value } => VerifyTarget::Ssn(value),
                VerifyCommand::Phone { value, remote } => VerifyTarget::Phone { value, remote },
            };
            run_verification(target).await
        }
        Command::Demo(args) => run_demo(args),
    }
}
