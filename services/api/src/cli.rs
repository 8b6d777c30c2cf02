use crate::commands::{run_bootstrap, run_migrate, run_report, BootstrapArgs, ReportCommand};
use crate::server;
use clap::{Args, Parser, Subcommand};
use sinag::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "sinag",
    about = "Run and administer the SINAG internship portal",
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
    /// Create or upgrade the database schema and exit
    Migrate,
    /// Create the first coordinator account
    Bootstrap(BootstrapArgs),
    /// Render a PDF report without going through the HTTP API
    Report {
        #[command(subcommand)]
        command: ReportCommand,
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
        Command::Migrate => run_migrate(),
        Command::Bootstrap(args) => run_bootstrap(args),
        Command::Report { command } => run_report(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["sinag"]).expect("parses");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["sinag", "serve", "--port", "8080"]).expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn report_commands_take_ids_and_output_paths() {
        let cli = Cli::try_parse_from([
            "sinag",
            "report",
            "roster",
            "--program-id",
            "3",
            "--output",
            "roster.pdf",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Report {
                command: ReportCommand::Roster(args),
            }) => {
                assert_eq!(args.program_id, 3);
                assert_eq!(args.output, PathBuf::from("roster.pdf"));
                assert!(args.today.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }

        let err = Cli::try_parse_from(["sinag", "report", "intern", "--output", "x.pdf"])
            .expect_err("intern id is required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn bootstrap_requires_credentials() {
        let cli = Cli::try_parse_from([
            "sinag",
            "bootstrap",
            "--email",
            "ojt.office@pup.edu.ph",
            "--name",
            "OJT Office",
            "--password",
            "change-me-now",
        ])
        .expect("parses");
        assert!(matches!(cli.command, Some(Command::Bootstrap(_))));
        assert!(Cli::try_parse_from(["sinag", "bootstrap", "--email", "a@b.ph"]).is_err());
    }
}
