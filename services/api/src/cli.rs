use crate::commands::{
    run_allocate, run_match, run_notify_test, run_refresh_embeddings, AllocateArgs, MatchArgs,
    RefreshArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use talent_fit::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "TalentFit",
    about = "Match candidates to projects and deliver staffing notifications",
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
    /// Print match suggestions, or the raw similarity ranking, for a project
    Match(MatchArgs),
    /// Dispatch the canned test notification through every configured channel
    NotifyTest,
    /// Embed candidates and projects that are missing a vector
    RefreshEmbeddings(RefreshArgs),
    /// Allocate a candidate to a project and notify them
    Allocate(AllocateArgs),
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
        Command::Match(args) => run_match(args).await,
        Command::NotifyTest => run_notify_test().await,
        Command::RefreshEmbeddings(args) => run_refresh_embeddings(args).await,
        Command::Allocate(args) => run_allocate(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["talent-fit-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn match_accepts_project_and_limit() {
        let cli = Cli::try_parse_from([
            "talent-fit-api",
            "match",
            "--project-id",
            "42",
            "--limit",
            "5",
            "--similar",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Match(args)) => {
                assert_eq!(args.project_id, "42");
                assert_eq!(args.limit, Some(5));
                assert!(args.similar);
            }
            other => panic!("expected match command, got {other:?}"),
        }
    }

    #[test]
    fn serve_overrides_are_optional() {
        let cli = Cli::try_parse_from(["talent-fit-api", "serve", "--port", "9090"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(9090));
                assert!(args.host.is_none());
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }

    #[test]
    fn refresh_embeddings_force_is_opt_in() {
        let cli = Cli::try_parse_from(["talent-fit-api", "refresh-embeddings"]).expect("parses");
        match cli.command {
            Some(Command::RefreshEmbeddings(args)) => assert!(!args.force),
            other => panic!("expected refresh command, got {other:?}"),
        }

        let cli = Cli::try_parse_from(["talent-fit-api", "refresh-embeddings", "--force"])
            .expect("parses");
        match cli.command {
            Some(Command::RefreshEmbeddings(args)) => assert!(args.force),
            other => panic!("expected refresh command, got {other:?}"),
        }
    }

    #[test]
    fn allocate_parses_dates_and_defaults_the_type() {
        let cli = Cli::try_parse_from([
            "talent-fit-api",
            "allocate",
            "--project-id",
            "7",
            "--candidate-id",
            "12",
            "--start",
            "2025-06-01",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Allocate(args)) => {
                assert_eq!(args.project_id, 7);
                assert_eq!(args.allocation_type, "billable");
                assert_eq!(args.start.to_string(), "2025-06-01");
                assert!(args.end.is_none());
            }
            other => panic!("expected allocate command, got {other:?}"),
        }
    }

    #[test]
    fn allocate_rejects_malformed_dates() {
        let parsed = Cli::try_parse_from([
            "talent-fit-api",
            "allocate",
            "--project-id",
            "7",
            "--candidate-id",
            "12",
            "--start",
            "June 1st",
        ]);
        assert!(parsed.is_err());
    }
}
