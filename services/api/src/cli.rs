use crate::analyze::{run_analyze, run_evaluate, AnalyzeArgs, EvaluateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use doc_compliance::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "doc-compliance",
    about = "Analyze documents and check extracted fields for compliance",
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
    /// Submit a document for analysis and print its compliance verdict
    Analyze(AnalyzeArgs),
    /// Evaluate a saved analysis response without contacting the service
    Evaluate(EvaluateArgs),
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
        Command::Analyze(args) => run_analyze(args).await,
        Command::Evaluate(args) => run_evaluate(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["doc-compliance"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn analyze_collects_repeated_prefixes() {
        let cli = Cli::try_parse_from([
            "doc-compliance",
            "analyze",
            "textract",
            "s3://compliance-docs-bucket/mock_reports/report.pdf",
            "--sync",
            "--prefix",
            "Date:",
            "--prefix",
            "Reviewed by:",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Analyze(args)) => {
                assert_eq!(args.target, "textract");
                assert!(args.sync);
                assert_eq!(args.prefix, vec!["Date:", "Reviewed by:"]);
                assert!(args.keyword.is_none());
            }
            other => panic!("expected analyze command, got {other:?}"),
        }
    }
}
