mod config;
mod github;
mod metrics;
mod report;

use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use github::GithubClient;
use metrics::DateWindow;
use report::SummaryMethod;

/// pr-metrics — collects pull-request metadata across all repositories of a
/// GitHub organization, filters by a creation-date window, and writes per-PR
/// engineering metrics (lifetime, size, review activity) to a CSV report.
#[derive(Parser, Debug)]
#[command(name = "pr-metrics", version, about)]
struct Cli {
    /// Name of the organization in GitHub
    #[arg(short, long)]
    org: String,

    /// Branch that reflects a production deployment, typically "main"
    #[arg(short, long)]
    target_branch: String,

    /// Window start, inclusive (format: YYYY-MM-DDTHH:MM:SSZ)
    #[arg(long)]
    start_date: String,

    /// Window end, inclusive (format: YYYY-MM-DDTHH:MM:SSZ)
    #[arg(long)]
    end_date: String,

    /// Repository to exclude; may be given multiple times
    #[arg(short, long = "excluded-repo")]
    excluded_repos: Vec<String>,

    /// Collect a single repository instead of every repo in the org
    #[arg(short, long)]
    repo: Option<String>,

    /// Print per-page and per-PR detail
    #[arg(short, long)]
    verbose: bool,

    /// Fold lifetimes into one number: "mean" or "percentileNN"
    /// (e.g. --result-method percentile90)
    #[arg(long)]
    result_method: Option<SummaryMethod>,

    /// Output CSV path
    #[arg(long, default_value = "out.csv")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let window = DateWindow::parse(&cli.start_date, &cli.end_date)?;

    info!("loading configuration");
    let config = config::Config::load()?;
    let token = config.github_token()?;

    let client = GithubClient::new(&token, &cli.org)?;

    let repos = match &cli.repo {
        Some(repo) => vec![repo.clone()],
        None => {
            info!(org = %cli.org, "listing organization repositories");
            client
                .list_repo_names(&[("per_page", metrics::PER_PAGE)])
                .await?
        }
    };
    info!(repos = repos.len(), "collecting pull request metrics");

    let rows = metrics::collect_metrics(
        &client,
        &repos,
        &cli.excluded_repos,
        &cli.target_branch,
        window,
        Utc::now(),
    )
    .await?;
    info!(rows = rows.len(), "collection complete");

    report::write_csv(&rows, &cli.output)?;
    info!(path = %cli.output.display(), "report written");

    if let Some(method) = cli.result_method {
        report::print_summary(&rows, method);
    }

    Ok(())
}
