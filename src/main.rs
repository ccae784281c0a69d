use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use appstore_insights::app;
use appstore_insights::environment::Config;
use appstore_insights::export::reviews_to_csv;
use appstore_insights::logging::configure_logging;
use appstore_insights::report::{
    ReviewAnalysisService, ReviewRequest, DEFAULT_COUNTRY, DEFAULT_LIMIT_REVIEWS,
    DEFAULT_REVIEW_COUNT,
};
use appstore_insights::TARGET_WEB_REQUEST;

#[derive(Parser)]
#[clap(
    name = "appstore-insights",
    version,
    about = "Analyze App Store reviews and suggest improvements"
)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Port to listen on, overrides PORT
        #[clap(short, long)]
        port: Option<u16>,
    },
    /// Analyze an app's reviews and print the report as JSON
    Analyze {
        #[clap(flatten)]
        target: TargetArgs,

        /// Number of sample reviews included in the report
        #[clap(long, default_value_t = DEFAULT_LIMIT_REVIEWS)]
        limit_reviews: usize,
    },
    /// Download an app's reviews as CSV
    Download {
        #[clap(flatten)]
        target: TargetArgs,

        /// Output file, defaults to {APP_NAME}_reviews.csv
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// App name as shown in the store
    app_name: String,

    /// Store identifier, skips the name search
    #[clap(long)]
    app_id: Option<String>,

    /// Two-letter store country code
    #[clap(short, long, default_value = DEFAULT_COUNTRY)]
    country: String,

    /// Number of reviews to sample
    #[clap(short = 'n', long, default_value_t = DEFAULT_REVIEW_COUNT)]
    count: usize,
}

impl From<TargetArgs> for ReviewRequest {
    fn from(args: TargetArgs) -> Self {
        ReviewRequest {
            app_name: args.app_name,
            app_id: args.app_id,
            country: args.country,
            count: args.count,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env().context("Invalid configuration")?;
    let _guard = configure_logging(&config.log_dir);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            app::serve(&config).await
        }
        Commands::Analyze {
            target,
            limit_reviews,
        } => {
            let service = ReviewAnalysisService::from_config(&config)?;
            let request = ReviewRequest::from(target);
            match service.build_report(&request, limit_reviews).await? {
                Some(report) => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    Ok(())
                }
                None => bail!("No reviews found or app not found: {}", request.app_name),
            }
        }
        Commands::Download { target, output } => {
            let service = ReviewAnalysisService::from_config(&config)?;
            let request = ReviewRequest::from(target);
            let reviews = service.fetch_reviews(&request).await;
            if reviews.is_empty() {
                bail!("No reviews found: {}", request.app_name);
            }

            let path = output
                .unwrap_or_else(|| PathBuf::from(format!("{}_reviews.csv", request.app_name)));
            tokio::fs::write(&path, reviews_to_csv(&reviews))
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(target: TARGET_WEB_REQUEST, "Wrote {} reviews to {}", reviews.len(), path.display());
            Ok(())
        }
    }
}
