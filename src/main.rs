mod download;
mod error;
mod file;
mod logging;
mod options;
mod wizard;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use download::catalog::fetch_resolutions;
use download::orchestrator::{status_message, DownloadRequest, Downloader};
use download::source::ytdlp::YtDlpResolver;
use logging::CliLogLevel;
use wizard::{Wizard, WizardState};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[clap(subcommand)]
    subcmd: Option<SubCmd>,

    #[clap(long = "yt-dlp", env = "VORTIGAL_YT_DLP", default_value = "yt-dlp")]
    /// path of the yt-dlp executable used to look up videos
    ytdlp: PathBuf,

    #[clap(long, value_enum, default_value = "warn")]
    /// set the log level (RUST_LOG takes precedence)
    log_level: CliLogLevel,

    #[clap(long, default_value = options::DEFAULT_USER_AGENT)]
    /// user agent sent when downloading video data
    user_agent: String,

    #[clap(long)]
    /// keep half-written files when a download fails
    keep_partial: bool,

    #[clap(long)]
    /// do not animate a progress indicator while downloading
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about)]
enum SubCmd {
    /// Step through URL, quality and destination interactively (the default)
    Wizard {
        #[clap(short, long)]
        /// destination offered when none is typed in
        output: Option<PathBuf>,
    },
    /// List the resolutions a video can be downloaded in
    Resolutions {
        #[clap(value_parser = url_parser)]
        /// provide a video link
        url: String,
    },
    /// Download a video in the given resolution
    Download {
        #[clap(value_parser = url_parser)]
        /// provide a video link
        url: String,

        #[clap(short, long)]
        /// resolution label as printed by `resolutions`, e.g. 720p
        resolution: String,

        #[clap(short, long, default_value = ".")]
        /// provide the output folder
        output: PathBuf,
    },
}

fn url_parser(url: &str) -> Result<String, String> {
    if url.starts_with("http") {
        Ok(url.to_string())
    } else {
        Err("URL must start with http or https".to_string())
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    logging::init_tracing(args.log_level.as_tracing_level())?;

    let default_output = match &args.subcmd {
        Some(SubCmd::Wizard { output: Some(output) }) => output.clone(),
        Some(SubCmd::Download { output, .. }) => output.clone(),
        _ => std::env::current_dir()?,
    };

    let options = options::Options {
        ytdlp_bin: args.ytdlp,
        user_agent: args.user_agent,
        default_output,
        keep_partial: args.keep_partial,
        show_progress: !args.no_progress,
    };

    tracing::debug!("Options: {:?}", options);

    let resolver = Arc::new(YtDlpResolver::new(&options));
    let downloader = Downloader::new(resolver, options);

    match args.subcmd.unwrap_or(SubCmd::Wizard { output: None }) {
        SubCmd::Wizard { .. } => {
            println!("Vortigal Downloader");

            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut wizard = Wizard::new(downloader, input, std::io::stdout());

            // runs until stdin is closed; download failures only change the status line
            match wizard.run().await? {
                WizardState::Completed(path) => tracing::info!("Last download saved {}", path.display()),
                WizardState::Failed(status) => tracing::info!("Last download failed: {}", status),
                _ => tracing::debug!("Wizard closed without a download"),
            }
        }
        SubCmd::Resolutions { url } => match fetch_resolutions(downloader.resolver(), &url).await {
            Ok(resolutions) => {
                for resolution in resolutions {
                    println!("{}", resolution);
                }
            }
            Err(err) => {
                eprintln!("{}", err.user_message());
                return Ok(ExitCode::FAILURE);
            }
        },
        SubCmd::Download { url, resolution, output } => {
            let request = DownloadRequest {
                url,
                resolution,
                destination: output,
            };

            let result = downloader.start(request)?.await?;
            println!("{}", status_message(&result));

            match result {
                Ok(path) => println!("{}", path.display()),
                Err(_) => return Ok(ExitCode::FAILURE),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
