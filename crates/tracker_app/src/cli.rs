use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::LevelFilter;
use tracker_core::{ControllerState, JobId};
use tracker_engine::{ChannelTrackerSink, ReqwestStatusFetcher, TrackerEvent, TrackerHandle};
use tracker_logging::{tracker_error, tracker_info, LogDestination};

use crate::render;
use crate::settings::TrackerSettings;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Parser, Debug)]
#[command(name = "tracker_app")]
#[command(about = "Follow a submitted policy analysis until its report is ready")]
pub struct Args {
    /// Job identifier returned when the document was submitted.
    pub job_id: String,

    /// Backend base URL. Overrides the settings file.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Path to a RON settings file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, short)]
    pub verbose: bool,
}

/// How tracking ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Completed { location: String },
    Failed { message: Option<String> },
    GaveUp { last_error: Option<String> },
}

pub fn dispatch(args: Args) -> Result<()> {
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = match args.log_file.clone() {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    tracker_logging::initialize(destination, level);

    let settings = match args.config.as_deref() {
        Some(path) => TrackerSettings::load(path)?,
        None => TrackerSettings::default(),
    };
    let job_id = JobId::new(&args.job_id).context("invalid job id")?;
    let base_url = args
        .base_url
        .clone()
        .or_else(|| settings.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    match track(job_id, &base_url, &settings) {
        Ok(Outcome::Completed { location }) => {
            println!("Report ready: {base_url}{location}");
            Ok(())
        }
        Ok(Outcome::Failed { message }) => {
            bail!(
                "analysis failed: {}",
                message.as_deref().unwrap_or("no details from server")
            )
        }
        Ok(Outcome::GaveUp { last_error }) => {
            bail!(
                "stopped tracking: {}",
                last_error.as_deref().unwrap_or("tracking deadline elapsed")
            )
        }
        Err(err) => {
            tracker_error!("{:#}", err);
            Err(err)
        }
    }
}

fn track(job_id: JobId, base_url: &str, settings: &TrackerSettings) -> Result<Outcome> {
    let fetcher = ReqwestStatusFetcher::new(base_url, settings.fetch_settings())
        .with_context(|| format!("building status client for {base_url}"))?;
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let _enter = runtime.enter();

    let (tx, rx) = mpsc::channel();
    let handle = TrackerHandle::mount(
        job_id,
        settings.tracker_config(),
        Arc::new(fetcher),
        Arc::new(ChannelTrackerSink::new(tx)),
    )
    .context("invalid tracker settings")?;
    tracker_info!("following job {} at {}", handle.job_id(), base_url);

    let outcome = wait_for_outcome(&rx);
    handle.dispose();
    outcome
}

fn wait_for_outcome(rx: &mpsc::Receiver<TrackerEvent>) -> Result<Outcome> {
    for event in rx.iter() {
        match event {
            TrackerEvent::View(view) => {
                println!("{}", render::render(&view, chrono::Local::now()));
                match view.controller {
                    ControllerState::Failed => {
                        return Ok(Outcome::Failed {
                            message: view.message,
                        })
                    }
                    ControllerState::GaveUp => {
                        return Ok(Outcome::GaveUp {
                            last_error: view.last_error,
                        })
                    }
                    ControllerState::Active
                    | ControllerState::Redirecting
                    | ControllerState::Disposed => {}
                }
            }
            TrackerEvent::Navigate { location, .. } => {
                return Ok(Outcome::Completed { location });
            }
        }
    }
    bail!("tracker stopped without reaching a terminal state")
}
