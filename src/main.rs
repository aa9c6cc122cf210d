mod app;
mod attachments;
mod backend;
mod cache;
mod commands;
mod config;
mod error;
mod event;
mod form;
mod lifecycle;
mod logging;
mod model;
mod notify;
mod pending;
mod repository;
mod routes;
mod session;
mod ui;
mod video;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "siteadmin")]
#[command(about = "Terminal admin console for a construction company's website content")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/siteadmin/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Directory for log files
  #[arg(long)]
  log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let _guard = logging::init(args.log_dir)?;

  // Load configuration
  let config = Arc::new(config::Config::load(args.config.as_deref())?);
  info!(url = %config.backend.url, "starting");

  let state = session::SessionState::new();
  let backend = Arc::new(backend::HttpBackend::new(
    &config.backend,
    state.clone(),
  )?);
  let (notifier, notifications) = notify::Notifier::channel();

  let ctx = app::Context {
    cache: Arc::new(cache::EntityCache::new(backend.clone(), notifier.clone())),
    attachments: attachments::Attachments::new(backend.clone(), notifier.clone())
      .with_max_bytes(config.limits.max_upload_bytes),
    auth: session::Auth::new(backend, state, notifier.clone()),
    notifier,
    config,
  };

  // Initialize and run the app
  let mut app = app::App::new(ctx, notifications, config::Config::get_password());
  app.run().await?;

  Ok(())
}
