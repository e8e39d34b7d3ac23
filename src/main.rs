mod app;
mod cache;
mod cli;
mod config;
mod dates;
mod display;
mod logging;
mod settings;
mod tasks;

use chrono::Local;
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::{debug, warn};

use app::{App, Session};
use cache::{CacheLayer, CacheStorage, Fetcher, FileStorage, NoopStorage, RefreshLock, Refresher};
use cli::{Args, Command};
use config::Config;
use display::Palette;
use settings::Settings;
use tasks::client::GoogleTasksClient;

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let log_guard = logging::init(&logging::default_dir()?, args.debug)?;

  let today = Local::now().date_naive();
  let command = args.command.clone().unwrap_or(Command::Show);

  // Reject bad input before talking to anything
  let filter = args.filter.to_options(today)?;
  let display = args.display.to_options(&filter);
  let task_edit = command.task_edit(today)?;
  let draft = match &command {
    Command::Add(task) => Some(task.to_draft(today)?),
    _ => None,
  };
  debug!(?command, ?filter, "starting");

  let service = Arc::new(GoogleTasksClient::new(&config)?);

  let (store, lock) = if config.cache.enabled {
    let dir = match &config.cache.dir {
      Some(dir) => dir.clone(),
      None => FileStorage::default_dir()?,
    };
    let storage = FileStorage::open(dir)?;
    let lock = RefreshLock::in_dir(storage.dir());
    let store: Arc<dyn CacheStorage> = Arc::new(storage);
    (store, Some(lock))
  } else {
    let store: Arc<dyn CacheStorage> = Arc::new(NoopStorage);
    (store, None)
  };

  let settings_path = Settings::default_path()?;
  let mut settings = Settings::load(&settings_path);
  let loaded_settings = settings.clone();
  app::sweep_cache(store.as_ref(), &mut settings, today, config.sweep_max_age());

  let fetcher = Fetcher::new(Arc::clone(&service), store, today);
  let refresher = lock.map(|lock| Refresher::new(fetcher.clone(), lock));
  let cache = CacheLayer::new(fetcher, refresher).with_stale_time(config.ttl());

  // Lists the command works on; empty means all of them
  let titles: Vec<String> = if args.all || !args.lists.is_empty() {
    args.lists.clone()
  } else {
    match &command {
      Command::Lists
      | Command::AddList { .. }
      | Command::EditList { .. }
      | Command::DeleteList { .. } => Vec::new(),
      _ => vec![
        app::default_list_title(service.as_ref(), config.default_list.as_deref(), &mut settings)
          .await?,
      ],
    }
  };

  if settings != loaded_settings {
    if let Err(e) = settings.save(&settings_path) {
      warn!("{:#}", e);
    }
  }

  let session = Session {
    filter,
    display,
    palette: Palette::for_stdout(),
    quiet: args.quiet,
    interactive: args.interactive,
    use_cache: !args.no_cache,
  };
  let mut app = App::new(
    service,
    cache,
    session,
    Box::new(std::io::stdout()),
    Box::new(std::io::stdin().lock()),
  );

  let changed = if command.changes_tasks() {
    let list = titles
      .first()
      .cloned()
      .ok_or_else(|| eyre!("Error, name the list to change with -l"))?;
    let changed = match (&command, draft, task_edit) {
      (Command::Clear, _, _) => app.clear_completed(&list).await?,
      (_, Some(draft), _) => app.add_task(&list, draft).await?,
      (_, _, Some((position, edit))) => app.edit_task(&list, position, edit).await?,
      _ => false,
    };
    changed.then_some(list)
  } else {
    match &command {
      Command::Show => app.show_tasks(&titles).await?,
      Command::Lists => app.show_lists(&titles).await?,
      Command::Dashboard => app.show_dashboard(&titles).await?,
      Command::Refresh => app.refresh(&titles).await?,
      Command::AddList { title } => {
        app.add_list(title).await?;
      }
      Command::EditList { title, new_title } => {
        app.edit_list(title, new_title).await?;
      }
      Command::DeleteList { title } => {
        app.delete_list(title).await?;
      }
      _ => {}
    }
    None
  };

  if let Some(list) = changed {
    app.after_change(&list, !args.display.no_show_after).await?;
  }

  // Output is already printed; only background refreshes remain
  app.finish().await;

  let failed = app.failed();
  drop(app);
  drop(log_guard);
  if failed {
    std::process::exit(1);
  }
  Ok(())
}
