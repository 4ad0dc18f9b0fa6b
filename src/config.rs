use crate::error::GameError;
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const APP_DIR: &str = "arcade-minis";
const STORAGE_FILE: &str = "storage.json";
const LOG_FILE: &str = "arcade-minis.log";

pub struct Settings
{
    pub data_dir: PathBuf,
    pub log_filter: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Settings
{
    pub fn resolve(
        data_dir: Option<PathBuf>,
        log_filter: Option<String>,
        log_file: Option<PathBuf>,
    ) -> Self
    {
        let data_dir = data_dir.unwrap_or_else(|| {
            default_data_dir(
                env::var_os("XDG_DATA_HOME").map(PathBuf::from),
                env::var_os("HOME").map(PathBuf::from),
            )
        });
        Self {
            data_dir,
            log_filter: log_filter.filter(|filter| !filter.trim().is_empty()),
            log_file,
        }
    }

    pub fn storage_path(&self) -> PathBuf
    {
        self.data_dir.join(STORAGE_FILE)
    }

    pub fn log_path(&self) -> PathBuf
    {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(LOG_FILE))
    }
}

fn default_data_dir(xdg_data_home: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf
{
    if let Some(dir) = xdg_data_home.filter(|dir| dir.is_absolute()) {
        return dir.join(APP_DIR);
    }
    if let Some(home) = home.filter(|dir| !dir.as_os_str().is_empty()) {
        return home.join(".local").join("share").join(APP_DIR);
    }
    Path::new(".").join(format!(".{APP_DIR}"))
}

/// Installs a file-backed subscriber. Stdout belongs to the game screen, so
/// nothing is logged unless a filter was asked for.
pub fn init_tracing(settings: &Settings) -> Result<(), GameError>
{
    let Some(filter) = settings.log_filter.as_deref() else {
        return Ok(());
    };
    let env_filter = EnvFilter::try_new(filter)
        .map_err(|err| GameError::usage(format!("Invalid log filter '{filter}': {err}")))?;

    let path = settings.log_path();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}
