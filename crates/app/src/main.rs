use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context as _;
use directories::ProjectDirs;
use marginalia_application::{Catalog, DirAssets, Library, mindmap};
use marginalia_core::Settings;
use marginalia_storage::{Prefs, RecordStore};
use marginalia_ui::{Ui, UiConfig};
use tracing_subscriber::EnvFilter;

const DATA_DIR_ENV: &str = "MARGINALIA_DATA_DIR";
const ASSETS_DIR_ENV: &str = "MARGINALIA_ASSETS_DIR";
const LOG_ENV: &str = "MARGINALIA_LOG";

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dirs =
        ProjectDirs::from("dev", "marginalia", "marginalia").context("resolve project dirs")?;

    let data_dir = env_path(DATA_DIR_ENV).unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
    create_dir(&data_dir)?;
    init_logging(&data_dir)?;

    let config_dir = project_dirs.config_dir();
    create_dir(config_dir)?;

    let db_path = config_dir.join("marginalia.db");
    let prefs = Prefs::open(&db_path)?;
    let mut settings = prefs.load_settings()?;
    settings.normalize();
    if settings.assets_dir.is_none() {
        settings.assets_dir = Some(data_dir.join("assets").to_string_lossy().to_string());
        prefs.save_settings(&settings)?;
    }

    let assets_dir = resolve_assets_dir(&settings, &data_dir);
    create_dir(&assets_dir)?;
    tracing::info!(
        data_dir = %data_dir.display(),
        assets_dir = %assets_dir.display(),
        db = %db_path.display(),
        "starting"
    );

    let store = RecordStore::new(data_dir.join("records"));
    let catalog = Catalog::load(prefs, DirAssets::new(&assets_dir));
    let library = Library::new(catalog, store, &assets_dir);

    let config = UiConfig {
        assets_dir,
        mindmap_dir: data_dir.join("mindmaps"),
        markmap_script: mindmap::MARKMAP_SCRIPT.to_string(),
    };
    let mut ui = Ui::new(library, config);
    let result = ui.run();
    if let Err(err) = &result {
        tracing::error!(error = ?err, "ui exited with error");
    }
    result
}

fn resolve_assets_dir(settings: &Settings, data_dir: &Path) -> PathBuf {
    env_path(ASSETS_DIR_ENV)
        .or_else(|| settings.assets_dir.as_deref().map(PathBuf::from))
        .unwrap_or_else(|| data_dir.join("assets"))
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn create_dir(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_logging(data_dir: &Path) -> anyhow::Result<()> {
    let log_path = data_dir.join("marginalia.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("open log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| anyhow::anyhow!("install log subscriber: {err}"))
}
