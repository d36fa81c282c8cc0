use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use habit_core::{date::parse_date, Granularity, STREAK_WALK_LIMIT};
use habit_service::{DashboardOptions, HabitService};
use tracing::{debug, info};

use crate::render::render_text;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unknown output format `{other}`"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) roots: Vec<PathBuf>,
    pub(crate) as_of: Option<NaiveDate>,
    pub(crate) stats_days: u32,
    pub(crate) streak_limit: u32,
    pub(crate) abandoned_limit: usize,
    pub(crate) trend: Granularity,
    pub(crate) output: OutputFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Build a config from any key lookup. Values that fail to parse keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(root) = lookup("HABITS_ROOT") {
            config.push_root(PathBuf::from(root));
        }
        if let Some(list) = lookup("HABITS_ROOTS") {
            for path in std::env::split_paths(&list) {
                config.push_root(path);
            }
        }
        if let Some(as_of) = lookup("HABITS_AS_OF") {
            match parse_date(as_of.trim()) {
                Ok(date) => config.as_of = Some(date),
                Err(err) => debug!(%err, "ignoring HABITS_AS_OF"),
            }
        }
        if let Some(days) = lookup("HABITS_STATS_DAYS") {
            if let Ok(value) = days.trim().parse::<u32>() {
                if value > 0 {
                    config.stats_days = value;
                }
            }
        }
        if let Some(limit) = lookup("HABITS_STREAK_LIMIT") {
            if let Ok(value) = limit.trim().parse::<u32>() {
                if value > 0 {
                    config.streak_limit = value;
                }
            }
        }
        if let Some(limit) = lookup("HABITS_ABANDONED_LIMIT") {
            if let Ok(value) = limit.trim().parse::<usize>() {
                config.abandoned_limit = value;
            }
        }
        if let Some(trend) = lookup("HABITS_TREND") {
            if let Ok(value) = trend.trim().to_ascii_lowercase().parse::<Granularity>() {
                config.trend = value;
            }
        }
        if let Some(output) = lookup("HABITS_OUTPUT") {
            if let Ok(value) = output.parse::<OutputFormat>() {
                config.output = value;
            }
        }
        config
    }

    pub(crate) fn push_root(&mut self, path: PathBuf) {
        if path.as_os_str().is_empty() {
            return;
        }
        if !self.roots.contains(&path) {
            info!(path = %path.display(), "registering root");
            self.roots.push(path);
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            window_days: self.stats_days,
            streak_walk_limit: self.streak_limit,
            abandoned_limit: self.abandoned_limit,
            granularity: self.trend,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let options = DashboardOptions::default();
        Self {
            roots: Vec::new(),
            as_of: None,
            stats_days: options.window_days,
            streak_limit: STREAK_WALK_LIMIT,
            abandoned_limit: options.abandoned_limit,
            trend: options.granularity,
            output: OutputFormat::Text,
        }
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with(&config, &mut out)
}

/// Load every configured root and write one dashboard report to `out`.
pub fn run_with(config: &AppConfig, out: &mut impl Write) -> Result<()> {
    anyhow::ensure!(
        !config.roots.is_empty(),
        "no habit roots configured; set HABITS_ROOT or HABITS_ROOTS"
    );
    let mut builder = HabitService::builder();
    for root in &config.roots {
        anyhow::ensure!(root.exists(), "habit root `{}` does not exist", root.display());
        builder = builder.add_root(root);
    }
    let service = builder.build().context("failed to load habit snapshots")?;

    let as_of = config.as_of();
    let dashboard = service.dashboard(as_of, &config.dashboard_options());
    debug!(%as_of, habits = dashboard.habits.len(), "dashboard computed");

    match config.output {
        OutputFormat::Text => out.write_all(render_text(&dashboard).as_bytes())?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &dashboard)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
