// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use sheetboard_app::{
    LayoutMode, RoleLabels, SortDirection, SortField, SortTerm, UrgencyWindow, ViewConfig,
    action_sort, default_hidden_statuses, normalize,
};
use sheetboard_tui::BoardTiming;
use std::collections::{BTreeSet, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "sheetboard";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_TITLE: &str = "Shop Board";
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_REFRESH_INTERVAL: &str = "15s";
const DEFAULT_CLOCK_INTERVAL: &str = "1s";
const DEFAULT_SCROLL_TICK: &str = "25ms";
const SHEET_ID_ENV: &str = "SHEETBOARD_SHEET_ID";
const CONFIG_PATH_ENV: &str = "SHEETBOARD_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub refresh: Refresh,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub views: Vec<ViewEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            source: Source::default(),
            refresh: Refresh::default(),
            ui: Ui::default(),
            logging: Logging::default(),
            views: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    pub sheet_id: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            sheet_id: None,
            base_url: Some(sheetboard_gviz::DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Refresh {
    pub interval: Option<String>,
    pub clock: Option<String>,
}

impl Default for Refresh {
    fn default() -> Self {
        Self {
            interval: Some(DEFAULT_REFRESH_INTERVAL.to_owned()),
            clock: Some(DEFAULT_CLOCK_INTERVAL.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub title: Option<String>,
    pub layout: Option<LayoutMode>,
    pub scroll_rows_per_second: Option<f64>,
    pub scroll_tick: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            title: Some(DEFAULT_TITLE.to_owned()),
            layout: Some(LayoutMode::SideBySide),
            scroll_rows_per_second: Some(sheetboard_app::DEFAULT_ROWS_PER_SECOND),
            scroll_tick: Some(DEFAULT_SCROLL_TICK.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Logging {
    pub file: Option<String>,
}

/// Sheet tab ids are numeric in the sheet URL; both `"0"` and `0` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TableId {
    Text(String),
    Number(i64),
}

impl TableId {
    fn as_string(&self) -> String {
        match self {
            Self::Text(value) => value.trim().to_owned(),
            Self::Number(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewEntry {
    pub name: String,
    pub table_id: TableId,
    pub count_label: Option<String>,
    pub columns: Option<Vec<usize>>,
    pub sort: Option<Vec<SortEntry>>,
    pub hide_statuses: Option<Vec<String>>,
    pub red_window_days: Option<i64>,
    pub yellow_window_days: Option<i64>,
    pub auto_scroll: Option<bool>,
    #[serde(default)]
    pub roles: RoleOverrides,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SortEntry {
    pub key: String,
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleOverrides {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub samples: Option<String>,
    pub needed_by: Option<String>,
    pub timestamp: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and place values under [source], [refresh], [ui], and [[views]]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        for (key, raw) in [
            ("source.timeout", &self.source.timeout),
            ("refresh.interval", &self.refresh.interval),
            ("refresh.clock", &self.refresh.clock),
            ("ui.scroll_tick", &self.ui.scroll_tick),
        ] {
            if let Some(raw) = raw {
                let parsed = parse_duration(raw)
                    .with_context(|| format!("{key} in {}", path.display()))?;
                if parsed <= Duration::ZERO {
                    bail!("{key} in {} must be positive, got {raw}", path.display());
                }
            }
        }

        if let Some(speed) = self.ui.scroll_rows_per_second
            && !(speed.is_finite() && speed > 0.0)
        {
            bail!(
                "ui.scroll_rows_per_second in {} must be a positive number, got {speed}",
                path.display()
            );
        }

        let mut names = HashSet::new();
        for (index, view) in self.views.iter().enumerate() {
            let name = view.name.trim();
            if name.is_empty() {
                bail!("views[{index}].name in {} must not be empty", path.display());
            }
            if !names.insert(name.to_owned()) {
                bail!(
                    "duplicate view name {name:?} in {}; give each [[views]] entry a unique name",
                    path.display()
                );
            }
            if view.table_id.as_string().is_empty() {
                bail!(
                    "views[{index}].table_id in {} must not be empty; use the gid from the sheet tab URL",
                    path.display()
                );
            }
            view_config(view).with_context(|| format!("views[{index}] in {}", path.display()))?;
        }

        Ok(())
    }

    /// `SHEETBOARD_SHEET_ID` wins over `[source].sheet_id`.
    pub fn sheet_id(&self) -> Result<String> {
        let from_env = env::var(SHEET_ID_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        let from_config = self
            .source
            .sheet_id
            .clone()
            .filter(|value| !value.trim().is_empty());
        from_env.or(from_config).ok_or_else(|| {
            anyhow!(
                "no spreadsheet configured; set [source].sheet_id or {SHEET_ID_ENV} (the id between /d/ and /edit in the sheet URL)"
            )
        })
    }

    pub fn base_url(&self) -> &str {
        self.source
            .base_url
            .as_deref()
            .unwrap_or(sheetboard_gviz::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.source.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn timing(&self) -> Result<BoardTiming> {
        Ok(BoardTiming {
            refresh_interval: parse_duration(
                self.refresh
                    .interval
                    .as_deref()
                    .unwrap_or(DEFAULT_REFRESH_INTERVAL),
            )?,
            clock_interval: parse_duration(
                self.refresh.clock.as_deref().unwrap_or(DEFAULT_CLOCK_INTERVAL),
            )?,
            scroll_tick: parse_duration(
                self.ui.scroll_tick.as_deref().unwrap_or(DEFAULT_SCROLL_TICK),
            )?,
        })
    }

    pub fn title(&self) -> &str {
        self.ui.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub fn layout(&self) -> LayoutMode {
        self.ui.layout.unwrap_or_default()
    }

    pub fn scroll_rows_per_second(&self) -> f64 {
        self.ui
            .scroll_rows_per_second
            .unwrap_or(sheetboard_app::DEFAULT_ROWS_PER_SECOND)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.logging.file {
            return Ok(PathBuf::from(file));
        }
        let cache_root = dirs::cache_dir().ok_or_else(|| {
            anyhow!("cannot resolve cache directory; set [logging].file to a writable path")
        })?;
        Ok(cache_root.join(APP_NAME).join(format!("{APP_NAME}.log")))
    }

    pub fn view_configs(&self) -> Result<Vec<ViewConfig>> {
        if self.views.is_empty() {
            bail!(
                "no [[views]] configured; run `sheetboard --print-example-config` for a template"
            );
        }
        self.views.iter().map(view_config).collect()
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            r#"# sheetboard config
# Place this file at: {path}

version = 1

[source]
# The id between /d/ and /edit in the sheet URL. SHEETBOARD_SHEET_ID overrides it.
sheet_id = "your-sheet-id"
base_url = "{base_url}"
timeout = "{timeout}"

[refresh]
interval = "{interval}"
clock = "{clock}"

[ui]
title = "{title}"
# side-by-side or stacked
layout = "side-by-side"
scroll_rows_per_second = {speed}
scroll_tick = "{tick}"

[logging]
# Optional. Default is the platform cache dir (for example ~/.cache/sheetboard/sheetboard.log)
# file = "/absolute/path/to/sheetboard.log"

[[views]]
name = "New Parts"
table_id = "0"
count_label = "items"
# Column positions to show; leave out to show every column.
# columns = [0, 1, 2, 3, 6, 7]
sort = [
  {{ key = "status", direction = "asc" }},
  {{ key = "due", direction = "asc" }},
  {{ key = "timestamp", direction = "asc" }},
]
hide_statuses = ["DONE"]
red_window_days = 7
yellow_window_days = 10

[[views]]
name = "Live Notes"
table_id = "your-notes-gid"
count_label = "notes"
sort = [{{ key = "timestamp", direction = "desc" }}]
auto_scroll = true

# [views.roles]
# needed_by = "DUE"
"#,
            path = path.display(),
            base_url = sheetboard_gviz::DEFAULT_BASE_URL,
            timeout = DEFAULT_TIMEOUT,
            interval = DEFAULT_REFRESH_INTERVAL,
            clock = DEFAULT_CLOCK_INTERVAL,
            title = DEFAULT_TITLE,
            speed = sheetboard_app::DEFAULT_ROWS_PER_SECOND,
            tick = DEFAULT_SCROLL_TICK,
        )
    }
}

fn view_config(entry: &ViewEntry) -> Result<ViewConfig> {
    let sort = match &entry.sort {
        Some(terms) if !terms.is_empty() => terms
            .iter()
            .map(sort_term)
            .collect::<Result<Vec<_>>>()?,
        _ => action_sort(),
    };

    let hide_statuses = match &entry.hide_statuses {
        Some(statuses) => statuses
            .iter()
            .map(|status| normalize(status))
            .filter(|status| !status.is_empty())
            .collect::<BTreeSet<_>>(),
        None => default_hidden_statuses(),
    };

    let defaults = UrgencyWindow::default();
    let urgency = UrgencyWindow::new(
        entry.red_window_days.unwrap_or(defaults.red_days),
        entry.yellow_window_days.unwrap_or(defaults.yellow_days),
    );
    if urgency.yellow_days < urgency.red_days {
        bail!(
            "yellow_window_days ({}) must not be smaller than red_window_days ({})",
            urgency.yellow_days,
            urgency.red_days
        );
    }

    let mut roles = RoleLabels::default();
    for (slot, value) in [
        (&mut roles.status, &entry.roles.status),
        (&mut roles.priority, &entry.roles.priority),
        (&mut roles.samples, &entry.roles.samples),
        (&mut roles.needed_by, &entry.roles.needed_by),
        (&mut roles.timestamp, &entry.roles.timestamp),
    ] {
        if let Some(label) = value
            && !label.trim().is_empty()
        {
            *slot = label.clone();
        }
    }

    Ok(ViewConfig {
        name: entry.name.trim().to_owned(),
        table_id: entry.table_id.as_string(),
        count_label: entry
            .count_label
            .clone()
            .unwrap_or_else(|| "items".to_owned()),
        visible_columns: entry.columns.clone().unwrap_or_default(),
        sort,
        hide_statuses,
        urgency,
        roles,
        auto_scroll: entry.auto_scroll.unwrap_or(false),
    })
}

fn sort_term(entry: &SortEntry) -> Result<SortTerm> {
    let field = SortField::parse(&entry.key).ok_or_else(|| {
        anyhow!(
            "unknown sort key {:?}; use status, priority, due, timestamp, or column:<LABEL>",
            entry.key
        )
    })?;
    let direction = match entry.direction.as_deref() {
        None => SortDirection::Asc,
        Some(raw) => SortDirection::parse(raw)
            .ok_or_else(|| anyhow!("unknown sort direction {raw:?}; use asc or desc"))?,
    };
    Ok(SortTerm { field, direction })
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 15s)")
}
