use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout_engine::LayoutKind;

const MAX_GAP: i32 = 500;
const MAX_HEADER: i32 = 500;

pub fn config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("tessera")
}
pub fn config_file() -> PathBuf { config_dir().join("config.toml") }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub gaps: GapSettings,
    #[serde(default)]
    pub focus: FocusSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Height of each title header in a stacked container.
    #[serde(default = "default_header_height")]
    pub stack_header_height: i32,
    /// Height of the tab bar above the children of a tabbed container.
    #[serde(default = "default_header_height")]
    pub tab_bar_height: i32,
    /// Layout given to newly created monitor nodes.
    #[serde(default = "default_layout")]
    pub default_layout: LayoutKind,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        LayoutSettings {
            stack_header_height: default_header_height(),
            tab_bar_height: default_header_height(),
            default_layout: default_layout(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct GapSettings {
    #[serde(default)]
    pub size: i32,
    #[serde(default = "default_gap_increment")]
    pub increment: i32,
    /// Drop the gap when a monitor shows a single tiled window.
    #[serde(default = "no")]
    pub hide_when_single: bool,
}

impl Default for GapSettings {
    fn default() -> Self {
        GapSettings {
            size: 0,
            increment: default_gap_increment(),
            hide_when_single: no(),
        }
    }
}

impl GapSettings {
    pub fn gap_for(&self, tiled_windows: usize) -> i32 {
        if self.hide_when_single && tiled_windows <= 1 {
            return 0;
        }
        self.size.saturating_mul(self.increment).max(0)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.size < 0 {
            issues.push(format!("gaps.size must not be negative (got {})", self.size));
        }
        if self.increment < 0 {
            issues.push(format!("gaps.increment must not be negative (got {})", self.increment));
        }
        if self.size.saturating_mul(self.increment) > MAX_GAP {
            issues.push(format!("gaps.size * gaps.increment should not exceed {MAX_GAP}"));
        }
        issues
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct FocusSettings {
    /// Warp the pointer into windows focused by direction.
    #[serde(default = "yes")]
    pub move_pointer: bool,
}

impl Default for FocusSettings {
    fn default() -> Self { FocusSettings { move_pointer: yes() } }
}

fn yes() -> bool { true }

fn no() -> bool { false }

fn default_header_height() -> i32 { 35 }

fn default_gap_increment() -> i32 { 1 }

fn default_layout() -> LayoutKind { LayoutKind::HSplit }

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for (name, value) in [
            ("stack_header_height", self.stack_header_height),
            ("tab_bar_height", self.tab_bar_height),
        ] {
            if !(0..=MAX_HEADER).contains(&value) {
                issues.push(format!("layout.{name} must be between 0 and {MAX_HEADER} (got {value})"));
            }
        }
        if !matches!(self.default_layout, LayoutKind::HSplit | LayoutKind::VSplit) {
            issues.push(format!(
                "layout.default_layout must be hsplit or vsplit (got {:?})",
                self.default_layout
            ));
        }
        issues
    }
}

impl Settings {
    pub fn read(path: &Path) -> anyhow::Result<Settings> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn parse(buf: &str) -> anyhow::Result<Settings> { Ok(toml::from_str(buf)?) }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Returns a description of every problem found; empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.layout.validate());
        issues.extend(self.gaps.validate());
        issues
    }
}
