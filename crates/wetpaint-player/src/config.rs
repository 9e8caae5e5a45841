//! Layered player configuration
//!
//! Layers are merged table by table, later layers winning:
//! 1. Built-in defaults
//! 2. Global: `<config dir>/wetpaint/config.toml`
//! 3. Project-local: `./wetpaint.toml` (or the file passed with `--config`)
//! 4. Command line flags, applied by the binary

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wetpaint_core::{ParticleColor, Result, Vec2, DEFAULT_GRAVITY};
use wetpaint_physics::StepParams;
use wetpaint_tools::{StrokeSettings, ToolKind};

pub const LOCAL_CONFIG_FILE: &str = "wetpaint.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub fullscreen: bool,
}

fn default_title() -> String {
    "wetpaint".to_string()
}
fn default_width() -> u32 {
    1280
}
fn default_height() -> u32 {
    720
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            fullscreen: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 2],
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default = "default_velocity_iterations")]
    pub velocity_iterations: u32,
    #[serde(default = "default_position_iterations")]
    pub position_iterations: u32,
    #[serde(default = "default_particle_iterations")]
    pub particle_iterations: u32,
    #[serde(default)]
    pub start_paused: bool,
}

fn default_gravity() -> [f32; 2] {
    DEFAULT_GRAVITY.to_array()
}
fn default_dt() -> f32 {
    StepParams::default().dt
}
fn default_velocity_iterations() -> u32 {
    StepParams::default().velocity_iterations
}
fn default_position_iterations() -> u32 {
    StepParams::default().position_iterations
}
fn default_particle_iterations() -> u32 {
    StepParams::default().particle_iterations
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            dt: default_dt(),
            velocity_iterations: default_velocity_iterations(),
            position_iterations: default_position_iterations(),
            particle_iterations: default_particle_iterations(),
            start_paused: false,
        }
    }
}

impl SimulationConfig {
    pub fn gravity(&self) -> Vec2 {
        Vec2::from_array(self.gravity)
    }

    pub fn step_params(&self) -> StepParams {
        StepParams {
            dt: self.dt,
            velocity_iterations: self.velocity_iterations,
            position_iterations: self.position_iterations,
            particle_iterations: self.particle_iterations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub strokes: StrokeSettings,
    #[serde(default = "default_tool")]
    pub initial_tool: ToolKind,
    #[serde(default = "default_palette")]
    pub palette: Vec<ParticleColor>,
    #[serde(default = "default_materials")]
    pub materials: PathBuf,
}

fn default_tool() -> ToolKind {
    ToolKind::Fluid
}

fn default_palette() -> Vec<ParticleColor> {
    [
        "#1e64dc", "#dc2832", "#f0c814", "#28a046", "#8c3cb4", "#141414",
    ]
    .iter()
    .filter_map(|hex| ParticleColor::from_hex(hex))
    .collect()
}

fn default_materials() -> PathBuf {
    PathBuf::from("assets/materials.json")
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            simulation: SimulationConfig::default(),
            strokes: StrokeSettings::default(),
            initial_tool: default_tool(),
            palette: default_palette(),
            materials: default_materials(),
        }
    }
}

impl PlayerConfig {
    /// Global config, then `local` on top. Unreadable or malformed layers are
    /// logged and skipped.
    pub fn load(local: &Path) -> Self {
        let mut layers = Vec::new();
        if let Some(global) = global_config_path() {
            layers.push(global);
        }
        layers.push(local.to_path_buf());
        Self::load_layers(&layers)
    }

    pub fn load_layers(paths: &[PathBuf]) -> Self {
        let mut merged = toml::Table::new();
        for path in paths {
            if !path.exists() {
                continue;
            }
            match read_layer(path) {
                Ok(layer) => {
                    log::info!("Config layer: {}", path.display());
                    merge_tables(&mut merged, layer);
                }
                Err(e) => log::error!("Skipping config {}: {}", path.display(), e),
            }
        }
        Self::from_table(merged)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn from_table(table: toml::Table) -> Self {
        match Self::deserialize(toml::Value::Table(table)) {
            Ok(config) => config.validated(),
            Err(e) => {
                log::error!("Invalid configuration: {}. Using defaults", e);
                Self::default()
            }
        }
    }

    /// Replace values the rest of the program cannot run with
    fn validated(mut self) -> Self {
        if self.strokes.capacity == 0 {
            log::warn!("strokes.capacity must be at least 1");
            self.strokes.capacity = 1;
        }
        if self.simulation.dt.is_nan() || self.simulation.dt <= 0.0 {
            log::warn!("simulation.dt must be positive, using {}", default_dt());
            self.simulation.dt = default_dt();
        }
        if self.palette.is_empty() {
            self.palette = default_palette();
        }
        self
    }
}

pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wetpaint").join("config.toml"))
}

fn read_layer(path: &Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.parse::<toml::Table>()?)
}

/// Merge `overlay` into `base`, recursing into nested tables
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wetpaint_tools::FlushPolicy;

    fn temp_config(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "wetpaint_config_test_{}_{}",
            std::process::id(),
            name
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PlayerConfig::from_toml_str("").unwrap();
        assert_eq!(config, PlayerConfig::default());
        assert_eq!(config.strokes.flush_policy, FlushPolicy::WhenFull);
        assert_eq!(config.simulation.gravity(), Vec2::new(0.0, -10.0));
        assert_eq!(config.simulation.step_params(), StepParams::default());
        assert_eq!(config.initial_tool, ToolKind::Fluid);
        assert_eq!(config.palette.len(), 6);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = PlayerConfig::from_toml_str(
            r##"
initial_tool = "ink"
palette = ["#ff0000", "#00ff0080"]

[strokes]
flush_policy = "when_full_or_released"

[window]
width = 800
"##,
        )
        .unwrap();
        assert_eq!(config.initial_tool, ToolKind::Ink);
        assert_eq!(config.palette[1], ParticleColor::new(0, 255, 0, 128));
        assert_eq!(config.strokes.flush_policy, FlushPolicy::WhenFullOrReleased);
        assert_eq!(config.strokes.capacity, 256);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
    }

    #[test]
    fn test_later_layers_win_per_key() {
        let global = temp_config(
            "global",
            "[window]\nwidth = 1000\nheight = 500\n[simulation]\ngravity = [0.0, -5.0]\n",
        );
        let local = temp_config("local", "[window]\nwidth = 640\n");

        let config = PlayerConfig::load_layers(&[global.clone(), local.clone()]);
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 500);
        assert_eq!(config.simulation.gravity(), Vec2::new(0.0, -5.0));

        for path in [global, local] {
            std::fs::remove_file(&path).ok();
            std::fs::remove_dir(path.parent().unwrap()).ok();
        }
    }

    #[test]
    fn test_malformed_layer_is_skipped() {
        let broken = temp_config("broken", "[window\nwidth = ");
        let good = temp_config("good", "initial_tool = \"eraser\"\n");

        let config = PlayerConfig::load_layers(&[good.clone(), broken.clone()]);
        assert_eq!(config.initial_tool, ToolKind::Eraser);

        for path in [broken, good] {
            std::fs::remove_file(&path).ok();
            std::fs::remove_dir(path.parent().unwrap()).ok();
        }
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let bad_type = temp_config("bad_type", "[window]\nwidth = \"wide\"\n");
        assert_eq!(
            PlayerConfig::load_layers(&[bad_type.clone()]),
            PlayerConfig::default()
        );
        std::fs::remove_file(&bad_type).ok();
        std::fs::remove_dir(bad_type.parent().unwrap()).ok();

        let config = PlayerConfig::from_toml_str("[strokes]\ncapacity = 0\n")
            .unwrap()
            .validated();
        assert_eq!(config.strokes.capacity, 1);
    }

    #[test]
    fn test_missing_files_are_ignored() {
        let config = PlayerConfig::load_layers(&[PathBuf::from("/nonexistent/wetpaint.toml")]);
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn test_shipped_config_parses() {
        let config = PlayerConfig::from_toml_str(include_str!("../../../wetpaint.toml")).unwrap();
        assert_eq!(config.strokes.flush_policy, FlushPolicy::WhenFullOrReleased);
        assert!(config.strokes.capacity > 0);
    }
}
