//! `slimefinder.toml`: one file with `[mask]`, `[search]` and `[image]`
//! tables.
//!
//! Loading is lenient. Every key is read on its own and falls back to its
//! default with a warning when it is missing or unreadable, unknown keys are
//! reported and dropped, and out-of-range numbers are clamped. The normalised
//! result is written back so the file always lists every key.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use slime_core::{
    MAX_BLOCK_SIZE, MAX_CHUNK_SIZE, MaskParams, MaskShape, SearchCriteria, SearchParams,
};
use slime_geom::Position;
use toml::{Table, Value};

pub const DEFAULT_CONFIG_FILE: &str = "slimefinder.toml";

const MAX_CHUNK_WEIGHT: i32 = 255;
const MAX_BLOCK_WIDTH: i32 = 16;
const MAX_GRID_WIDTH: i32 = 16;

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config i/o error: {}", e),
            ConfigError::Parse(e) => write!(f, "invalid config: {}", e),
            ConfigError::Serialize(e) => write!(f, "could not serialise config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Serialize(e) => Some(e),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

pub fn shape_name(shape: MaskShape) -> &'static str {
    match shape {
        MaskShape::Exact => "exact",
        MaskShape::Floor => "floor",
        MaskShape::Ceil => "ceil",
    }
}

pub fn parse_shape(name: &str) -> Option<MaskShape> {
    match name.trim().to_ascii_lowercase().as_str() {
        "exact" => Some(MaskShape::Exact),
        "floor" => Some(MaskShape::Floor),
        "ceil" => Some(MaskShape::Ceil),
        _ => None,
    }
}

fn serialize_shape<S: Serializer>(shape: &MaskShape, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(shape_name(*shape))
}

fn serialize_block_form<S: Serializer>(pos: &Position, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&pos.block_string())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MaskConfig {
    pub world_seed: i64,
    pub despawn_sphere: bool,
    pub exclusion_sphere: bool,
    pub y_offset: i32,
    pub chunk_weight: i32,
    #[serde(serialize_with = "serialize_shape")]
    pub shape: MaskShape,
}

impl Default for MaskConfig {
    fn default() -> Self {
        let p = MaskParams::default();
        Self {
            world_seed: p.world_seed,
            despawn_sphere: p.despawn_sphere,
            exclusion_sphere: p.exclusion_sphere,
            y_offset: p.y_offset,
            chunk_weight: p.chunk_weight,
            shape: p.shape,
        }
    }
}

impl MaskConfig {
    pub fn to_params(&self) -> MaskParams {
        MaskParams {
            world_seed: self.world_seed,
            despawn_sphere: self.despawn_sphere,
            exclusion_sphere: self.exclusion_sphere,
            y_offset: self.y_offset,
            chunk_weight: self.chunk_weight,
            shape: self.shape,
        }
    }

    fn read(section: &mut Section) -> Self {
        let d = MaskConfig::default();
        let world_seed = section.take("world-seed", d.world_seed);
        let despawn_sphere = section.take("despawn-sphere", d.despawn_sphere);
        let exclusion_sphere = section.take("exclusion-sphere", d.exclusion_sphere);
        let y_offset = section.take("y-offset", d.y_offset);
        let chunk_weight = section.take("chunk-weight", d.chunk_weight);
        let chunk_weight = section.clamp("chunk-weight", chunk_weight, 0, MAX_CHUNK_WEIGHT);
        let shape = section.take_with("shape", d.shape, shape_name(d.shape), |v| {
            v.as_str().and_then(parse_shape)
        });
        Self {
            world_seed,
            despawn_sphere,
            exclusion_sphere,
            y_offset,
            chunk_weight,
            shape,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearchConfig {
    #[serde(serialize_with = "serialize_block_form")]
    pub center_pos: Position,
    pub min_width: i32,
    pub max_width: i32,
    pub fine_search: bool,
    pub min_block_size: i64,
    pub max_block_size: i64,
    pub min_chunk_size: i64,
    pub max_chunk_size: i64,
    pub output_file: String,
    pub append: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            center_pos: Position::default(),
            min_width: 0,
            max_width: 1,
            fine_search: false,
            min_block_size: 0,
            max_block_size: i64::from(MAX_BLOCK_SIZE),
            min_chunk_size: 0,
            max_chunk_size: i64::from(MAX_CHUNK_SIZE),
            output_file: "results.csv".to_string(),
            append: false,
        }
    }
}

impl SearchConfig {
    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            min_block_size: self.min_block_size,
            max_block_size: self.max_block_size,
            min_chunk_size: self.min_chunk_size,
            max_chunk_size: self.max_chunk_size,
        }
    }

    pub fn to_params(&self) -> SearchParams {
        SearchParams {
            center: self.center_pos,
            min_width: self.min_width,
            max_width: self.max_width,
            fine_search: self.fine_search,
            criteria: self.criteria(),
        }
    }

    fn read(section: &mut Section) -> Self {
        let d = SearchConfig::default();
        let center_pos = section.take_with(
            "center-pos",
            d.center_pos,
            &d.center_pos.block_string(),
            |v| v.as_str().and_then(|s| s.parse().ok()),
        );
        let min_width = section.take("min-width", d.min_width);
        let min_width = section.clamp("min-width", min_width, 0, i32::MAX);
        let max_width = section.take("max-width", d.max_width);
        let max_width = section.clamp("max-width", max_width, 0, i32::MAX);
        Self {
            center_pos,
            min_width,
            max_width,
            fine_search: section.take("fine-search", d.fine_search),
            min_block_size: section.take("min-block-size", d.min_block_size),
            max_block_size: section.take("max-block-size", d.max_block_size),
            min_chunk_size: section.take("min-chunk-size", d.min_chunk_size),
            max_chunk_size: section.take("max-chunk-size", d.max_chunk_size),
            output_file: section.take("output-file", d.output_file),
            append: section.take("append", d.append),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImageConfig {
    pub input_file: String,
    pub output_dir: String,
    pub block_width: i32,
    pub grid_width: i32,
    pub draw_slime_chunks: bool,
    pub draw_block_mask: bool,
    pub draw_chunk_mask: bool,
    pub draw_center: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            input_file: "results.csv".to_string(),
            output_dir: "images".to_string(),
            block_width: 1,
            grid_width: 1,
            draw_slime_chunks: true,
            draw_block_mask: true,
            draw_chunk_mask: true,
            draw_center: true,
        }
    }
}

impl ImageConfig {
    fn read(section: &mut Section) -> Self {
        let d = ImageConfig::default();
        let input_file = section.take("input-file", d.input_file);
        let output_dir = section.take("output-dir", d.output_dir);
        let block_width = section.take("block-width", d.block_width);
        let block_width = section.clamp("block-width", block_width, 1, MAX_BLOCK_WIDTH);
        let grid_width = section.take("grid-width", d.grid_width);
        let grid_width = section.clamp("grid-width", grid_width, 0, MAX_GRID_WIDTH);
        Self {
            input_file,
            output_dir,
            block_width,
            grid_width,
            draw_slime_chunks: section.take("draw-slime-chunks", d.draw_slime_chunks),
            draw_block_mask: section.take("draw-block-mask", d.draw_block_mask),
            draw_chunk_mask: section.take("draw-chunk-mask", d.draw_chunk_mask),
            draw_center: section.take("draw-center", d.draw_center),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Config {
    pub mask: MaskConfig,
    pub search: SearchConfig,
    pub image: ImageConfig,
}

impl Config {
    /// Parses a whole file leniently. Only a syntax error fails; everything
    /// else falls back per key.
    pub fn parse(text: &str) -> Result<Config, ConfigError> {
        let mut root: Table = text.parse()?;
        let mask = MaskConfig::read(&mut Section::take_from(&mut root, "mask"));
        let search = SearchConfig::read(&mut Section::take_from(&mut root, "search"));
        let image = ImageConfig::read(&mut Section::take_from(&mut root, "image"));
        for key in root.keys() {
            log::warn!(target: "config", "Unused property '{}'", key);
        }
        Ok(Config {
            mask,
            search,
            image,
        })
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

/// Loads the configuration at `path`, creating it with defaults when it does
/// not exist. A file that is not valid TOML is left untouched and the
/// defaults are used for this run.
pub fn load_config_from_path(path: &Path) -> Result<Config, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!(
                target: "config",
                "Could not find '{}'. Generating defaults",
                path.display()
            );
            let config = Config::default();
            config.save(path)?;
            return Ok(config);
        }
        Err(e) => return Err(e.into()),
    };
    match Config::parse(&text) {
        Ok(config) => {
            log::info!(target: "config", "Loaded configuration from '{}'", path.display());
            config.save(path)?;
            Ok(config)
        }
        Err(e) => {
            log::error!(
                target: "config",
                "Could not load '{}': {}. Using defaults",
                path.display(),
                e
            );
            Ok(Config::default())
        }
    }
}

/// One table of the file, consumed key by key. Whatever is left when it is
/// dropped was not recognised.
struct Section {
    name: &'static str,
    table: Table,
}

impl Section {
    fn take_from(root: &mut Table, name: &'static str) -> Section {
        let table = match root.remove(name) {
            Some(Value::Table(table)) => table,
            Some(_) => {
                log::warn!(target: "config", "'{}' is not a table. Using defaults", name);
                Table::new()
            }
            None => Table::new(),
        };
        Section { name, table }
    }

    /// Reads a typed value. Strings are accepted too when they parse.
    fn take<T>(&mut self, key: &str, default: T) -> T
    where
        T: DeserializeOwned + FromStr + fmt::Display,
    {
        let shown = default.to_string();
        self.take_with(key, default, &shown, |value| match value {
            Value::String(s) => s.trim().parse().ok(),
            other => other.try_into().ok(),
        })
    }

    fn take_with<T>(
        &mut self,
        key: &str,
        default: T,
        shown: &str,
        parse: impl FnOnce(Value) -> Option<T>,
    ) -> T {
        match self.table.remove(key) {
            None => {
                log::warn!(
                    target: "config",
                    "{}.{} not specified. Using default ({})",
                    self.name,
                    key,
                    shown
                );
                default
            }
            Some(value) => match parse(value) {
                Some(v) => v,
                None => {
                    log::warn!(
                        target: "config",
                        "Parsing {}.{} failed. Using default ({})",
                        self.name,
                        key,
                        shown
                    );
                    default
                }
            },
        }
    }

    fn clamp(&self, key: &str, value: i32, min: i32, max: i32) -> i32 {
        let clamped = value.clamp(min, max);
        if clamped != value {
            log::warn!(
                target: "config",
                "{}.{} = {} is out of range. Using {}",
                self.name,
                key,
                value,
                clamped
            );
        }
        clamped
    }
}

impl Drop for Section {
    fn drop(&mut self) {
        for key in self.table.keys() {
            log::warn!(target: "config", "Unused property '{}.{}'", self.name, key);
        }
    }
}
