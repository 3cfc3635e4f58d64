//! Files and text: the TOML configuration, the results file and the
//! console formatting helpers.
#![forbid(unsafe_code)]

pub mod config;
pub mod format;
pub mod results;

pub use config::{
    Config, ConfigError, DEFAULT_CONFIG_FILE, ImageConfig, MaskConfig, SearchConfig,
    load_config_from_path, parse_shape, shape_name,
};
pub use results::{HEADER, ResultsError, ResultsReader, ResultsWriter, format_record, parse_line};
