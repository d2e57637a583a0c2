//! Runtime settings, read from a RON file.
use std::{fs::File, path::Path};

use derivative::Derivative;
use serde::Deserialize;

use crate::transform::Propagation;

/// Settings for a [`crate::TransformTree`] and the process hosting it. Fields
/// missing from the file keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Config {
    /// How invalidation travels down the tree.
    pub propagation: Propagation,
    /// Level for this crate's log output (`error` through `trace`, or `off`).
    #[derivative(Default(value = "String::from(\"info\")"))]
    pub log_level: String,
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, failure::Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            failure::format_err!("Failed to open config {}: {}", path.display(), err)
        })?;
        let reader = std::io::BufReader::new(file);
        ron::de::from_reader(reader).map_err(From::from)
    }

    pub fn parse(source: &str) -> Result<Self, failure::Error> {
        ron::de::from_str(source).map_err(From::from)
    }

    pub fn log_level_filter(&self) -> Result<log::LevelFilter, failure::Error> {
        self.log_level
            .parse()
            .map_err(|_| failure::format_err!("Unknown log level: {}", self.log_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("()").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.propagation, Propagation::Generational);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn fields_override_defaults() {
        let config = Config::parse("(propagation: OneHop, log_level: \"trace\")").unwrap();
        assert_eq!(config.propagation, Propagation::OneHop);
        assert_eq!(config.log_level_filter().unwrap(), log::LevelFilter::Trace);
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(Config::parse("(propagation: Sideways)").is_err());
        let config = Config {
            log_level: "loud".into(),
            ..Config::default()
        };
        assert!(config.log_level_filter().is_err());
    }

    #[test]
    fn shipped_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.ron");
        let config = Config::from_path(path).unwrap();
        assert_eq!(config.propagation, Propagation::Generational);
    }
}
