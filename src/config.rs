use std::{fs, path::Path};

use log::info;
use serde::Deserialize;
use zdom::Color;

use crate::{error::SqError, SqResult};

pub const HIGHLIGHT_COLOR: Color = Color::new(255, 255, 100, 0.9);

/// What the hover handler does with an id that isn't `row,col`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum MalformedIdPolicy {
    /// Fail the handler and leave the style slot untouched.
    Reject,

    /// Build the rule anyway, with `undefined` for a missing column.
    Lenient,
}

/// How `bind_all` keeps squares from collecting duplicate handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum RebindStrategy {
    /// Remove every listener attached by the previous call.
    Deregister,

    /// Swap every square for a listener-free deep copy of itself.
    CloneReplace,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub square_class: String,
    pub style_slot_id: String,
    pub update_control_id: String,
    pub highlight_color: Color,
    pub malformed_ids: MalformedIdPolicy,
    pub rebind: RebindStrategy,
    pub board_size: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            square_class: "square".into(),
            style_slot_id: "style2".into(),
            update_control_id: "update".into(),
            highlight_color: HIGHLIGHT_COLOR,
            malformed_ids: MalformedIdPolicy::Reject,
            rebind: RebindStrategy::Deregister,
            board_size: 8,
        }
    }
}

impl Config {
    pub fn from_ron_str(s: &str) -> Result<Self, ron::de::Error> {
        ron::de::from_str(s)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> SqResult<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)?;
        let config =
            Self::from_ron_str(&s).map_err(|e| SqError::from_ron_de_error(e, path.into()))?;
        info!("Config loaded from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_struct_gives_defaults() {
        let config = Config::from_ron_str("()").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_config_overrides_fields() {
        let config = Config::from_ron_str(
            "(
                style_slot_id: \"hover-style\",
                malformed_ids: Lenient,
                rebind: CloneReplace,
                highlight_color: (r: 10, g: 20, b: 30, a: 0.5),
            )",
        )
        .unwrap();
        assert_eq!(config.style_slot_id, "hover-style");
        assert_eq!(config.malformed_ids, MalformedIdPolicy::Lenient);
        assert_eq!(config.rebind, RebindStrategy::CloneReplace);
        assert_eq!(config.highlight_color, Color::new(10, 20, 30, 0.5));
        assert_eq!(config.update_control_id, "update");
    }

    #[test]
    fn bundled_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/config.ron");
        let config = Config::load(path).unwrap();
        assert_eq!(config.square_class, "square");
        assert_eq!(config.highlight_color, HIGHLIGHT_COLOR);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = Config::load("/definitely/not/here.ron");
        assert!(matches!(result, Err(SqError::IOError(_))));
    }
}
