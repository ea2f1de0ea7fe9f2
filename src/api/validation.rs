use std::path::{Component, Path};

use crate::core::{UID_LEN, ValueRange};
use crate::error::{ViewError, ViewResult};

use super::ViewerConfig;

pub fn validate_viewer_config(config: ViewerConfig) -> ViewResult<ViewerConfig> {
    if config.uid_len != UID_LEN {
        return Err(ViewError::InvalidConfig(format!(
            "uid_len must be {UID_LEN}, got {}",
            config.uid_len
        )));
    }

    validate_file_name("manifest_name", &config.manifest_name)?;

    if config.default_group.trim().is_empty() {
        return Err(ViewError::InvalidConfig(
            "default_group must not be empty".to_owned(),
        ));
    }

    for (name, range) in [
        ("fallback_position_range", config.fallback_position_range),
        ("fallback_force_range", config.fallback_force_range),
    ] {
        validate_range(name, range)?;
    }

    if !config.playback_speed.is_finite() || config.playback_speed <= 0.0 {
        return Err(ViewError::InvalidConfig(
            "playback_speed must be finite and > 0".to_owned(),
        ));
    }

    Ok(config)
}

/// Result and manifest names must stay inside the results root.
pub(super) fn is_contained_path(name: &str) -> bool {
    let mut components = Path::new(name).components().peekable();
    components.peek().is_some()
        && components.all(|component| matches!(component, Component::Normal(_)))
}

fn validate_file_name(field: &str, name: &str) -> ViewResult<()> {
    if is_contained_path(name) {
        Ok(())
    } else {
        Err(ViewError::InvalidConfig(format!(
            "{field} must be a relative path inside the results root, got `{name}`"
        )))
    }
}

fn validate_range(name: &str, range: ValueRange) -> ViewResult<()> {
    if !range.min.is_finite() || !range.max.is_finite() {
        return Err(ViewError::InvalidConfig(format!(
            "{name} bounds must be finite"
        )));
    }
    if range.min >= range.max {
        return Err(ViewError::InvalidConfig(format!(
            "{name} min must be < max"
        )));
    }
    Ok(())
}
