use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use sim::{Fixed, KindInfo};

/// Numeric overrides for one kind. All fields optional; whole map units for
/// sizes and speeds, health/damage as plain integers, gravity in permille
/// so the file never needs fractions.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KindTuning {
    pub radius: Option<i32>,
    pub height: Option<i32>,
    pub speed: Option<i32>,
    pub health: Option<i32>,
    pub damage: Option<i32>,
    pub gravity_permille: Option<i32>,
}

/// Apply a JSON tuning file to the kind table. Content errors are
/// recoverable: a malformed file or an unknown kind name warns and leaves
/// defaults in place; a missing file is silently fine.
pub fn apply_tuning_file(kinds: &mut [KindInfo], path: &Path) {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return,
    };
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    let parsed: Result<BTreeMap<String, KindTuning>, _> =
        serde_path_to_error::deserialize(&mut deserializer);
    let overrides = match parsed {
        Ok(overrides) => overrides,
        Err(error) => {
            warn!(
                path = %path.display(),
                at = %error.path(),
                error = %error,
                "tuning_file_malformed"
            );
            return;
        }
    };
    apply_overrides(kinds, &overrides);
    info!(path = %path.display(), entries = overrides.len(), "tuning_applied");
}

fn apply_overrides(kinds: &mut [KindInfo], overrides: &BTreeMap<String, KindTuning>) {
    for (name, tuning) in overrides {
        let Some(info) = kinds.iter_mut().find(|info| info.name == name.as_str()) else {
            warn!(kind = name.as_str(), "tuning_unknown_kind");
            continue;
        };
        if let Some(radius) = tuning.radius {
            info.radius = Fixed::from_int(radius);
        }
        if let Some(height) = tuning.height {
            info.height = Fixed::from_int(height);
        }
        if let Some(speed) = tuning.speed {
            info.speed = Fixed::from_int(speed);
        }
        if let Some(health) = tuning.health {
            info.spawn_health = health;
        }
        if let Some(damage) = tuning.damage {
            info.damage = damage;
        }
        if let Some(permille) = tuning.gravity_permille {
            info.gravity_factor = Fixed::from_int(permille).div(Fixed::from_int(1_000));
        }
    }
}
