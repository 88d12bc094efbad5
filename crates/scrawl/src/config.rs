//! Arena configuration.

use std::time::Duration;

use tracing::warn;

/// Palette used when a config supplies no colors of its own.
pub const DEFAULT_USER_COLORS: [&str; 6] = [
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#46f0f0",
];

/// Configuration for one arena service instance.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Maximum participants. Enforced at join time by a read-then-decide
    /// check against the presence subtree.
    pub max_users: usize,

    /// Ordered color palette; joiners get `colors[count % len]`.
    pub user_colors: Vec<String>,

    /// Cap on the live food pool.
    pub max_food_dots: usize,

    /// How often the spawner considers adding one food item.
    pub food_spawn_interval: Duration,

    /// Width of the area food spawns into.
    pub spawn_width: f64,

    /// Height of the area food spawns into.
    pub spawn_height: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            max_users: 8,
            user_colors: DEFAULT_USER_COLORS.iter().map(|c| c.to_string()).collect(),
            max_food_dots: 50,
            food_spawn_interval: Duration::from_secs(2),
            spawn_width: 1280.0,
            spawn_height: 720.0,
        }
    }
}

impl ArenaConfig {
    /// Floor for the spawn interval; anything lower would make the
    /// spawner a busy loop against the store.
    pub const MIN_SPAWN_INTERVAL: Duration = Duration::from_millis(10);

    /// Clamp and fix any degenerate values so the config is safe to use.
    ///
    /// Called automatically by `RealtimeService::new`. Rules:
    /// - an empty palette is replaced with [`DEFAULT_USER_COLORS`]
    /// - `food_spawn_interval` is raised to [`Self::MIN_SPAWN_INTERVAL`]
    /// - non-positive spawn bounds fall back to the defaults
    pub fn validated(mut self) -> Self {
        if self.user_colors.is_empty() {
            warn!("empty color palette — falling back to the default palette");
            self.user_colors = DEFAULT_USER_COLORS.iter().map(|c| c.to_string()).collect();
        }
        if self.food_spawn_interval < Self::MIN_SPAWN_INTERVAL {
            warn!(
                interval_ms = self.food_spawn_interval.as_millis() as u64,
                floor_ms = Self::MIN_SPAWN_INTERVAL.as_millis() as u64,
                "food spawn interval below floor — clamping"
            );
            self.food_spawn_interval = Self::MIN_SPAWN_INTERVAL;
        }
        if self.spawn_width <= 0.0 {
            warn!(width = self.spawn_width, "non-positive spawn width — using default");
            self.spawn_width = Self::default().spawn_width;
        }
        if self.spawn_height <= 0.0 {
            warn!(height = self.spawn_height, "non-positive spawn height — using default");
            self.spawn_height = Self::default().spawn_height;
        }
        self
    }
}
