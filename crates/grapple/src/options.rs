//! Kernel configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::plugin::Plugin;
use crate::plugins::collision::{CollisionAlgorithm, CollisionArgs};
use crate::sensors::{KeyboardSensorOptions, PointerSensorOptions, TouchSensorOptions};

/// The built-in input sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Pointer,
    Touch,
    Keyboard,
}

impl SensorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SensorKind::Pointer => "pointer",
            SensorKind::Touch => "touch",
            SensorKind::Keyboard => "keyboard",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom collision function; returns the index of the hit candidate.
pub type CollisionFn = Arc<dyn Fn(&CollisionArgs<'_>) -> Option<usize> + Send + Sync>;

/// Collision algorithm, either built-in or supplied by the host.
#[derive(Clone)]
pub enum CollisionStrategy {
    Named(CollisionAlgorithm),
    Custom(CollisionFn),
}

impl CollisionStrategy {
    /// Wrap a custom collision function.
    pub fn custom<F>(detect: F) -> Self
    where
        F: Fn(&CollisionArgs<'_>) -> Option<usize> + Send + Sync + 'static,
    {
        CollisionStrategy::Custom(Arc::new(detect))
    }

    /// The built-in algorithm, if this is not a custom function.
    pub fn algorithm(&self) -> Option<CollisionAlgorithm> {
        match self {
            CollisionStrategy::Named(algorithm) => Some(*algorithm),
            CollisionStrategy::Custom(_) => None,
        }
    }
}

impl Default for CollisionStrategy {
    fn default() -> Self {
        CollisionStrategy::Named(CollisionAlgorithm::Rectangle)
    }
}

impl From<CollisionAlgorithm> for CollisionStrategy {
    fn from(algorithm: CollisionAlgorithm) -> Self {
        CollisionStrategy::Named(algorithm)
    }
}

impl fmt::Debug for CollisionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionStrategy::Named(algorithm) => f.debug_tuple("Named").field(algorithm).finish(),
            CollisionStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Edge auto-scroll settings, consumed by host-side scroll plugins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AutoScroll {
    #[default]
    Disabled,
    Enabled {
        /// Fraction of the scroll container's size that triggers scrolling.
        threshold: f32,
        /// Pixels per frame.
        speed: f32,
    },
}

impl AutoScroll {
    pub const DEFAULT_THRESHOLD: f32 = 0.2;
    pub const DEFAULT_SPEED: f32 = 10.0;

    pub fn is_enabled(&self) -> bool {
        matches!(self, AutoScroll::Enabled { .. })
    }
}

impl From<bool> for AutoScroll {
    fn from(enabled: bool) -> Self {
        if enabled {
            AutoScroll::Enabled {
                threshold: Self::DEFAULT_THRESHOLD,
                speed: Self::DEFAULT_SPEED,
            }
        } else {
            AutoScroll::Disabled
        }
    }
}

/// Drop animation timing, consumed by host-side renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationOptions {
    pub duration: Duration,
    /// CSS-style easing name.
    pub easing: String,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(250),
            easing: "ease".to_string(),
        }
    }
}

/// Kernel configuration.
#[derive(Clone)]
pub struct KernelOptions {
    pub sensors: Vec<SensorKind>,
    pub collision: CollisionStrategy,
    pub auto_scroll: AutoScroll,
    pub accessibility: bool,
    /// `None` disables drop animations.
    pub animation: Option<AnimationOptions>,
    pub pointer: PointerSensorOptions,
    pub touch: TouchSensorOptions,
    pub keyboard: KeyboardSensorOptions,
    /// Plugins installed after the built-ins during initialization.
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl Default for KernelOptions {
    fn default() -> Self {
        Self {
            sensors: vec![SensorKind::Pointer, SensorKind::Touch],
            collision: CollisionStrategy::default(),
            auto_scroll: AutoScroll::Disabled,
            accessibility: true,
            animation: Some(AnimationOptions::default()),
            pointer: PointerSensorOptions::default(),
            touch: TouchSensorOptions::default(),
            keyboard: KeyboardSensorOptions::default(),
            plugins: Vec::new(),
        }
    }
}

impl KernelOptions {
    /// Merge a patch into these options.
    pub fn apply(&mut self, patch: OptionsPatch) {
        let OptionsPatch {
            sensors,
            collision,
            auto_scroll,
            accessibility,
            animation,
            plugins,
        } = patch;

        if let Some(sensors) = sensors {
            self.sensors = sensors;
        }
        if let Some(collision) = collision {
            self.collision = collision;
        }
        if let Some(auto_scroll) = auto_scroll {
            self.auto_scroll = auto_scroll;
        }
        if let Some(accessibility) = accessibility {
            self.accessibility = accessibility;
        }
        if let Some(animation) = animation {
            self.animation = animation;
        }
        for plugin in plugins {
            if !self.plugins.iter().any(|p| p.name() == plugin.name()) {
                self.plugins.push(plugin);
            }
        }
    }

    pub fn has_sensor(&self, kind: SensorKind) -> bool {
        self.sensors.contains(&kind)
    }
}

impl fmt::Debug for KernelOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("KernelOptions")
            .field("sensors", &self.sensors)
            .field("collision", &self.collision)
            .field("auto_scroll", &self.auto_scroll)
            .field("accessibility", &self.accessibility)
            .field("animation", &self.animation)
            .field("pointer", &self.pointer)
            .field("touch", &self.touch)
            .field("keyboard", &self.keyboard)
            .field("plugins", &plugins)
            .finish()
    }
}

/// Partial options for [`Kernel::configure`](crate::Kernel::configure).
///
/// Unset fields keep their current value. Plugins are added, never removed.
#[derive(Clone, Default)]
pub struct OptionsPatch {
    pub sensors: Option<Vec<SensorKind>>,
    pub collision: Option<CollisionStrategy>,
    pub auto_scroll: Option<AutoScroll>,
    pub accessibility: Option<bool>,
    pub animation: Option<Option<AnimationOptions>>,
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl OptionsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sensors(mut self, sensors: impl Into<Vec<SensorKind>>) -> Self {
        self.sensors = Some(sensors.into());
        self
    }

    pub fn collision(mut self, collision: impl Into<CollisionStrategy>) -> Self {
        self.collision = Some(collision.into());
        self
    }

    pub fn auto_scroll(mut self, auto_scroll: impl Into<AutoScroll>) -> Self {
        self.auto_scroll = Some(auto_scroll.into());
        self
    }

    pub fn accessibility(mut self, enabled: bool) -> Self {
        self.accessibility = Some(enabled);
        self
    }

    pub fn animation(mut self, animation: Option<AnimationOptions>) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn plugin(mut self, plugin: impl Plugin) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }
}

impl fmt::Debug for OptionsPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("OptionsPatch")
            .field("sensors", &self.sensors)
            .field("collision", &self.collision)
            .field("auto_scroll", &self.auto_scroll)
            .field("accessibility", &self.accessibility)
            .field("animation", &self.animation)
            .field("plugins", &plugins)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = KernelOptions::default();
        assert_eq!(options.sensors, vec![SensorKind::Pointer, SensorKind::Touch]);
        assert_eq!(
            options.collision.algorithm(),
            Some(CollisionAlgorithm::Rectangle)
        );
        assert!(options.accessibility);
        assert!(!options.auto_scroll.is_enabled());

        let animation = options.animation.unwrap();
        assert_eq!(animation.duration, Duration::from_millis(250));
        assert_eq!(animation.easing, "ease");
    }

    #[test]
    fn test_apply_patch_keeps_unset_fields() {
        let mut options = KernelOptions::default();
        options.apply(
            OptionsPatch::new()
                .collision(CollisionAlgorithm::Closest)
                .auto_scroll(true)
                .animation(None),
        );

        assert_eq!(options.collision.algorithm(), Some(CollisionAlgorithm::Closest));
        assert_eq!(
            options.auto_scroll,
            AutoScroll::Enabled {
                threshold: 0.2,
                speed: 10.0
            }
        );
        assert!(options.animation.is_none());
        assert!(options.accessibility);
        assert_eq!(options.sensors.len(), 2);
    }

    #[test]
    fn test_custom_strategy_has_no_algorithm() {
        let strategy = CollisionStrategy::custom(|_| None);
        assert!(strategy.algorithm().is_none());
        assert_eq!(format!("{:?}", strategy), "Custom(..)");
    }
}
