//! Named timing presets
//!
//! Common entry, exit and attention timings, plus a loader for user presets
//! kept in TOML:
//!
//! ```toml
//! [presets.drawer_open]
//! style = "Quint"
//! direction = "Out"
//! duration = 0.35
//!
//! [presets.blink]
//! duration = 0.1
//! should_reverse = true
//! play_count = 3
//! ```

use crate::config::{normalize, TweenConfig, TweenConfigRecord};
use crate::easing::{Easing, EasingDirection, EasingStyle};
use crate::error::{Result, TweenError};
use rustc_hash::FxHashMap;
use serde::Deserialize;

#[derive(Deserialize)]
struct PresetDocument {
    #[serde(default)]
    presets: FxHashMap<String, TweenConfigRecord>,
}

/// Catalogue of named timing configs
#[derive(Clone, Debug, Default)]
pub struct TimingPresets {
    presets: FxHashMap<String, TweenConfig>,
}

impl TimingPresets {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalogue
    pub fn builtin() -> Self {
        let styled = |duration, style, direction| {
            TweenConfig::new(duration).with_easing(Easing::styled(style, direction))
        };

        let mut presets = Self::new();
        // Entry / exit
        presets.insert("fade_in", styled(0.3, EasingStyle::Quad, EasingDirection::Out));
        presets.insert("fade_out", styled(0.2, EasingStyle::Quad, EasingDirection::In));
        presets.insert("slide_in", styled(0.35, EasingStyle::Cubic, EasingDirection::Out));
        presets.insert("slide_out", styled(0.25, EasingStyle::Cubic, EasingDirection::In));
        presets.insert("pop", styled(0.25, EasingStyle::Back, EasingDirection::Out));
        presets.insert("drop", styled(0.5, EasingStyle::Bounce, EasingDirection::Out));
        // Attention
        presets.insert(
            "pulse",
            styled(0.3, EasingStyle::Sine, EasingDirection::InOut).with_reverse(0.0),
        );
        presets.insert(
            "shake",
            styled(0.05, EasingStyle::Sine, EasingDirection::InOut)
                .with_reverse(0.0)
                .with_repeat(2, 0.0),
        );
        presets.insert(
            "wobble",
            styled(0.6, EasingStyle::Elastic, EasingDirection::Out),
        );
        presets
    }

    /// Parse `[presets.<name>]` tables
    ///
    /// Every preset must describe a usable tween; the first one that does
    /// not fails the whole document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let document: PresetDocument =
            toml::from_str(source).map_err(|err| TweenError::Presets(err.to_string()))?;

        let mut presets = Self::new();
        for (name, record) in document.presets {
            let config = normalize(record);
            config
                .validate()
                .map_err(|err| TweenError::Presets(format!("preset `{name}`: {err}")))?;
            presets.presets.insert(name, config);
        }
        tracing::debug!(count = presets.len(), "loaded timing presets");
        Ok(presets)
    }

    pub fn get(&self, name: &str) -> Option<TweenConfig> {
        self.presets.get(name).copied()
    }

    pub fn insert(&mut self, name: impl Into<String>, config: TweenConfig) {
        self.presets.insert(name.into(), config);
    }

    /// Add every preset of `other`, replacing presets with the same name
    pub fn merge(&mut self, other: TimingPresets) {
        self.presets.extend(other.presets);
    }

    /// Preset names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.presets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets_are_valid() {
        let presets = TimingPresets::builtin();
        assert!(!presets.is_empty());
        for name in presets.names() {
            let config = presets.get(name).unwrap();
            assert!(config.validate().is_ok(), "{name}");
        }

        let shake = presets.get("shake").unwrap();
        assert!(shake.should_reverse);
        assert_eq!(shake.play_count(), 3);
    }

    #[test]
    fn test_from_toml() {
        let presets = TimingPresets::from_toml_str(
            r#"
            [presets.drawer_open]
            style = "Quint"
            direction = "Out"
            duration = 0.35

            [presets.blink]
            duration = 0.1
            should_reverse = true
            play_count = 3
            "#,
        )
        .unwrap();

        assert_eq!(presets.names(), vec!["blink", "drawer_open"]);

        let drawer = presets.get("drawer_open").unwrap();
        assert_eq!(drawer.duration, 0.35);
        assert!(matches!(
            drawer.easing,
            Easing::Styled(EasingStyle::Quint, EasingDirection::Out)
        ));

        let blink = presets.get("blink").unwrap();
        assert_eq!(blink.repeat_count, 2);
        assert!(matches!(blink.easing, Easing::Linear));
        assert!(presets.get("missing").is_none());
    }

    #[test]
    fn test_invalid_preset_names_the_culprit() {
        let err = TimingPresets::from_toml_str(
            r#"
            [presets.instant]
            style = "Sine"
            "#,
        )
        .unwrap_err();

        match err {
            TweenError::Presets(message) => assert!(message.contains("instant")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_toml() {
        let err = TimingPresets::from_toml_str("[presets.broken\nduration = ").unwrap_err();
        assert!(matches!(err, TweenError::Presets(_)));
    }

    #[test]
    fn test_empty_document() {
        assert!(TimingPresets::from_toml_str("").unwrap().is_empty());
    }

    #[test]
    fn test_merge_replaces_by_name() {
        let mut presets = TimingPresets::builtin();
        let before = presets.len();

        let mut custom = TimingPresets::new();
        custom.insert("fade_in", TweenConfig::new(1.5));
        custom.insert("linger", TweenConfig::new(4.0));
        presets.merge(custom);

        assert_eq!(presets.len(), before + 1);
        assert_eq!(presets.get("fade_in").unwrap().duration, 1.5);
    }
}
