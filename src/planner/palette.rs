//! # Emotion → light-color mapping.
//!
//! [`EmotionPalette`] maps emotion labels to the subset of the seven device
//! colors that suits them. The mapping is configurable and extensible:
//! unknown labels fall back to a neutral set, and callers can add or
//! replace entries for their own emotion vocabulary.

use std::collections::HashMap;

use crate::plan::LightColor;

/// Allowed light colors per emotion label, with a neutral fallback.
#[derive(Clone, Debug)]
pub struct EmotionPalette {
    map: HashMap<String, Vec<LightColor>>,
    fallback: Vec<LightColor>,
}

impl Default for EmotionPalette {
    /// Stock mapping:
    /// - `energetic` → red, yellow, cyan
    /// - `happy` → yellow, green, cyan
    /// - `calm` → blue, green, white
    /// - `powerful` → red, purple, blue
    /// - fallback → green, blue, white
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert(
            "energetic".to_string(),
            vec![LightColor::Red, LightColor::Yellow, LightColor::Cyan],
        );
        map.insert(
            "happy".to_string(),
            vec![LightColor::Yellow, LightColor::Green, LightColor::Cyan],
        );
        map.insert(
            "calm".to_string(),
            vec![LightColor::Blue, LightColor::Green, LightColor::White],
        );
        map.insert(
            "powerful".to_string(),
            vec![LightColor::Red, LightColor::Purple, LightColor::Blue],
        );
        Self {
            map,
            fallback: vec![LightColor::Green, LightColor::Blue, LightColor::White],
        }
    }
}

impl EmotionPalette {
    /// Colors allowed for `emotion`; unknown labels get the fallback set.
    pub fn colors_for(&self, emotion: &str) -> &[LightColor] {
        self.map
            .get(emotion)
            .map(Vec::as_slice)
            .unwrap_or(&self.fallback)
    }

    /// Adds or replaces an emotion's color set. Empty sets are ignored.
    pub fn set(&mut self, emotion: impl Into<String>, colors: Vec<LightColor>) {
        if !colors.is_empty() {
            self.map.insert(emotion.into(), colors);
        }
    }

    /// Replaces the fallback set. Empty sets are ignored.
    pub fn set_fallback(&mut self, colors: Vec<LightColor>) {
        if !colors.is_empty() {
            self.fallback = colors;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_mapping() {
        let palette = EmotionPalette::default();
        assert_eq!(
            palette.colors_for("energetic"),
            &[LightColor::Red, LightColor::Yellow, LightColor::Cyan]
        );
    }

    #[test]
    fn test_unknown_emotion_falls_back() {
        let palette = EmotionPalette::default();
        assert_eq!(
            palette.colors_for("wistful"),
            &[LightColor::Green, LightColor::Blue, LightColor::White]
        );
    }

    #[test]
    fn test_extensible() {
        let mut palette = EmotionPalette::default();
        palette.set("wistful", vec![LightColor::Purple]);
        assert_eq!(palette.colors_for("wistful"), &[LightColor::Purple]);

        // Empty sets do not clobber existing entries.
        palette.set("wistful", vec![]);
        assert_eq!(palette.colors_for("wistful"), &[LightColor::Purple]);
    }
}
