//! Narrative themes and scene prompts.
//!
//! A theme maps to an ordered list of exactly five scene prompts. The
//! catalog is static data: looking up a theme is pure and deterministic,
//! and anything that is unknown or not exactly five scenes long is
//! rejected up front, before any remote call is made.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every narrative is exactly this many scenes.
pub const SCENES_PER_THEME: usize = 5;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("unknown or incomplete theme: {0}")]
    InvalidTheme(String),
}

/// One scene of a narrative: the generation prompt plus optional
/// reference image ids forwarded to the generation API for that scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSpec {
    /// Prompt text sent to the generation API
    pub prompt: String,
    /// Reference image ids included alongside the seed image
    #[serde(default)]
    pub reference_image_ids: Vec<String>,
}

impl SceneSpec {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            reference_image_ids: Vec::new(),
        }
    }

    pub fn with_references(prompt: impl Into<String>, refs: &[&str]) -> Self {
        Self {
            prompt: prompt.into(),
            reference_image_ids: refs.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// A complete theme: id plus its ordered scenes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub scenes: Vec<SceneSpec>,
}

/// Static catalog of built-in themes.
#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    themes: HashMap<String, Vec<SceneSpec>>,
}

impl ThemeCatalog {
    /// Build a catalog from explicit themes. Entries that are not exactly
    /// five scenes long are kept as-is and rejected at lookup time.
    pub fn new(themes: Vec<Theme>) -> Self {
        Self {
            themes: themes.into_iter().map(|t| (t.id, t.scenes)).collect(),
        }
    }

    /// The built-in narrative catalog.
    pub fn builtin() -> Self {
        let mut themes = HashMap::new();

        themes.insert(
            "fairy-tale".to_string(),
            vec![
                SceneSpec::new(
                    "Photorealistic high-fantasy scene in cinematic natural lighting with soft \
                     lens bokeh and magical realism tone. A cute pet wakes up in a sun-dappled \
                     meadow filled with floating golden pollen, soft breeze stirring wildflowers, \
                     and butterflies drifting lazily. Camera static shot, then slow zoom out",
                ),
                SceneSpec::new(
                    "Photorealistic high-fantasy scene in cinematic natural lighting with soft \
                     lens bokeh and magical realism tone. The pet cautiously enters a deep \
                     enchanted forest glowing with bioluminescent mushrooms and twinkling \
                     fireflies. Cool bluish mist rolls between tall ancient trees. Camera pan \
                     right, tracking the pet.",
                ),
                SceneSpec::with_references(
                    "Photorealistic high-fantasy scene in cinematic natural lighting with soft \
                     lens bokeh and magical realism tone. The pet stands at a mossy riverbank. A \
                     menacing frog-dragon slowly rises its head above the water showing its \
                     teeth. Pet looks fearfully at frog-dragon",
                    &["FROG_DRAGON"],
                ),
                SceneSpec::with_references(
                    "Photorealistic high-fantasy scene in cinematic natural lighting with soft \
                     lens bokeh and magical realism tone. The pet sits still on the top of a \
                     glowing iridescent leaf that moves left to right across a sparkling river. \
                     The frog-dragon swims directly behind pet in the water. Wide side tracking \
                     shot on the leaf moving across the river",
                    &["FROG_DRAGON", "LEAF"],
                ),
                SceneSpec::new(
                    "Photorealistic high-fantasy scene in cinematic natural lighting with soft \
                     lens bokeh and magical realism tone. A castle made of glassy crystal and \
                     blooming vines appears through the trees. Forest creatures dance in a \
                     circle around the pet, petals and confetti in the air. Arc shot around the \
                     scene",
                ),
            ],
        );

        themes.insert(
            "crime-drama".to_string(),
            vec![
                SceneSpec::new(
                    "Film noir style: A tough-looking pet detective sits in a dimly lit office, \
                     rain pattering against the window. Venetian blind shadows across the scene. \
                     Slow push in",
                ),
                SceneSpec::new(
                    "The pet detective walks down a foggy alley at night, street lamps creating \
                     pools of light. Mysterious figure disappears around corner. Track forward \
                     following pet",
                ),
                SceneSpec::with_references(
                    "Close-up of pet's paw finding a mysterious glowing object hidden under \
                     newspapers. Lightning flashes outside. Tilt down to object, then zoom in",
                    &["LEAF"],
                ),
                SceneSpec::new(
                    "The pet runs through rain-slicked streets, jumping over obstacles. Neon \
                     signs reflect in puddles. Dynamic tracking shot",
                ),
                SceneSpec::new(
                    "The pet detective stands triumphantly on a rooftop at dawn, city skyline in \
                     background. Wind ruffles their fur heroically. Low angle hero shot, slow \
                     zoom out",
                ),
            ],
        );

        themes.insert(
            "superhero".to_string(),
            vec![
                SceneSpec::with_references(
                    "A regular pet discovers a glowing meteor in their backyard. As they touch \
                     it, colorful energy swirls around them. Orbit around pet",
                    &["LEAF"],
                ),
                SceneSpec::new(
                    "The pet transforms in a burst of light, now wearing a flowing cape and \
                     mask. They test their new flying powers. Vertical tilt following pet's \
                     ascent",
                ),
                SceneSpec::new(
                    "The superhero pet flies between skyscrapers, scanning the city for trouble. \
                     Sun glints off glass buildings. Aerial tracking shot",
                ),
                SceneSpec::new(
                    "The pet swoops down to save a kitten stuck in a tree, using super strength \
                     to gently lift them to safety. Arc shot around the rescue",
                ),
                SceneSpec::with_references(
                    "The superhero pet stands proudly on top of the tallest building, cape \
                     billowing in the wind, city safe below. Dramatic low angle, slow pull back \
                     to reveal cityscape",
                    &["FROG_DRAGON"],
                ),
            ],
        );

        Self { themes }
    }

    /// Look up the ordered scenes for a theme.
    ///
    /// Fails when the id is unknown or the configured list is not exactly
    /// [`SCENES_PER_THEME`] scenes long.
    pub fn scenes(&self, theme_id: &str) -> Result<&[SceneSpec], ThemeError> {
        match self.themes.get(theme_id) {
            Some(scenes) if scenes.len() == SCENES_PER_THEME => Ok(scenes),
            _ => Err(ThemeError::InvalidTheme(theme_id.to_string())),
        }
    }

    /// Ids of all themes in the catalog, sorted for stable output.
    pub fn available_themes(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.themes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Append a small deterministic per-position suffix to a scene prompt.
///
/// The upstream generation API rejects duplicate prompts submitted in
/// quick succession; the suffix keeps each scene's prompt distinct even
/// when a theme reuses wording.
pub fn vary_prompt(prompt: &str, clip_number: usize) -> String {
    const VARIATIONS: [&str; SCENES_PER_THEME] = [
        "",
        "High quality rendering.",
        "Smooth animation.",
        "Professional quality.",
        "Cinematic style.",
    ];

    let variation = VARIATIONS
        .get(clip_number.saturating_sub(1))
        .copied()
        .unwrap_or("");

    if variation.is_empty() {
        prompt.to_string()
    } else {
        format!("{} {}", prompt, variation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_themes_have_five_scenes() {
        let catalog = ThemeCatalog::builtin();
        for id in catalog.available_themes() {
            let scenes = catalog.scenes(id).unwrap();
            assert_eq!(scenes.len(), SCENES_PER_THEME, "theme {}", id);
        }
    }

    #[test]
    fn test_unknown_theme_is_invalid() {
        let catalog = ThemeCatalog::builtin();
        let err = catalog.scenes("space-opera").unwrap_err();
        assert!(matches!(err, ThemeError::InvalidTheme(_)));
    }

    #[test]
    fn test_incomplete_theme_is_invalid() {
        let catalog = ThemeCatalog::new(vec![Theme {
            id: "short".to_string(),
            scenes: vec![SceneSpec::new("only one scene")],
        }]);
        assert!(catalog.scenes("short").is_err());
    }

    #[test]
    fn test_available_themes_sorted() {
        let catalog = ThemeCatalog::builtin();
        assert_eq!(
            catalog.available_themes(),
            vec!["crime-drama", "fairy-tale", "superhero"]
        );
    }

    #[test]
    fn test_vary_prompt_deterministic_per_position() {
        assert_eq!(vary_prompt("A pet", 1), "A pet");
        assert_eq!(vary_prompt("A pet", 2), "A pet High quality rendering.");
        assert_eq!(vary_prompt("A pet", 5), "A pet Cinematic style.");
        // Out-of-range positions fall back to the bare prompt
        assert_eq!(vary_prompt("A pet", 9), "A pet");
    }
}
