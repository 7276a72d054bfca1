//! Command line options and the resolved viewer configuration

use std::path::PathBuf;

use cgmath::Vector3;
use clap::{Parser, ValueEnum};

use crate::assets;
use crate::error::ViewerError;
use crate::gfx::camera::CameraTween;
use crate::gfx::geometry::TextParams;
use crate::gfx::scene::{SceneRecipe, TextSpec};

pub const DEFAULT_TEXT: &str = "Hello world";
pub const DEFAULT_FONT: &str = "assets/fonts/IBMPlexSans-Regular.ttf";

/// Scene variant to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Toruses and cubes with text and a camera fly-in
    Mixed,
    /// Toruses with text
    Donuts,
    /// Cubes only
    Cubes,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "orbitscape", version, about = "Spinning shapes and 3D text under an orbit camera")]
pub struct Args {
    #[arg(long, value_enum, default_value_t = Preset::Mixed)]
    pub preset: Preset,

    /// Text to extrude
    #[arg(long, env = "ORBITSCAPE_TEXT", default_value = DEFAULT_TEXT)]
    pub value: String,

    /// Number of toruses, overriding the preset
    #[arg(long)]
    pub donuts: Option<usize>,

    /// Number of cubes, overriding the preset
    #[arg(long)]
    pub cubes: Option<usize>,

    /// Edge length of the placement cube, overriding the preset
    #[arg(long, allow_negative_numbers = true)]
    pub bound: Option<f32>,

    /// Leave the text out
    #[arg(long)]
    pub no_text: bool,

    /// TrueType or OpenType font used for the text
    #[arg(long, default_value = DEFAULT_FONT)]
    pub font: PathBuf,

    /// Seed for shape placement
    #[arg(long)]
    pub seed: Option<u64>,

    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Wait for vertical sync when presenting
    #[arg(long)]
    pub vsync: bool,

    /// Start at the final camera position instead of flying in
    #[arg(long)]
    pub no_intro: bool,
}

impl Args {
    /// Applies the overrides on top of the chosen preset and validates
    pub fn resolve(self) -> Result<ViewerConfig, ViewerError> {
        let mut config = ViewerConfig::preset(self.preset);

        if let Some(donuts) = self.donuts {
            config.recipe.donuts = donuts;
        }
        if let Some(cubes) = self.cubes {
            config.recipe.cubes = cubes;
        }
        if let Some(bound) = self.bound {
            config.recipe.bound = bound;
        }

        if self.no_text {
            config.recipe.text = None;
        } else if let Some(text) = config.recipe.text.as_mut() {
            text.value = self.value;
            text.font_path = self.font;
        }

        if self.no_intro {
            if let Some(tween) = config.intro.take() {
                config.camera_position = tween.to;
            }
        }

        config.seed = self.seed;
        config.width = self.width;
        config.height = self.height;
        config.vsync = self.vsync;

        config.validate()?;
        Ok(config)
    }
}

/// Everything the viewer needs to start
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub preset: Preset,
    pub recipe: SceneRecipe,
    /// Initial camera eye; the camera always looks at the origin
    pub camera_position: Vector3<f32>,
    pub intro: Option<CameraTween>,
    pub seed: Option<u64>,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl ViewerConfig {
    /// Built-in settings of a preset
    pub fn preset(preset: Preset) -> Self {
        let text = Some(TextSpec {
            value: DEFAULT_TEXT.to_string(),
            font_path: PathBuf::from(DEFAULT_FONT),
            fallback_fonts: assets::system_fonts(),
            params: TextParams::default(),
        });

        let (recipe, camera_position, intro) = match preset {
            Preset::Mixed => {
                let from = Vector3::new(-30.0, 30.0, 50.0);
                let to = Vector3::new(0.0, 1.0, 4.0);
                (
                    SceneRecipe {
                        donuts: 100,
                        cubes: 100,
                        bound: 15.0,
                        text,
                    },
                    from,
                    Some(CameraTween::new(from, to, 1.5)),
                )
            }
            Preset::Donuts => (
                SceneRecipe {
                    donuts: 150,
                    cubes: 0,
                    bound: 10.0,
                    text,
                },
                Vector3::new(1.0, 1.0, 4.0),
                None,
            ),
            Preset::Cubes => (
                SceneRecipe {
                    donuts: 0,
                    cubes: 150,
                    bound: 10.0,
                    text: None,
                },
                Vector3::new(0.0, 0.0, 6.0),
                None,
            ),
        };

        Self {
            preset,
            recipe,
            camera_position,
            intro,
            seed: None,
            width: 1200,
            height: 800,
            vsync: false,
        }
    }

    pub fn validate(&self) -> Result<(), ViewerError> {
        let bound = self.recipe.bound;
        if !bound.is_finite() || bound <= 0.0 {
            return Err(ViewerError::InvalidConfig(format!(
                "bound must be a positive number, got {}",
                bound
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ViewerError::InvalidConfig(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if let Some(text) = &self.recipe.text {
            if text.value.trim().is_empty() {
                return Err(ViewerError::InvalidConfig(
                    "text is empty; pass --no-text to disable it".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<ViewerConfig, ViewerError> {
        let mut argv = vec!["orbitscape"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv)
            .expect("arguments should parse")
            .resolve()
    }

    #[test]
    fn test_default_is_mixed_preset() {
        let config = parse(&["--value", "Hello world"]).unwrap();
        assert_eq!(config.preset, Preset::Mixed);
        assert_eq!(config.recipe.donuts, 100);
        assert_eq!(config.recipe.cubes, 100);
        assert_eq!(config.recipe.bound, 15.0);
        assert_eq!(config.camera_position, Vector3::new(-30.0, 30.0, 50.0));
        let tween = config.intro.unwrap();
        assert_eq!(tween.to, Vector3::new(0.0, 1.0, 4.0));
        assert_eq!(tween.duration, 1.5);
        assert_eq!((config.width, config.height), (1200, 800));
        assert!(!config.vsync);
    }

    #[test]
    fn test_presets() {
        let donuts = parse(&["--preset", "donuts", "--value", "hi"]).unwrap();
        assert_eq!((donuts.recipe.donuts, donuts.recipe.cubes), (150, 0));
        assert_eq!(donuts.recipe.bound, 10.0);
        assert_eq!(donuts.recipe.text.unwrap().value, "hi");
        assert!(donuts.intro.is_none());

        let cubes = parse(&["--preset", "cubes"]).unwrap();
        assert_eq!((cubes.recipe.donuts, cubes.recipe.cubes), (0, 150));
        assert!(cubes.recipe.text.is_none());
        assert_eq!(cubes.camera_position, Vector3::new(0.0, 0.0, 6.0));
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--donuts", "3", "--cubes", "4", "--bound", "2.5", "--seed", "9", "--no-text",
            "--font", "/tmp/x.ttf", "--vsync",
        ])
        .unwrap();
        assert_eq!(config.recipe.shape_count(), 7);
        assert_eq!(config.recipe.bound, 2.5);
        assert_eq!(config.seed, Some(9));
        assert!(config.recipe.text.is_none());
        assert!(config.vsync);
    }

    #[test]
    fn test_custom_font_and_text() {
        let config = parse(&["--value", "orbit", "--font", "fonts/a.otf"]).unwrap();
        let text = config.recipe.text.unwrap();
        assert_eq!(text.value, "orbit");
        assert_eq!(text.font_path, PathBuf::from("fonts/a.otf"));
    }

    #[test]
    fn test_no_intro_starts_at_destination() {
        let config = parse(&["--no-intro", "--value", "x"]).unwrap();
        assert!(config.intro.is_none());
        assert_eq!(config.camera_position, Vector3::new(0.0, 1.0, 4.0));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            parse(&["--bound", "0", "--value", "x"]),
            Err(ViewerError::InvalidConfig(_))
        ));
        assert!(matches!(
            parse(&["--bound", "-3", "--value", "x"]),
            Err(ViewerError::InvalidConfig(_))
        ));
        assert!(matches!(
            parse(&["--bound", "NaN", "--value", "x"]),
            Err(ViewerError::InvalidConfig(_))
        ));
        assert!(matches!(
            parse(&["--width", "0", "--value", "x"]),
            Err(ViewerError::InvalidConfig(_))
        ));
        assert!(matches!(
            parse(&["--value", "   "]),
            Err(ViewerError::InvalidConfig(_))
        ));
        assert!(parse(&["--value", "", "--no-text"]).is_ok());
    }
}
