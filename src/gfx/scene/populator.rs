//! One-time scene population
//!
//! Shapes are scattered uniformly through a cube of edge `bound` centred on
//! the origin. The optional text mesh needs a font, so populating only starts
//! its load; the viewer context inserts the mesh when the load completes.

use std::f32::consts::PI;
use std::path::PathBuf;

use cgmath::Vector3;
use log::{debug, info};
use rand::Rng;

use crate::assets::{self, PendingText};
use crate::gfx::geometry::TextParams;

use super::scene::Scene;
use super::shape::{Shape, ShapeKind};

/// Text to extrude and the font to build it from
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpec {
    pub value: String,
    pub font_path: PathBuf,
    /// Tried in order when `font_path` cannot be loaded
    pub fallback_fonts: Vec<PathBuf>,
    pub params: TextParams,
}

/// What the populator builds
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRecipe {
    pub donuts: usize,
    pub cubes: usize,
    /// Edge length of the placement cube
    pub bound: f32,
    pub text: Option<TextSpec>,
}

impl SceneRecipe {
    pub fn shape_count(&self) -> usize {
        self.donuts + self.cubes
    }
}

/// Builds the static scene content exactly once
///
/// [`ScenePopulator::populate`] takes `self`, so a populator cannot run twice.
/// `Scene::add_shapes` itself has no duplicate guard.
#[derive(Debug)]
pub struct ScenePopulator {
    recipe: SceneRecipe,
}

impl ScenePopulator {
    pub fn new(recipe: SceneRecipe) -> Self {
        Self { recipe }
    }

    /// Inserts all shapes as one batch and starts the font load, if any
    pub fn populate<R>(self, scene: &mut Scene, rng: &mut R) -> Option<PendingText>
    where
        R: Rng,
    {
        let SceneRecipe {
            donuts,
            cubes,
            bound,
            text,
        } = self.recipe;

        let mut shapes = Vec::with_capacity(donuts + cubes);
        shapes.extend((0..donuts).map(|_| random_shape(ShapeKind::Torus, bound, rng)));
        shapes.extend((0..cubes).map(|_| random_shape(ShapeKind::Cube, bound, rng)));
        scene.add_shapes(shapes);

        info!(
            "Populated scene with {} toruses and {} cubes (bound {})",
            donuts, cubes, bound
        );

        text.map(|spec| {
            debug!("Loading font {} for text {:?}", spec.font_path.display(), spec.value);
            let load = assets::load_font(spec.font_path.clone(), spec.fallback_fonts.clone());
            PendingText::new(spec, load)
        })
    }
}

/// A shape with uniformly random placement, orientation, scale and spin
pub fn random_shape<R>(kind: ShapeKind, bound: f32, rng: &mut R) -> Shape
where
    R: Rng,
{
    let position = Vector3::new(
        (rng.random::<f32>() - 0.5) * bound,
        (rng.random::<f32>() - 0.5) * bound,
        (rng.random::<f32>() - 0.5) * bound,
    );
    let rotation = Vector3::new(rng.random::<f32>() * PI, rng.random::<f32>() * PI, 0.0);
    let scale = rng.random::<f32>();
    let rotation_speed = rng.random::<f32>();

    Shape {
        kind,
        position,
        rotation,
        scale,
        rotation_speed: Some(rotation_speed),
    }
}
