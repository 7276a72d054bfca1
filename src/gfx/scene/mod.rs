//! # Scene Management Module
//!
//! The scene is deliberately flat: a list of [`Shape`]s drawn with shared
//! meshes, and at most one [`TextMesh`].
//!
//! - [`Scene`] - container for shapes and text
//! - [`Shape`] - one placed torus or cube with its spin speed
//! - [`ScenePopulator`] - one-shot random placement from a [`SceneRecipe`]

pub mod populator;
pub mod scene;
pub mod shape;

// Re-export main types
pub use populator::{random_shape, ScenePopulator, SceneRecipe, TextSpec};
pub use scene::{Scene, TextMesh};
pub use shape::{Shape, ShapeKind};
