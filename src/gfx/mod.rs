//! # Graphics Module
//!
//! Everything that ends up on screen: the orbit camera, mesh generation,
//! the flat shape scene and the wgpu renderer that draws it.
//!
//! - **Camera System** ([`camera`]) - Orbit camera, damped controls and the intro tween
//! - **Geometry** ([`geometry`]) - Torus, cube and extruded text meshes
//! - **Rendering Pipeline** ([`rendering`]) - Instanced normal-shaded drawing
//! - **Scene Management** ([`scene`]) - Shapes, text and random population
//! - **Resource Management** ([`resources`]) - Depth buffer and other GPU textures
//!
//! ```no_run
//! use orbitscape::gfx::scene::{Scene, ScenePopulator, SceneRecipe};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut scene = Scene::new();
//! let recipe = SceneRecipe { donuts: 10, cubes: 10, bound: 15.0, text: None };
//! ScenePopulator::new(recipe).populate(&mut scene, &mut StdRng::seed_from_u64(1));
//! assert_eq!(scene.shapes().len(), 20);
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
