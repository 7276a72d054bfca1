use cgmath::Matrix4;

use crate::gfx::geometry::GeometryData;

use super::shape::{Shape, ShapeKind};

/// Centred text geometry together with the string it spells
#[derive(Debug, Clone, PartialEq)]
pub struct TextMesh {
    pub value: String,
    pub geometry: GeometryData,
}

/// Everything the viewer draws: a flat list of shapes and at most one text mesh
#[derive(Debug, Clone, Default)]
pub struct Scene {
    shapes: Vec<Shape>,
    text: Option<TextMesh>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a batch of shapes, keeping their order
    pub fn add_shapes<I>(&mut self, shapes: I)
    where
        I: IntoIterator<Item = Shape>,
    {
        self.shapes.extend(shapes);
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn count(&self, kind: ShapeKind) -> usize {
        self.shapes.iter().filter(|s| s.kind == kind).count()
    }

    /// Inserts the text mesh. Returns false and keeps the existing mesh if
    /// one is already present.
    pub fn set_text(&mut self, text: TextMesh) -> bool {
        if self.text.is_some() {
            return false;
        }
        self.text = Some(text);
        true
    }

    pub fn text(&self) -> Option<&TextMesh> {
        self.text.as_ref()
    }

    /// Sets every spinning shape's rotation for `elapsed` seconds since loop start
    pub fn animate(&mut self, elapsed: f32) {
        for shape in self.shapes.iter_mut() {
            shape.animate(elapsed);
        }
    }

    /// Model matrices of all shapes of `kind`, in insertion order
    pub fn model_matrices(&self, kind: ShapeKind) -> impl Iterator<Item = Matrix4<f32>> + '_ {
        self.shapes
            .iter()
            .filter(move |s| s.kind == kind)
            .map(Shape::model_matrix)
    }
}
