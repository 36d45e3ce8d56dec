//! Scene documents: a canvas description plus an ordered list of shapes,
//! stored as JSON and replayed through a [`DrawEngine`].

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::display::{PixelBuffer, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::draw::DrawEngine;
use crate::error::Result;
use crate::geometry::Point;

/// One drawing operation. Each variant maps onto the [`DrawEngine`] method
/// of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Point {
        at: Point,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
    },
    Rect {
        from: Point,
        to: Point,
        color: Color,
    },
    FillRect {
        from: Point,
        to: Point,
        color: Color,
    },
    Circle {
        center: Point,
        radius: u32,
        color: Color,
    },
    FillCircle {
        center: Point,
        radius: u32,
        color: Color,
    },
    Triangle {
        points: [Point; 3],
        color: Color,
    },
    Path {
        points: Vec<Point>,
        color: Color,
    },
    FillPath {
        points: Vec<Point>,
        color: Color,
    },
    Bezier {
        points: Vec<Point>,
        color: Color,
        /// Curve parameter step; omitted means one sample per pixel of span
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    /// Whole-buffer overwrite, discarding nothing but the buffer contents
    Fill {
        color: Color,
    },
}

impl Shape {
    /// Draw this shape with `engine`
    pub fn draw(&self, engine: &mut DrawEngine<'_>) -> Result<()> {
        match self {
            Self::Point { at, color } => engine.point(*at, *color),
            Self::Line { from, to, color } => engine.line(*from, *to, *color),
            Self::Rect { from, to, color } => engine.rect(*from, *to, *color),
            Self::FillRect { from, to, color } => engine.fill_rect(*from, *to, *color),
            Self::Circle {
                center,
                radius,
                color,
            } => engine.circle(*center, *radius, *color),
            Self::FillCircle {
                center,
                radius,
                color,
            } => engine.fill_circle(*center, *radius, *color),
            Self::Triangle { points, color } => {
                engine.triangle(points[0], points[1], points[2], *color);
            },
            Self::Path { points, color } => engine.path(points, *color)?,
            Self::FillPath { points, color } => engine.fill_path(points, *color)?,
            Self::Bezier {
                points,
                color,
                step: Some(step),
            } => engine.bezier_with_step(points, *step, *color)?,
            Self::Bezier {
                points,
                color,
                step: None,
            } => engine.bezier(points, *color)?,
            Self::Fill { color } => engine.fill(*color),
        }
        Ok(())
    }
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_blending() -> bool {
    true
}

fn default_line_thickness() -> f64 {
    1.0
}

/// A canvas and the shapes drawn on it, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Initial fill; the buffer starts transparent black when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    #[serde(default = "default_blending")]
    pub blending: bool,
    #[serde(default = "default_line_thickness")]
    pub line_thickness: f64,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl Scene {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            background: None,
            blending: default_blending(),
            line_thickness: default_line_thickness(),
            shapes: Vec::new(),
        }
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Parse a scene from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save scene to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load scene from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading scene from {}", path.display());
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Replay every shape onto `engine`, stopping at the first failure.
    /// Shapes drawn before the failing one stay on the buffer.
    pub fn draw(&self, engine: &mut DrawEngine<'_>) -> Result<()> {
        engine.set_blending(self.blending);
        engine.set_line_thickness(self.line_thickness);
        if let Some(bg) = self.background {
            engine.fill(bg);
        }
        for shape in &self.shapes {
            shape.draw(engine)?;
        }
        Ok(())
    }

    /// Render into a freshly allocated buffer
    pub fn render(&self) -> Result<PixelBuffer> {
        let mut buffer = PixelBuffer::new(self.width, self.height)?;
        self.draw(&mut DrawEngine::new(&mut buffer))?;
        info!(
            "rendered scene '{}' ({}x{}, {} shapes)",
            self.name,
            self.width,
            self.height,
            self.shapes.len()
        );
        Ok(buffer)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("untitled", DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}
