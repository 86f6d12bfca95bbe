use crate::physics::{Circle, Rect};

/// Static collision rectangle supplied by the level loader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub rect: Rect,
}

impl Obstacle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            rect: Rect::new(x, y, width, height),
        }
    }

    #[inline]
    pub fn blocks(&self, circle: &Circle) -> bool {
        circle.overlaps_rect(&self.rect)
    }
}

#[derive(Debug, Clone)]
pub struct ArenaMap {
    width: f32,
    height: f32,
    obstacles: Vec<Obstacle>,
}

impl ArenaMap {
    pub fn new(width: f32, height: f32, obstacles: Vec<Obstacle>) -> Self {
        Self {
            width,
            height,
            obstacles,
        }
    }

    pub fn open(width: f32, height: f32) -> Self {
        Self::new(width, height, Vec::new())
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn is_blocked(&self, circle: &Circle) -> bool {
        self.obstacles.iter().any(|o| o.blocks(circle))
    }
}
