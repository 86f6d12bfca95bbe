mod shapes;

pub use shapes::{Circle, Rect};
