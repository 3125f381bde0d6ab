pub type Metres = f64;

/// A point within the installation space.
pub type Point2 = cgmath::Point2<Metres>;

/// A displacement within the installation space.
pub type Vector2 = cgmath::Vector2<Metres>;

/// Shorthand for constructing a `Point2` in metres.
pub fn pt2(x: Metres, y: Metres) -> Point2 {
    Point2::new(x, y)
}
