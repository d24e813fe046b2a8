//! Compass geometry: 0° points north (+y) and angles grow clockwise.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Point `distance` away along compass `heading`.
    pub fn project(self, heading: f64, distance: f64) -> Point {
        let radians = heading.to_radians();
        Point::new(
            self.x + radians.sin() * distance,
            self.y + radians.cos() * distance,
        )
    }

    /// Point at fraction `t` of the segment from `self` to `other`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Angle in `[0, 360)`.
pub fn normalize_absolute(degrees: f64) -> f64 {
    let angle = degrees.rem_euclid(360.0);
    if angle >= 360.0 { 0.0 } else { angle }
}

/// Angle in `(-180, 180]`.
pub fn normalize_relative(degrees: f64) -> f64 {
    let angle = normalize_absolute(degrees);
    if angle > 180.0 { angle - 360.0 } else { angle }
}

/// Compass bearing from `from` to `to`.
pub fn absolute_bearing(from: Point, to: Point) -> f64 {
    normalize_absolute((to.x - from.x).atan2(to.y - from.y).to_degrees())
}

/// Whether turning from `start` by `delta` degrees passes over `target`,
/// widened by `tolerance` on both ends.
pub fn within_sweep(start: f64, delta: f64, target: f64, tolerance: f64) -> bool {
    if delta.abs() >= 360.0 {
        return true;
    }
    let offset = normalize_relative(target - start);
    let (low, high) = if delta >= 0.0 {
        (-tolerance, delta + tolerance)
    } else {
        (delta - tolerance, tolerance)
    };
    // the arc may wrap past ±180, so also try the offset one turn around
    [offset, offset - 360.0, offset + 360.0]
        .into_iter()
        .any(|angle| (low..=high).contains(&angle))
}

/// Fraction of the segment `from..to` at which a moving point first comes
/// within `radius` of `center`.
pub fn first_contact(from: Point, to: Point, center: Point, radius: f64) -> Option<f64> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let (fx, fy) = (from.x - center.x, from.y - center.y);

    let c = fx * fx + fy * fy - radius * radius;
    if c <= 0.0 {
        // already touching: only motion toward the center counts
        return (fx * dx + fy * dy < 0.0).then_some(0.0);
    }

    let a = dx * dx + dy * dy;
    if a == 0.0 {
        return None;
    }
    let b = 2.0 * (fx * dx + fy * dy);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Distance from `from`, inside a `width` x `height` field, to the edge
/// along compass `heading`.
pub fn distance_to_edge(from: Point, heading: f64, width: f64, height: f64) -> f64 {
    let radians = heading.to_radians();
    let (sin, cos) = (radians.sin(), radians.cos());

    let along_x = if sin > f64::EPSILON {
        (width - from.x) / sin
    } else if sin < -f64::EPSILON {
        -from.x / sin
    } else {
        f64::INFINITY
    };
    let along_y = if cos > f64::EPSILON {
        (height - from.y) / cos
    } else if cos < -f64::EPSILON {
        -from.y / cos
    } else {
        f64::INFINITY
    };

    along_x.min(along_y).max(0.0)
}
