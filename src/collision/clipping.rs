use glam::{Vec2, Vec3};

/// Most vertices a quad clipped by a rectangle can have.
pub const MAX_CLIP_POINTS: usize = 8;

const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

fn outcode(point: Vec2, half: Vec2) -> u8 {
    let mut code = 0;
    if point.x < -half.x {
        code |= LEFT;
    } else if point.x > half.x {
        code |= RIGHT;
    }
    if point.y < -half.y {
        code |= BOTTOM;
    } else if point.y > half.y {
        code |= TOP;
    }
    code
}

/// Clips a quadrilateral against the centered rectangle `[-half, half]`.
///
/// Quads fully inside are returned as-is and quads fully beyond one edge are
/// rejected from their outcodes alone; everything else is chopped edge by
/// edge. Points on the rectangle boundary count as inside. The result holds at
/// most [`MAX_CLIP_POINTS`] vertices and is empty when the shapes are disjoint.
pub fn intersect_rect_quad(half: Vec2, quad: [Vec2; 4]) -> Vec<Vec2> {
    let codes = quad.map(|p| outcode(p, half));
    if codes.iter().all(|&c| c == 0) {
        return quad.to_vec();
    }
    if codes.iter().fold(0xff, |acc, &c| acc & c) != 0 {
        return Vec::new();
    }

    let mut polygon = quad.to_vec();
    let mut chopped = Vec::with_capacity(MAX_CLIP_POINTS);
    for dir in 0..2 {
        for sign in [-1.0_f32, 1.0] {
            chopped.clear();
            let limit = half[dir];
            let inside = |p: Vec2| sign * p[dir] <= limit;

            for i in 0..polygon.len() {
                let current = polygon[i];
                let next = polygon[(i + 1) % polygon.len()];

                if inside(current) {
                    chopped.push(current);
                    if chopped.len() == MAX_CLIP_POINTS {
                        return chopped;
                    }
                }
                if inside(current) != inside(next) {
                    let mut crossing = Vec2::ZERO;
                    let other = 1 - dir;
                    crossing[other] = current[other]
                        + (next[other] - current[other]) / (next[dir] - current[dir])
                            * (sign * limit - current[dir]);
                    crossing[dir] = sign * limit;
                    chopped.push(crossing);
                    if chopped.len() == MAX_CLIP_POINTS {
                        return chopped;
                    }
                }
            }

            std::mem::swap(&mut polygon, &mut chopped);
            if polygon.is_empty() {
                return polygon;
            }
        }
    }
    polygon
}

/// Closest points between segments `p1-q1` and `p2-q2`, clamped to both segments.
pub fn closest_points_on_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    const EPSILON: f32 = 1e-8;

    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    if a <= EPSILON && e <= EPSILON {
        return (p1, p2);
    }

    let (s, t) = if a <= EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom.abs() > EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (p1 + d1 * s, p2 + d2 * t)
}
