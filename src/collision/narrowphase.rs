use glam::Vec3;

use crate::{core::collider::OrientedBox, utils::allocator::EntityId};

/// Bias added to every `|R|` entry so nearly parallel edges do not produce
/// false separations from rounding.
const ABS_R_EPSILON: f32 = 1e-6;
/// Cross products of edges shorter than this are treated as parallel and skipped.
const EDGE_AXIS_EPSILON: f32 = 1e-3;
/// Edge axes must beat face axes by this factor to be picked; keeps face
/// contacts (which clip to a full manifold) for near-ties.
const EDGE_PREFERENCE: f32 = 1.05;

/// Result of a successful separating-axis test for one pair of boxes.
///
/// `code` 1–3 names a face of `a`, 4–6 a face of `b`, and `7 + 3i + j` the
/// cross product of edge `i` of `a` with edge `j` of `b`.
#[derive(Debug, Clone, Copy)]
pub struct CollisionInfo {
    pub a: OrientedBox,
    pub b: OrientedBox,
    /// `b.center - a.center` in world space.
    pub relative_position: Vec3,
    /// `relative_position` expressed in `a`'s frame.
    pub relative_position_rotated: Vec3,
    /// `r[i][j] = a.axis[i] · b.axis[j]`.
    pub r: [[f32; 3]; 3],
    pub abs_r: [[f32; 3]; 3],
    /// Largest (least negative) axis overlap found; `-r_min` is the depth.
    pub r_min: f32,
    /// Unit axis of `r_min`, before sign correction.
    pub n_min: Vec3,
    pub code: u8,
    pub tested_axis_0: usize,
    pub tested_axis_1: usize,
    /// Set when `b` lies on the negative side of `n_min`.
    pub invert_normal: bool,
}

impl CollisionInfo {
    pub fn body_a(&self) -> EntityId {
        self.a.body
    }

    pub fn body_b(&self) -> EntityId {
        self.b.body
    }

    /// Contact normal pointing from `a` toward `b`.
    pub fn normal(&self) -> Vec3 {
        if self.invert_normal {
            -self.n_min
        } else {
            self.n_min
        }
    }

    pub fn depth(&self) -> f32 {
        -self.r_min
    }

    pub fn is_face(&self) -> bool {
        self.code <= 6
    }

    pub fn is_edge_edge(&self) -> bool {
        self.code >= 7
    }
}

/// Fifteen-axis separating-axis test between two oriented boxes.
pub struct SeparatingAxisTest;

impl SeparatingAxisTest {
    /// Returns `None` as soon as any axis separates the boxes, otherwise the
    /// axis of least penetration.
    pub fn test(a: &OrientedBox, b: &OrientedBox) -> Option<CollisionInfo> {
        let relative_position = b.center - a.center;
        let t = Vec3::new(
            relative_position.dot(a.axis[0]),
            relative_position.dot(a.axis[1]),
            relative_position.dot(a.axis[2]),
        );

        let mut r = [[0.0; 3]; 3];
        let mut abs_r = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                r[i][j] = a.axis[i].dot(b.axis[j]);
                abs_r[i][j] = r[i][j].abs() + ABS_R_EPSILON;
            }
        }

        let mut best = Candidate {
            overlap: f32::MIN,
            axis: Vec3::ZERO,
            invert: false,
            code: 0,
            tested: (0, 0),
        };

        for i in 0..3 {
            let ra = a.extents[i];
            let rb = (0..3).map(|j| b.extents[j] * abs_r[i][j]).sum::<f32>();
            let projection = t[i];
            let overlap = projection.abs() - (ra + rb);
            if overlap > 0.0 {
                return None;
            }
            if overlap > best.overlap {
                best = Candidate {
                    overlap,
                    axis: a.axis[i],
                    invert: projection < 0.0,
                    code: 1 + i as u8,
                    tested: (i, i),
                };
            }
        }

        for j in 0..3 {
            let ra = (0..3).map(|i| a.extents[i] * abs_r[i][j]).sum::<f32>();
            let rb = b.extents[j];
            let projection = (0..3).map(|i| t[i] * r[i][j]).sum::<f32>();
            let overlap = projection.abs() - (ra + rb);
            if overlap > 0.0 {
                return None;
            }
            if overlap > best.overlap {
                best = Candidate {
                    overlap,
                    axis: b.axis[j],
                    invert: projection < 0.0,
                    code: 4 + j as u8,
                    tested: (j, j),
                };
            }
        }

        for i in 0..3 {
            for j in 0..3 {
                let axis = a.axis[i].cross(b.axis[j]);
                let length = axis.length();
                if length < EDGE_AXIS_EPSILON {
                    continue;
                }
                let unit = axis / length;
                let projection = relative_position.dot(unit);
                let overlap =
                    projection.abs() - (a.projected_radius(unit) + b.projected_radius(unit));
                if overlap > 0.0 {
                    return None;
                }
                if overlap * EDGE_PREFERENCE > best.overlap {
                    best = Candidate {
                        overlap,
                        axis: unit,
                        invert: projection < 0.0,
                        code: 7 + (3 * i + j) as u8,
                        tested: (i, j),
                    };
                }
            }
        }

        Some(CollisionInfo {
            a: *a,
            b: *b,
            relative_position,
            relative_position_rotated: t,
            r,
            abs_r,
            r_min: best.overlap,
            n_min: best.axis,
            code: best.code,
            tested_axis_0: best.tested.0,
            tested_axis_1: best.tested.1,
            invert_normal: best.invert,
        })
    }
}

struct Candidate {
    overlap: f32,
    axis: Vec3,
    invert: bool,
    code: u8,
    tested: (usize, usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rigidbody::RigidBody;
    use approx::assert_relative_eq;
    use glam::Quat;

    fn obb(index: u32, position: Vec3, orientation: Quat) -> OrientedBox {
        let mut body = RigidBody::cuboid(Vec3::splat(0.5), 1.0)
            .with_position(position)
            .with_orientation(orientation);
        body.id = EntityId::from_index(index);
        OrientedBox::from_body(&body)
    }

    #[test]
    fn separated_boxes_report_none() {
        let a = obb(0, Vec3::ZERO, Quat::IDENTITY);
        let b = obb(1, Vec3::new(1.2, 0.0, 0.0), Quat::IDENTITY);
        assert!(SeparatingAxisTest::test(&a, &b).is_none());
    }

    #[test]
    fn face_overlap_reports_axis_and_depth() {
        let a = obb(0, Vec3::ZERO, Quat::IDENTITY);
        let b = obb(1, Vec3::new(0.0, 0.9, 0.0), Quat::IDENTITY);
        let info = SeparatingAxisTest::test(&a, &b).expect("overlapping boxes");
        assert_eq!(info.code, 2);
        assert!(info.is_face());
        assert_relative_eq!(info.depth(), 0.1, epsilon = 1e-4);
        assert!(info.normal().dot(Vec3::Y) > 0.999);
    }

    #[test]
    fn normal_points_from_a_to_b() {
        let a = obb(0, Vec3::ZERO, Quat::IDENTITY);
        let b = obb(1, Vec3::new(-0.8, 0.0, 0.0), Quat::IDENTITY);
        let info = SeparatingAxisTest::test(&a, &b).expect("overlapping boxes");
        assert!(info.invert_normal);
        assert!(info.normal().dot(Vec3::NEG_X) > 0.999);
        assert_relative_eq!(info.depth(), 0.2, epsilon = 1e-4);
    }

    #[test]
    fn rotated_box_resting_on_face_uses_reference_face_of_other_box() {
        let a = obb(0, Vec3::ZERO, Quat::from_rotation_y(0.7));
        let b = obb(1, Vec3::new(0.1, 0.95, 0.0), Quat::IDENTITY);
        let info = SeparatingAxisTest::test(&a, &b).expect("overlapping boxes");
        assert!(info.is_face());
        assert_relative_eq!(info.depth(), 0.05, epsilon = 1e-4);
        assert!(info.normal().dot(Vec3::Y) > 0.999);
    }

    #[test]
    fn crossed_edges_report_edge_code() {
        // Two boxes each rotated 45° so that their edges cross like an X.
        let a = obb(0, Vec3::ZERO, Quat::from_rotation_x(std::f32::consts::FRAC_PI_4));
        let b = obb(
            1,
            Vec3::new(0.0, 1.35, 0.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_4),
        );
        let info = SeparatingAxisTest::test(&a, &b).expect("crossed edges overlap");
        assert!(info.is_edge_edge(), "code was {}", info.code);
        let expected = 2.0_f32.sqrt() - 1.35;
        assert_relative_eq!(info.depth(), expected, epsilon = 1e-4);
        assert!(info.normal().dot(Vec3::Y) > 0.999);
    }

    #[test]
    fn corner_gap_is_found_by_an_edge_axis() {
        // Face axes all overlap, but the rotated edges leave a gap.
        let a = obb(0, Vec3::ZERO, Quat::from_rotation_x(std::f32::consts::FRAC_PI_4));
        let b = obb(
            1,
            Vec3::new(0.0, 1.45, 0.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_4),
        );
        assert!(SeparatingAxisTest::test(&a, &b).is_none());
    }
}
