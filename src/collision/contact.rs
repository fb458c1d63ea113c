use glam::{Vec2, Vec3};
use log::trace;

use super::{
    clipping::{closest_points_on_segments, intersect_rect_quad},
    narrowphase::CollisionInfo,
};
use crate::{
    config::{SimulationConfig, SolverConfig},
    core::{collider::OrientedBox, rigidbody::RigidBody},
    dynamics::solver::Contact,
    utils::allocator::{Arena, EntityId},
};

/// Incident faces nearly perpendicular to the reference face cannot be
/// mapped back from the clip plane.
const PROJECTION_EPSILON: f32 = 1e-6;

/// World-space point and depth before any body data is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    pub position: Vec3,
    pub depth: f32,
}

/// Every contact generated for one colliding pair.
#[derive(Debug, Clone)]
pub struct ContactManifold {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub contacts: Vec<Contact>,
}

impl ContactManifold {
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }
}

/// Turns separating-axis results into prepared contacts.
#[derive(Debug, Clone)]
pub struct ContactGenerator {
    dt: f32,
    config: SolverConfig,
}

impl ContactGenerator {
    pub fn new(dt: f32, config: SolverConfig) -> Self {
        Self { dt, config }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.timestep, config.solver)
    }

    /// Builds the contacts of one pair. A static body never appears in a
    /// contact: the dynamic body takes slot 0 and the static side becomes a
    /// world anchor, with the normal flipped when needed so it still points
    /// from slot 0 toward the anchor.
    pub fn generate(&self, info: &CollisionInfo, bodies: &Arena<RigidBody>) -> ContactManifold {
        let mut manifold = ContactManifold {
            body_a: info.body_a(),
            body_b: info.body_b(),
            contacts: Vec::new(),
        };
        let (Some(a), Some(b)) = (bodies.get(info.body_a()), bodies.get(info.body_b())) else {
            return manifold;
        };

        let normal = info.normal();
        let (first, second, normal) = match (a.is_static(), b.is_static()) {
            (false, false) => (a, Some(b), normal),
            (false, true) => (a, None, normal),
            (true, false) => (b, None, -normal),
            (true, true) => return manifold,
        };
        let material = a.material.combine(&b.material);

        for point in Self::contact_points(info) {
            let mut contact = Contact::new(
                first.id,
                second.map(|body| body.id),
                point.position,
                normal,
                point.depth,
                material,
            );
            contact.prepare(first, second, self.dt, &self.config);
            manifold.contacts.push(contact);
        }

        trace!(
            "pair {:?}/{:?}: code {} produced {} contacts",
            manifold.body_a,
            manifold.body_b,
            info.code,
            manifold.contacts.len()
        );
        manifold
    }

    /// Geometric contact points for a collision, dispatched on its axis code.
    pub fn contact_points(info: &CollisionInfo) -> Vec<ContactPoint> {
        if info.is_edge_edge() {
            vec![Self::edge_contact(info)]
        } else {
            Self::face_contacts(info)
        }
    }

    /// Clips the incident face of one box against the reference face of the
    /// other. Points ending up above the reference face are dropped, so a
    /// degenerate clip yields no contacts at all.
    pub fn face_contacts(info: &CollisionInfo) -> Vec<ContactPoint> {
        let normal = info.normal();
        let (reference, incident, normal, face) = if info.code <= 3 {
            (&info.a, &info.b, normal, usize::from(info.code) - 1)
        } else {
            (&info.b, &info.a, -normal, usize::from(info.code) - 4)
        };
        let (u, v) = other_axes(face);

        // The incident face is the one most opposed to the reference normal.
        let alignment = incident.axis.map(|axis| axis.dot(normal));
        let incident_face = (0..3)
            .max_by(|&l, &r| alignment[l].abs().total_cmp(&alignment[r].abs()))
            .unwrap_or(0);
        let offset = incident.center - reference.center;
        let face_center = if alignment[incident_face] < 0.0 {
            offset + incident.axis[incident_face] * incident.extents[incident_face]
        } else {
            offset - incident.axis[incident_face] * incident.extents[incident_face]
        };
        let (s, t) = other_axes(incident_face);

        let c1 = face_center.dot(reference.axis[u]);
        let c2 = face_center.dot(reference.axis[v]);
        let m11 = reference.axis[u].dot(incident.axis[s]);
        let m12 = reference.axis[u].dot(incident.axis[t]);
        let m21 = reference.axis[v].dot(incident.axis[s]);
        let m22 = reference.axis[v].dot(incident.axis[t]);
        let determinant = m11 * m22 - m12 * m21;
        if determinant.abs() < PROJECTION_EPSILON {
            return Vec::new();
        }

        let k1 = m11 * incident.extents[s];
        let k2 = m21 * incident.extents[s];
        let k3 = m12 * incident.extents[t];
        let k4 = m22 * incident.extents[t];
        let quad = [
            Vec2::new(c1 - k1 - k3, c2 - k2 - k4),
            Vec2::new(c1 - k1 + k3, c2 - k2 + k4),
            Vec2::new(c1 + k1 + k3, c2 + k2 + k4),
            Vec2::new(c1 + k1 - k3, c2 + k2 - k4),
        ];
        let rectangle = Vec2::new(reference.extents[u], reference.extents[v]);

        let inverse = 1.0 / determinant;
        intersect_rect_quad(rectangle, quad)
            .into_iter()
            .filter_map(|p| {
                let du = p.x - c1;
                let dv = p.y - c2;
                let along_s = (m22 * du - m12 * dv) * inverse;
                let along_t = (-m21 * du + m11 * dv) * inverse;
                let point = face_center + incident.axis[s] * along_s + incident.axis[t] * along_t;
                let depth = reference.extents[face] - normal.dot(point);
                (depth >= 0.0).then(|| ContactPoint {
                    position: point + reference.center,
                    depth,
                })
            })
            .collect()
    }

    /// Midpoint of the closest points between the two touching edges.
    pub fn edge_contact(info: &CollisionInfo) -> ContactPoint {
        let normal = info.normal();
        let (edge_a, edge_b) = (info.tested_axis_0, info.tested_axis_1);
        let (start_a, end_a) = supporting_edge(&info.a, edge_a, normal);
        let (start_b, end_b) = supporting_edge(&info.b, edge_b, -normal);
        let (on_a, on_b) = closest_points_on_segments(start_a, end_a, start_b, end_b);
        ContactPoint {
            position: (on_a + on_b) * 0.5,
            depth: info.depth(),
        }
    }
}

fn other_axes(axis: usize) -> (usize, usize) {
    match axis {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    }
}

/// Edge parallel to `axis` lying furthest along `direction`.
fn supporting_edge(obb: &OrientedBox, axis: usize, direction: Vec3) -> (Vec3, Vec3) {
    let mut middle = obb.center;
    for k in (0..3).filter(|&k| k != axis) {
        let sign = if direction.dot(obb.axis[k]) > 0.0 { 1.0 } else { -1.0 };
        middle += obb.axis[k] * (sign * obb.extents[k]);
    }
    let half = obb.axis[axis] * obb.extents[axis];
    (middle - half, middle + half)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::narrowphase::SeparatingAxisTest;
    use approx::assert_relative_eq;
    use glam::Quat;

    fn spawn(bodies: &mut Arena<RigidBody>, body: RigidBody) -> EntityId {
        let id = bodies.insert(body);
        if let Some(body) = bodies.get_mut(id) {
            body.id = id;
        }
        id
    }

    fn collide(bodies: &Arena<RigidBody>, a: EntityId, b: EntityId) -> CollisionInfo {
        let a = OrientedBox::from_body(bodies.get(a).expect("a"));
        let b = OrientedBox::from_body(bodies.get(b).expect("b"));
        SeparatingAxisTest::test(&a, &b).expect("boxes overlap")
    }

    #[test]
    fn stacked_boxes_touch_at_four_corners() {
        let mut bodies = Arena::new();
        let a = spawn(&mut bodies, RigidBody::default());
        let b = spawn(&mut bodies, RigidBody::default().with_position(Vec3::new(0.0, 0.95, 0.0)));
        let info = collide(&bodies, a, b);

        let points = ContactGenerator::face_contacts(&info);
        assert_eq!(points.len(), 4);
        for point in &points {
            assert_relative_eq!(point.depth, 0.05, epsilon = 1e-4);
            assert!((0.45 - 1e-4..=0.5 + 1e-4).contains(&point.position.y));
            assert_relative_eq!(point.position.x.abs(), 0.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn small_box_on_large_box_is_clipped_to_its_own_face() {
        let mut bodies = Arena::new();
        let floor = spawn(&mut bodies, RigidBody::cuboid(Vec3::new(4.0, 0.5, 4.0), 10.0));
        let cube = spawn(
            &mut bodies,
            RigidBody::cuboid(Vec3::splat(0.25), 1.0)
                .with_position(Vec3::new(1.0, 0.7, -1.0))
                .with_orientation(Quat::from_rotation_y(0.5)),
        );
        let info = collide(&bodies, floor, cube);
        assert!(info.is_face());

        let points = ContactGenerator::face_contacts(&info);
        assert_eq!(points.len(), 4);
        for point in &points {
            assert_relative_eq!(point.depth, 0.05, epsilon = 1e-4);
            let planar = Vec2::new(point.position.x - 1.0, point.position.z + 1.0);
            assert!(planar.length() <= 0.25 * 2.0_f32.sqrt() + 1e-4);
        }
    }

    #[test]
    fn tilted_box_touches_with_its_lowest_corner() {
        let mut bodies = Arena::new();
        let floor = spawn(&mut bodies, RigidBody::cuboid(Vec3::new(4.0, 0.5, 4.0), 10.0));
        let tilt = Quat::from_rotation_z(0.3) * Quat::from_rotation_x(0.2);
        let mut cube = RigidBody::default().with_orientation(tilt);
        let lowest = cube.corners().iter().map(|c| c.y).fold(f32::MAX, f32::min);
        cube.position = Vec3::new(0.0, 0.5 - lowest - 0.02, 0.0);
        let cube = spawn(&mut bodies, cube);

        let info = collide(&bodies, floor, cube);
        let points = ContactGenerator::contact_points(&info);
        assert_eq!(points.len(), 1);
        assert_relative_eq!(points[0].depth, 0.02, epsilon = 1e-4);
    }

    #[test]
    fn crossed_edges_meet_between_the_ridges() {
        let mut bodies = Arena::new();
        let a = spawn(
            &mut bodies,
            RigidBody::default().with_orientation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_4)),
        );
        let b = spawn(
            &mut bodies,
            RigidBody::default()
                .with_position(Vec3::new(0.0, 1.35, 0.0))
                .with_orientation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_4)),
        );
        let info = collide(&bodies, a, b);
        assert!(info.is_edge_edge());

        let point = ContactGenerator::edge_contact(&info);
        // Ridges sit at y = 0.707 (bottom box) and y = 0.643 (top box).
        let ridge = 0.5 * 2.0_f32.sqrt();
        assert!((point.position - Vec3::new(0.0, 0.675, 0.0)).length() < 1e-3, "{point:?}");
        assert_relative_eq!(point.depth, 2.0 * ridge - 1.35, epsilon = 1e-4);
    }

    #[test]
    fn static_partner_becomes_a_world_anchor() {
        let mut bodies = Arena::new();
        let ground = spawn(
            &mut bodies,
            RigidBody::cuboid(Vec3::new(4.0, 0.5, 4.0), 10.0).with_static(true),
        );
        let cube = spawn(&mut bodies, RigidBody::default().with_position(Vec3::new(0.0, 0.95, 0.0)));
        let info = collide(&bodies, ground, cube);

        let generator = ContactGenerator::from_config(&SimulationConfig::default());
        let manifold = generator.generate(&info, &bodies);
        assert_eq!(manifold.len(), 4);
        for contact in &manifold.contacts {
            assert_eq!(contact.body_a, cube);
            assert_eq!(contact.body_b, None);
            assert!(contact.normal.dot(Vec3::NEG_Y) > 0.999);
        }
    }

    #[test]
    fn generated_contacts_carry_approach_velocity() {
        let mut bodies = Arena::new();
        let a = spawn(&mut bodies, RigidBody::default().with_velocity(Vec3::new(0.0, 2.0, 0.0)));
        let b = spawn(
            &mut bodies,
            RigidBody::default()
                .with_position(Vec3::new(0.0, 0.95, 0.0))
                .with_velocity(Vec3::new(0.0, -2.0, 0.0)),
        );
        let info = collide(&bodies, a, b);
        let manifold = ContactGenerator::from_config(&SimulationConfig::default()).generate(&info, &bodies);
        assert!(!manifold.is_empty());
        for contact in &manifold.contacts {
            assert_relative_eq!(contact.contact_velocity.x, -4.0, epsilon = 1e-4);
            assert!(contact.desired_delta_velocity > 4.0);
        }
    }
}
