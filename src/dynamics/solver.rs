use glam::{Mat3, Vec3};
use log::trace;

use crate::{
    config::{SimulationConfig, SolverConfig},
    core::{rigidbody::RigidBody, types::MaterialPair},
    dynamics::sleep::SleepModel,
    utils::{
        allocator::{Arena, EntityId},
        math,
    },
};

/// Denominators below this are treated as "both sides immovable".
const INERTIA_EPSILON: f32 = 1e-8;

/// One point of interaction, alive for a single step.
///
/// Slot 0 always holds a dynamic body. Slot 1 is absent for contacts against
/// static geometry, which act as immovable world anchors.
#[derive(Debug, Clone)]
pub struct Contact {
    pub body_a: EntityId,
    pub body_b: Option<EntityId>,
    pub point: Vec3,
    /// Unit normal pointing from `body_a` toward `body_b`.
    pub normal: Vec3,
    pub depth: f32,
    pub material: MaterialPair,
    /// Contact-to-world rotation; column 0 is the normal.
    pub basis: Mat3,
    /// Contact point relative to each body's center.
    pub relative_position: [Vec3; 2],
    /// Velocity of `body_b` relative to `body_a` in contact space.
    pub contact_velocity: Vec3,
    /// Normal velocity change the velocity pass still has to produce.
    pub desired_delta_velocity: f32,
    /// Normal velocity built up by the awake bodies' last-step acceleration.
    pub velocity_from_acceleration: f32,
}

impl Contact {
    pub fn new(
        body_a: EntityId,
        body_b: Option<EntityId>,
        point: Vec3,
        normal: Vec3,
        depth: f32,
        material: MaterialPair,
    ) -> Self {
        Self {
            body_a,
            body_b,
            point,
            normal,
            depth,
            material,
            basis: math::contact_basis(normal),
            relative_position: [Vec3::ZERO; 2],
            contact_velocity: Vec3::ZERO,
            desired_delta_velocity: 0.0,
            velocity_from_acceleration: 0.0,
        }
    }

    pub fn bodies(&self) -> [Option<EntityId>; 2] {
        [Some(self.body_a), self.body_b]
    }

    pub fn involves(&self, id: EntityId) -> bool {
        self.body_a == id || self.body_b == Some(id)
    }

    /// Closing speed along the normal that last step's acceleration does not
    /// account for. Zero for separating and purely resting contacts.
    pub fn impact_speed(&self) -> f32 {
        (self.velocity_from_acceleration - self.contact_velocity.x).max(0.0)
    }

    /// Computes the contact frame, relative positions, contact velocity and
    /// velocity target from the bodies' current state.
    pub fn prepare(
        &mut self,
        a: &RigidBody,
        b: Option<&RigidBody>,
        dt: f32,
        config: &SolverConfig,
    ) {
        self.basis = math::contact_basis(self.normal);
        self.relative_position[0] = self.point - a.position;
        self.relative_position[1] = b.map_or(Vec3::ZERO, |b| self.point - b.position);

        let mut velocity = -self.local_velocity(a, 0, dt);
        if let Some(b) = b {
            velocity += self.local_velocity(b, 1, dt);
        }
        self.contact_velocity = velocity;
        self.calculate_desired_delta_velocity(a, b, dt, config.restitution_velocity_limit);
    }

    /// Sets the normal velocity target. Velocity built up by last step's
    /// acceleration is not bounced back, and slow contacts get no restitution.
    pub fn calculate_desired_delta_velocity(
        &mut self,
        a: &RigidBody,
        b: Option<&RigidBody>,
        dt: f32,
        restitution_velocity_limit: f32,
    ) {
        let mut velocity_from_acceleration = 0.0;
        if a.is_awake() {
            velocity_from_acceleration -= a.last_frame_acceleration.dot(self.normal) * dt;
        }
        if let Some(b) = b.filter(|b| b.is_awake()) {
            velocity_from_acceleration += b.last_frame_acceleration.dot(self.normal) * dt;
        }

        self.velocity_from_acceleration = velocity_from_acceleration;

        let normal_velocity = self.contact_velocity.x;
        let restitution = if normal_velocity.abs() < restitution_velocity_limit {
            0.0
        } else {
            self.material.restitution
        };
        self.desired_delta_velocity =
            -normal_velocity - restitution * (normal_velocity - velocity_from_acceleration);
    }

    fn local_velocity(&self, body: &RigidBody, slot: usize, dt: f32) -> Vec3 {
        if body.is_static() {
            return Vec3::ZERO;
        }
        let to_contact = self.basis.transpose();
        let r = self.relative_position[slot];
        let velocity = to_contact * (body.angular_velocity().cross(r) + body.velocity());

        // Only the planar part of the acceleration feeds friction.
        let mut planar = to_contact * (body.last_frame_acceleration * dt);
        planar.x = 0.0;
        velocity + planar
    }
}

/// Linear and angular change applied to one body by a single correction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyChange {
    pub linear: Vec3,
    pub angular: Vec3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub position_iterations: usize,
    pub velocity_iterations: usize,
    /// Contacts dropped because neither side could move.
    pub skipped_contacts: usize,
    pub woken_bodies: usize,
}

impl ResolutionStats {
    pub fn merge(&mut self, other: &Self) {
        self.position_iterations += other.position_iterations;
        self.velocity_iterations += other.velocity_iterations;
        self.skipped_contacts += other.skipped_contacts;
        self.woken_bodies += other.woken_bodies;
    }
}

/// Sequential-impulse resolver: a penetration pass followed by a velocity
/// pass, each always working on the worst remaining contact.
#[derive(Debug, Clone, Default)]
pub struct ContactResolver {
    config: SolverConfig,
    sleep: SleepModel,
}

impl ContactResolver {
    pub fn new(config: SolverConfig, sleep: SleepModel) -> Self {
        Self { config, sleep }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.solver, SleepModel::from_config(&config.sleep))
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Resolves one batch of prepared contacts against the bodies they touch.
    pub fn resolve(&self, contacts: &mut [Contact], bodies: &mut Arena<RigidBody>) -> ResolutionStats {
        let mut stats = ResolutionStats::default();
        if contacts.is_empty() {
            return stats;
        }
        self.adjust_positions(contacts, bodies, &mut stats);
        self.adjust_velocities(contacts, bodies, &mut stats);
        trace!(
            "resolved {} contacts in {}+{} iterations",
            contacts.len(),
            stats.position_iterations,
            stats.velocity_iterations
        );
        stats
    }

    pub fn adjust_positions(
        &self,
        contacts: &mut [Contact],
        bodies: &mut Arena<RigidBody>,
        stats: &mut ResolutionStats,
    ) {
        let iterations = self.config.iterations_for(contacts.len());
        for _ in 0..iterations {
            let Some(index) = worst(contacts, self.config.position_epsilon, |c| c.depth) else {
                break;
            };
            self.match_awake_state(&contacts[index], bodies, stats);

            let Some(changes) = self.apply_position_change(&contacts[index], bodies) else {
                contacts[index].depth = 0.0;
                stats.skipped_contacts += 1;
                continue;
            };
            stats.position_iterations += 1;

            let resolved = contacts[index].bodies();
            for contact in contacts.iter_mut() {
                for (slot, body) in contact.bodies().into_iter().enumerate() {
                    for (changed, change) in resolved.iter().zip(changes.iter()) {
                        if body.is_none() || body != *changed {
                            continue;
                        }
                        let delta = change.linear + change.angular.cross(contact.relative_position[slot]);
                        let sign = if slot == 1 { -1.0 } else { 1.0 };
                        contact.depth += sign * delta.dot(contact.normal);
                    }
                }
            }
        }
    }

    pub fn adjust_velocities(
        &self,
        contacts: &mut [Contact],
        bodies: &mut Arena<RigidBody>,
        stats: &mut ResolutionStats,
    ) {
        let iterations = self.config.iterations_for(contacts.len());
        for _ in 0..iterations {
            let Some(index) =
                worst(contacts, self.config.velocity_epsilon, |c| c.desired_delta_velocity)
            else {
                break;
            };
            self.match_awake_state(&contacts[index], bodies, stats);

            let Some(changes) = self.apply_velocity_change(&contacts[index], bodies) else {
                contacts[index].desired_delta_velocity = 0.0;
                stats.skipped_contacts += 1;
                continue;
            };
            stats.velocity_iterations += 1;

            let resolved = contacts[index].bodies();
            for contact in contacts.iter_mut() {
                for (slot, body) in contact.bodies().into_iter().enumerate() {
                    for (changed, change) in resolved.iter().zip(changes.iter()) {
                        if body.is_none() || body != *changed {
                            continue;
                        }
                        let delta = change.linear + change.angular.cross(contact.relative_position[slot]);
                        let sign = if slot == 1 { 1.0 } else { -1.0 };
                        let local = contact.basis.transpose() * delta * sign;
                        contact.contact_velocity += local;
                        contact.desired_delta_velocity -= local.x;
                    }
                }
            }
        }
    }

    /// Moves and turns the contact's bodies apart along the normal, split by
    /// their linear and angular inertia. Returns `None` when neither can move.
    pub fn apply_position_change(
        &self,
        contact: &Contact,
        bodies: &mut Arena<RigidBody>,
    ) -> Option<[BodyChange; 2]> {
        let n = contact.normal;
        let mut linear_inertia = [0.0; 2];
        let mut angular_inertia = [0.0; 2];
        let mut inverse_inertia = [Mat3::ZERO; 2];

        for (slot, id) in contact.bodies().into_iter().enumerate() {
            let Some(body) = id.and_then(|id| bodies.get(id)) else {
                continue;
            };
            let r = contact.relative_position[slot];
            inverse_inertia[slot] = body.effective_inverse_inertia_world();
            angular_inertia[slot] = (inverse_inertia[slot] * r.cross(n)).cross(r).dot(n);
            linear_inertia[slot] = body.effective_inverse_mass();
        }

        let total_inertia: f32 = linear_inertia.iter().chain(angular_inertia.iter()).sum();
        if total_inertia <= INERTIA_EPSILON || !total_inertia.is_finite() || !contact.depth.is_finite() {
            return None;
        }

        let mut changes = [BodyChange::default(); 2];
        for (slot, id) in contact.bodies().into_iter().enumerate() {
            let Some(body) = id.and_then(|id| bodies.get_mut(id)) else {
                continue;
            };
            if body.is_static() || !body.is_awake() {
                continue;
            }

            let sign = if slot == 1 { 1.0 } else { -1.0 };
            let mut angular_move = sign * contact.depth * angular_inertia[slot] / total_inertia;
            let mut linear_move = sign * contact.depth * linear_inertia[slot] / total_inertia;

            let r = contact.relative_position[slot];
            let projection = r - n * r.dot(n);
            let max_angular_move = self.config.angular_move_limit * projection.length();
            if angular_move.abs() > max_angular_move {
                let total_move = angular_move + linear_move;
                angular_move = max_angular_move.copysign(angular_move);
                linear_move = total_move - angular_move;
            }

            let angular_change = if angular_move == 0.0 || angular_inertia[slot] <= INERTIA_EPSILON {
                Vec3::ZERO
            } else {
                inverse_inertia[slot] * r.cross(n) * (angular_move / angular_inertia[slot])
            };
            let linear_change = n * linear_move;

            body.position += linear_change;
            body.orientation =
                math::normalize_quat(math::add_scaled_rotation(body.orientation, angular_change, 1.0));
            body.recalculate_derived();

            changes[slot] = BodyChange {
                linear: linear_change,
                angular: angular_change,
            };
        }
        Some(changes)
    }

    /// Applies the impulse that meets the contact's velocity target as
    /// momentum deltas: `+J` on `body_b`, `-J` on `body_a`. Returns the
    /// resulting velocity changes, or `None` when neither body can respond.
    pub fn apply_velocity_change(
        &self,
        contact: &Contact,
        bodies: &mut Arena<RigidBody>,
    ) -> Option<[BodyChange; 2]> {
        let mut inverse_mass = [0.0; 2];
        let mut inverse_inertia = [Mat3::ZERO; 2];
        for (slot, id) in contact.bodies().into_iter().enumerate() {
            if let Some(body) = id.and_then(|id| bodies.get(id)) {
                inverse_mass[slot] = body.effective_inverse_mass();
                inverse_inertia[slot] = body.effective_inverse_inertia_world();
            }
        }

        let impulse_contact = if contact.material.friction <= 0.0 {
            frictionless_impulse(contact, &inverse_mass, &inverse_inertia)?
        } else {
            frictional_impulse(contact, &inverse_mass, &inverse_inertia)?
        };
        let impulse = contact.basis * impulse_contact;
        if !impulse.is_finite() {
            return None;
        }

        let mut changes = [BodyChange::default(); 2];
        for (slot, id) in contact.bodies().into_iter().enumerate() {
            let Some(body) = id.and_then(|id| bodies.get_mut(id)) else {
                continue;
            };
            if body.is_static() || !body.is_awake() {
                continue;
            }
            let sign = if slot == 1 { 1.0 } else { -1.0 };
            let linear = impulse * sign;
            let torque = contact.relative_position[slot].cross(linear);

            body.momentum += linear;
            body.angular_momentum += torque;
            body.recalculate_derived();

            changes[slot] = BodyChange {
                linear: linear * inverse_mass[slot],
                angular: inverse_inertia[slot] * torque,
            };
        }
        Some(changes)
    }

    /// Wakes the sleeping side of a contact whose other side is awake, unless
    /// the awake body is only resting on it. A sleeper left asleep acts as an
    /// anchor for this step.
    fn match_awake_state(
        &self,
        contact: &Contact,
        bodies: &mut Arena<RigidBody>,
        stats: &mut ResolutionStats,
    ) {
        let Some(other) = contact.body_b else {
            return;
        };
        if contact.impact_speed() <= self.sleep.wake_speed {
            return;
        }
        let Some((a, b)) = bodies.get2_mut(contact.body_a, other) else {
            return;
        };
        if a.is_static() || b.is_static() || a.is_awake() == b.is_awake() {
            return;
        }
        let sleeper = if a.is_awake() { b } else { a };
        self.sleep.wake(sleeper);
        stats.woken_bodies += 1;
    }
}

/// Index of the contact with the largest `key` above `epsilon`.
fn worst(contacts: &[Contact], epsilon: f32, key: impl Fn(&Contact) -> f32) -> Option<usize> {
    let mut best = None;
    let mut max = epsilon;
    for (index, contact) in contacts.iter().enumerate() {
        let value = key(contact);
        if value > max {
            max = value;
            best = Some(index);
        }
    }
    best
}

fn frictionless_impulse(
    contact: &Contact,
    inverse_mass: &[f32; 2],
    inverse_inertia: &[Mat3; 2],
) -> Option<Vec3> {
    let n = contact.normal;
    let mut delta_velocity = 0.0;
    for slot in 0..2 {
        let r = contact.relative_position[slot];
        let rotation_per_unit = inverse_inertia[slot] * r.cross(n);
        delta_velocity += rotation_per_unit.cross(r).dot(n) + inverse_mass[slot];
    }
    if delta_velocity <= INERTIA_EPSILON {
        return None;
    }
    Some(Vec3::new(contact.desired_delta_velocity / delta_velocity, 0.0, 0.0))
}

/// Solves for the impulse that meets the normal target and removes tangential
/// sliding, then falls back to dynamic friction on the cone boundary when the
/// sticking impulse is outside the Coulomb cone.
fn frictional_impulse(
    contact: &Contact,
    inverse_mass: &[f32; 2],
    inverse_inertia: &[Mat3; 2],
) -> Option<Vec3> {
    let mut delta_velocity_world = Mat3::ZERO;
    for slot in 0..2 {
        let impulse_to_torque = math::skew_symmetric(contact.relative_position[slot]);
        delta_velocity_world -= impulse_to_torque * inverse_inertia[slot] * impulse_to_torque;
    }

    let total_inverse_mass = inverse_mass[0] + inverse_mass[1];
    let delta_velocity = contact.basis.transpose() * delta_velocity_world * contact.basis
        + Mat3::from_diagonal(Vec3::splat(total_inverse_mass));
    if delta_velocity.determinant().abs() <= INERTIA_EPSILON {
        return None;
    }

    let velocity_to_kill = Vec3::new(
        contact.desired_delta_velocity,
        -contact.contact_velocity.y,
        -contact.contact_velocity.z,
    );
    let mut impulse = delta_velocity.inverse() * velocity_to_kill;

    let friction = contact.material.friction;
    let planar = (impulse.y * impulse.y + impulse.z * impulse.z).sqrt();
    if planar > impulse.x * friction {
        impulse.y /= planar;
        impulse.z /= planar;
        let normal_rate = math::element(&delta_velocity, 0, 0)
            + math::element(&delta_velocity, 0, 1) * friction * impulse.y
            + math::element(&delta_velocity, 0, 2) * friction * impulse.z;
        if normal_rate.abs() <= INERTIA_EPSILON {
            return None;
        }
        impulse.x = contact.desired_delta_velocity / normal_rate;
        impulse.y *= friction * impulse.x;
        impulse.z *= friction * impulse.x;
    }
    Some(impulse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Material;
    use approx::assert_relative_eq;

    const DT: f32 = 0.02;

    fn spawn(bodies: &mut Arena<RigidBody>, body: RigidBody) -> EntityId {
        let id = bodies.insert(body);
        if let Some(body) = bodies.get_mut(id) {
            body.id = id;
        }
        id
    }

    fn prepared(bodies: &Arena<RigidBody>, mut contact: Contact) -> Contact {
        let a = bodies.get(contact.body_a).expect("body a");
        let b = contact.body_b.and_then(|id| bodies.get(id));
        contact.prepare(a, b, DT, &SolverConfig::default());
        contact
    }

    fn head_on(material: Material) -> (Arena<RigidBody>, EntityId, EntityId) {
        let mut bodies = Arena::new();
        let a = spawn(
            &mut bodies,
            RigidBody::default()
                .with_material(material)
                .with_position(Vec3::new(-0.45, 0.0, 0.0))
                .with_velocity(Vec3::X),
        );
        let b = spawn(
            &mut bodies,
            RigidBody::default()
                .with_material(material)
                .with_position(Vec3::new(0.45, 0.0, 0.0))
                .with_velocity(Vec3::NEG_X),
        );
        (bodies, a, b)
    }

    #[test]
    fn elastic_central_impact_swaps_velocities_and_separates() {
        let material = Material::frictionless(1.0);
        let (mut bodies, a, b) = head_on(material);
        let contact = Contact::new(a, Some(b), Vec3::ZERO, Vec3::X, 0.1, material.combine(&material));
        let mut contacts = vec![prepared(&bodies, contact)];
        assert_relative_eq!(contacts[0].desired_delta_velocity, 4.0, epsilon = 1e-5);

        let stats = ContactResolver::default().resolve(&mut contacts, &mut bodies);
        assert_eq!(stats.velocity_iterations, 1);

        let body_a = bodies.get(a).expect("a");
        let body_b = bodies.get(b).expect("b");
        assert_relative_eq!(body_a.velocity().x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(body_b.velocity().x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(body_a.position.x, -0.5, epsilon = 1e-5);
        assert_relative_eq!(body_b.position.x, 0.5, epsilon = 1e-5);
        assert!(contacts[0].depth.abs() < 1e-5);
    }

    #[test]
    fn impulse_conserves_linear_momentum() {
        let material = Material::new(0.5, 0.6);
        let (mut bodies, a, b) = head_on(material);
        let momentum_before = bodies.get(a).expect("a").momentum + bodies.get(b).expect("b").momentum;

        let contact = Contact::new(
            a,
            Some(b),
            Vec3::new(0.0, 0.3, 0.2),
            Vec3::X,
            0.0,
            material.combine(&material),
        );
        let contact = prepared(&bodies, contact);
        let resolver = ContactResolver::default();
        let changes = resolver
            .apply_velocity_change(&contact, &mut bodies)
            .expect("both bodies are dynamic");

        let body_a = bodies.get(a).expect("a");
        let body_b = bodies.get(b).expect("b");
        let momentum_after = body_a.momentum + body_b.momentum;
        assert!((momentum_after - momentum_before).length() < 1e-5);
        // Equal masses, so the velocity changes mirror each other.
        assert!((changes[0].linear + changes[1].linear).length() < 1e-5);
        assert!(body_a.angular_velocity().length() > 0.0);
    }

    #[test]
    fn friction_stays_inside_the_cone() {
        let material = Material::new(0.0, 0.3);
        let mut bodies = Arena::new();
        spawn(
            &mut bodies,
            RigidBody::default().with_material(material).with_static(true),
        );
        let slider = spawn(
            &mut bodies,
            RigidBody::default()
                .with_material(material)
                .with_position(Vec3::new(0.0, 1.0, 0.0))
                .with_velocity(Vec3::new(5.0, -1.0, 0.0)),
        );
        // Slider first, ground as world anchor below it.
        let contact = Contact::new(
            slider,
            None,
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::NEG_Y,
            0.0,
            material.combine(&material),
        );
        let contact = prepared(&bodies, contact);
        let before = bodies.get(slider).expect("slider").momentum;
        ContactResolver::default()
            .apply_velocity_change(&contact, &mut bodies)
            .expect("slider is dynamic");
        let impulse = bodies.get(slider).expect("slider").momentum - before;

        let normal = impulse.y;
        let tangent = Vec3::new(impulse.x, 0.0, impulse.z).length();
        assert!(normal > 0.0);
        assert!(tangent <= normal * 0.3 + 1e-4, "tangent {tangent} normal {normal}");
        assert!(impulse.x < 0.0);
    }

    #[test]
    fn contact_against_immovable_sides_is_skipped() {
        let mut bodies = Arena::new();
        let anchor = spawn(&mut bodies, RigidBody::default().with_static(true));
        let contact = Contact::new(anchor, None, Vec3::ZERO, Vec3::Y, 0.2, Default::default());
        let mut contacts = vec![prepared(&bodies, contact)];
        let stats = ContactResolver::default().resolve(&mut contacts, &mut bodies);
        assert_eq!(stats.skipped_contacts, 1);
        assert_eq!(bodies.get(anchor).expect("anchor").position, Vec3::ZERO);
    }

    #[test]
    fn resolving_wakes_a_sleeping_partner() {
        let material = Material::frictionless(0.0);
        let (mut bodies, a, b) = head_on(material);
        if let Some(body) = bodies.get_mut(b) {
            body.put_to_sleep();
        }
        let contact = Contact::new(a, Some(b), Vec3::ZERO, Vec3::X, 0.1, material.combine(&material));
        let mut contacts = vec![prepared(&bodies, contact)];
        let stats = ContactResolver::default().resolve(&mut contacts, &mut bodies);

        assert_eq!(stats.woken_bodies, 1);
        let sleeper = bodies.get(b).expect("b");
        assert!(sleeper.is_awake());
        assert!(sleeper.velocity().x > 0.0);
    }

    #[test]
    fn resting_on_a_sleeper_leaves_it_asleep() {
        let material = Material::frictionless(0.0);
        let mut bodies = Arena::new();
        let lower = spawn(&mut bodies, RigidBody::default().with_material(material).with_awake(false));
        let step_of_gravity = Vec3::new(0.0, -9.81 * DT, 0.0);
        let mut upper_body = RigidBody::default()
            .with_material(material)
            .with_position(Vec3::new(0.0, 0.995, 0.0))
            .with_velocity(step_of_gravity);
        upper_body.last_frame_acceleration = Vec3::new(0.0, -9.81, 0.0);
        let upper = spawn(&mut bodies, upper_body);

        let contact = Contact::new(
            lower,
            Some(upper),
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::Y,
            0.005,
            material.combine(&material),
        );
        let mut contacts = vec![prepared(&bodies, contact)];
        assert!(contacts[0].impact_speed() < 1e-4);

        let stats = ContactResolver::default().resolve(&mut contacts, &mut bodies);
        assert_eq!(stats.woken_bodies, 0);
        assert_eq!(stats.velocity_iterations, 1);

        let sleeper = bodies.get(lower).expect("lower");
        assert!(!sleeper.is_awake());
        assert_eq!(sleeper.momentum, Vec3::ZERO);
        assert_eq!(sleeper.position, Vec3::ZERO);
        let resting = bodies.get(upper).expect("upper");
        assert!(resting.velocity().length() < 1e-4, "upper kept {:?}", resting.velocity());
    }

    #[test]
    fn penetration_changes_propagate_to_sibling_contacts() {
        let material = Material::frictionless(0.0);
        let (mut bodies, a, b) = head_on(material);
        let pair = material.combine(&material);
        let mut contacts = vec![
            prepared(&bodies, Contact::new(a, Some(b), Vec3::new(0.0, 0.5, 0.0), Vec3::X, 0.1, pair)),
            prepared(&bodies, Contact::new(a, Some(b), Vec3::new(0.0, -0.5, 0.0), Vec3::X, 0.1, pair)),
        ];
        let mut stats = ResolutionStats::default();
        ContactResolver::default().adjust_positions(&mut contacts, &mut bodies, &mut stats);

        for contact in &contacts {
            assert!(contact.depth < 0.01, "depth was {}", contact.depth);
        }
        let gap = bodies.get(b).expect("b").position.x - bodies.get(a).expect("a").position.x;
        assert!(gap > 0.9);
    }
}
