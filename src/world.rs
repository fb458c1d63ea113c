use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use glam::Vec3;
use log::debug;

use crate::{
    collision::{
        broadphase::{BodyProxy, Octree},
        contact::ContactGenerator,
        narrowphase::SeparatingAxisTest,
        wall::{Wall, WallSolver},
    },
    config::{SimulationConfig, DEFAULT_TIME_STEP},
    core::{collider::OrientedBox, rigidbody::RigidBody},
    dynamics::{
        forces::{accumulate_contributors, ForceContributor},
        integrator::{IntegrationOutcome, Integrator},
        island::ContactBatcher,
        sleep::SleepModel,
        solver::{Contact, ContactResolver},
    },
    error::ConfigResult,
    utils::{
        allocator::{Arena, EntityId},
        logging::{warn_if_frame_budget_exceeded, ScopedTimer},
        profiling::StepProfile,
    },
};

/// What one call to [`PhysicsWorld::step`] or [`PhysicsWorld::step_fixed`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Fixed steps run.
    pub steps: usize,
    /// Bodies whose touching state flipped, sorted by handle.
    pub changed: Vec<EntityId>,
    /// Leftover accumulator as a fraction of the timestep.
    pub alpha: f32,
}

/// Owns every body and wall and runs the fixed-step pipeline over them.
pub struct PhysicsWorld {
    bodies: Arena<RigidBody>,
    walls: Vec<Wall>,
    config: SimulationConfig,
    octree: Octree,
    generator: ContactGenerator,
    batcher: ContactBatcher,
    resolver: ContactResolver,
    wall_solver: WallSolver,
    integrator: Integrator,
    sleep: SleepModel,
    snapshots: HashMap<EntityId, OrientedBox>,
    queued_forces: HashMap<EntityId, (Vec3, Vec3)>,
    touching: HashSet<EntityId>,
    time_accumulated: f32,
    profile: StepProfile,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::from_valid_config(SimulationConfig::default())
    }
}

impl PhysicsWorld {
    /// World with default settings; a non-positive or non-finite timestep
    /// falls back to [`DEFAULT_TIME_STEP`].
    pub fn new(timestep: f32) -> Self {
        let timestep = if timestep.is_finite() && timestep > 0.0 {
            timestep
        } else {
            DEFAULT_TIME_STEP
        };
        let mut config = SimulationConfig::default().with_timestep(timestep);
        config.max_frame_time = config.max_frame_time.max(timestep);
        Self::from_valid_config(config)
    }

    pub fn with_config(config: SimulationConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: SimulationConfig) -> Self {
        Self {
            bodies: Arena::new(),
            walls: Vec::new(),
            octree: Octree::new(config.broadphase),
            generator: ContactGenerator::from_config(&config),
            batcher: ContactBatcher::new(),
            resolver: ContactResolver::from_config(&config),
            wall_solver: WallSolver::new(config.walls),
            integrator: Integrator::new(config.timestep),
            sleep: SleepModel::from_config(&config.sleep),
            snapshots: HashMap::new(),
            queued_forces: HashMap::new(),
            touching: HashSet::new(),
            time_accumulated: 0.0,
            profile: StepProfile::default(),
            config,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Stores `body` and writes its handle back into it. Awake bodies start
    /// with the wake-up motion so they are not put to sleep on their first step.
    pub fn add_body(&mut self, body: RigidBody) -> EntityId {
        let id = self.bodies.insert(body);
        if let Some(stored) = self.bodies.get_mut(id) {
            stored.id = id;
            if stored.is_static() {
                stored.put_to_sleep();
            } else if stored.is_awake() {
                stored.wake(self.sleep.wake_motion);
            }
        }
        id
    }

    pub fn remove_body(&mut self, id: EntityId) -> Option<RigidBody> {
        self.queued_forces.remove(&id);
        self.touching.remove(&id);
        self.snapshots.remove(&id);
        self.bodies.remove(id)
    }

    pub fn body(&self, id: EntityId) -> Option<&RigidBody> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> &Arena<RigidBody> {
        &self.bodies
    }

    pub fn add_wall(&mut self, wall: Wall) {
        self.walls.push(wall);
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Queues a force and torque for the next fixed step and wakes the body.
    /// Returns `false` for unknown handles.
    pub fn apply_force(&mut self, id: EntityId, force: Vec3, torque: Vec3) -> bool {
        let Some(body) = self.bodies.get_mut(id) else {
            return false;
        };
        if body.is_static() {
            return true;
        }
        self.sleep.wake(body);
        let queued = self.queued_forces.entry(id).or_insert((Vec3::ZERO, Vec3::ZERO));
        queued.0 += force;
        queued.1 += torque;
        true
    }

    /// Points the body's player-input contributor along `direction`.
    /// Returns `false` when the body is unknown or carries no such contributor.
    pub fn set_player_input(&mut self, id: EntityId, direction: Vec3) -> bool {
        let Some(body) = self.bodies.get_mut(id) else {
            return false;
        };
        let Some(slot) = body.forces.iter_mut().find_map(|force| match force {
            ForceContributor::PlayerInput { direction, .. } => Some(direction),
            _ => None,
        }) else {
            return false;
        };
        *slot = direction;
        if direction != Vec3::ZERO {
            self.sleep.wake(body);
        }
        true
    }

    pub fn wake_body(&mut self, id: EntityId) -> bool {
        match self.bodies.get_mut(id) {
            Some(body) => {
                self.sleep.wake(body);
                true
            }
            None => false,
        }
    }

    pub fn profile(&self) -> &StepProfile {
        &self.profile
    }

    /// Runs broad and narrow phase on the current state and returns the
    /// prepared contacts without resolving or integrating anything.
    pub fn collect_contacts(&mut self) -> Vec<Contact> {
        self.rebuild_snapshots();
        let pairs = self.candidate_pairs();
        let pairs: Vec<_> = pairs
            .into_iter()
            .filter(|&(a, b)| self.pair_collides(a, b))
            .collect();
        self.generate_contacts(&pairs).0
    }

    /// Clamps `frame_dt`, adds it to the accumulator and runs as many fixed
    /// steps as it covers.
    pub fn step(&mut self, frame_dt: f32) -> StepReport {
        let mut frame_dt = if frame_dt.is_finite() { frame_dt.max(0.0) } else { 0.0 };
        if frame_dt > self.config.max_frame_time {
            warn_if_frame_budget_exceeded(
                Duration::from_secs_f32(frame_dt),
                self.config.max_frame_time * 1000.0,
            );
            frame_dt = self.config.max_frame_time;
        }
        self.time_accumulated += frame_dt;

        let mut report = StepReport::default();
        while self.time_accumulated >= self.config.timestep {
            self.time_accumulated -= self.config.timestep;
            let fixed = self.step_fixed();
            report.steps += fixed.steps;
            report.changed.extend(fixed.changed);
        }
        report.changed.sort_unstable();
        report.changed.dedup();
        report.alpha = self.time_accumulated / self.config.timestep;
        report
    }

    /// Runs exactly one fixed step of the pipeline.
    pub fn step_fixed(&mut self) -> StepReport {
        let mut profile = StepProfile {
            body_count: self.bodies.len(),
            ..StepProfile::default()
        };
        let mut touching = HashSet::new();

        {
            let _timer = ScopedTimer::recording("forces", &mut profile.force_time);
            self.apply_forces();
        }
        {
            let _timer = ScopedTimer::recording("walls", &mut profile.wall_time);
            self.resolve_walls(&mut touching);
        }

        let pairs = {
            let _timer = ScopedTimer::recording("broadphase", &mut profile.broad_phase_time);
            self.rebuild_snapshots();
            let pairs = self.candidate_pairs();
            self.apply_fields(pairs)
        };
        profile.pair_count = pairs.len();

        let contacts = {
            let _timer = ScopedTimer::recording("narrowphase", &mut profile.narrow_phase_time);
            let (contacts, pair_touching) = self.generate_contacts(&pairs);
            touching.extend(pair_touching);
            contacts
        };
        profile.contact_count = contacts.len();

        {
            let _timer = ScopedTimer::recording("resolve", &mut profile.resolve_time);
            let batches = self.batcher.batch(contacts);
            profile.batch_count = batches.len();
            for mut batch in batches {
                let stats = self.resolver.resolve(&mut batch.contacts, &mut self.bodies);
                profile.resolution.merge(&stats);
            }
        }
        {
            let _timer = ScopedTimer::recording("integrate", &mut profile.integrate_time);
            for (_, body) in self.bodies.iter_mut() {
                if self.integrator.integrate(body) == IntegrationOutcome::Discarded {
                    profile.discarded_integrations += 1;
                }
            }
        }
        {
            let _timer = ScopedTimer::recording("sleep", &mut profile.sleep_time);
            for (_, body) in self.bodies.iter_mut() {
                self.sleep.update(body, self.config.timestep);
            }
        }
        profile.awake_count = self.bodies.values().filter(|body| body.is_awake()).count();

        let mut changed: Vec<EntityId> = self
            .touching
            .symmetric_difference(&touching)
            .copied()
            .filter(|id| self.bodies.contains(*id))
            .collect();
        changed.sort_unstable();
        self.touching = touching;

        profile.report();
        self.profile = profile;
        StepReport {
            steps: 1,
            changed,
            alpha: self.time_accumulated / self.config.timestep,
        }
    }

    fn apply_forces(&mut self) {
        let gravity = self.config.gravity;
        for (id, body) in self.bodies.iter_mut() {
            accumulate_contributors(body, gravity);
            if let Some((force, torque)) = self.queued_forces.remove(&id) {
                if body.is_awake() {
                    body.add_force(force);
                    body.add_torque(torque);
                }
            }
        }
        self.queued_forces.clear();
    }

    fn resolve_walls(&mut self, touching: &mut HashSet<EntityId>) {
        if self.walls.is_empty() {
            return;
        }
        for (id, body) in self.bodies.iter_mut() {
            let response = self.wall_solver.resolve(body, &self.walls, self.config.timestep);
            if response.touching {
                touching.insert(id);
            }
        }
    }

    fn rebuild_snapshots(&mut self) {
        self.snapshots.clear();
        for (id, body) in self.bodies.iter() {
            self.snapshots.insert(id, OrientedBox::from_body(body));
        }
    }

    /// Rebuilds the octree from the current snapshots and enumerates pairs.
    fn candidate_pairs(&mut self) -> Vec<(EntityId, EntityId)> {
        self.octree.setup();
        for (id, body) in self.bodies.iter() {
            let Some(obb) = self.snapshots.get(&id) else {
                continue;
            };
            let proxy = match body.field_of_influence.filter(|field| field.is_active()) {
                Some(field) => {
                    let reach = field.radius.max(obb.world_half_extents().max_element());
                    BodyProxy::from_sphere(id, obb.center, reach, body.is_awake())
                }
                None => BodyProxy::from_box(obb, body.is_awake()),
            };
            self.octree.insert(proxy);
        }
        self.octree.candidate_pairs()
    }

    /// Applies field-of-influence pushes for every pair with an emitter and
    /// returns the pairs that still need a collision test.
    fn apply_fields(&mut self, pairs: Vec<(EntityId, EntityId)>) -> Vec<(EntityId, EntityId)> {
        let mut colliding = Vec::with_capacity(pairs.len());
        for (a, b) in pairs {
            self.push_from_field(a, b);
            self.push_from_field(b, a);
            if self.pair_collides(a, b) {
                colliding.push((a, b));
            }
        }
        colliding
    }

    fn push_from_field(&mut self, emitter: EntityId, target: EntityId) {
        let Some((source, field)) = self.bodies.get(emitter).and_then(|body| {
            body.field_of_influence
                .filter(|field| field.is_active())
                .map(|field| (body.position, field))
        }) else {
            return;
        };
        let Some(body) = self.bodies.get_mut(target) else {
            return;
        };
        if body.is_static() {
            return;
        }
        if let Some(force) = field.force_on(source, body.position) {
            self.sleep.wake(body);
            body.add_force(force);
        }
    }

    fn pair_collides(&self, a: EntityId, b: EntityId) -> bool {
        let collides = |id: EntityId| {
            self.bodies
                .get(id)
                .and_then(|body| body.field_of_influence)
                .map_or(true, |field| !field.is_active() || field.collides)
        };
        collides(a) && collides(b)
    }

    /// Narrow phase plus contact generation for every pair, in pair order.
    fn generate_contacts(
        &self,
        pairs: &[(EntityId, EntityId)],
    ) -> (Vec<Contact>, HashSet<EntityId>) {
        let mut contacts = Vec::new();
        let mut touching = HashSet::new();
        for &(a, b) in pairs {
            let (Some(box_a), Some(box_b)) = (self.snapshots.get(&a), self.snapshots.get(&b))
            else {
                continue;
            };
            let Some(info) = SeparatingAxisTest::test(box_a, box_b) else {
                continue;
            };
            let manifold = self.generator.generate(&info, &self.bodies);
            if manifold.is_empty() {
                continue;
            }
            touching.insert(a);
            touching.insert(b);
            contacts.extend(manifold.contacts);
        }
        if !contacts.is_empty() {
            debug!("{} pairs produced {} contacts", pairs.len(), contacts.len());
        }
        (contacts, touching)
    }
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("bodies", &self.bodies.len())
            .field("walls", &self.walls.len())
            .field("timestep", &self.config.timestep)
            .finish()
    }
}
