use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use obb_dynamics::{
    collision::broadphase::BodyProxy,
    config::OctreeConfig,
    *,
};
use std::hint::black_box;

const DT: f32 = 0.02;

fn snapshot(index: u32, position: Vec3, orientation: Quat) -> OrientedBox {
    let mut body = RigidBody::default()
        .with_position(position)
        .with_orientation(orientation);
    body.id = EntityId::from_index(index);
    OrientedBox::from_body(&body)
}

fn prepare_stack(height: usize) -> PhysicsWorld {
    let mut world = PhysicsWorld::new(DT);
    world.add_body(
        RigidBody::cuboid(Vec3::new(10.0, 0.5, 10.0), 100.0)
            .with_position(Vec3::new(0.0, -0.5, 0.0))
            .with_static(true),
    );
    for i in 0..height {
        world.add_body(
            RigidBody::default()
                .with_position(Vec3::new(0.0, i as f32 + 0.5, 0.0))
                .with_can_sleep(false),
        );
    }
    world
}

fn bench_separating_axis(c: &mut Criterion) {
    let mut group = c.benchmark_group("sat");
    let a = snapshot(0, Vec3::ZERO, Quat::from_rotation_y(0.4));
    let face = snapshot(1, Vec3::new(0.1, 0.95, 0.0), Quat::IDENTITY);
    let edge = snapshot(
        2,
        Vec3::new(0.0, 1.35, 0.0),
        Quat::from_rotation_z(std::f32::consts::FRAC_PI_4),
    );
    let apart = snapshot(3, Vec3::new(3.0, 0.0, 0.0), Quat::IDENTITY);

    group.bench_function("face", |b| {
        b.iter(|| SeparatingAxisTest::test(black_box(&a), black_box(&face)))
    });
    group.bench_function("edge", |b| {
        b.iter(|| SeparatingAxisTest::test(black_box(&a), black_box(&edge)))
    });
    group.bench_function("separated", |b| {
        b.iter(|| SeparatingAxisTest::test(black_box(&a), black_box(&apart)))
    });
    group.finish();
}

fn bench_octree(c: &mut Criterion) {
    let mut group = c.benchmark_group("octree_rebuild_pairs");
    for &side in &[8usize, 16, 24] {
        let proxies: Vec<BodyProxy> = (0..side * side)
            .map(|i| {
                let center = Vec3::new((i % side) as f32 * 1.1, 0.0, (i / side) as f32 * 1.1);
                BodyProxy {
                    id: EntityId::from_index(i as u32),
                    min: center - Vec3::splat(0.6),
                    max: center + Vec3::splat(0.6),
                    awake: true,
                }
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(side * side), &proxies, |b, proxies| {
            let mut octree = Octree::new(OctreeConfig::default());
            b.iter(|| {
                octree.setup();
                for proxy in proxies {
                    octree.insert(*proxy);
                }
                black_box(octree.candidate_pairs())
            })
        });
    }
    group.finish();
}

fn bench_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step_stack");
    for &height in &[2usize, 8, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(height), &height, |b, &height| {
            let mut world = prepare_stack(height);
            b.iter(|| black_box(world.step_fixed()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_separating_axis, bench_octree, bench_world_step);
criterion_main!(benches);
