use obb_dynamics::*;

fn main() {
    env_logger::init();

    let mut engine = PhysicsEngine::new(0.02);

    engine.add_body(
        RigidBody::cuboid(Vec3::new(8.0, 0.5, 8.0), 100.0)
            .with_position(Vec3::new(0.0, -0.5, 0.0))
            .with_static(true),
    );
    engine.add_wall(Wall::new(Vec3::Y, -2.0));

    let stack: Vec<EntityId> = (0..5)
        .map(|i| {
            engine.add_body(
                RigidBody::default()
                    .with_position(Vec3::new(0.0, i as f32 + 0.5, 0.0))
                    .with_material(Material::new(0.0, 0.6)),
            )
        })
        .collect();

    let mut frames_with_changes = 0;
    for _ in 0..300 {
        let report = engine.step(1.0 / 60.0);
        if !report.changed.is_empty() {
            frames_with_changes += 1;
        }
    }

    println!("Simulated a stack of {} boxes for 5 seconds", stack.len());
    println!("{frames_with_changes} frames changed contact state");
    for id in stack {
        if let Some(body) = engine.get_body(id) {
            println!(
                "  {:?}: y = {:.3}, awake = {}",
                id,
                body.position.y,
                body.is_awake()
            );
        }
    }
    engine.world().profile().report();
}
