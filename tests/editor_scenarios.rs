//! End-to-end editor scenarios against the headless engine.
use approx::assert_relative_eq;
use tracing_subscriber::EnvFilter;

use tubetrack::catalog::defaults::{CURVE_90, STRAIGHT_SEGMENT};
use tubetrack::config::GravityConfig;
use tubetrack::physics::{DriveIntent, DT};
use tubetrack::session::EditorSession;
use tubetrack::{
    DirectoryStore, EngineConfig, Float3, HeadlessWorld, MemoryStore, PhysicsEngine, SnapOutcome,
    Vehicle,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn session() -> EditorSession<HeadlessWorld, MemoryStore> {
    init_tracing();
    EditorSession::new(EngineConfig::default(), HeadlessWorld::new(), MemoryStore::new())
}

#[test]
fn dragged_straight_snaps_onto_exit() {
    let mut session = session();
    let a = session.place(STRAIGHT_SEGMENT, Float3::ZERO, Float3::ZERO).unwrap();
    let b = session.place(STRAIGHT_SEGMENT, Float3::new(0.0, 0.0, 31.0), Float3::ZERO).unwrap();

    let placement = session.placement_mut();
    placement.begin_drag(b).unwrap();
    placement.drag_to(Float3::new(0.0, 0.0, 29.5), None).unwrap();
    let outcome = placement.end_drag().unwrap();

    assert_eq!(
        outcome,
        SnapOutcome::Snapped {
            connector: "entry".into(),
            target: a,
            target_connector: "exit".into(),
        }
    );
    let moved = placement.get_instance(b).unwrap();
    assert_relative_eq!(moved.position.z, 30.0, epsilon = 1e-6);
    assert_relative_eq!(moved.position.x, 0.0, epsilon = 1e-6);

    let entry = moved.connector("entry").unwrap().frame.position;
    let exit = placement.get_instance(a).unwrap().connector("exit").unwrap().frame.position;
    assert!(entry.distance(exit) < 1e-5);
}

#[test]
fn like_connectors_never_snap() {
    let mut session = session();
    session.place(STRAIGHT_SEGMENT, Float3::ZERO, Float3::ZERO).unwrap();
    let reversed = Float3::new(0.0, std::f32::consts::PI, 0.0);

    // Entry half a unit from the other entry.
    let entries = session.place(STRAIGHT_SEGMENT, Float3::new(0.0, 0.0, 0.5), reversed).unwrap();
    assert_eq!(
        session.placement_mut().try_auto_snap(entries).unwrap(),
        SnapOutcome::NoMatch
    );
    session.placement_mut().remove_instance(entries).unwrap();

    // Exit half a unit from the other exit.
    let exits = session.place(STRAIGHT_SEGMENT, Float3::new(0.0, 0.0, 60.5), reversed).unwrap();
    assert_eq!(
        session.placement_mut().try_auto_snap(exits).unwrap(),
        SnapOutcome::NoMatch
    );
}

#[test]
fn cancelled_drag_restores_position() {
    let mut session = session();
    let a = session.place(CURVE_90, Float3::new(5.0, 0.0, 5.0), Float3::ZERO).unwrap();
    let placement = session.placement_mut();
    placement.begin_drag(a).unwrap();
    placement.drag_to(Float3::new(50.0, 0.0, 50.0), None).unwrap();
    assert_eq!(placement.cancel_drag(), Ok(true));
    assert_eq!(placement.get_instance(a).unwrap().position, Float3::new(5.0, 0.0, 5.0));
}

#[test]
fn vehicle_settles_on_flat_straight() {
    let mut session = session();
    session.place(STRAIGHT_SEGMENT, Float3::ZERO, Float3::ZERO).unwrap();
    let config = *session.config();
    let world = session.placement_mut().engine_mut();
    let mut vehicle = Vehicle::spawn(world, Float3::new(0.0, 4.0, 15.0), config.vehicle, config.gravity).unwrap();

    for _ in 0..20 {
        vehicle.tick(world, DT);
    }
    let falling = world.linear_velocity(vehicle.body()).unwrap();
    assert!(falling.y < 0.0);
    assert!(falling.y.abs() > 10.0 * (falling.x.abs() + falling.z.abs()), "{falling:?}");

    for _ in 0..300 {
        vehicle.tick(world, DT);
    }
    let resting = world.body_position(vehicle.body()).unwrap();
    assert!(resting.y > 0.5 && resting.y < 2.0, "{resting:?}");
    assert!(vehicle.speed(&*world) < 1.0);
    assert!(vehicle.surface_follow().surface().is_some());
}

#[test]
fn gravity_follows_a_rolled_track() {
    let mut session = session();
    session.place(STRAIGHT_SEGMENT, Float3::ZERO, Float3::new(0.0, 0.0, 0.5)).unwrap();
    let normal = Float3::new(-0.5f32.sin(), 0.5f32.cos(), 0.0);
    let config = *session.config();
    let world = session.placement_mut().engine_mut();
    let start = Float3::new(0.0, 0.0, 15.0) + normal * 3.0;
    let mut vehicle = Vehicle::spawn(world, start, config.vehicle, config.gravity).unwrap();

    vehicle.tick(world, DT);
    let expected = normal * -config.gravity.strength;
    let gravity = vehicle.gravity();
    assert_relative_eq!(gravity.x, expected.x, epsilon = 1e-3);
    assert_relative_eq!(gravity.y, expected.y, epsilon = 1e-3);
    assert_relative_eq!(gravity.z, 0.0, epsilon = 1e-3);
}

#[test]
fn empty_world_keeps_default_gravity() {
    init_tracing();
    let mut world = HeadlessWorld::new();
    let mut vehicle = Vehicle::spawn(
        &mut world,
        Float3::ZERO,
        Default::default(),
        GravityConfig::default(),
    )
    .unwrap();
    vehicle.set_intent(DriveIntent {
        accelerate: true,
        turn_right: true,
        ..DriveIntent::default()
    });
    for _ in 0..120 {
        vehicle.tick(&mut world, DT);
        assert!(world.linear_velocity(vehicle.body()).unwrap().is_finite());
    }
    assert_eq!(vehicle.gravity(), Float3::new(0.0, -9.81, 0.0));
}

#[test]
fn track_survives_directory_store_round_trip() {
    init_tracing();
    let root = std::env::temp_dir().join(format!("tubetrack-scenario-{}", std::process::id()));
    let store = DirectoryStore::open(&root).unwrap();
    let mut session = EditorSession::new(EngineConfig::default(), HeadlessWorld::new(), store);

    session.new_track("Harbour", "robin");
    session.place(STRAIGHT_SEGMENT, Float3::ZERO, Float3::ZERO).unwrap();
    session.place(CURVE_90, Float3::new(0.0, 0.0, 30.0), Float3::ZERO).unwrap();
    session.record_lap("robin", 41.5);
    session.save().unwrap();
    let saved = session.track().clone();

    let store = DirectoryStore::open(&root).unwrap();
    let mut reopened = EditorSession::new(EngineConfig::default(), HeadlessWorld::new(), store);
    let report = reopened.load(&saved.id).unwrap();
    assert_eq!(report.restored, 2);
    assert_eq!(reopened.track(), &saved);
    assert_eq!(reopened.placement().len(), 2);
    assert_eq!(reopened.track().checkpoints.len(), 1);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn leaderboard_keeps_ten_fastest() {
    let mut session = session();
    for i in 0..12 {
        session.record_lap("p", 60.0 - i as f32);
    }
    let times: Vec<f32> = session.track().best_times.iter().map(|b| b.time).collect();
    assert_eq!(times.len(), 10);
    assert_eq!(times.first(), Some(&49.0));
    assert_eq!(times.last(), Some(&58.0));
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}
