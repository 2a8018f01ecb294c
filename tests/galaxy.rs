use approx::assert_relative_eq;
use galaxy_background::galaxy::config::{ControlScheme, GalaxyConfig};
use galaxy_background::galaxy::{Cursor, Galaxy, PointerButton};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::sync::Once;

const WIDTH: f32 = 1280.0;
const HEIGHT: f32 = 720.0;

thread_local! {
    static RECORDS: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

/// Keeps each test thread's info records apart.
struct ThreadRecorder;

impl log::Log for ThreadRecorder {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            RECORDS.with(|records| records.borrow_mut().push(record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static RECORDER: ThreadRecorder = ThreadRecorder;
static INSTALL: Once = Once::new();

fn click_records() -> Vec<String> {
    RECORDS.with(|records| {
        records.borrow().iter().filter(|line| line.starts_with("Clicked on:")).cloned().collect()
    })
}

fn record_logs() {
    INSTALL.call_once(|| {
        log::set_logger(&RECORDER).unwrap();
        log::set_max_level(log::LevelFilter::Info);
    });
    RECORDS.with(|records| records.borrow_mut().clear());
}

fn galaxy_with(config: GalaxyConfig) -> Galaxy {
    let config = GalaxyConfig { star_count: 100, ..config };
    Galaxy::new(config, WIDTH, HEIGHT, &mut SmallRng::seed_from_u64(42))
}

fn galaxy() -> Galaxy {
    galaxy_with(GalaxyConfig::default())
}

/// Pixel position of a world point on the current camera.
fn screen_position(galaxy: &Galaxy, point: &Point3<f32>) -> (f32, f32) {
    let ndc = galaxy.camera().project(point);
    ((ndc.x + 1.0) / 2.0 * WIDTH, (1.0 - ndc.y) / 2.0 * HEIGHT)
}

fn body_on_screen(galaxy: &Galaxy, name: &str) -> (f32, f32) {
    let scene = galaxy.scene();
    let id = scene.graph.find(name).unwrap();
    screen_position(galaxy, &scene.graph.world_position(id))
}

#[test]
fn first_frame_rotates_earth_and_moon() {
    let mut galaxy = galaxy();
    assert!(galaxy.state().rotation_enabled());
    assert_eq!(galaxy.state().rotation_speed(), 0.005);

    galaxy.frame();

    let scene = galaxy.scene();
    assert_relative_eq!(scene.graph.node(scene.earth_pivot).yaw(), 0.005, epsilon = 1e-6);
    assert_relative_eq!(scene.graph.node(scene.moon_pivot).yaw(), 0.01, epsilon = 1e-6);
}

#[test]
fn slower_three_times_then_clamps() {
    let mut galaxy = galaxy();
    for _ in 0..3 {
        galaxy.state_mut().slower();
    }
    assert_eq!(galaxy.state().rotation_speed(), 0.002);
    for _ in 0..3 {
        galaxy.state_mut().slower();
    }
    assert_eq!(galaxy.state().rotation_speed(), 0.0);
}

#[test]
fn moon_always_turns_twice_as_far() {
    for clicks in 0..8 {
        let mut galaxy = galaxy();
        for _ in 0..clicks {
            galaxy.state_mut().faster();
        }
        galaxy.frame();
        galaxy.frame();
        let scene = galaxy.scene();
        let earth = scene.graph.node(scene.earth_pivot).yaw();
        let moon = scene.graph.node(scene.moon_pivot).yaw();
        assert_relative_eq!(moon, 2.0 * earth, epsilon = 1e-6);
        assert_relative_eq!(earth, 2.0 * galaxy.state().rotation_speed(), epsilon = 1e-6);
    }
}

#[test]
fn disabled_rotation_freezes_pivots_but_controls_still_run() {
    let mut galaxy = galaxy();
    galaxy.state_mut().toggle_rotation();

    galaxy.begin_drag(PointerButton::Primary, 600.0, 300.0);
    galaxy.pointer_move(700.0, 300.0);
    galaxy.end_drag();
    let eye_before = galaxy.camera().eye;

    for _ in 0..50 {
        galaxy.frame();
    }

    let scene = galaxy.scene();
    assert_eq!(scene.graph.node(scene.earth_pivot).rotation, UnitQuaternion::identity());
    assert_eq!(scene.graph.node(scene.moon_pivot).rotation, UnitQuaternion::identity());
    assert!((galaxy.camera().eye - eye_before).norm() > 0.01);
}

#[test]
fn earth_follows_its_orbit() {
    let mut galaxy = galaxy();
    for _ in 0..100 {
        galaxy.frame();
    }
    let turn = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 100.0 * 0.005);
    let expected = turn * Point3::new(5.0, 0.0, 0.0);
    let scene = galaxy.scene();
    assert_relative_eq!(scene.graph.world_position(scene.earth), expected, epsilon = 1e-4);
}

#[test]
fn hover_over_bodies_shows_pointer() {
    let mut galaxy = galaxy();
    let (x, y) = body_on_screen(&galaxy, "Earth");
    assert_eq!(galaxy.pointer_move(x, y), Cursor::Pointer);

    let (x, y) = body_on_screen(&galaxy, "Moon");
    assert_eq!(galaxy.pointer_move(x, y), Cursor::Pointer);

    assert_eq!(galaxy.pointer_move(0.0, 0.0), Cursor::Default);
    assert_eq!(galaxy.cursor(), Cursor::Default);
}

#[test]
fn sun_is_not_clickable() {
    let mut galaxy = galaxy();
    let (x, y) = body_on_screen(&galaxy, "Sun");
    assert_eq!(galaxy.pointer_move(x, y), Cursor::Default);
    assert_eq!(galaxy.pointer_down(x, y), None);
}

#[test]
fn click_reports_body_without_toggling_in_button_variant() {
    let mut galaxy = galaxy();
    let (x, y) = body_on_screen(&galaxy, "Moon");
    assert_eq!(galaxy.pointer_down(x, y).as_deref(), Some("Moon"));
    assert!(galaxy.state().rotation_enabled());

    assert_eq!(galaxy.pointer_down(5.0, 5.0), None);
}

#[test]
fn click_variant_toggles_rotation_on_hit_only() {
    let config = GalaxyConfig { controls: ControlScheme::click(), ..GalaxyConfig::default() };
    let mut galaxy = galaxy_with(config);
    let (x, y) = body_on_screen(&galaxy, "Earth");

    assert_eq!(galaxy.pointer_down(x, y).as_deref(), Some("Earth"));
    assert!(!galaxy.state().rotation_enabled());

    galaxy.pointer_down(1.0, 1.0);
    assert!(!galaxy.state().rotation_enabled());

    galaxy.pointer_down(x, y);
    assert!(galaxy.state().rotation_enabled());
}

#[test]
fn each_hit_logs_one_click_line_and_misses_log_none() {
    record_logs();
    let mut galaxy = galaxy();
    let (x, y) = body_on_screen(&galaxy, "Earth");

    galaxy.pointer_down(x, y);
    assert_eq!(click_records(), vec!["Clicked on: Earth".to_string()]);

    galaxy.pointer_down(3.0, 3.0);
    let (x, y) = body_on_screen(&galaxy, "Sun");
    galaxy.pointer_down(x, y);
    assert_eq!(click_records().len(), 1);

    let (x, y) = body_on_screen(&galaxy, "Moon");
    galaxy.pointer_down(x, y);
    assert_eq!(click_records(), ["Clicked on: Earth", "Clicked on: Moon"]);
}

#[test]
fn picking_tracks_orbiting_earth() {
    let mut galaxy = galaxy();
    let (x, y) = body_on_screen(&galaxy, "Earth");
    // a quarter orbit later the earth has left that pixel
    for _ in 0..315 {
        galaxy.frame();
    }
    assert_ne!(galaxy.pointer_down(x, y).as_deref(), Some("Earth"));

    let (x, y) = body_on_screen(&galaxy, "Earth");
    assert_eq!(galaxy.pointer_down(x, y).as_deref(), Some("Earth"));
}

#[test]
fn resize_updates_aspect() {
    let mut galaxy = galaxy();
    galaxy.resize(800.0, 800.0);
    assert_relative_eq!(galaxy.camera().aspect, 1.0);
    assert_eq!(galaxy.viewport(), (800.0, 800.0));
}

#[test]
fn configured_moon_ratio_and_star_count() {
    let config = GalaxyConfig { moon_speed_ratio: 3.0, ..GalaxyConfig::default() };
    let mut galaxy = Galaxy::new(
        GalaxyConfig { star_count: 64, ..config },
        WIDTH,
        HEIGHT,
        &mut SmallRng::seed_from_u64(1),
    );
    galaxy.frame();
    let scene = galaxy.scene();
    assert_relative_eq!(scene.graph.node(scene.moon_pivot).yaw(), 0.015, epsilon = 1e-6);
    assert_eq!(scene.starfield().unwrap().len(), 64);
}

#[test]
fn wheel_zoom_respects_limits() {
    let mut galaxy = galaxy();
    for _ in 0..300 {
        galaxy.wheel(-1.0);
        galaxy.frame();
    }
    assert_relative_eq!(galaxy.controls().distance(), 2.0);
}
