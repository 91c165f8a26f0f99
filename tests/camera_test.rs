use std::f32::consts::PI;

use cgmath::{Deg, InnerSpace, Matrix4, SquareMatrix};
use portfolio_scene::camera::{
    CameraConfig, CameraUniform, OrbitCamera, OrbitControls, OrbitSettings, Projection,
};
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceId, ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
};

const HEIGHT: u32 = 600;

fn device() -> DeviceId {
    // SAFETY: only used to build synthetic events.
    unsafe { DeviceId::dummy() }
}

fn button(button: MouseButton, state: ElementState) -> WindowEvent {
    WindowEvent::MouseInput {
        device_id: device(),
        state,
        button,
    }
}

fn cursor(x: f64, y: f64) -> WindowEvent {
    WindowEvent::CursorMoved {
        device_id: device(),
        position: PhysicalPosition::new(x, y),
    }
}

fn wheel(lines: f32) -> WindowEvent {
    WindowEvent::MouseWheel {
        device_id: device(),
        delta: MouseScrollDelta::LineDelta(0.0, lines),
        phase: TouchPhase::Moved,
    }
}

struct Rig {
    camera: OrbitCamera,
    controls: OrbitControls,
    projection: Projection,
}

impl Rig {
    fn new(settings: OrbitSettings) -> Self {
        let config = CameraConfig::portfolio();
        Self {
            camera: OrbitCamera::new(config.position, config.target),
            controls: OrbitControls::new(settings),
            projection: Projection::new(800, HEIGHT, config.fovy, config.znear, config.zfar),
        }
    }

    fn send(&mut self, event: WindowEvent) -> bool {
        self.controls
            .handle_window_event(&event, &self.camera, &self.projection, HEIGHT)
    }

    fn drag(&mut self, with: MouseButton, from: (f64, f64), to: (f64, f64)) {
        self.send(cursor(from.0, from.1));
        self.send(button(with, ElementState::Pressed));
        self.send(cursor(to.0, to.1));
        self.send(button(with, ElementState::Released));
    }

    fn settle(&mut self) {
        for _ in 0..400 {
            self.controls.update(&mut self.camera);
        }
    }
}

#[test]
fn orbit_camera_starts_at_the_configured_position() {
    let config = CameraConfig::portfolio();
    let camera = OrbitCamera::new(config.position, config.target);
    let eye = camera.eye();
    for (actual, expected) in [eye.x, eye.y, eye.z].into_iter().zip(config.position) {
        assert!((actual - expected).abs() < 1e-4, "{actual} != {expected}");
    }
    assert!((camera.distance - (1.0f32 + 36.0 + 256.0).sqrt()).abs() < 1e-4);
}

#[test]
fn portfolio_camera_settings() {
    let config = CameraConfig::portfolio();
    assert_eq!(config.position, [-1.0, 6.0, 16.0]);
    assert_eq!(config.fovy, Deg(75.0));
    assert_eq!(config.znear, 0.025);
    assert_eq!(config.zfar, 1000.0);
}

#[test]
fn wheel_up_dollies_in_and_wheel_down_out() {
    let mut rig = Rig::new(OrbitSettings::default());
    let start = rig.camera.distance;

    assert!(rig.send(wheel(1.0)));
    rig.controls.update(&mut rig.camera);
    assert!((rig.camera.distance - start * 0.95).abs() < 1e-4);

    assert!(rig.send(wheel(-1.0)));
    rig.controls.update(&mut rig.camera);
    assert!((rig.camera.distance - start).abs() < 1e-4);
}

#[test]
fn left_drag_rotates_with_damping() {
    let mut rig = Rig::new(OrbitSettings::default());
    let start = rig.camera.azimuth;

    rig.drag(MouseButton::Left, (100.0, 100.0), (160.0, 100.0));
    rig.controls.update(&mut rig.camera);
    let expected_total = -60.0 * 2.0 * PI / HEIGHT as f32;
    let first_step = rig.camera.azimuth - start;
    assert!((first_step - expected_total * 0.05).abs() < 1e-5);

    rig.settle();
    assert!((rig.camera.azimuth - start - expected_total).abs() < 1e-3);
    assert!((rig.camera.target - cgmath::Vector3::new(0.0, 0.0, 0.0)).magnitude() < 1e-6);
}

#[test]
fn undamped_controls_apply_motion_at_once() {
    let mut rig = Rig::new(OrbitSettings {
        damping: None,
        ..Default::default()
    });
    let start = rig.camera.azimuth;
    rig.drag(MouseButton::Left, (0.0, 0.0), (30.0, 0.0));
    rig.controls.update(&mut rig.camera);
    let after_one = rig.camera.azimuth;
    rig.controls.update(&mut rig.camera);
    assert!((after_one - start - (-30.0 * 2.0 * PI / HEIGHT as f32)).abs() < 1e-5);
    assert_eq!(rig.camera.azimuth, after_one);
}

#[test]
fn moving_without_a_pressed_button_does_nothing() {
    let mut rig = Rig::new(OrbitSettings::default());
    let before = rig.camera;
    assert!(!rig.send(cursor(10.0, 10.0)));
    assert!(!rig.send(cursor(200.0, 50.0)));
    rig.settle();
    assert_eq!(rig.camera, before);
}

#[test]
fn polar_angle_never_reaches_a_pole() {
    let mut rig = Rig::new(OrbitSettings::default());
    rig.drag(MouseButton::Left, (0.0, 0.0), (0.0, 100_000.0));
    rig.settle();
    assert!(rig.camera.polar > 0.0);
    assert!(rig.camera.polar < PI);

    rig.drag(MouseButton::Left, (0.0, 100_000.0), (0.0, -100_000.0));
    rig.settle();
    assert!(rig.camera.polar > 0.0);
    assert!(rig.camera.polar < PI);
}

#[test]
fn right_drag_pans_the_target() {
    let mut rig = Rig::new(OrbitSettings::default());
    let distance = rig.camera.distance;
    rig.drag(MouseButton::Right, (0.0, 0.0), (50.0, 0.0));
    rig.settle();
    assert!(rig.camera.target.magnitude() > 0.1);
    // Panning moves the target, not the distance to it.
    assert!((rig.camera.distance - distance).abs() < 1e-4);
}

#[test]
fn distance_is_clamped() {
    let mut rig = Rig::new(OrbitSettings {
        min_distance: 5.0,
        max_distance: 20.0,
        ..Default::default()
    });
    for _ in 0..200 {
        rig.send(wheel(1.0));
    }
    rig.controls.update(&mut rig.camera);
    assert_eq!(rig.camera.distance, 5.0);

    for _ in 0..200 {
        rig.send(wheel(-1.0));
    }
    rig.controls.update(&mut rig.camera);
    assert_eq!(rig.camera.distance, 20.0);
}

#[test]
fn uniform_carries_an_inverse_view_projection() {
    let rig = Rig::new(OrbitSettings::default());
    let mut uniform = CameraUniform::new();
    uniform.update_view_proj(&rig.camera, &rig.projection);

    let product = Matrix4::from(uniform.inv_view_proj) * Matrix4::from(uniform.view_proj);
    let identity = Matrix4::<f32>::identity();
    for c in 0..4 {
        for r in 0..4 {
            assert!((product[c][r] - identity[c][r]).abs() < 1e-3);
        }
    }
    assert!((uniform.view_position[1] - 6.0).abs() < 1e-4);
}
