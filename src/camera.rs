//! Orbit camera, projection, uniforms and pointer controls.
//!
//! The camera orbits a target on a sphere (azimuth around +Y, polar angle
//! from +Y). [`OrbitControls`] turns window pointer events into rotation
//! (left drag), panning (right drag) and dolly (wheel), eased out over the
//! following frames.

use std::f32::consts::PI;

use cgmath::{
    Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, Zero,
    perspective,
};
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Polar angles closer than this to a pole are clamped.
const POLE_EPSILON: f32 = 1e-6;

/// Initial camera parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl CameraConfig {
    pub fn portfolio() -> Self {
        Self {
            position: [-1.0, 6.0, 16.0],
            target: [0.0, 0.0, 0.0],
            fovy: Deg(75.0),
            znear: 0.025,
            zfar: 1000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub target: Vector3<f32>,
    pub distance: f32,
    /// Angle around +Y, zero looking down -Z from +Z.
    pub azimuth: f32,
    /// Angle from +Y.
    pub polar: f32,
}

impl OrbitCamera {
    pub fn new(position: [f32; 3], target: [f32; 3]) -> Self {
        let target = Vector3::from(target);
        let offset = Vector3::from(position) - target;
        let distance = offset.magnitude();
        let (azimuth, polar) = if distance > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / distance).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };
        Self {
            target,
            distance,
            azimuth,
            polar,
        }
    }

    pub fn eye(&self) -> Vector3<f32> {
        let sin_polar = self.polar.sin();
        self.target
            + Vector3::new(
                self.distance * sin_polar * self.azimuth.sin(),
                self.distance * self.polar.cos(),
                self.distance * sin_polar * self.azimuth.cos(),
            )
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from_vec(self.eye()),
            Point3::from_vec(self.target),
            Vector3::unit_y(),
        )
    }

    /// Camera right and up axes in world space.
    pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>) {
        let forward = (self.target - self.eye()).normalize();
        let right = forward.cross(Vector3::unit_y()).normalize();
        let up = right.cross(forward).normalize();
        (right, up)
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    pub fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    /// Maps clip space back to world space, used by the skybox.
    pub inv_view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view: Matrix4::identity().into(),
            view_proj: Matrix4::identity().into(),
            inv_view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &OrbitCamera, projection: &Projection) {
        self.view_position = camera.eye().extend(1.0).into();
        let view = camera.calc_matrix();
        let view_proj = projection.calc_matrix() * view;
        self.view = view.into();
        self.view_proj = view_proj.into();
        self.inv_view_proj = view_proj
            .invert()
            .unwrap_or_else(Matrix4::identity)
            .into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Speeds and limits of [`OrbitControls`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitSettings {
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    /// Fraction of the pending motion applied per frame; `None` applies it at once.
    pub damping: Option<f32>,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.01,
            max_distance: f32::INFINITY,
            min_polar: 0.0,
            max_polar: PI,
            damping: Some(0.05),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    Rotate,
    Pan,
}

#[derive(Debug)]
pub struct OrbitControls {
    pub settings: OrbitSettings,
    drag: Option<Drag>,
    cursor: Option<PhysicalPosition<f64>>,
    azimuth_delta: f32,
    polar_delta: f32,
    pan_offset: Vector3<f32>,
    zoom_scale: f32,
}

impl OrbitControls {
    pub fn new(settings: OrbitSettings) -> Self {
        Self {
            settings,
            drag: None,
            cursor: None,
            azimuth_delta: 0.0,
            polar_delta: 0.0,
            pan_offset: Vector3::zero(),
            zoom_scale: 1.0,
        }
    }

    /// Record pointer input. Returns whether the event was used.
    pub fn handle_window_event(
        &mut self,
        event: &WindowEvent,
        camera: &OrbitCamera,
        projection: &Projection,
        viewport_height: u32,
    ) -> bool {
        let height = viewport_height.max(1) as f32;
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let drag = match button {
                    MouseButton::Left => Drag::Rotate,
                    MouseButton::Right => Drag::Pan,
                    _ => return false,
                };
                match state {
                    ElementState::Pressed => self.drag = Some(drag),
                    ElementState::Released if self.drag == Some(drag) => self.drag = None,
                    ElementState::Released => (),
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position);
                let (Some(drag), Some(previous)) = (self.drag, previous) else {
                    return false;
                };
                let dx = (position.x - previous.x) as f32;
                let dy = (position.y - previous.y) as f32;
                match drag {
                    Drag::Rotate => {
                        let step = 2.0 * PI * self.settings.rotate_speed / height;
                        self.azimuth_delta -= dx * step;
                        self.polar_delta -= dy * step;
                    }
                    Drag::Pan => {
                        let (right, up) = camera.basis();
                        let target_distance = camera.distance * (projection.fovy.0 / 2.0).tan();
                        let step = 2.0 * target_distance * self.settings.pan_speed / height;
                        self.pan_offset += -right * (dx * step) + up * (dy * step);
                    }
                }
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32,
                };
                let scale = 0.95f32.powf(self.settings.zoom_speed);
                if scroll > 0.0 {
                    self.zoom_scale *= scale;
                } else if scroll < 0.0 {
                    self.zoom_scale /= scale;
                }
                scroll != 0.0
            }
            _ => false,
        }
    }

    /// Apply pending motion to `camera`. Called once per frame.
    pub fn update(&mut self, camera: &mut OrbitCamera) {
        let factor = self.settings.damping.unwrap_or(1.0);

        camera.azimuth += self.azimuth_delta * factor;
        camera.polar = (camera.polar + self.polar_delta * factor)
            .clamp(self.settings.min_polar, self.settings.max_polar)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);
        camera.distance = (camera.distance * self.zoom_scale)
            .clamp(self.settings.min_distance, self.settings.max_distance);
        camera.target += self.pan_offset * factor;

        let remaining = 1.0 - factor;
        self.azimuth_delta *= remaining;
        self.polar_delta *= remaining;
        self.pan_offset *= remaining;
        self.zoom_scale = 1.0;
    }
}

/// The camera together with its GPU uniform.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: OrbitCamera,
    pub controls: OrbitControls,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        camera: OrbitCamera,
        controls: OrbitControls,
        projection: &Projection,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controls,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Advance the controls and upload the new matrices.
    pub fn update(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.controls.update(&mut self.camera);
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
