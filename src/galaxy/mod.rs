pub mod config;
pub mod overlay;
pub mod scene;
pub mod state;
pub mod view;

use crate::engine::camera::{DragMode, OrbitControls, PerspectiveCamera};
use crate::engine::raycast::{to_ndc, Ray};
use crate::engine::scene_graph::NodeId;
use crate::galaxy::config::GalaxyConfig;
use crate::galaxy::scene::SolarScene;
use crate::galaxy::state::InteractionState;
use nalgebra::Point3;
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cursor {
    Default,
    Pointer,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Pointer => "pointer",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

impl PointerButton {
    /// Maps `MouseEvent.button` values.
    pub fn from_code(code: i16) -> Self {
        match code {
            0 => PointerButton::Primary,
            2 => PointerButton::Secondary,
            _ => PointerButton::Other,
        }
    }
}

/// Everything the component owns apart from the DOM and GL handles:
/// the scene, the camera rig and the interaction state.
pub struct Galaxy {
    config: GalaxyConfig,
    state: InteractionState,
    scene: SolarScene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    viewport: (f32, f32),
    cursor: Cursor,
}

impl Galaxy {
    pub fn new<R: Rng>(config: GalaxyConfig, width: f32, height: f32, rng: &mut R) -> Self {
        let config = config.sanitized();
        let scene = SolarScene::build(&config, rng);

        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        camera.set_aspect(width, height);
        camera.eye = Point3::new(10.0, 5.0, 10.0);
        let controls = OrbitControls::new(&camera, config.control_settings());

        let state =
            InteractionState::new(config.rotation_enabled, config.initial_speed, config.speed_step);

        Galaxy {
            config,
            state,
            scene,
            camera,
            controls,
            viewport: (width, height),
            cursor: Cursor::Default,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut InteractionState {
        &mut self.state
    }

    pub fn scene(&self) -> &SolarScene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    /// One tick of the frame loop, minus the draw call.
    pub fn frame(&mut self) {
        if self.state.rotation_enabled() {
            self.scene.advance_orbits(self.state.rotation_speed(), self.config.moon_speed_ratio);
        }
        self.controls.update(&mut self.camera);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
        self.camera.set_aspect(width, height);
    }

    /// Nearest clickable body under a pixel, if any.
    pub fn pick(&self, x: f32, y: f32) -> Option<NodeId> {
        let (width, height) = self.viewport;
        let ray = Ray::from_camera(&to_ndc(x, y, width, height), &self.camera)?;
        let graph = &self.scene.graph;
        let spheres = self.scene.clickable.iter().filter_map(|&id| {
            self.scene.body(id).map(|body| (id, graph.world_position(id), body.radius))
        });
        ray.nearest_sphere(spheres).map(|hit| hit.target)
    }

    /// Hover: continues any camera drag, then updates the cursor affordance.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Cursor {
        self.controls.drag_to(x, y, &self.camera, self.viewport.1);
        self.cursor = match self.pick(x, y) {
            Some(_) => Cursor::Pointer,
            None => Cursor::Default,
        };
        self.cursor
    }

    /// Click: reports the body under the pointer and, in the click variant,
    /// toggles rotation.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Option<String> {
        let id = self.pick(x, y)?;
        let name = self.scene.graph.node(id).name.clone();
        log::info!("Clicked on: {}", name);
        if self.config.controls.toggle_via_click {
            self.state.toggle_rotation();
        }
        Some(name)
    }

    pub fn begin_drag(&mut self, button: PointerButton, x: f32, y: f32) {
        let mode = match button {
            PointerButton::Primary => DragMode::Rotate,
            PointerButton::Secondary => DragMode::Pan,
            PointerButton::Other => return,
        };
        self.controls.begin_drag(mode, x, y);
    }

    pub fn end_drag(&mut self) {
        self.controls.end_drag();
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.controls.zoom(delta_y);
    }
}
