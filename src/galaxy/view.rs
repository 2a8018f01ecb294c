use crate::engine::renderer::{
    GpuMesh, GpuPoints, Lighting, PointLightUniform, Renderer, SurfaceParams, SurfaceTextures,
};
use crate::engine::scene_graph::NodeId;
use crate::error::GalaxyError;
use crate::galaxy::scene::{Material, SceneObject};
use crate::galaxy::Galaxy;
use nalgebra::Point3;
use std::collections::HashMap;
use web_sys::WebGlTexture;

struct BodyDraw {
    node: NodeId,
    mesh: GpuMesh,
}

/// GPU-side mirror of a [`Galaxy`] scene. Buffers are uploaded once; the
/// transforms are read from the scene graph on every draw.
pub struct GalaxyView {
    renderer: Renderer,
    bodies: Vec<BodyDraw>,
    stars: Option<(GpuPoints, f32, (f32, f32, f32))>,
    textures: HashMap<String, WebGlTexture>,
}

impl GalaxyView {
    pub fn new(renderer: Renderer, galaxy: &Galaxy) -> Result<Self, GalaxyError> {
        let mut bodies = Vec::new();
        let mut stars = None;
        let mut textures = HashMap::new();

        for (id, node) in galaxy.scene().graph.iter() {
            match &node.payload {
                SceneObject::Body(body) => {
                    for path in body.material.texture_paths() {
                        if !textures.contains_key(path) {
                            textures.insert(path.to_string(), renderer.create_texture(path)?);
                        }
                    }
                    bodies.push(BodyDraw { node: id, mesh: renderer.upload_mesh(&body.mesh)? });
                }
                SceneObject::Stars(field) => {
                    let points = renderer.upload_points(&field.positions)?;
                    stars = Some((points, field.size, field.color));
                }
                _ => {}
            }
        }

        log::info!("uploaded {} bodies and {} textures", bodies.len(), textures.len());
        Ok(GalaxyView { renderer, bodies, stars, textures })
    }

    pub fn render(&self, galaxy: &Galaxy) {
        let (width, height) = galaxy.viewport();
        self.renderer.clear(0.0, 0.0, 0.0);
        self.renderer.resize(width as i32, height as i32);
        self.renderer.enable_depth_test();

        let camera = galaxy.camera();
        let view = camera.view();
        let projection = camera.projection();
        let view_projection = projection * view;

        let graph = &galaxy.scene().graph;
        let world = graph.world_transforms();
        let lighting = collect_lighting(galaxy);

        if let Some((points, size, color)) = &self.stars {
            self.renderer.draw_points(points, *size, *color, &view, &projection, height);
        }

        for draw in &self.bodies {
            let SceneObject::Body(body) = &graph.node(draw.node).payload else {
                continue;
            };
            let model = world[draw.node.index()].to_homogeneous();
            let (textures, params) = self.surface(&body.material);
            self.renderer.draw_body(
                &draw.mesh,
                &model,
                &textures,
                &params,
                &lighting,
                &view_projection,
                &camera.eye,
            );
        }
    }

    fn surface<'a>(&'a self, material: &Material) -> (SurfaceTextures<'a>, SurfaceParams) {
        match material {
            Material::Emissive { map, color } => (
                SurfaceTextures {
                    map: self.textures.get(map),
                    specular_map: None,
                    normal_map: None,
                },
                SurfaceParams {
                    unlit: true,
                    base_color: *color,
                    normal_scale: 1.0,
                    shininess: 1.0,
                },
            ),
            Material::Phong { map, specular_map, normal_map, normal_scale, shininess } => (
                SurfaceTextures {
                    map: self.textures.get(map),
                    specular_map: specular_map.as_ref().and_then(|p| self.textures.get(p)),
                    normal_map: normal_map.as_ref().and_then(|p| self.textures.get(p)),
                },
                SurfaceParams {
                    unlit: false,
                    base_color: (1.0, 1.0, 1.0),
                    normal_scale: *normal_scale,
                    shininess: *shininess,
                },
            ),
        }
    }
}

fn collect_lighting(galaxy: &Galaxy) -> Lighting {
    let graph = &galaxy.scene().graph;
    let mut lighting = Lighting::default();
    for (id, node) in graph.iter() {
        match &node.payload {
            SceneObject::AmbientLight { color, intensity } => {
                lighting.ambient.0 += color.0 * intensity;
                lighting.ambient.1 += color.1 * intensity;
                lighting.ambient.2 += color.2 * intensity;
            }
            SceneObject::PointLight(light) => {
                let position: Point3<f32> = graph.world_position(id);
                lighting.points.push(PointLightUniform {
                    position,
                    color: (
                        light.color.0 * light.intensity,
                        light.color.1 * light.intensity,
                        light.color.2 * light.intensity,
                    ),
                    range: light.range,
                });
            }
            _ => {}
        }
    }
    lighting
}
