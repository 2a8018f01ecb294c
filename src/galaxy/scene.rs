use crate::engine::mesh::Mesh;
use crate::engine::scene_graph::{NodeId, SceneGraph};
use crate::galaxy::config::GalaxyConfig;
use nalgebra::Vector3;
use rand::Rng;

pub const SPHERE_SEGMENTS: u32 = 32;

pub type Color = (f32, f32, f32);

pub fn hex_color(hex: u32) -> Color {
    (
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

pub enum Material {
    /// Unlit; shows `color` until the map has loaded.
    Emissive { map: String, color: Color },
    Phong {
        map: String,
        specular_map: Option<String>,
        normal_map: Option<String>,
        normal_scale: f32,
        shininess: f32,
    },
}

impl Material {
    pub fn texture_paths(&self) -> Vec<&str> {
        match self {
            Material::Emissive { map, .. } => vec![map.as_str()],
            Material::Phong { map, specular_map, normal_map, .. } => {
                let mut paths = vec![map.as_str()];
                paths.extend(specular_map.as_deref());
                paths.extend(normal_map.as_deref());
                paths
            }
        }
    }
}

pub struct CelestialBody {
    pub radius: f32,
    pub mesh: Mesh,
    pub material: Material,
}

pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub range: f32,
}

pub struct Starfield {
    /// Flat xyz triples.
    pub positions: Vec<f32>,
    pub size: f32,
    pub color: Color,
}

impl Starfield {
    pub fn generate<R: Rng>(count: usize, half_extent: f32, rng: &mut R) -> Self {
        let mut positions = Vec::with_capacity(count * 3);
        for _ in 0..count * 3 {
            positions.push((rng.gen::<f32>() - 0.5) * 2.0 * half_extent);
        }
        Starfield { positions, size: 0.7, color: (1.0, 1.0, 1.0) }
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

pub enum SceneObject {
    Group,
    Body(CelestialBody),
    PointLight(PointLight),
    AmbientLight { color: Color, intensity: f32 },
    Stars(Starfield),
}

/// The built scene plus handles to the nodes the frame loop and the
/// interaction handler touch.
pub struct SolarScene {
    pub graph: SceneGraph<SceneObject>,
    pub sun: NodeId,
    pub earth_pivot: NodeId,
    pub earth: NodeId,
    pub moon_pivot: NodeId,
    pub moon: NodeId,
    pub clickable: Vec<NodeId>,
}

impl SolarScene {
    pub fn build<R: Rng>(config: &GalaxyConfig, rng: &mut R) -> Self {
        let textures = &config.textures;
        let mut graph = SceneGraph::new(SceneObject::Group);
        let root = graph.root();

        let stars = Starfield::generate(config.star_count, config.star_half_extent, rng);
        graph.add_child(root, "stars", Vector3::zeros(), SceneObject::Stars(stars));

        let sun = graph.add_child(
            root,
            "Sun",
            Vector3::zeros(),
            SceneObject::Body(CelestialBody {
                radius: 1.2,
                mesh: Mesh::sphere(1.2, SPHERE_SEGMENTS, SPHERE_SEGMENTS),
                material: Material::Emissive {
                    map: textures.sun.clone(),
                    color: hex_color(0xffff00),
                },
            }),
        );

        graph.add_child(
            root,
            "sunlight",
            Vector3::zeros(),
            SceneObject::PointLight(PointLight {
                color: hex_color(0xffffff),
                intensity: 3.0,
                range: 1000.0,
            }),
        );
        graph.add_child(
            root,
            "ambient",
            Vector3::zeros(),
            SceneObject::AmbientLight { color: hex_color(0x404040), intensity: 1.0 },
        );

        let earth_pivot = graph.add_child(sun, "earth-orbit", Vector3::zeros(), SceneObject::Group);
        let earth = graph.add_child(
            earth_pivot,
            "Earth",
            Vector3::new(5.0, 0.0, 0.0),
            SceneObject::Body(CelestialBody {
                radius: 0.5,
                mesh: Mesh::sphere(0.5, SPHERE_SEGMENTS, SPHERE_SEGMENTS),
                material: Material::Phong {
                    map: textures.earth.clone(),
                    specular_map: Some(textures.earth_specular.clone()),
                    normal_map: Some(textures.earth_normal.clone()),
                    normal_scale: 0.5,
                    shininess: 10.0,
                },
            }),
        );
        graph.add_child(
            root,
            "earthlight",
            Vector3::new(5.0, 0.0, 10.0),
            SceneObject::PointLight(PointLight {
                color: hex_color(0x4b92dc),
                intensity: 1.5,
                range: 100.0,
            }),
        );

        let moon_pivot = graph.add_child(earth, "moon-orbit", Vector3::zeros(), SceneObject::Group);
        let moon = graph.add_child(
            moon_pivot,
            "Moon",
            Vector3::new(1.0, 0.0, 0.0),
            SceneObject::Body(CelestialBody {
                radius: 0.14,
                mesh: Mesh::sphere(0.14, SPHERE_SEGMENTS, SPHERE_SEGMENTS),
                material: Material::Phong {
                    map: textures.moon.clone(),
                    specular_map: None,
                    normal_map: None,
                    normal_scale: 1.0,
                    shininess: 30.0,
                },
            }),
        );
        graph.add_child(
            root,
            "moonlight",
            Vector3::new(6.0, 0.0, 1.0),
            SceneObject::PointLight(PointLight {
                color: hex_color(0x888888),
                intensity: 0.5,
                range: 50.0,
            }),
        );

        SolarScene {
            graph,
            sun,
            earth_pivot,
            earth,
            moon_pivot,
            moon,
            clickable: vec![earth, moon],
        }
    }

    pub fn body(&self, id: NodeId) -> Option<&CelestialBody> {
        match &self.graph.node(id).payload {
            SceneObject::Body(body) => Some(body),
            _ => None,
        }
    }

    pub fn starfield(&self) -> Option<&Starfield> {
        self.graph.iter().find_map(|(_, node)| match &node.payload {
            SceneObject::Stars(stars) => Some(stars),
            _ => None,
        })
    }

    /// Advances both orbits; the moon turns `ratio` times as far as the earth.
    pub fn advance_orbits(&mut self, speed: f32, ratio: f32) {
        self.graph.rotate_y(self.earth_pivot, speed);
        self.graph.rotate_y(self.moon_pivot, speed * ratio);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn scene() -> SolarScene {
        let config = GalaxyConfig { star_count: 250, ..GalaxyConfig::default() };
        SolarScene::build(&config, &mut SmallRng::seed_from_u64(7))
    }

    #[test]
    fn hierarchy_moon_under_earth_under_sun() {
        let scene = scene();
        let graph = &scene.graph;
        assert_eq!(graph.node(scene.earth_pivot).parent, Some(scene.sun));
        assert_eq!(graph.node(scene.earth).parent, Some(scene.earth_pivot));
        assert_eq!(graph.node(scene.moon_pivot).parent, Some(scene.earth));
        assert_eq!(graph.node(scene.moon).parent, Some(scene.moon_pivot));
        assert_eq!(graph.node(scene.earth).name, "Earth");
        assert_eq!(graph.node(scene.moon).name, "Moon");
    }

    #[test]
    fn starfield_fills_cube() {
        let scene = scene();
        let stars = scene.starfield().unwrap();
        assert_eq!(stars.len(), 250);
        assert!(stars.positions.iter().all(|c| c.abs() <= 1000.0));
    }

    #[test]
    fn clickable_set_is_earth_and_moon() {
        let scene = scene();
        assert_eq!(scene.clickable, vec![scene.earth, scene.moon]);
        assert!(scene.body(scene.sun).is_some());
        assert!(scene.body(scene.earth_pivot).is_none());
    }

    #[test]
    fn earth_material_carries_all_maps() {
        let scene = scene();
        let earth = scene.body(scene.earth).unwrap();
        assert_eq!(
            earth.material.texture_paths(),
            vec!["earthmap1k.jpeg", "earthspec1k.jpeg", "earth_normalmap_flat.jpeg"]
        );
    }

    #[test]
    fn hex_colors() {
        assert_eq!(hex_color(0xffff00), (1.0, 1.0, 0.0));
        assert_eq!(hex_color(0x000000), (0.0, 0.0, 0.0));
    }
}
