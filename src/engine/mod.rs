pub mod camera;
pub mod mesh;
pub mod raycast;
pub mod renderer;
pub mod scene_graph;
