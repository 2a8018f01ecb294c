use std::f32::consts::PI;

/// Position (3), normal (3), texture coordinate (2), tangent (3).
pub const FLOATS_PER_VERTEX: usize = 11;

/// Keeps `(w + 1) * (h + 1)` within the `u16` index range.
pub const MAX_SEGMENTS: u32 = 255;

pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// UV sphere centered on the origin. Rows run pole to pole, columns wrap
    /// around the vertical axis with a duplicated seam column.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.clamp(3, MAX_SEGMENTS);
        let height_segments = height_segments.clamp(2, MAX_SEGMENTS);
        let row_len = width_segments + 1;

        let vertex_count = (row_len * (height_segments + 1)) as usize;
        let mut vertices = Vec::with_capacity(vertex_count * FLOATS_PER_VERTEX);
        let mut indices = Vec::new();

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let (sin_v, cos_v) = (v * PI).sin_cos();

            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let (sin_u, cos_u) = (u * 2.0 * PI).sin_cos();

                let nx = -cos_u * sin_v;
                let ny = cos_v;
                let nz = sin_u * sin_v;

                vertices.extend_from_slice(&[
                    radius * nx, radius * ny, radius * nz,
                    nx, ny, nz,
                    u, 1.0 - v,
                    sin_u, 0.0, cos_u,
                ]);
            }
        }

        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = (iy * row_len + ix + 1) as u16;
                let b = (iy * row_len + ix) as u16;
                let c = ((iy + 1) * row_len + ix) as u16;
                let d = ((iy + 1) * row_len + ix + 1) as u16;

                // the pole rows collapse to triangles
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Mesh { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    pub fn position(&self, index: usize) -> [f32; 3] {
        let base = index * FLOATS_PER_VERTEX;
        [self.vertices[base], self.vertices[base + 1], self.vertices[base + 2]]
    }

    pub fn normal(&self, index: usize) -> [f32; 3] {
        let base = index * FLOATS_PER_VERTEX + 3;
        [self.vertices[base], self.vertices[base + 1], self.vertices[base + 2]]
    }
}
