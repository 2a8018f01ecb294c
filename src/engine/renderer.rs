use crate::engine::mesh::{Mesh, FLOATS_PER_VERTEX};
use crate::error::GalaxyError;
use nalgebra::{Matrix3, Matrix4, Point3};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlImageElement, WebGlBuffer, WebGlProgram, WebGlRenderingContext as Gl,
    WebGlTexture, WebGlUniformLocation,
};

pub const MAX_LIGHTS: usize = 4;

const BODY_VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    attribute vec3 aNormal;
    attribute vec2 aTexCoord;
    attribute vec3 aTangent;
    uniform mat4 uModel;
    uniform mat3 uNormalMatrix;
    uniform mat4 uViewProjection;
    varying vec3 vWorldPos;
    varying vec3 vNormal;
    varying vec3 vTangent;
    varying vec2 vTexCoord;
    void main() {
        vec4 world = uModel * vec4(aPosition, 1.0);
        vWorldPos = world.xyz;
        vNormal = uNormalMatrix * aNormal;
        vTangent = uNormalMatrix * aTangent;
        vTexCoord = aTexCoord;
        gl_Position = uViewProjection * world;
    }
"#;

const BODY_FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    #define MAX_LIGHTS 4
    varying vec3 vWorldPos;
    varying vec3 vNormal;
    varying vec3 vTangent;
    varying vec2 vTexCoord;

    uniform bool uUnlit;
    uniform vec3 uBaseColor;
    uniform vec3 uEyePosition;
    uniform vec3 uAmbient;
    uniform int uLightCount;
    uniform vec3 uLightPositions[MAX_LIGHTS];
    uniform vec3 uLightColors[MAX_LIGHTS];
    uniform float uLightRanges[MAX_LIGHTS];

    uniform sampler2D uMap;
    uniform sampler2D uSpecularMap;
    uniform bool uUseSpecularMap;
    uniform sampler2D uNormalMap;
    uniform bool uUseNormalMap;
    uniform float uNormalScale;
    uniform float uShininess;

    void main() {
        // Placeholder texels are transparent until the image arrives
        vec4 texel = texture2D(uMap, vTexCoord);
        vec3 albedo = mix(uBaseColor, texel.rgb, texel.a);
        if (uUnlit) {
            gl_FragColor = vec4(albedo, 1.0);
            return;
        }

        vec3 normal = normalize(vNormal);
        if (uUseNormalMap) {
            vec4 sampled = texture2D(uNormalMap, vTexCoord);
            vec3 tangent = normalize(vTangent - normal * dot(normal, vTangent));
            vec3 bitangent = cross(normal, tangent);
            vec3 mapped = sampled.rgb * 2.0 - 1.0;
            mapped.xy *= uNormalScale;
            vec3 perturbed = normalize(mat3(tangent, bitangent, normal) * mapped);
            normal = normalize(mix(normal, perturbed, sampled.a));
        }

        float specularStrength = 1.0;
        if (uUseSpecularMap) {
            vec4 spec = texture2D(uSpecularMap, vTexCoord);
            specularStrength = mix(1.0, spec.r, spec.a);
        }

        vec3 viewDir = normalize(uEyePosition - vWorldPos);
        vec3 diffuse = vec3(0.0);
        vec3 specular = vec3(0.0);
        for (int i = 0; i < MAX_LIGHTS; i++) {
            if (i >= uLightCount) {
                break;
            }
            vec3 toLight = uLightPositions[i] - vWorldPos;
            float dist = length(toLight);
            vec3 lightDir = toLight / max(dist, 0.0001);
            float falloff = clamp(1.0 - dist / uLightRanges[i], 0.0, 1.0);
            float lambert = max(dot(normal, lightDir), 0.0);
            diffuse += uLightColors[i] * lambert * falloff;
            vec3 halfway = normalize(lightDir + viewDir);
            float highlight = pow(max(dot(normal, halfway), 0.0), uShininess);
            specular += uLightColors[i] * highlight * falloff * specularStrength * 0.2;
        }

        vec3 color = albedo * (uAmbient + diffuse) + specular;
        gl_FragColor = vec4(color, 1.0);
    }
"#;

const POINTS_VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    uniform mat4 uView;
    uniform mat4 uProjection;
    uniform float uPointSize;
    uniform float uScale;
    void main() {
        vec4 viewPos = uView * vec4(aPosition, 1.0);
        gl_Position = uProjection * viewPos;
        gl_PointSize = max(uPointSize * (uScale / -viewPos.z), 1.0);
    }
"#;

const POINTS_FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    uniform vec3 uColor;
    void main() {
        gl_FragColor = vec4(uColor, 1.0);
    }
"#;

/// Vertex and index buffers for a mesh that lives on the GPU.
pub struct GpuMesh {
    vertex_buffer: WebGlBuffer,
    index_buffer: WebGlBuffer,
    index_count: i32,
}

pub struct GpuPoints {
    buffer: WebGlBuffer,
    count: i32,
}

pub struct PointLightUniform {
    pub position: Point3<f32>,
    pub color: (f32, f32, f32),
    pub range: f32,
}

/// Lights already folded into shader inputs: intensities are multiplied into colors.
#[derive(Default)]
pub struct Lighting {
    pub ambient: (f32, f32, f32),
    pub points: Vec<PointLightUniform>,
}

pub struct SurfaceTextures<'a> {
    pub map: Option<&'a WebGlTexture>,
    pub specular_map: Option<&'a WebGlTexture>,
    pub normal_map: Option<&'a WebGlTexture>,
}

pub struct SurfaceParams {
    pub unlit: bool,
    pub base_color: (f32, f32, f32),
    pub normal_scale: f32,
    pub shininess: f32,
}

struct BodyProgram {
    program: WebGlProgram,
    a_position: u32,
    a_normal: u32,
    a_tex_coord: u32,
    a_tangent: u32,
    u_model: WebGlUniformLocation,
    u_normal_matrix: WebGlUniformLocation,
    u_view_projection: WebGlUniformLocation,
    u_unlit: WebGlUniformLocation,
    u_base_color: WebGlUniformLocation,
    u_eye_position: WebGlUniformLocation,
    u_ambient: WebGlUniformLocation,
    u_light_count: WebGlUniformLocation,
    u_light_positions: WebGlUniformLocation,
    u_light_colors: WebGlUniformLocation,
    u_light_ranges: WebGlUniformLocation,
    u_map: WebGlUniformLocation,
    u_specular_map: WebGlUniformLocation,
    u_use_specular_map: WebGlUniformLocation,
    u_normal_map: WebGlUniformLocation,
    u_use_normal_map: WebGlUniformLocation,
    u_normal_scale: WebGlUniformLocation,
    u_shininess: WebGlUniformLocation,
}

struct PointsProgram {
    program: WebGlProgram,
    a_position: u32,
    u_view: WebGlUniformLocation,
    u_projection: WebGlUniformLocation,
    u_point_size: WebGlUniformLocation,
    u_scale: WebGlUniformLocation,
    u_color: WebGlUniformLocation,
}

pub struct Renderer {
    pub gl: Gl,
    body: BodyProgram,
    points: PointsProgram,
    placeholder: WebGlTexture,
}

impl Renderer {
    pub fn new(gl: Gl) -> Result<Self, GalaxyError> {
        let program = create_program(&gl, BODY_VERTEX_SHADER, BODY_FRAGMENT_SHADER)?;
        let body = BodyProgram {
            a_position: attrib(&gl, &program, "aPosition")?,
            a_normal: attrib(&gl, &program, "aNormal")?,
            a_tex_coord: attrib(&gl, &program, "aTexCoord")?,
            a_tangent: attrib(&gl, &program, "aTangent")?,
            u_model: uniform(&gl, &program, "uModel")?,
            u_normal_matrix: uniform(&gl, &program, "uNormalMatrix")?,
            u_view_projection: uniform(&gl, &program, "uViewProjection")?,
            u_unlit: uniform(&gl, &program, "uUnlit")?,
            u_base_color: uniform(&gl, &program, "uBaseColor")?,
            u_eye_position: uniform(&gl, &program, "uEyePosition")?,
            u_ambient: uniform(&gl, &program, "uAmbient")?,
            u_light_count: uniform(&gl, &program, "uLightCount")?,
            u_light_positions: uniform(&gl, &program, "uLightPositions[0]")?,
            u_light_colors: uniform(&gl, &program, "uLightColors[0]")?,
            u_light_ranges: uniform(&gl, &program, "uLightRanges[0]")?,
            u_map: uniform(&gl, &program, "uMap")?,
            u_specular_map: uniform(&gl, &program, "uSpecularMap")?,
            u_use_specular_map: uniform(&gl, &program, "uUseSpecularMap")?,
            u_normal_map: uniform(&gl, &program, "uNormalMap")?,
            u_use_normal_map: uniform(&gl, &program, "uUseNormalMap")?,
            u_normal_scale: uniform(&gl, &program, "uNormalScale")?,
            u_shininess: uniform(&gl, &program, "uShininess")?,
            program,
        };

        let program = create_program(&gl, POINTS_VERTEX_SHADER, POINTS_FRAGMENT_SHADER)?;
        let points = PointsProgram {
            a_position: attrib(&gl, &program, "aPosition")?,
            u_view: uniform(&gl, &program, "uView")?,
            u_projection: uniform(&gl, &program, "uProjection")?,
            u_point_size: uniform(&gl, &program, "uPointSize")?,
            u_scale: uniform(&gl, &program, "uScale")?,
            u_color: uniform(&gl, &program, "uColor")?,
            program,
        };

        let placeholder = create_pixel_texture(&gl, [0, 0, 0, 0])?;

        Ok(Renderer { gl, body, points, placeholder })
    }

    pub fn clear(&self, r: f32, g: f32, b: f32) {
        self.gl.clear_color(r, g, b, 1.0);
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
    }

    pub fn enable_depth_test(&self) {
        self.gl.enable(Gl::DEPTH_TEST);
    }

    pub fn resize(&self, width: i32, height: i32) {
        self.gl.viewport(0, 0, width, height);
    }

    pub fn upload_mesh(&self, mesh: &Mesh) -> Result<GpuMesh, GalaxyError> {
        let vertex_buffer = self.gl.create_buffer().ok_or(GalaxyError::Resource("vertex buffer"))?;
        let index_buffer = self.gl.create_buffer().ok_or(GalaxyError::Resource("index buffer"))?;

        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&vertex_buffer));
        unsafe {
            let vert_array = js_sys::Float32Array::view(&mesh.vertices);
            self.gl
                .buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &vert_array, Gl::STATIC_DRAW);
        }

        self.gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
        unsafe {
            let idx_array = js_sys::Uint16Array::view(&mesh.indices);
            self.gl.buffer_data_with_array_buffer_view(
                Gl::ELEMENT_ARRAY_BUFFER,
                &idx_array,
                Gl::STATIC_DRAW,
            );
        }

        Ok(GpuMesh { vertex_buffer, index_buffer, index_count: mesh.indices.len() as i32 })
    }

    pub fn upload_points(&self, positions: &[f32]) -> Result<GpuPoints, GalaxyError> {
        let buffer = self.gl.create_buffer().ok_or(GalaxyError::Resource("point buffer"))?;
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
        unsafe {
            let array = js_sys::Float32Array::view(positions);
            self.gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &array, Gl::STATIC_DRAW);
        }
        Ok(GpuPoints { buffer, count: (positions.len() / 3) as i32 })
    }

    pub fn draw_points(
        &self,
        points: &GpuPoints,
        size: f32,
        color: (f32, f32, f32),
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
        viewport_height: f32,
    ) {
        let p = &self.points;
        self.gl.use_program(Some(&p.program));
        self.disable_body_attributes();

        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&points.buffer));
        self.gl.vertex_attrib_pointer_with_i32(p.a_position, 3, Gl::FLOAT, false, 0, 0);
        self.gl.enable_vertex_attrib_array(p.a_position);

        self.gl.uniform_matrix4fv_with_f32_array(Some(&p.u_view), false, view.as_slice());
        self.gl
            .uniform_matrix4fv_with_f32_array(Some(&p.u_projection), false, projection.as_slice());
        self.gl.uniform1f(Some(&p.u_point_size), size);
        self.gl.uniform1f(Some(&p.u_scale), viewport_height / 2.0);
        self.gl.uniform3f(Some(&p.u_color), color.0, color.1, color.2);

        self.gl.draw_arrays(Gl::POINTS, 0, points.count);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_body(
        &self,
        mesh: &GpuMesh,
        model: &Matrix4<f32>,
        textures: &SurfaceTextures,
        params: &SurfaceParams,
        lighting: &Lighting,
        view_projection: &Matrix4<f32>,
        eye: &Point3<f32>,
    ) {
        let p = &self.body;
        self.gl.use_program(Some(&p.program));

        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&mesh.vertex_buffer));
        self.gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&mesh.index_buffer));

        let stride = (FLOATS_PER_VERTEX * 4) as i32;
        for (location, size, offset) in [
            (p.a_position, 3, 0),
            (p.a_normal, 3, 12),
            (p.a_tex_coord, 2, 24),
            (p.a_tangent, 3, 32),
        ] {
            self.gl
                .vertex_attrib_pointer_with_i32(location, size, Gl::FLOAT, false, stride, offset);
            self.gl.enable_vertex_attrib_array(location);
        }

        let normal_matrix: Matrix3<f32> = model.fixed_view::<3, 3>(0, 0).into_owned();
        self.gl.uniform_matrix4fv_with_f32_array(Some(&p.u_model), false, model.as_slice());
        self.gl.uniform_matrix3fv_with_f32_array(
            Some(&p.u_normal_matrix),
            false,
            normal_matrix.as_slice(),
        );
        self.gl.uniform_matrix4fv_with_f32_array(
            Some(&p.u_view_projection),
            false,
            view_projection.as_slice(),
        );

        self.gl.uniform1i(Some(&p.u_unlit), params.unlit as i32);
        let (r, g, b) = params.base_color;
        self.gl.uniform3f(Some(&p.u_base_color), r, g, b);
        self.gl.uniform3f(Some(&p.u_eye_position), eye.x, eye.y, eye.z);
        self.gl.uniform1f(Some(&p.u_normal_scale), params.normal_scale);
        self.gl.uniform1f(Some(&p.u_shininess), params.shininess);

        self.apply_lighting(lighting);

        self.bind_texture_unit(0, textures.map, &p.u_map);
        self.bind_texture_unit(1, textures.specular_map, &p.u_specular_map);
        self.gl.uniform1i(Some(&p.u_use_specular_map), textures.specular_map.is_some() as i32);
        self.bind_texture_unit(2, textures.normal_map, &p.u_normal_map);
        self.gl.uniform1i(Some(&p.u_use_normal_map), textures.normal_map.is_some() as i32);

        self.gl.draw_elements_with_i32(Gl::TRIANGLES, mesh.index_count, Gl::UNSIGNED_SHORT, 0);
    }

    fn apply_lighting(&self, lighting: &Lighting) {
        let p = &self.body;
        let (r, g, b) = lighting.ambient;
        self.gl.uniform3f(Some(&p.u_ambient), r, g, b);

        let count = lighting.points.len().min(MAX_LIGHTS);
        let mut positions = [0.0f32; MAX_LIGHTS * 3];
        let mut colors = [0.0f32; MAX_LIGHTS * 3];
        let mut ranges = [1.0f32; MAX_LIGHTS];
        for (i, light) in lighting.points.iter().take(count).enumerate() {
            let (position, color) = (&light.position, light.color);
            positions[i * 3..i * 3 + 3].copy_from_slice(&[position.x, position.y, position.z]);
            colors[i * 3..i * 3 + 3].copy_from_slice(&[color.0, color.1, color.2]);
            ranges[i] = light.range;
        }
        self.gl.uniform1i(Some(&p.u_light_count), count as i32);
        self.gl.uniform3fv_with_f32_array(Some(&p.u_light_positions), &positions);
        self.gl.uniform3fv_with_f32_array(Some(&p.u_light_colors), &colors);
        self.gl.uniform1fv_with_f32_array(Some(&p.u_light_ranges), &ranges);
    }

    fn bind_texture_unit(
        &self,
        unit: u32,
        texture: Option<&WebGlTexture>,
        location: &WebGlUniformLocation,
    ) {
        self.gl.active_texture(Gl::TEXTURE0 + unit);
        self.gl.bind_texture(Gl::TEXTURE_2D, Some(texture.unwrap_or(&self.placeholder)));
        self.gl.uniform1i(Some(location), unit as i32);
    }

    fn disable_body_attributes(&self) {
        let p = &self.body;
        for location in [p.a_normal, p.a_tex_coord, p.a_tangent] {
            self.gl.disable_vertex_attrib_array(location);
        }
    }

    /// Starts an asynchronous image load. The texture is usable at once and
    /// samples as transparent until the image arrives; a failed load leaves
    /// it that way.
    pub fn create_texture(&self, url: &str) -> Result<WebGlTexture, GalaxyError> {
        let texture = create_pixel_texture(&self.gl, [0, 0, 0, 0])?;

        let img = HtmlImageElement::new()?;
        img.set_cross_origin(Some("anonymous"));

        let gl = self.gl.clone();
        let texture_clone = texture.clone();
        let img_clone = img.clone();

        let onload = Closure::wrap(Box::new(move || {
            gl.bind_texture(Gl::TEXTURE_2D, Some(&texture_clone));
            if let Err(err) = gl.tex_image_2d_with_u32_and_u32_and_image(
                Gl::TEXTURE_2D, 0, Gl::RGBA as i32, Gl::RGBA, Gl::UNSIGNED_BYTE, &img_clone,
            ) {
                log::warn!("texture upload failed: {:?}", err);
                return;
            }

            if is_power_of_2(img_clone.width()) && is_power_of_2(img_clone.height()) {
                gl.generate_mipmap(Gl::TEXTURE_2D);
            } else {
                gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_S, Gl::CLAMP_TO_EDGE as i32);
                gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_T, Gl::CLAMP_TO_EDGE as i32);
                gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR as i32);
            }
        }) as Box<dyn FnMut()>);

        let source = url.to_string();
        let onerror = Closure::wrap(Box::new(move || {
            log::warn!("failed to load texture {}", source);
        }) as Box<dyn FnMut()>);

        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onload.forget();
        onerror.forget();

        img.set_src(url);

        Ok(texture)
    }
}

fn is_power_of_2(value: u32) -> bool {
    value != 0 && (value & (value - 1)) == 0
}

fn create_pixel_texture(gl: &Gl, pixel: [u8; 4]) -> Result<WebGlTexture, GalaxyError> {
    let texture = gl.create_texture().ok_or(GalaxyError::Resource("texture"))?;
    gl.bind_texture(Gl::TEXTURE_2D, Some(&texture));
    gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
        Gl::TEXTURE_2D, 0, Gl::RGBA as i32, 1, 1, 0, Gl::RGBA, Gl::UNSIGNED_BYTE, Some(&pixel),
    )?;
    Ok(texture)
}

fn attrib(gl: &Gl, program: &WebGlProgram, name: &str) -> Result<u32, GalaxyError> {
    let location = gl.get_attrib_location(program, name);
    if location < 0 {
        return Err(GalaxyError::Link(format!("attribute {} not found", name)));
    }
    Ok(location as u32)
}

fn uniform(
    gl: &Gl,
    program: &WebGlProgram,
    name: &str,
) -> Result<WebGlUniformLocation, GalaxyError> {
    gl.get_uniform_location(program, name)
        .ok_or_else(|| GalaxyError::Link(format!("uniform {} not found", name)))
}

fn create_program(gl: &Gl, vertex: &str, fragment: &str) -> Result<WebGlProgram, GalaxyError> {
    let vert_shader = compile_shader(gl, Gl::VERTEX_SHADER, vertex)?;
    let frag_shader = compile_shader(gl, Gl::FRAGMENT_SHADER, fragment)?;

    let program = gl.create_program().ok_or(GalaxyError::Resource("program"))?;
    gl.attach_shader(&program, &vert_shader);
    gl.attach_shader(&program, &frag_shader);
    gl.link_program(&program);

    if gl.get_program_parameter(&program, Gl::LINK_STATUS).as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        Err(GalaxyError::Link(gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

fn compile_shader(
    gl: &Gl,
    shader_type: u32,
    source: &str,
) -> Result<web_sys::WebGlShader, GalaxyError> {
    let shader = gl.create_shader(shader_type).ok_or(GalaxyError::Resource("shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl.get_shader_parameter(&shader, Gl::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        Err(GalaxyError::Shader(gl.get_shader_info_log(&shader).unwrap_or_default()))
    }
}
