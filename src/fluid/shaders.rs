//! WGSL for the fluid programs. Every program shares `COMMON_WGSL`: the pass
//! uniforms, a full-screen triangle vertex stage that also emits the four
//! neighbour coordinates, and clamp-to-edge field sampling.

pub const COMMON_WGSL: &str = r#"
struct Params {
  texel_size: vec2<f32>,
  dt: f32,
  dissipation: f32,
  point: vec2<f32>,
  aspect_ratio: f32,
  radius: f32,
  color: vec4<f32>,
  curl: f32,
  filter_linear: f32,
  _pad0: f32,
  _pad1: f32,
};
@group(0) @binding(0) var<uniform> p: Params;

struct VsOut {
  @builtin(position) pos: vec4<f32>,
  @location(0) uv: vec2<f32>,
  @location(1) l: vec2<f32>,
  @location(2) r: vec2<f32>,
  @location(3) t: vec2<f32>,
  @location(4) b: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> VsOut {
  let xy = vec2<f32>(f32((vi << 1u) & 2u), f32(vi & 2u)) * 2.0 - vec2<f32>(1.0, 1.0);
  var out: VsOut;
  out.pos = vec4<f32>(xy, 0.0, 1.0);
  out.uv = vec2<f32>(xy.x * 0.5 + 0.5, 0.5 - xy.y * 0.5);
  out.l = out.uv - vec2<f32>(p.texel_size.x, 0.0);
  out.r = out.uv + vec2<f32>(p.texel_size.x, 0.0);
  out.t = out.uv + vec2<f32>(0.0, p.texel_size.y);
  out.b = out.uv - vec2<f32>(0.0, p.texel_size.y);
  return out;
}

fn fetch(tex: texture_2d<f32>, c: vec2<i32>) -> vec4<f32> {
  let dims = vec2<i32>(textureDimensions(tex));
  return textureLoad(tex, clamp(c, vec2<i32>(0, 0), dims - vec2<i32>(1, 1)), 0);
}

fn sample_field(tex: texture_2d<f32>, uv: vec2<f32>) -> vec4<f32> {
  let dims = vec2<f32>(textureDimensions(tex));
  if (p.filter_linear < 0.5) {
    return fetch(tex, vec2<i32>(floor(uv * dims)));
  }
  let st = uv * dims - vec2<f32>(0.5, 0.5);
  let base = floor(st);
  let f = st - base;
  let i = vec2<i32>(base);
  let a = fetch(tex, i);
  let b = fetch(tex, i + vec2<i32>(1, 0));
  let c = fetch(tex, i + vec2<i32>(0, 1));
  let d = fetch(tex, i + vec2<i32>(1, 1));
  return mix(mix(a, b, f.x), mix(c, d, f.x), f.y);
}
"#;

pub const CLEAR_WGSL: &str = r#"
@group(0) @binding(1) var u_texture: texture_2d<f32>;

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
  return p.dissipation * sample_field(u_texture, in.uv);
}
"#;

pub const DISPLAY_WGSL: &str = r#"
@group(0) @binding(1) var u_texture: texture_2d<f32>;

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
  return vec4<f32>(sample_field(u_texture, in.uv).rgb, 1.0);
}
"#;

pub const SPLAT_WGSL: &str = r#"
@group(0) @binding(1) var u_target: texture_2d<f32>;

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
  var d = in.uv - p.point;
  d.x = d.x * p.aspect_ratio;
  let splat = exp(-dot(d, d) / p.radius) * p.color.xyz;
  let base = sample_field(u_target, in.uv).xyz;
  return vec4<f32>(base + splat, 1.0);
}
"#;

pub const ADVECTION_WGSL: &str = r#"
@group(0) @binding(1) var u_velocity: texture_2d<f32>;
@group(0) @binding(2) var u_source: texture_2d<f32>;

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
  let back = in.uv - p.dt * sample_field(u_velocity, in.uv).xy * p.texel_size;
  return p.dissipation * sample_field(u_source, back);
}
"#;

pub const DIVERGENCE_WGSL: &str = r#"
@group(0) @binding(1) var u_velocity: texture_2d<f32>;

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
  let l = sample_field(u_velocity, in.l).x;
  let r = sample_field(u_velocity, in.r).x;
  let t = sample_field(u_velocity, in.t).y;
  let b = sample_field(u_velocity, in.b).y;
  return vec4<f32>(0.5 * (r - l + t - b), 0.0, 0.0, 1.0);
}
"#;

pub const CURL_WGSL: &str = r#"
@group(0) @binding(1) var u_velocity: texture_2d<f32>;

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
  let l = sample_field(u_velocity, in.l).y;
  let r = sample_field(u_velocity, in.r).y;
  let t = sample_field(u_velocity, in.t).x;
  let b = sample_field(u_velocity, in.b).x;
  return vec4<f32>(r - l - t + b, 0.0, 0.0, 1.0);
}
"#;

pub const VORTICITY_WGSL: &str = r#"
@group(0) @binding(1) var u_velocity: texture_2d<f32>;
@group(0) @binding(2) var u_curl: texture_2d<f32>;

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
  let l = sample_field(u_curl, in.l).x;
  let r = sample_field(u_curl, in.r).x;
  let t = sample_field(u_curl, in.t).x;
  let b = sample_field(u_curl, in.b).x;
  let c = sample_field(u_curl, in.uv).x;
  var force = vec2<f32>(abs(t) - abs(b), abs(r) - abs(l));
  force = force / (length(force) + 0.00001) * p.curl * c;
  force.y = -force.y;
  let vel = sample_field(u_velocity, in.uv).xy;
  return vec4<f32>(vel + force * p.dt, 0.0, 1.0);
}
"#;

pub const PRESSURE_WGSL: &str = r#"
@group(0) @binding(1) var u_pressure: texture_2d<f32>;
@group(0) @binding(2) var u_divergence: texture_2d<f32>;

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
  let l = sample_field(u_pressure, in.l).x;
  let r = sample_field(u_pressure, in.r).x;
  let t = sample_field(u_pressure, in.t).x;
  let b = sample_field(u_pressure, in.b).x;
  let div = sample_field(u_divergence, in.uv).x;
  return vec4<f32>((l + r + b + t - div) * 0.25, 0.0, 0.0, 1.0);
}
"#;

pub const GRADIENT_SUBTRACT_WGSL: &str = r#"
@group(0) @binding(1) var u_pressure: texture_2d<f32>;
@group(0) @binding(2) var u_velocity: texture_2d<f32>;

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
  let l = sample_field(u_pressure, in.l).x;
  let r = sample_field(u_pressure, in.r).x;
  let t = sample_field(u_pressure, in.t).x;
  let b = sample_field(u_pressure, in.b).x;
  let vel = sample_field(u_velocity, in.uv).xy - 0.5 * vec2<f32>(r - l, t - b);
  return vec4<f32>(vel, 0.0, 1.0);
}
"#;
