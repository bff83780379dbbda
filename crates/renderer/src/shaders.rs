//! WGSL source assembly for the three stage programs.
//!
//! Kernel bodies are templates with `@TOKEN@` placeholders; tuning values
//! and the shared plane/palette constants from [`crate::kernel`] are
//! substituted at startup, so the driver sees ordinary constant-folded
//! WGSL. The canvas is a `r32uint` storage
//! texture holding the four 8-bit channels packed per texel
//! (`pack4x8unorm`/`unpack4x8unorm`), the format class WebGPU guarantees
//! for read-write storage access.

use crate::kernel::{
    ESCAPE_THRESHOLD, PLANE_CENTER, SCALE_AMPLITUDE, SCALE_BASE, TIME_FREQUENCY,
};
use crate::types::Tuning;

/// Compute kernels run on square workgroup tiles of this dimension; the
/// dispatch grid is the ceil-division of the canvas by it.
pub(crate) const WORKGROUP_DIM: u32 = 8;

/// Uniform block shared by all three stages. The Rust mirror lives in
/// `gpu::params`.
const PARAMS_BLOCK: &str = "\
struct KernelParams {
    width: u32,
    height: u32,
    time: f32,
    _pad: u32,
}

@group(0) @binding(0) var<uniform> params: KernelParams;
";

const GENERATOR_TEMPLATE: &str = "\
@group(1) @binding(0) var canvas: texture_storage_2d<r32uint, read_write>;

const MAX_ITERATIONS: u32 = @MAX_ITERATIONS@u;
const HALF_ITERATIONS: u32 = @HALF_ITERATIONS@u;
const OUTER: vec3<f32> = vec3<f32>(@OUTER@);
const MID: vec3<f32> = vec3<f32>(@MID@);
const CORE: vec3<f32> = vec3<f32>(@CORE@);

@compute @workgroup_size(@TILE@, @TILE@, 1)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= params.width || gid.y >= params.height) {
        return;
    }
    let uv = vec2<f32>(
        f32(gid.x) / f32(params.width),
        f32(gid.y) / f32(params.height),
    );
    let scale = @SCALE_BASE@ + @SCALE_AMPLITUDE@ * cos(@TIME_FREQUENCY@ * params.time);
    let c = vec2<f32>(@CENTER_X@, @CENTER_Y@) + (uv - vec2<f32>(0.5)) * scale;

    var z = vec2<f32>(0.0);
    var count: u32 = 0u;
    for (var i: u32 = 0u; i < MAX_ITERATIONS; i = i + 1u) {
        z = vec2<f32>(z.x * z.x - z.y * z.y, 2.0 * z.x * z.y) + c;
        if (dot(z, z) > @ESCAPE_THRESHOLD@) {
            break;
        }
        count = count + 1u;
    }

    var rgb: vec3<f32>;
    if (count <= HALF_ITERATIONS - 1u) {
        rgb = mix(OUTER, MID, f32(count) / f32(HALF_ITERATIONS - 1u));
    } else {
        rgb = mix(MID, CORE, f32(count - HALF_ITERATIONS) / f32(HALF_ITERATIONS));
    }
    let texel = pack4x8unorm(vec4<f32>(rgb, 1.0));
    textureStore(canvas, vec2<i32>(gid.xy), vec4<u32>(texel, 0u, 0u, 0u));
}
";

const FILTER_TEMPLATE: &str = "\
@group(1) @binding(0) var canvas: texture_storage_2d<r32uint, read_write>;

const RADIUS: i32 = @RADIUS@;
// Uniform weight for every sample; edge pixels are deliberately not
// renormalized, clamped neighbors resample the border instead.
const WEIGHT: f32 = 1.0 / @AREA@.0;

fn load_clamped(p: vec2<i32>) -> vec4<f32> {
    let q = vec2<i32>(
        clamp(p.x, 0, i32(params.width) - 1),
        clamp(p.y, 0, i32(params.height) - 1),
    );
    return unpack4x8unorm(textureLoad(canvas, q).x);
}

@compute @workgroup_size(@TILE@, @TILE@, 1)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= params.width || gid.y >= params.height) {
        return;
    }
    let base = vec2<i32>(gid.xy);
    var sum = vec4<f32>(0.0);
    for (var dy: i32 = -RADIUS; dy <= RADIUS; dy = dy + 1) {
        for (var dx: i32 = -RADIUS; dx <= RADIUS; dx = dx + 1) {
            sum = sum + WEIGHT * load_clamped(base + vec2<i32>(dx, dy));
        }
    }
    textureStore(canvas, base, vec4<u32>(pack4x8unorm(sum), 0u, 0u, 0u));
}
";

/// The presenter is the only stage touching the display surface: a
/// 3-vertex covering triangle whose over-extended UVs map the visible
/// surface exactly onto `[0,1]²` after clipping.
const PRESENTER_SOURCE: &str = "\
@group(1) @binding(0) var canvas: texture_2d<u32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var uvs = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(2.0, 0.0),
        vec2<f32>(0.0, 2.0),
    );
    var out: VertexOutput;
    out.position = vec4<f32>(positions[index], 0.0, 1.0);
    out.uv = uvs[index];
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let coord = vec2<i32>(
        i32(in.uv.x * f32(params.width)),
        i32(in.uv.y * f32(params.height)),
    );
    let texel = textureLoad(canvas, coord, 0).x;
    return vec4<f32>(unpack4x8unorm(texel).rgb, 1.0);
}
";

fn wgsl_f32(value: f32) -> String {
    // `{:?}` keeps a decimal point for whole values, which WGSL requires
    // for f32 literals.
    format!("{value:?}")
}

fn wgsl_vec3(value: [f32; 3]) -> String {
    format!(
        "{}, {}, {}",
        wgsl_f32(value[0]),
        wgsl_f32(value[1]),
        wgsl_f32(value[2])
    )
}

fn substitute_common(template: &str) -> String {
    template.replace("@TILE@", &WORKGROUP_DIM.to_string())
}

/// Generator stage kernel source for the given tuning.
pub(crate) fn generator_source(tuning: &Tuning) -> String {
    // The two-segment ramp divides by HALF_ITERATIONS - 1.
    debug_assert!(
        tuning.max_iterations >= 4 && tuning.max_iterations % 2 == 0,
        "iteration cap must be even and at least 4"
    );
    let body = substitute_common(GENERATOR_TEMPLATE)
        .replace("@MAX_ITERATIONS@", &tuning.max_iterations.to_string())
        .replace("@HALF_ITERATIONS@", &(tuning.max_iterations / 2).to_string())
        .replace("@OUTER@", &wgsl_vec3(tuning.palette.outer))
        .replace("@MID@", &wgsl_vec3(tuning.palette.mid))
        .replace("@CORE@", &wgsl_vec3(tuning.palette.core))
        .replace("@CENTER_X@", &wgsl_f32(PLANE_CENTER.0))
        .replace("@CENTER_Y@", &wgsl_f32(PLANE_CENTER.1))
        .replace("@SCALE_BASE@", &wgsl_f32(SCALE_BASE))
        .replace("@SCALE_AMPLITUDE@", &wgsl_f32(SCALE_AMPLITUDE))
        .replace("@TIME_FREQUENCY@", &wgsl_f32(TIME_FREQUENCY))
        .replace("@ESCAPE_THRESHOLD@", &wgsl_f32(ESCAPE_THRESHOLD));
    format!("{PARAMS_BLOCK}\n{body}")
}

/// Filter stage kernel source for the given tuning.
pub(crate) fn filter_source(tuning: &Tuning) -> String {
    let side = 2 * tuning.blur_radius + 1;
    let body = substitute_common(FILTER_TEMPLATE)
        .replace("@RADIUS@", &tuning.blur_radius.to_string())
        .replace("@AREA@", &(side * side).to_string());
    format!("{PARAMS_BLOCK}\n{body}")
}

/// Presenter stage source (vertex + fragment).
pub(crate) fn presenter_source() -> String {
    format!("{PARAMS_BLOCK}\n{PRESENTER_SOURCE}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Palette;

    /// A leftover `@NAME@` token means a substitution was missed; WGSL's own
    /// `@group`/`@compute` attributes are lowercase and never match.
    fn assert_fully_substituted(source: &str) {
        for token in [
            "@TILE@",
            "@MAX_ITERATIONS@",
            "@HALF_ITERATIONS@",
            "@OUTER@",
            "@MID@",
            "@CORE@",
            "@CENTER_X@",
            "@CENTER_Y@",
            "@SCALE_BASE@",
            "@SCALE_AMPLITUDE@",
            "@TIME_FREQUENCY@",
            "@ESCAPE_THRESHOLD@",
            "@RADIUS@",
            "@AREA@",
        ] {
            assert!(!source.contains(token), "unsubstituted token {token}");
        }
    }

    #[test]
    fn generator_bakes_tuning_constants() {
        let tuning = Tuning::default();
        let source = generator_source(&tuning);
        assert!(source.contains("const MAX_ITERATIONS: u32 = 128u;"));
        assert!(source.contains("const HALF_ITERATIONS: u32 = 64u;"));
        assert!(source.contains("vec3<f32>(0.2, 0.1, 0.4)"));
        assert!(source.contains("vec2<f32>(-0.745, 0.186)"));
        assert!(source.contains("pack4x8unorm"));
        assert_fully_substituted(&source);
    }

    #[test]
    fn filter_bakes_radius_and_area() {
        let tuning = Tuning {
            blur_radius: 8,
            ..Tuning::default()
        };
        let source = filter_source(&tuning);
        assert!(source.contains("const RADIUS: i32 = 8;"));
        assert!(source.contains("1.0 / 289.0"));
        assert_fully_substituted(&source);
    }

    #[test]
    fn presenter_keeps_the_covering_triangle_tables() {
        let source = presenter_source();
        assert!(source.contains("vec2<f32>(3.0, -1.0)"));
        assert!(source.contains("vec2<f32>(-1.0, 3.0)"));
        assert!(source.contains("vec2<f32>(2.0, 0.0)"));
        assert!(source.contains("texture_2d<u32>"));
    }

    #[test]
    fn custom_palette_reaches_the_kernel_text() {
        let tuning = Tuning {
            palette: Palette {
                outer: [1.0, 0.5, 0.25],
                mid: [0.0, 1.0, 0.0],
                core: [0.0, 0.0, 0.0],
            },
            ..Tuning::default()
        };
        let source = generator_source(&tuning);
        assert!(source.contains("vec3<f32>(1.0, 0.5, 0.25)"));
        assert!(source.contains("vec3<f32>(0.0, 1.0, 0.0)"));
    }
}
