pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Source-over blend of one premultiplied RGBA8 pixel onto an opaque destination pixel.
pub(crate) fn blend_premul_over(dst: &mut [u8], src_premul: [u8; 4]) {
    let inv = 255u16 - u16::from(src_premul[3]);
    for c in 0..3 {
        let v = u16::from(src_premul[c]) + mul_div255_u16(u16::from(dst[c]), inv);
        dst[c] = v.min(255) as u8;
    }
}

/// Linear interpolation between two RGB colors, `t` in `[0, 1]`.
pub(crate) fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| -> u8 {
        (f64::from(x) + (f64::from(y) - f64::from(x)) * t)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}
