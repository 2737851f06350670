/// Convert a gamma-encoded sRGB channel in `[0, 1]` to linear space.
#[inline]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

/// Unpack a `0x00RRGGBB` value into linear RGB channels in `[0, 1]`.
#[inline]
pub fn unpack_rgb(rgb: u32) -> [f32; 3] {
    bytes_to_linear((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

/// Convert 8-bit sRGB channels to linear RGB channels in `[0, 1]`.
#[inline]
pub fn bytes_to_linear(r: u8, g: u8, b: u8) -> [f32; 3] {
    [
        srgb_to_linear(r as f32 / 255.0),
        srgb_to_linear(g as f32 / 255.0),
        srgb_to_linear(b as f32 / 255.0),
    ]
}
