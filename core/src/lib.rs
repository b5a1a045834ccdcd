#[cfg(feature = "io_ext")]
pub mod io_ext;

pub mod scene;
pub mod texture;

/// Maps an 8 bit channel onto the 0.0..=1.0 range
pub fn unorm8(b: u8) -> f32 {
	b as f32 / 255.0
}

/// Swaps a stored `(x, y, z)` triple into the Z-up convention used by the intermediate API,
/// negating the stored Y axis.
pub fn z_up(x: f32, y: f32, z: f32) -> ultraviolet::vec::Vec3 {
	ultraviolet::vec::Vec3::new(x, z, -y)
}
