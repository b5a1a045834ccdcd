use crate::unorm8;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
	pub red: f32,
	pub green: f32,
	pub blue: f32,
	pub alpha: f32,
}

impl Color {
	pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

	pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Color {
		Color {
			red: red,
			green: green,
			blue: blue,
			alpha: alpha,
		}
	}

	/// Builds an opaque color from 8 bit channels, except for pure black which is the
	/// transparent key color.
	pub fn from_rgb888_keyed(red: u8, green: u8, blue: u8) -> Color {
		let alpha = if red == 0 && green == 0 && blue == 0 { 0.0 } else { 1.0 };
		Color::new(unorm8(red), unorm8(green), unorm8(blue), alpha)
	}

	pub fn to_array(&self) -> [f32; 4] {
		[self.red, self.green, self.blue, self.alpha]
	}
}

/// Palette-indexed image
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
	pub name: String,
	pub palette: Vec<Color>,
	pub indices: Vec<u8>,
	pub width: usize,
	pub height: usize,
}

impl Texture {
	pub fn new(name: &str, width: usize, height: usize) -> Texture {
		Texture {
			name: name.to_string(),
			palette: vec![],
			indices: vec![],
			width: width,
			height: height,
		}
	}

	/// Returns the position of the first index that falls outside the palette, if any
	pub fn find_invalid_index(&self) -> Option<usize> {
		self.indices.iter().position(|i| *i as usize >= self.palette.len())
	}

	/// Uses the palette and indices to build a pixel array.
	/// Indices outside the palette resolve to [`Color::TRANSPARENT`].
	pub fn pixels(&self) -> Vec<Color> {
		self.indices.iter()
			.map(|i| self.palette.get(*i as usize).copied().unwrap_or(Color::TRANSPARENT))
			.collect()
	}

	/// Flattened RGBA float buffer, four values per pixel
	pub fn rgba(&self) -> Vec<f32> {
		self.pixels().iter().flat_map(|c| c.to_array()).collect()
	}
}
