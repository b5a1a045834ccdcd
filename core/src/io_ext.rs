use std::io::{
	Read,
	Result
};

use oem_cp::{
	code_table::DECODING_TABLE_CP858,
	decode_string_complete_table
};

use ultraviolet::vec::Vec3;

use crate::{
	texture::Color,
	unorm8
};

pub trait ReadBinExt: Read {
	/// Reads a fixed-length, NUL padded CP858 string, stripping the padding
	#[inline]
	fn read_fixed_str(&mut self, length: usize) -> Result<String> {
		let mut buf = vec![0; length];
		self.read_exact(&mut buf)?;

		let end = buf.iter().position(|b| *b == 0).unwrap_or(length);
		Ok(decode_string_complete_table(&buf[..end], &DECODING_TABLE_CP858))
	}

	/// Reads an opaque block of `N` bytes
	#[inline]
	fn read_opaque<const N: usize>(&mut self) -> Result<[u8; N]> {
		let mut buf = [0; N];
		self.read_exact(&mut buf)?;
		Ok(buf)
	}

	/// Reads a little endian 3D vector
	#[inline]
	fn read_vec3_le(&mut self) -> Result<Vec3> {
		let mut x = [0; 4];
		let mut y = x;
		let mut z = y;

		self.read_exact(&mut x)?;
		self.read_exact(&mut y)?;
		self.read_exact(&mut z)?;

		Ok(Vec3::new(f32::from_le_bytes(x), f32::from_le_bytes(y), f32::from_le_bytes(z)))
	}

	/// Reads a packed color stored in B, G, R, A byte order
	#[inline]
	fn read_bgra8(&mut self) -> Result<Color> {
		let [b, g, r, a] = self.read_opaque::<4>()?;
		Ok(Color::new(unorm8(r), unorm8(g), unorm8(b), unorm8(a)))
	}

	/// Reads a packed color stored in R, G, B, A byte order
	#[inline]
	fn read_rgba8(&mut self) -> Result<Color> {
		let [r, g, b, a] = self.read_opaque::<4>()?;
		Ok(Color::new(unorm8(r), unorm8(g), unorm8(b), unorm8(a)))
	}
}

impl<R> ReadBinExt for R
where
	R: Read + ?Sized,
{
}
