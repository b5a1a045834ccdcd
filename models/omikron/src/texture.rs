use byteorder::{
	BE,
	ReadBytesExt
};

use log::debug;

use rgk_core::{
	io_ext::ReadBinExt,
	texture::{
		Color,
		Texture
	}
};

use crate::{
	error::{
		OmikronImportError,
		Result
	},
	model::MaterialRecord
};

/// Block size marking an uncompressed index stream
pub const RAW_BLOCK_SIZE: usize = 65536;

/// Reads `count` RGB888 palette entries, keying pure black as transparent
#[cfg(feature = "import")]
pub fn read_palette<R>(buf: &mut R, count: usize) -> Result<Vec<Color>>
where
	R: ReadBytesExt,
{
	let mut palette = Vec::with_capacity(count);
	for _ in 0..count {
		let [r, g, b] = buf.read_opaque::<3>()?;
		palette.push(Color::from_rgb888_keyed(r, g, b));
	}

	Ok(palette)
}

/// Expands a compressed index stream into exactly `size` bytes.
///
/// The first byte is a literal. After it, each control byte drives up to eight steps,
/// high bit first: a clear bit copies one literal byte, a set bit reads a sequence
/// descriptor whose low two bits pick how the back-reference distance is encoded and
/// whose upper six bits, plus 3, give the run length. History that does not reach back
/// far enough reads as zero.
#[cfg(feature = "import")]
pub fn decompress(block: &[u8], size: usize) -> Result<Vec<u8>> {
	// a two byte back-reference expands to at most 66 bytes
	let mut out = Vec::with_capacity(size.min(block.len().saturating_mul(66)));
	if size == 0 {
		return Ok(out);
	}

	let mut input = block;
	out.push(input.read_u8()?);

	while out.len() < size {
		let control = input.read_u8()?;

		for bit in (0..8).rev() {
			if out.len() >= size {
				break;
			}

			if (control >> bit) & 1 == 0 {
				out.push(input.read_u8()?);
				continue;
			}

			let descriptor = input.read_u8()?;
			let mut run = (descriptor >> 2) as usize + 3;
			let distance = match descriptor & 3 {
				0 => {
					run -= 1;
					1
				}
				1 => 1 + input.read_u8()? as usize,
				2 => 1 + input.read_u16::<BE>()? as usize,
				_ => input.read_u8()? as usize * 256,
			};

			if distance == 0 {
				return Err(OmikronImportError::BackReference(out.len()));
			}

			for _ in 0..run {
				if out.len() >= size {
					break;
				}

				let byte = if distance > out.len() { 0 } else { out[out.len() - distance] };
				out.push(byte);
			}
		}
	}

	Ok(out)
}

/// Decodes one palette and index block per material, laid out back to back in `data`
#[cfg(feature = "import")]
pub fn read_textures(data: &[u8], materials: &[MaterialRecord]) -> Result<Vec<Texture>> {
	let mut offset = 0;
	let mut textures = Vec::with_capacity(materials.len());

	for (i, material) in materials.iter().enumerate() {
		let palette_len = material.palette_len().ok_or(OmikronImportError::BitsPerPixel {
			material: i,
			bpp: material.bpp,
		})?;

		let stride = palette_len * 3 + material.data_size as usize;
		let block = data.get(offset..offset + stride).ok_or(OmikronImportError::Truncated)?;
		offset += stride;

		let (mut palette_bytes, compressed) = block.split_at(palette_len * 3);
		let size = material.pixel_count();

		let mut texture = Texture::new(&material.name, material.width as usize, material.height as usize);
		texture.palette = read_palette(&mut palette_bytes, palette_len)?;
		texture.indices = if compressed.len() == RAW_BLOCK_SIZE {
			compressed.get(..size).ok_or(OmikronImportError::Truncated)?.to_vec()
		} else {
			decompress(compressed, size)?
		};

		if let Some(pos) = texture.find_invalid_index() {
			return Err(OmikronImportError::PaletteIndex {
				material: i,
				index: texture.indices[pos],
				palette_len: palette_len,
			});
		}

		debug!("Texture {} ({}): {}x{}, {} colors", i, material.name, material.width, material.height,
			palette_len);
		textures.push(texture);
	}

	Ok(textures)
}
