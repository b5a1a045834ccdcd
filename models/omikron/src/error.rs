use std::io;
use thiserror::Error;

/// Coarse classification of [`OmikronImportError`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
	/// The data contradicts the file layout
	Format,
	/// An index or ID points at nothing
	Reference,
	/// The stream ended before a record or section was complete
	Truncated,
	/// Any other I/O failure
	Io,
}

#[derive(Error, Debug)]
pub enum OmikronImportError {
	#[error("I/O error")]
	IO {
		source: io::Error,
	},
	#[error("Not an Omikron model file: {0:X?}")]
	Magic([u8; 4]),
	#[error("{section} section at {offset:#X} ({size} bytes) lies outside the {len} byte stream")]
	SectionBounds {
		section: &'static str,
		offset: u64,
		size: u64,
		len: u64,
	},
	#[error("Material {material} has {bpp} bits per pixel, more than an index byte can address")]
	BitsPerPixel {
		material: usize,
		bpp: u32,
	},
	#[error("Texture {material} uses palette index {index} but only has {palette_len} colors")]
	PaletteIndex {
		material: usize,
		index: u8,
		palette_len: usize,
	},
	#[error("Back-reference with zero distance at output position {0}")]
	BackReference(usize),
	#[error("Mesh {mesh} has parent ID {parent_id}, which matches no mesh")]
	Parent {
		mesh: usize,
		parent_id: i32,
	},
	#[error("Parent chain of mesh {0} loops back on itself")]
	ParentCycle(usize),
	#[error("Mesh {mesh} references material {material}, but the material table has {count} entries")]
	Material {
		mesh: usize,
		material: i32,
		count: usize,
	},
	#[error("Mesh {mesh} references vertex {vertex}, but the model has {count} vertices")]
	Vertex {
		mesh: usize,
		vertex: usize,
		count: usize,
	},
	#[error("Stream ended before the data was complete")]
	Truncated,
}

impl OmikronImportError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::IO { .. } => ErrorKind::Io,
			Self::Magic(_) | Self::SectionBounds { .. } | Self::BitsPerPixel { .. } |
				Self::PaletteIndex { .. } | Self::BackReference(_) => ErrorKind::Format,
			Self::Parent { .. } | Self::ParentCycle(_) | Self::Material { .. } |
				Self::Vertex { .. } => ErrorKind::Reference,
			Self::Truncated => ErrorKind::Truncated,
		}
	}
}

impl From<io::Error> for OmikronImportError {
	fn from(source: io::Error) -> Self {
		match source.kind() {
			io::ErrorKind::UnexpectedEof => Self::Truncated,
			_ => Self::IO {
				source: source,
			},
		}
	}
}

pub type Result<T> = std::result::Result<T, OmikronImportError>;
