use bitflags::bitflags;
use indexmap::IndexSet;

use crate::{
	error::{
		OmikronImportError,
		Result
	},
	model::{
		MeshFlags,
		ModelFile
	}
};

bitflags! {
	/// Rendering technique of a mesh, a subset of its [`MeshFlags`] sharing the same bits
	pub struct ShaderFlags: u32 {
		const VERTEX_LIT = MeshFlags::VERTEX_LIT.bits();
		const ALPHA_TESTING = MeshFlags::ALPHA_TESTING.bits();
		const ALPHA_BLENDING = MeshFlags::ALPHA_BLENDING.bits();
		const ADDITIVE = MeshFlags::ADDITIVE.bits();
		const SUBSTRACTIVE = MeshFlags::SUBSTRACTIVE.bits();
		const MIRROR = MeshFlags::MIRROR.bits();
		const ENVIRONMENT_MAPPED = MeshFlags::ENVIRONMENT_MAPPED.bits();
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Lighting {
	Diffuse,
	VertexLit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlendMode {
	Opaque,
	AlphaBlend,
	AlphaClip,
	Mirror {
		subtractive: bool,
	},
	Environment,
}

impl ShaderFlags {
	/// Picks the first matching base technique out of mirror, environment mapping,
	/// alpha blending and alpha testing, then layers the independent bits on top.
	pub fn from_mesh(flags: MeshFlags) -> ShaderFlags {
		let mut shader = ShaderFlags::empty();

		let layered = if flags.contains(MeshFlags::MIRROR) {
			shader |= ShaderFlags::MIRROR;
			true
		} else if flags.contains(MeshFlags::ENVIRONMENT_MAPPED) {
			shader |= ShaderFlags::ENVIRONMENT_MAPPED;
			false
		} else if flags.contains(MeshFlags::ALPHA_BLENDING) {
			shader |= ShaderFlags::ALPHA_BLENDING;
			true
		} else if flags.contains(MeshFlags::ALPHA_TESTING) {
			shader |= ShaderFlags::ALPHA_TESTING;
			false
		} else {
			false
		};

		if layered {
			if flags.contains(MeshFlags::ADDITIVE) {
				shader |= ShaderFlags::ADDITIVE;
			}
			if flags.contains(MeshFlags::SUBSTRACTIVE) {
				shader |= ShaderFlags::SUBSTRACTIVE;
			}
		}

		if flags.contains(MeshFlags::VERTEX_LIT) {
			shader |= ShaderFlags::VERTEX_LIT;
		}

		shader
	}

	pub fn lighting(self) -> Lighting {
		if self.contains(ShaderFlags::VERTEX_LIT) {
			Lighting::VertexLit
		} else {
			Lighting::Diffuse
		}
	}

	/// How a material graph should combine the texture with what lies behind it
	pub fn blend_mode(self) -> BlendMode {
		if self.contains(ShaderFlags::ALPHA_BLENDING) {
			BlendMode::AlphaBlend
		} else if self.contains(ShaderFlags::ALPHA_TESTING) {
			BlendMode::AlphaClip
		} else if self.contains(ShaderFlags::MIRROR) {
			BlendMode::Mirror {
				subtractive: self.contains(ShaderFlags::SUBSTRACTIVE),
			}
		} else if self.contains(ShaderFlags::ENVIRONMENT_MAPPED) {
			BlendMode::Environment
		} else {
			BlendMode::Opaque
		}
	}
}

/// A texture paired with the technique used to draw it
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MaterialKey {
	pub material: usize,
	pub shader: ShaderFlags,
}

/// Checks a polygon's material index against the material table
pub(crate) fn material_index(mesh: usize, material: i32, count: usize) -> Result<usize> {
	match usize::try_from(material) {
		Ok(i) if i < count => Ok(i),
		_ => Err(OmikronImportError::Material {
			mesh: mesh,
			material: material,
			count: count,
		}),
	}
}

/// Distinct material keys of the displayed meshes, numbered in order of first use
#[derive(Clone, Debug, Default)]
pub struct MaterialSlots {
	keys: IndexSet<MaterialKey>,
}

impl MaterialSlots {
	pub fn index(file: &ModelFile) -> Result<MaterialSlots> {
		let mut slots = MaterialSlots::default();
		let count = file.materials.len();

		for (i, (mesh, polygons)) in file.meshes.iter().zip(file.polygons.iter()).enumerate() {
			if !mesh.is_displayed() {
				continue;
			}

			let shader = ShaderFlags::from_mesh(mesh.flags);
			let materials = polygons.triangles.iter().map(|t| t.material)
				.chain(polygons.rectangles.iter().map(|r| r.material));

			for material in materials {
				slots.insert(MaterialKey {
					material: material_index(i, material, count)?,
					shader: shader,
				});
			}
		}

		Ok(slots)
	}

	/// Returns the key's slot, assigning the next free one if the key is new
	pub fn insert(&mut self, key: MaterialKey) -> usize {
		self.keys.insert_full(key).0
	}

	pub fn slot(&self, key: &MaterialKey) -> Option<usize> {
		self.keys.get_index_of(key)
	}

	pub fn key(&self, slot: usize) -> Option<&MaterialKey> {
		self.keys.get_index(slot)
	}

	pub fn len(&self) -> usize {
		self.keys.len()
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Keys in slot order
	pub fn iter(&self) -> impl Iterator<Item = &MaterialKey> {
		self.keys.iter()
	}
}
