pub mod assemble;
pub mod error;
pub mod hierarchy;
pub mod model;
pub mod rig;
pub mod shader;
pub mod texture;

#[cfg(test)]
mod fixture;

use std::{
	collections::HashSet,
	fs,
	io::{
		Cursor,
		Seek
	},
	panic,
	path::Path,
	thread
};

use byteorder::ReadBytesExt;
use log::info;

use rgk_core::texture::Texture;

use assemble::DecodedModel;
use error::Result;
use hierarchy::Hierarchy;
use model::{
	MeshDescriptor,
	MeshFlags,
	ModelFile,
	WORLD_SCALE
};
use shader::MaterialSlots;

/// Extension of the texture file paired with a model
pub const TEXTURE_EXTENSION: &str = "3dt";

#[derive(Clone, Debug, PartialEq)]
pub struct ImportCfg {
	/// File units to world units
	pub world_scale: f32,
	/// Asset names whose meshes are all forced to vertex lighting
	pub vertex_lit_overrides: HashSet<String>,
	/// Rejects files whose signature differs, when set
	pub expected_signature: Option<[u8; 4]>,
	pub read_lights: bool,
}

impl Default for ImportCfg {
	fn default() -> Self {
		Self {
			world_scale: WORLD_SCALE,
			vertex_lit_overrides: ["VIR_FN".to_string()].into_iter().collect(),
			expected_signature: None,
			read_lights: false,
		}
	}
}

/// A decoded model together with everything needed to rebuild it in a host engine
#[derive(Clone, Debug)]
pub struct OmikronAsset {
	pub name: String,
	pub file: ModelFile,
	pub slots: MaterialSlots,
	pub model: DecodedModel,
	/// One texture per material, when a texture file was supplied
	pub textures: Option<Vec<Texture>>,
}

/// Marks every mesh vertex-lit if any of them is, or if `name` is listed in the override table.
/// Returns whether the meshes were changed.
pub fn apply_lighting(meshes: &mut [MeshDescriptor], name: &str, cfg: &ImportCfg) -> bool {
	let forced = cfg.vertex_lit_overrides.contains(name);
	if !forced && !meshes.iter().any(|m| m.flags.contains(MeshFlags::VERTEX_LIT)) {
		return false;
	}

	if forced {
		info!("{} is forced to vertex lighting", name);
	}

	for mesh in meshes.iter_mut() {
		mesh.set_flags(MeshFlags::VERTEX_LIT);
	}

	true
}

fn build(file: &ModelFile) -> Result<(MaterialSlots, DecodedModel)> {
	let hierarchy = Hierarchy::resolve(&file.meshes)?;
	let slots = MaterialSlots::index(file)?;
	let model = assemble::assemble(file, &hierarchy, &slots)?;

	info!("{} vertices, {} faces, {} material slots", model.vertices.len(), model.faces.len(), slots.len());
	Ok((slots, model))
}

/// Decodes a model file without textures
#[cfg(feature = "import")]
pub fn read_model<R>(name: &str, buf: &mut R, cfg: &ImportCfg) -> Result<OmikronAsset>
where
	R: ReadBytesExt + Seek,
{
	let mut file = ModelFile::read(buf, cfg)?;
	apply_lighting(&mut file.meshes, name, cfg);
	let (slots, model) = build(&file)?;

	Ok(OmikronAsset {
		name: name.to_string(),
		file: file,
		slots: slots,
		model: model,
		textures: None,
	})
}

/// Decodes a model and, if given, its texture file.
/// Textures are decoded on a second thread while the model is assembled.
#[cfg(feature = "import")]
pub fn decode(name: &str, model: &[u8], texture_file: Option<&[u8]>, cfg: &ImportCfg) -> Result<OmikronAsset> {
	let mut file = ModelFile::read(&mut Cursor::new(model), cfg)?;
	apply_lighting(&mut file.meshes, name, cfg);

	let (built, textures) = thread::scope(|s| {
		let materials = &file.materials;
		let handle = texture_file.map(|data| s.spawn(move || texture::read_textures(data, materials)));

		let built = build(&file);
		let textures = handle.map(|h| h.join().unwrap_or_else(|e| panic::resume_unwind(e)));
		(built, textures)
	});

	let (slots, model) = built?;
	let textures = textures.transpose()?;

	Ok(OmikronAsset {
		name: name.to_string(),
		file: file,
		slots: slots,
		model: model,
		textures: textures,
	})
}

/// Reads a `.3do` model, picking up the `.3dt` texture file next to it if there is one
#[cfg(feature = "import")]
pub fn read<P>(path: P, cfg: &ImportCfg) -> Result<OmikronAsset>
where
	P: AsRef<Path>,
{
	let path = path.as_ref();
	let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
	let model = fs::read(path)?;

	let texture_path = path.with_extension(TEXTURE_EXTENSION);
	let texture = if texture_path.is_file() {
		Some(fs::read(&texture_path)?)
	} else {
		info!("No texture file at {}", texture_path.display());
		None
	};

	decode(&name, &model, texture.as_deref(), cfg)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		error::ErrorKind,
		fixture::*,
		shader::ShaderFlags
	};

	fn textured_quad() -> (Vec<u8>, Vec<u8>) {
		let mut builder = ModelBuilder::single_quad();
		builder.materials[0].bpp = 1;
		builder.materials[0].width = 2;
		builder.materials[0].height = 2;
		builder.materials[0].data_size = 3;

		let texture = texture_file(&[(vec![[0, 0, 0], [255, 255, 255]], vec![0x01, 0x80, 0x04])]);
		(builder.build(), texture)
	}

	#[test]
	fn test_vertex_lit_spreads() {
		let mut builder = ModelBuilder::hierarchy();
		builder.meshes[3].flags = MeshFlags::VERTEX_LIT.bits();

		let asset = decode("hero", &builder.build(), None, &ImportCfg::default()).unwrap();
		assert!(asset.file.meshes.iter().all(|m| m.flags.contains(MeshFlags::VERTEX_LIT)));
		assert!(asset.slots.iter().all(|k| k.shader == ShaderFlags::VERTEX_LIT));
	}

	#[test]
	fn test_lighting_untouched() {
		let asset = decode("hero", &ModelBuilder::hierarchy().build(), None, &ImportCfg::default()).unwrap();
		assert!(asset.file.meshes.iter().all(|m| !m.flags.contains(MeshFlags::VERTEX_LIT)));
	}

	#[test]
	fn test_lighting_override() {
		let data = ModelBuilder::hierarchy().build();

		let asset = decode("VIR_FN", &data, None, &ImportCfg::default()).unwrap();
		assert!(asset.file.meshes.iter().all(|m| m.raw_flags & MeshFlags::VERTEX_LIT.bits() != 0));

		let cfg = ImportCfg {
			vertex_lit_overrides: HashSet::new(),
			..ImportCfg::default()
		};
		let asset = decode("VIR_FN", &data, None, &cfg).unwrap();
		assert!(asset.file.meshes.iter().all(|m| !m.flags.contains(MeshFlags::VERTEX_LIT)));
	}

	#[test]
	fn test_world_scale() {
		let cfg = ImportCfg {
			world_scale: 1.0,
			..ImportCfg::default()
		};
		let asset = read_model("quad", &mut Cursor::new(ModelBuilder::single_quad().build()), &cfg).unwrap();

		assert_eq!(40.0, asset.file.meshes[0].position.x);
		assert!(asset.textures.is_none());
	}

	#[test]
	fn test_decode_with_textures() {
		let (model, texture) = textured_quad();
		let asset = decode("quad", &model, Some(texture.as_slice()), &ImportCfg::default()).unwrap();

		let textures = asset.textures.unwrap();
		assert_eq!(1, textures.len());
		assert_eq!(vec![1, 1, 1, 1], textures[0].indices);
		assert_eq!(1, asset.model.faces.len());
	}

	#[test]
	fn test_texture_error_surfaces() {
		let (model, texture) = textured_quad();
		let err = decode("quad", &model, Some(&texture[..4]), &ImportCfg::default()).unwrap_err();
		assert_eq!(ErrorKind::Truncated, err.kind());
	}

	#[test]
	fn test_read_sibling_texture() {
		let dir = std::env::temp_dir().join(format!("rgk-omikron-{}", std::process::id()));
		fs::create_dir_all(&dir).unwrap();

		let (model, texture) = textured_quad();
		let path = dir.join("quad.3do");
		fs::write(&path, &model).unwrap();

		let asset = read(&path, &ImportCfg::default()).unwrap();
		assert_eq!("quad", asset.name);
		assert!(asset.textures.is_none());

		fs::write(dir.join("quad.3dt"), &texture).unwrap();
		let asset = read(&path, &ImportCfg::default()).unwrap();
		assert_eq!(Some(1), asset.textures.map(|t| t.len()));

		fs::remove_dir_all(&dir).unwrap();
	}
}
