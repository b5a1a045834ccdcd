use std::{
	fs,
	path::PathBuf
};

use clap::Parser;

use rgk_models_omikron::{
	decode,
	error::OmikronImportError,
	ImportCfg
};

/// Decodes an Omikron 3DO model and prints what it contains
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
	/// Path to the .3do model file
	model: PathBuf,
	/// Texture file to decode alongside the model, defaults to the .3dt next to it
	#[arg(long)]
	texture: Option<PathBuf>,
	/// File units to world units
	#[arg(long)]
	scale: Option<f32>,
	/// Asset name forced to vertex lighting, may be repeated
	#[arg(long = "vertex-lit")]
	vertex_lit: Vec<String>,
	/// Also read the light records
	#[arg(long)]
	lights: bool,
	/// Dump every decoded record
	#[arg(long)]
	verbose: bool,
}

fn main() -> Result<(), OmikronImportError> {
	env_logger::init();
	let cli = Cli::parse();

	let mut cfg = ImportCfg::default();
	if let Some(scale) = cli.scale {
		cfg.world_scale = scale;
	}
	cfg.vertex_lit_overrides.extend(cli.vertex_lit);
	cfg.read_lights = cli.lights;

	let name = cli.model.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
	let texture_path = cli.texture.unwrap_or_else(|| cli.model.with_extension(rgk_models_omikron::TEXTURE_EXTENSION));

	let model = fs::read(&cli.model)?;
	let texture = if texture_path.is_file() {
		Some(fs::read(&texture_path)?)
	} else {
		None
	};

	let asset = decode(&name, &model, texture.as_deref(), &cfg)?;

	println!("{}: {} meshes, {} materials, {} lights", asset.name, asset.file.meshes.len(),
		asset.file.materials.len(), asset.file.lights.len());
	println!("{} vertices, {} faces, skinned: {}", asset.model.vertices.len(), asset.model.faces.len(),
		asset.model.is_skinned);

	for (slot, key) in asset.slots.iter().enumerate() {
		let material = &asset.file.materials[key.material];
		let shader = key.shader;
		println!("slot {}: {} {:?} {:?} {:?}", slot, material.name, shader, shader.lighting(),
			shader.blend_mode());
	}

	if let Some(skeleton) = &asset.model.skeleton {
		println!("{} bones, {} vertex groups", skeleton.bones.len(), skeleton.groups.len());
	}
	for probe in asset.model.probes.iter() {
		println!("probe {}: {:?}", probe.name, probe.kind);
	}

	match &asset.textures {
		Some(textures) => {
			for t in textures.iter() {
				println!("texture {}: {}x{}, {} colors", t.name, t.width, t.height, t.palette.len());
			}
		}
		None => println!("no texture file"),
	}

	if cli.verbose {
		println!("{:#?}", asset.model);
	}

	Ok(())
}
