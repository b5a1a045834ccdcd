use log::debug;

use ultraviolet::vec::{
	Vec2,
	Vec3
};

use rgk_core::{
	scene::Face,
	texture::Color
};

use crate::{
	error::{
		OmikronImportError,
		Result
	},
	hierarchy::Hierarchy,
	model::{
		MaterialRecord,
		MeshDescriptor,
		MeshPolygons,
		ModelFile,
		RawVertex
	},
	rig::{
		self,
		Probe,
		Skeleton
	},
	shader::{
		material_index,
		MaterialKey,
		MaterialSlots,
		ShaderFlags
	}
};

/// Engine-agnostic geometry of a whole model file.
///
/// `uvs`, `colors` and `normals` hold one entry per face corner, in face order.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedModel {
	/// Midpoint of the mesh origins; every vertex is relative to it
	pub center: Vec3,
	pub vertices: Vec<Vec3>,
	pub faces: Vec<Face>,
	/// Material slot of each face
	pub face_slots: Vec<usize>,
	pub uvs: Vec<Vec2>,
	pub colors: Vec<Color>,
	pub normals: Vec<Vec3>,
	pub parents: Vec<Option<usize>>,
	pub skin_parents: Vec<Option<usize>>,
	pub is_skinned: bool,
	/// Present for skinned models only
	pub skeleton: Option<Skeleton>,
	pub probes: Vec<Probe>,
}

/// Midpoint of the per-axis bounds of all mesh positions
pub fn scene_center(meshes: &[MeshDescriptor]) -> Vec3 {
	let mut positions = meshes.iter().map(|m| m.position);
	let first = match positions.next() {
		Some(p) => p,
		None => return Vec3::zero(),
	};

	let (min, max) = positions.fold((first, first), |(min, max), p| {
		(Vec3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
			Vec3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)))
	});

	(min + max) * 0.5
}

/// Whether any triangle of the model borrows a vertex from its skin parent
pub fn is_skinned(polygons: &[MeshPolygons]) -> bool {
	polygons.iter()
		.flat_map(|p| p.triangles.iter())
		.any(|t| t.is_parented())
}

impl DecodedModel {
	fn push_face(&mut self, face: Face, uvs: &[[u8; 2]], material: &MaterialRecord, slot: usize,
		raw: &[RawVertex])
	{
		for (index, uv) in face.corners().iter().zip(uvs.iter()) {
			let [u, v] = material.uv(*uv);
			self.uvs.push(Vec2::new(u, v));
			self.colors.push(raw[*index].color);
			self.normals.push(raw[*index].normal);
		}

		self.faces.push(face);
		self.face_slots.push(slot);
	}
}

fn resolve(mesh: usize, base: usize, local: usize, count: usize) -> Result<usize> {
	let vertex = base + local;
	if vertex < count {
		Ok(vertex)
	} else {
		Err(OmikronImportError::Vertex {
			mesh: mesh,
			vertex: vertex,
			count: count,
		})
	}
}

fn slot_of(slots: &MaterialSlots, mesh: usize, material: usize, shader: ShaderFlags) -> Result<usize> {
	slots.slot(&MaterialKey {
		material: material,
		shader: shader,
	}).ok_or(OmikronImportError::Material {
		mesh: mesh,
		material: material as i32,
		count: slots.len(),
	})
}

/// Merges the per-mesh records of `file` into one recentred vertex/face set
pub fn assemble(file: &ModelFile, hierarchy: &Hierarchy, slots: &MaterialSlots) -> Result<DecodedModel> {
	let center = scene_center(&file.meshes);

	let mut vertices = Vec::with_capacity(file.vertices.len());
	for mesh in file.meshes.iter() {
		for v in file.vertices[mesh.vertex_range()].iter() {
			vertices.push(v.position + mesh.position - center);
		}
	}

	let skinned = is_skinned(&file.polygons);
	debug!("Model is skinned: {}", skinned);

	let mut model = DecodedModel {
		center: center,
		vertices: vertices,
		faces: vec![],
		face_slots: vec![],
		uvs: vec![],
		colors: vec![],
		normals: vec![],
		parents: hierarchy.parents.clone(),
		skin_parents: hierarchy.skin.clone(),
		is_skinned: skinned,
		skeleton: None,
		probes: vec![],
	};

	let count = file.vertices.len();
	for (i, (mesh, polygons)) in file.meshes.iter().zip(file.polygons.iter()).enumerate() {
		if !mesh.is_displayed() {
			continue;
		}

		let shader = ShaderFlags::from_mesh(mesh.flags);
		let parent_offset = match hierarchy.skin[i] {
			Some(p) if skinned => file.meshes[p].vertex_offset,
			_ => mesh.vertex_offset,
		};

		for tri in polygons.triangles.iter() {
			let mut corners = [0; 3];
			for (corner, packed) in corners.iter_mut().zip(tri.vertices.iter()) {
				let base = if packed.parented() { parent_offset } else { mesh.vertex_offset };
				*corner = resolve(i, base, packed.local(), count)?;
			}

			let material = material_index(i, tri.material, file.materials.len())?;
			let slot = slot_of(slots, i, material, shader)?;
			model.push_face(Face::Triangle(corners), &tri.uvs, &file.materials[material], slot, &file.vertices);
		}

		for rect in polygons.rectangles.iter() {
			let mut corners = [0; 4];
			for (corner, local) in corners.iter_mut().zip(rect.vertices.iter()) {
				*corner = resolve(i, mesh.vertex_offset, *local as usize, count)?;
			}

			let material = material_index(i, rect.material, file.materials.len())?;
			let slot = slot_of(slots, i, material, shader)?;
			model.push_face(Face::Quad(corners), &rect.uvs, &file.materials[material], slot, &file.vertices);
		}
	}

	if skinned {
		model.skeleton = Some(rig::skeleton(&file.meshes, &hierarchy.skin, center));
	}
	model.probes = rig::probes(file, &model.vertices, center);

	Ok(model)
}
