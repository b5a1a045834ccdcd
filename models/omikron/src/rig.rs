use ultraviolet::vec::Vec3;

use rgk_core::scene::{
	Bone,
	VertexGroup
};

use crate::model::{
	MeshDescriptor,
	MeshFlags,
	MeshPolygons,
	ModelFile
};

/// Length of a bone that has nothing to point at
pub const BONE_LENGTH: f32 = 0.1;

/// One bone per mesh, plus the vertex groups binding displayed meshes to their bone
#[derive(Clone, Debug, PartialEq)]
pub struct Skeleton {
	pub bones: Vec<Bone>,
	pub groups: Vec<VertexGroup>,
}

/// Builds bones at the mesh origins, parented along the skin table.
///
/// A bone with exactly one child reaches to that child's head. A leaf keeps going in the
/// direction it came from for half its parent's distance.
pub fn skeleton(meshes: &[MeshDescriptor], skin: &[Option<usize>], center: Vec3) -> Skeleton {
	let mut bones: Vec<Bone> = meshes.iter().zip(skin.iter()).map(|(mesh, parent)| {
		let head = mesh.position - center;
		Bone {
			name: mesh.name.clone(),
			parent: *parent,
			head: head,
			tail: head + Vec3::new(0.0, 0.0, BONE_LENGTH),
			connected: false,
		}
	}).collect();

	let mut children = vec![vec![]; bones.len()];
	for (i, bone) in bones.iter().enumerate() {
		if let Some(p) = bone.parent {
			children[p].push(i);
		}
	}

	for (i, kids) in children.iter().enumerate() {
		match kids.as_slice() {
			[child] => {
				let head = bones[*child].head;
				bones[i].tail = head;
				bones[*child].connected = true;
			}
			[] => {
				if let Some(p) = bones[i].parent {
					let head = bones[i].head;
					bones[i].tail = head + (head - bones[p].head) * 0.5;
				}
			}
			_ => {}
		}
	}

	let groups = meshes.iter()
		.filter(|m| !m.is_joint_only())
		.map(|m| VertexGroup {
			name: m.name.clone(),
			vertices: m.vertex_range(),
			weight: 1.0,
		})
		.collect();

	Skeleton {
		bones: bones,
		groups: groups,
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProbeKind {
	/// Reflection cube around an environment mapped mesh
	Cube,
	/// Reflection plane of a mirror
	Planar {
		normal: Vec3,
	},
}

#[derive(Clone, Debug, PartialEq)]
pub struct Probe {
	pub mesh: usize,
	pub name: String,
	pub kind: ProbeKind,
	pub location: Vec3,
	/// Influence radius
	pub extent: f32,
}

fn plane_normal(mesh: &MeshDescriptor, polygons: &MeshPolygons, vertices: &[Vec3]) -> Vec3 {
	let corners = if let Some(tri) = polygons.triangles.first() {
		[tri.vertices[0].local(), tri.vertices[1].local(), tri.vertices[2].local()]
	} else if let Some(rect) = polygons.rectangles.first() {
		[rect.vertices[0] as usize, rect.vertices[1] as usize, rect.vertices[2] as usize]
	} else {
		return Vec3::unit_x();
	};

	let get = |i: usize| vertices.get(mesh.vertex_offset + i).copied();
	match (get(corners[0]), get(corners[1]), get(corners[2])) {
		(Some(a), Some(b), Some(c)) => {
			let normal = (b - a).cross(c - a);
			if normal.mag_sq() > 0.0 {
				normal.normalized()
			} else {
				Vec3::unit_x()
			}
		}
		_ => Vec3::unit_x(),
	}
}

/// Reflection probes for environment mapped and mirror meshes.
/// `vertices` are the recentred positions of the assembled model.
pub fn probes(file: &ModelFile, vertices: &[Vec3], center: Vec3) -> Vec<Probe> {
	let mut probes = vec![];

	for (i, (mesh, polygons)) in file.meshes.iter().zip(file.polygons.iter()).enumerate() {
		let location = mesh.position - center;
		let extent = mesh.box_extent_pos.mag();

		if mesh.flags.contains(MeshFlags::ENVIRONMENT_MAPPED) {
			probes.push(Probe {
				mesh: i,
				name: format!("{}_probe", mesh.name),
				kind: ProbeKind::Cube,
				location: location,
				extent: extent,
			});
		}

		if mesh.flags.contains(MeshFlags::MIRROR) {
			probes.push(Probe {
				mesh: i,
				name: format!("{}_mirror", mesh.name),
				kind: ProbeKind::Planar {
					normal: plane_normal(mesh, polygons, vertices),
				},
				location: location,
				extent: extent,
			});
		}
	}

	probes
}
