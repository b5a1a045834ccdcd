//! Builders for small synthetic 3DO/3DT files

use byteorder::{
	LE,
	WriteBytesExt
};

use crate::model::{
	MeshFlags,
	HEADER_SIZE,
	LIGHT_SIZE,
	MATERIAL_SIZE,
	MESH_SIZE,
	NAME_SIZE,
	RECTANGLE_SIZE,
	TRIANGLE_SIZE,
	VERTEX_SIZE
};

pub const SIGNATURE: &[u8; 4] = b"3DO1";

#[derive(Clone, Debug)]
pub struct MaterialSpec {
	pub name: &'static str,
	pub data_size: u32,
	pub bpp: u32,
	pub width: u16,
	pub height: u16,
}

#[derive(Clone, Debug)]
pub struct VertexSpec {
	/// Stored order, before the axis swap
	pub position: [f32; 3],
	pub normal: [f32; 3],
	/// B, G, R, A
	pub color: [u8; 4],
}

#[derive(Clone, Debug)]
pub struct TriangleSpec {
	pub indices: [u16; 3],
	pub uvs: [u8; 6],
	pub material: i32,
}

#[derive(Clone, Debug)]
pub struct RectangleSpec {
	pub indices: [u16; 4],
	pub uvs: [u8; 8],
	pub material: i32,
}

#[derive(Clone, Debug)]
pub struct MeshSpec {
	pub name: &'static str,
	pub flags: u32,
	pub id: u32,
	pub parent_id: i32,
	pub position: [f32; 3],
	pub box_extent_pos: [f32; 3],
	pub vertices: Vec<VertexSpec>,
	pub triangles: Vec<TriangleSpec>,
	pub rectangles: Vec<RectangleSpec>,
}

#[derive(Clone, Debug)]
pub struct LightSpec {
	pub name: &'static str,
	pub position: [f32; 3],
	/// R, G, B, A
	pub color: [u8; 4],
}

#[derive(Clone, Debug, Default)]
pub struct ModelBuilder {
	pub materials: Vec<MaterialSpec>,
	pub meshes: Vec<MeshSpec>,
	pub lights: Vec<LightSpec>,
}

fn write_name(out: &mut Vec<u8>, name: &str) {
	let mut field = [0u8; NAME_SIZE];
	field[..name.len()].copy_from_slice(name.as_bytes());
	out.extend_from_slice(&field);
}

fn write_vec3(out: &mut Vec<u8>, v: [f32; 3]) {
	for c in v {
		out.write_f32::<LE>(c).unwrap();
	}
}

pub fn vertex(position: [f32; 3]) -> VertexSpec {
	VertexSpec {
		position: position,
		normal: [0.0, 1.0, 0.0],
		color: [0, 0, 255, 255],
	}
}

pub fn mesh(name: &'static str, id: u32, parent_id: i32, flags: MeshFlags) -> MeshSpec {
	MeshSpec {
		name: name,
		flags: flags.bits(),
		id: id,
		parent_id: parent_id,
		position: [0.0; 3],
		box_extent_pos: [0.0; 3],
		vertices: vec![],
		triangles: vec![],
		rectangles: vec![],
	}
}

impl ModelBuilder {
	/// One root mesh holding a single textured quad
	pub fn single_quad() -> ModelBuilder {
		let mut quad = mesh("quad", 7, -1, MeshFlags::empty());
		quad.position = [40.0, 80.0, 120.0];
		quad.box_extent_pos = [40.0, 0.0, 0.0];
		quad.vertices = vec![
			vertex([0.0, 0.0, 0.0]),
			vertex([40.0, 0.0, 0.0]),
			vertex([40.0, 0.0, 40.0]),
			vertex([0.0, 0.0, 40.0]),
		];
		quad.rectangles = vec![RectangleSpec {
			indices: [0, 1, 2, 3],
			uvs: [0, 0, 64, 0, 64, 64, 0, 64],
			material: 0,
		}];

		ModelBuilder {
			materials: vec![MaterialSpec {
				name: "floor",
				data_size: 0,
				bpp: 4,
				width: 64,
				height: 64,
			}],
			meshes: vec![quad],
			lights: vec![],
		}
	}

	/// body <- joint (joint only) <- arm (skinned onto body) <- hand
	pub fn hierarchy() -> ModelBuilder {
		let mut body = mesh("body", 10, -1, MeshFlags::empty());
		body.vertices = vec![
			vertex([0.0, 0.0, 0.0]),
			vertex([40.0, 0.0, 0.0]),
			vertex([40.0, 0.0, 40.0]),
			vertex([0.0, 0.0, 40.0]),
		];
		body.rectangles = vec![RectangleSpec {
			indices: [0, 1, 2, 3],
			uvs: [0, 0, 64, 0, 64, 64, 0, 64],
			material: 0,
		}];

		let mut joint = mesh("joint", 11, 10, MeshFlags::JOINT_ONLY);
		joint.position = [40.0, 0.0, 0.0];
		joint.vertices = vec![vertex([0.0, 0.0, 0.0])];

		let mut arm = mesh("arm", 12, 11, MeshFlags::empty());
		arm.position = [80.0, 0.0, 0.0];
		arm.vertices = vec![
			vertex([0.0, 0.0, 0.0]),
			vertex([40.0, 0.0, 0.0]),
			vertex([0.0, 0.0, 40.0]),
		];
		arm.triangles = vec![TriangleSpec {
			indices: [0x8001, 0x0000, 0x0002],
			uvs: [0, 0, 64, 0, 0, 64],
			material: 0,
		}];

		let mut hand = mesh("hand", 13, 12, MeshFlags::empty());
		hand.position = [120.0, 0.0, 80.0];
		hand.vertices = vec![
			vertex([0.0, 0.0, 0.0]),
			vertex([40.0, 0.0, 0.0]),
			vertex([0.0, 0.0, 40.0]),
		];
		hand.triangles = vec![TriangleSpec {
			indices: [0, 1, 2],
			uvs: [0, 0, 16, 0, 0, 16],
			material: 1,
		}];

		ModelBuilder {
			materials: vec![
				MaterialSpec {
					name: "skin",
					data_size: 0,
					bpp: 4,
					width: 64,
					height: 64,
				},
				MaterialSpec {
					name: "cloth",
					data_size: 0,
					bpp: 8,
					width: 32,
					height: 32,
				},
			],
			meshes: vec![body, joint, arm, hand],
			lights: vec![],
		}
	}

	pub fn build(&self) -> Vec<u8> {
		let num_vertices: usize = self.meshes.iter().map(|m| m.vertices.len()).sum();
		let num_triangles: usize = self.meshes.iter().map(|m| m.triangles.len()).sum();
		let num_rectangles: usize = self.meshes.iter().map(|m| m.rectangles.len()).sum();

		let materials = HEADER_SIZE as u32;
		let meshes = materials + self.materials.len() as u32 * MATERIAL_SIZE as u32;
		let vertices = meshes + self.meshes.len() as u32 * MESH_SIZE as u32;
		let triangles = vertices + num_vertices as u32 * VERTEX_SIZE as u32;
		let rectangles = triangles + num_triangles as u32 * TRIANGLE_SIZE as u32;
		let lights = rectangles + num_rectangles as u32 * RECTANGLE_SIZE as u32;

		let mut out = vec![];
		out.extend_from_slice(SIGNATURE);
		out.write_u32::<LE>(1).unwrap();
		out.write_u32::<LE>(0).unwrap();
		for offset in [materials, vertices, triangles, rectangles, meshes, 0, 0, lights] {
			out.write_u32::<LE>(offset).unwrap();
		}
		out.extend_from_slice(&[0; 180]);
		out.write_u32::<LE>(0).unwrap();
		out.write_u32::<LE>(0).unwrap();
		out.write_u32::<LE>(num_triangles as u32).unwrap();
		out.write_u32::<LE>(num_rectangles as u32).unwrap();
		out.write_u32::<LE>(num_vertices as u32).unwrap();
		out.write_u64::<LE>(0).unwrap();
		out.write_u32::<LE>(self.materials.len() as u32).unwrap();
		out.write_u32::<LE>(0).unwrap();
		out.write_u32::<LE>(0).unwrap();
		out.write_u32::<LE>(0).unwrap();
		out.write_u32::<LE>(self.meshes.len() as u32).unwrap();
		out.write_u32::<LE>(0).unwrap();
		out.write_u32::<LE>(self.lights.len() as u32).unwrap();
		out.write_u32::<LE>(0).unwrap();
		out.write_u32::<LE>(self.lights.len() as u32).unwrap();
		out.extend_from_slice(&[0; 84]);
		assert_eq!(HEADER_SIZE as usize, out.len());

		for m in self.materials.iter() {
			write_name(&mut out, m.name);
			write_name(&mut out, "");
			write_name(&mut out, "");
			out.write_u32::<LE>(m.data_size).unwrap();
			out.write_u64::<LE>(0).unwrap();
			out.write_u32::<LE>(m.bpp).unwrap();
			out.write_u16::<LE>(m.width).unwrap();
			out.write_u16::<LE>(m.height).unwrap();
		}

		for m in self.meshes.iter() {
			out.write_u32::<LE>(m.flags).unwrap();
			out.write_u32::<LE>(0).unwrap();
			out.write_u32::<LE>(m.id).unwrap();
			out.write_u32::<LE>(0).unwrap();
			write_name(&mut out, m.name);
			write_vec3(&mut out, m.position);
			out.write_i32::<LE>(m.parent_id).unwrap();
			out.write_i32::<LE>(-1).unwrap();
			out.write_i32::<LE>(-1).unwrap();
			out.write_u32::<LE>(0).unwrap();
			out.write_u32::<LE>(m.vertices.len() as u32).unwrap();
			out.write_u32::<LE>(m.triangles.len() as u32).unwrap();
			out.write_u32::<LE>(m.rectangles.len() as u32).unwrap();
			write_vec3(&mut out, [0.0; 3]);
			out.write_f32::<LE>(0.0).unwrap();
			write_vec3(&mut out, [0.0; 3]);
			write_vec3(&mut out, m.box_extent_pos);
			write_vec3(&mut out, [0.0; 3]);
			write_vec3(&mut out, [0.0; 3]);
		}
		assert_eq!(vertices as usize, out.len());

		for v in self.meshes.iter().flat_map(|m| m.vertices.iter()) {
			write_vec3(&mut out, v.position);
			write_vec3(&mut out, v.normal);
			out.write_u32::<LE>(0).unwrap();
			out.extend_from_slice(&v.color);
		}

		for t in self.meshes.iter().flat_map(|m| m.triangles.iter()) {
			for i in t.indices {
				out.write_u16::<LE>(i).unwrap();
			}
			out.extend_from_slice(&t.uvs);
			out.write_i32::<LE>(t.material).unwrap();
			out.extend_from_slice(&[0; 12]);
		}

		for r in self.meshes.iter().flat_map(|m| m.rectangles.iter()) {
			for i in r.indices {
				out.write_u16::<LE>(i).unwrap();
			}
			out.extend_from_slice(&r.uvs);
			out.write_i32::<LE>(r.material).unwrap();
			out.extend_from_slice(&[0; 12]);
		}
		assert_eq!(lights as usize, out.len());

		for l in self.lights.iter() {
			out.write_u32::<LE>(0).unwrap();
			write_name(&mut out, l.name);
			write_vec3(&mut out, l.position);
			out.write_f32::<LE>(0.0).unwrap();
			out.write_f32::<LE>(0.0).unwrap();
			out.extend_from_slice(&l.color);
			out.extend_from_slice(&[0; 256]);
		}
		assert_eq!(lights as usize + self.lights.len() * LIGHT_SIZE as usize, out.len());

		out
	}
}

/// Texture file holding one palette and compressed block per material
pub fn texture_file(blocks: &[(Vec<[u8; 3]>, Vec<u8>)]) -> Vec<u8> {
	let mut out = vec![];
	for (palette, data) in blocks {
		for rgb in palette {
			out.extend_from_slice(rgb);
		}
		out.extend_from_slice(data);
	}
	out
}
