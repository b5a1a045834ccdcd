use bitflags::bitflags;

use byteorder::{
	LE,
	ReadBytesExt
};

use std::{
	io::{
		self,
		Seek,
		SeekFrom
	},
	ops::Range
};

use log::debug;
use ultraviolet::vec::Vec3;

use rgk_core::{
	io_ext::ReadBinExt,
	texture::Color,
	z_up
};

use crate::{
	error::{
		OmikronImportError,
		Result
	},
	ImportCfg
};

pub const HEADER_SIZE: u64 = 372;
pub const MATERIAL_SIZE: u64 = 80;
pub const MESH_SIZE: u64 = 140;
pub const VERTEX_SIZE: u64 = 32;
pub const TRIANGLE_SIZE: u64 = 28;
pub const RECTANGLE_SIZE: u64 = 32;
pub const LIGHT_SIZE: u64 = 304;
pub const NAME_SIZE: usize = 20;

/// Default scale from file units to world units (1/40)
pub const WORLD_SCALE: f32 = 0.025;

/// Bits of a packed triangle corner holding the local vertex index
pub const INDEX_MASK: u16 = 0x3FF;
/// Bit of a packed triangle corner marking a vertex of the skin parent
pub const PARENTED_BIT: u16 = 0x8000;

bitflags! {
	pub struct MeshFlags: u32 {
		const JOINT_ONLY = 1;
		const VERTEX_LIT = 1 << 2;
		const HAS_PARENT = 1 << 4;
		const HAS_CHILDREN = 1 << 5;
		const ALPHA_TESTING = 1 << 11;
		const ALPHA_BLENDING = 1 << 12;
		const ADDITIVE = 1 << 13;
		const SUBSTRACTIVE = 1 << 14;
		const MIRROR = 1 << 20;
		const FPS_ARM = 1 << 21;
		const FACE_MORPH = 1 << 22;
		const INVISIBLE = 1 << 23;
		const SKYBOX = 1 << 24;
		const ENVIRONMENT_MAPPED = 1 << 26;
		const UNDERWATER = 1 << 27;
		const WATER_SURFACE = 1 << 29;
		const WATER_UNKNOWN = 1 << 30;
	}
}

/// Reads a vector and converts it to the Z-up convention
fn read_axis<R>(buf: &mut R) -> io::Result<Vec3>
where
	R: ReadBytesExt,
{
	let v = buf.read_vec3_le()?;
	Ok(z_up(v.x, v.y, v.z))
}

fn stream_len<R>(buf: &mut R) -> io::Result<u64>
where
	R: Seek,
{
	let pos = buf.stream_position()?;
	let len = buf.seek(SeekFrom::End(0))?;
	buf.seek(SeekFrom::Start(pos))?;
	Ok(len)
}

/// Fails unless `size` bytes starting at `offset` fit in a stream of `len` bytes
pub(crate) fn check_span(section: &'static str, offset: u64, size: u64, len: u64) -> Result<()> {
	match offset.checked_add(size) {
		Some(end) if end <= len => Ok(()),
		_ => Err(OmikronImportError::SectionBounds {
			section: section,
			offset: offset,
			size: size,
			len: len,
		}),
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Offsets {
	pub materials: u32,
	pub vertices: u32,
	pub triangles: u32,
	pub rectangles: u32,
	pub meshes: u32,
	pub doors: u32,
	pub cameras: u32,
	pub lights: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
	pub signature: [u8; 4],
	pub version_major: u32,
	pub version_minor: u32,
	pub offsets: Offsets,
	pub reserved: [u8; 180],
	pub unknown_1: u32,
	pub unknown_2: u32,
	pub num_triangles: u32,
	pub num_rectangles: u32,
	pub num_vertices: u32,
	pub reserved_2: u64,
	pub num_materials: u32,
	pub unknown_3: u32,
	pub reserved_3: u32,
	pub num_cameras: u32,
	pub num_meshes: u32,
	pub num_doors: u32,
	pub num_lights: u32,
	pub num_lights_1: u32,
	pub num_lights_2: u32,
	pub unknown_4: [u8; 84],
}

impl Header {
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R, expected_signature: Option<[u8; 4]>) -> Result<Header>
	where
		R: ReadBytesExt,
	{
		let signature = buf.read_opaque::<4>()?;
		if let Some(expected) = expected_signature {
			if signature != expected {
				return Err(OmikronImportError::Magic(signature));
			}
		}

		Ok(Header {
			signature: signature,
			version_major: buf.read_u32::<LE>()?,
			version_minor: buf.read_u32::<LE>()?,
			offsets: Offsets {
				materials: buf.read_u32::<LE>()?,
				vertices: buf.read_u32::<LE>()?,
				triangles: buf.read_u32::<LE>()?,
				rectangles: buf.read_u32::<LE>()?,
				meshes: buf.read_u32::<LE>()?,
				doors: buf.read_u32::<LE>()?,
				cameras: buf.read_u32::<LE>()?,
				lights: buf.read_u32::<LE>()?,
			},
			reserved: buf.read_opaque::<180>()?,
			unknown_1: buf.read_u32::<LE>()?,
			unknown_2: buf.read_u32::<LE>()?,
			num_triangles: buf.read_u32::<LE>()?,
			num_rectangles: buf.read_u32::<LE>()?,
			num_vertices: buf.read_u32::<LE>()?,
			reserved_2: buf.read_u64::<LE>()?,
			num_materials: buf.read_u32::<LE>()?,
			unknown_3: buf.read_u32::<LE>()?,
			reserved_3: buf.read_u32::<LE>()?,
			num_cameras: buf.read_u32::<LE>()?,
			num_meshes: buf.read_u32::<LE>()?,
			num_doors: buf.read_u32::<LE>()?,
			num_lights: buf.read_u32::<LE>()?,
			num_lights_1: buf.read_u32::<LE>()?,
			num_lights_2: buf.read_u32::<LE>()?,
			unknown_4: buf.read_opaque::<84>()?,
		})
	}

	/// Checks every populated section against the stream length.
	/// Sections with an unknown record layout only have their start checked.
	pub fn validate(&self, len: u64) -> Result<()> {
		let sections = [
			("materials", self.offsets.materials, self.num_materials, MATERIAL_SIZE),
			("meshes", self.offsets.meshes, self.num_meshes, MESH_SIZE),
			("vertices", self.offsets.vertices, self.num_vertices, VERTEX_SIZE),
			("triangles", self.offsets.triangles, self.num_triangles, TRIANGLE_SIZE),
			("rectangles", self.offsets.rectangles, self.num_rectangles, RECTANGLE_SIZE),
			("doors", self.offsets.doors, self.num_doors, 0),
			("cameras", self.offsets.cameras, self.num_cameras, 0),
			("lights", self.offsets.lights, self.num_lights, 0),
		];

		for (section, offset, count, record_size) in sections {
			if count > 0 {
				check_span(section, offset as u64, count as u64 * record_size, len)?;
			}
		}

		Ok(())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialRecord {
	pub name: String,
	pub bmp_file: String,
	pub tga_file: String,
	pub data_size: u32,
	pub reserved: u64,
	pub bpp: u32,
	pub width: u16,
	pub height: u16,
}

impl MaterialRecord {
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R) -> Result<MaterialRecord>
	where
		R: ReadBytesExt,
	{
		Ok(MaterialRecord {
			name: buf.read_fixed_str(NAME_SIZE)?,
			bmp_file: buf.read_fixed_str(NAME_SIZE)?,
			tga_file: buf.read_fixed_str(NAME_SIZE)?,
			data_size: buf.read_u32::<LE>()?,
			reserved: buf.read_u64::<LE>()?,
			bpp: buf.read_u32::<LE>()?,
			width: buf.read_u16::<LE>()?,
			height: buf.read_u16::<LE>()?,
		})
	}

	/// Number of palette entries, if the bit depth can be addressed by an index byte
	pub fn palette_len(&self) -> Option<usize> {
		if self.bpp <= 8 {
			Some(1 << self.bpp)
		} else {
			None
		}
	}

	pub fn pixel_count(&self) -> usize {
		self.width as usize * self.height as usize
	}

	/// Scales a byte texture coordinate pair into the 0..1 range of this material's image
	pub fn uv(&self, uv: [u8; 2]) -> [f32; 2] {
		[uv[0] as f32 / self.width.max(1) as f32, uv[1] as f32 / self.height.max(1) as f32]
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshDescriptor {
	pub flags: MeshFlags,
	/// Flag word as stored, including bits without a known meaning
	pub raw_flags: u32,
	pub mover_flags: u32,
	pub id: u32,
	pub script_id: u32,
	pub name: String,
	pub position: Vec3,
	pub parent_id: i32,
	pub first_child_id: i32,
	pub next_sibling_id: i32,
	pub unknown_07: u32,
	pub num_vertices: u32,
	pub num_triangles: u32,
	pub num_rectangles: u32,
	pub unknown_08: [f32; 4],
	pub box_extent_neg: Vec3,
	pub box_extent_pos: Vec3,
	pub unknown_18: [f32; 3],
	pub bone_position: Vec3,

	// Not stored; prefix sums over the preceding descriptors
	pub vertex_offset: usize,
	pub triangle_offset: u64,
	pub rectangle_offset: u64,
}

impl MeshDescriptor {
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R, scale: f32) -> Result<MeshDescriptor>
	where
		R: ReadBytesExt,
	{
		let raw_flags = buf.read_u32::<LE>()?;

		Ok(MeshDescriptor {
			flags: MeshFlags::from_bits_truncate(raw_flags),
			raw_flags: raw_flags,
			mover_flags: buf.read_u32::<LE>()?,
			id: buf.read_u32::<LE>()?,
			script_id: buf.read_u32::<LE>()?,
			name: buf.read_fixed_str(NAME_SIZE)?,
			position: read_axis(buf)? * scale,
			parent_id: buf.read_i32::<LE>()?,
			first_child_id: buf.read_i32::<LE>()?,
			next_sibling_id: buf.read_i32::<LE>()?,
			unknown_07: buf.read_u32::<LE>()?,
			num_vertices: buf.read_u32::<LE>()?,
			num_triangles: buf.read_u32::<LE>()?,
			num_rectangles: buf.read_u32::<LE>()?,
			unknown_08: [
				buf.read_f32::<LE>()?,
				buf.read_f32::<LE>()?,
				buf.read_f32::<LE>()?,
				buf.read_f32::<LE>()?,
			],
			box_extent_neg: read_axis(buf)? * scale,
			box_extent_pos: read_axis(buf)? * scale,
			unknown_18: [buf.read_f32::<LE>()?, buf.read_f32::<LE>()?, buf.read_f32::<LE>()?],
			bone_position: read_axis(buf)? * scale,
			vertex_offset: 0,
			triangle_offset: 0,
			rectangle_offset: 0,
		})
	}

	pub fn is_joint_only(&self) -> bool {
		self.flags.contains(MeshFlags::JOINT_ONLY)
	}

	pub fn is_invisible(&self) -> bool {
		self.flags.contains(MeshFlags::INVISIBLE)
	}

	/// Whether the mesh contributes faces to the assembled model
	pub fn is_displayed(&self) -> bool {
		!self.flags.intersects(MeshFlags::JOINT_ONLY | MeshFlags::INVISIBLE)
	}

	pub fn set_flags(&mut self, flags: MeshFlags) {
		self.flags |= flags;
		self.raw_flags |= flags.bits();
	}

	/// Range of this mesh's vertices in the flat vertex array
	pub fn vertex_range(&self) -> Range<usize> {
		self.vertex_offset..(self.vertex_offset + self.num_vertices as usize)
	}
}

/// Reads the mesh descriptors, deriving each mesh's offsets into the vertex, triangle and
/// rectangle sections from the counts of the meshes before it.
#[cfg(feature = "import")]
pub fn read_meshes<R>(buf: &mut R, header: &Header, scale: f32) -> Result<Vec<MeshDescriptor>>
where
	R: ReadBytesExt + Seek,
{
	buf.seek(SeekFrom::Start(header.offsets.meshes as u64))?;

	let mut vertex_total = 0usize;
	let mut triangle_total = 0u64;
	let mut rectangle_total = 0u64;
	let mut meshes = Vec::with_capacity(header.num_meshes as usize);

	for _ in 0..header.num_meshes {
		let mut mesh = MeshDescriptor::read(buf, scale)?;
		mesh.vertex_offset = vertex_total;
		mesh.triangle_offset = triangle_total;
		mesh.rectangle_offset = rectangle_total;

		vertex_total += mesh.num_vertices as usize;
		triangle_total += mesh.num_triangles as u64 * TRIANGLE_SIZE;
		rectangle_total += mesh.num_rectangles as u64 * RECTANGLE_SIZE;

		meshes.push(mesh);
	}

	Ok(meshes)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawVertex {
	pub position: Vec3,
	pub normal: Vec3,
	pub tag: u32,
	pub color: Color,
	/// Index of the mesh owning this vertex
	pub bone: usize,
}

impl RawVertex {
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R, scale: f32, bone: usize) -> Result<RawVertex>
	where
		R: ReadBytesExt,
	{
		Ok(RawVertex {
			position: read_axis(buf)? * scale,
			normal: read_axis(buf)?,
			tag: buf.read_u32::<LE>()?,
			color: buf.read_bgra8()?,
			bone: bone,
		})
	}
}

/// Index of the mesh owning flat vertex `index`: the number of meshes past the first
/// whose vertex offset is at or below it.
pub fn owning_mesh(meshes: &[MeshDescriptor], index: usize) -> usize {
	match meshes.get(1..) {
		Some(rest) => rest.partition_point(|m| m.vertex_offset <= index),
		None => 0,
	}
}

#[cfg(feature = "import")]
pub fn read_vertices<R>(buf: &mut R, header: &Header, meshes: &[MeshDescriptor], scale: f32, len: u64)
	-> Result<Vec<RawVertex>>
where
	R: ReadBytesExt + Seek,
{
	let total: usize = meshes.iter().map(|m| m.num_vertices as usize).sum();
	check_span("vertices", header.offsets.vertices as u64, total as u64 * VERTEX_SIZE, len)?;

	buf.seek(SeekFrom::Start(header.offsets.vertices as u64))?;

	let mut vertices = Vec::with_capacity(total);
	for i in 0..total {
		vertices.push(RawVertex::read(buf, scale, owning_mesh(meshes, i))?);
	}

	Ok(vertices)
}

/// Triangle corner: a local vertex index plus a flag selecting the skin parent's vertices
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PackedIndex(pub u16);

impl PackedIndex {
	pub fn local(self) -> usize {
		(self.0 & INDEX_MASK) as usize
	}

	pub fn parented(self) -> bool {
		self.0 & PARENTED_BIT != 0
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
	pub vertices: [PackedIndex; 3],
	pub uvs: [[u8; 2]; 3],
	pub material: i32,
	pub unknown: [i32; 3],
}

impl Triangle {
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R) -> Result<Triangle>
	where
		R: ReadBytesExt,
	{
		Ok(Triangle {
			vertices: [
				PackedIndex(buf.read_u16::<LE>()?),
				PackedIndex(buf.read_u16::<LE>()?),
				PackedIndex(buf.read_u16::<LE>()?),
			],
			uvs: [buf.read_opaque::<2>()?, buf.read_opaque::<2>()?, buf.read_opaque::<2>()?],
			material: buf.read_i32::<LE>()?,
			unknown: [buf.read_i32::<LE>()?, buf.read_i32::<LE>()?, buf.read_i32::<LE>()?],
		})
	}

	pub fn is_parented(&self) -> bool {
		self.vertices.iter().any(|v| v.parented())
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rectangle {
	pub vertices: [u16; 4],
	pub uvs: [[u8; 2]; 4],
	pub material: i32,
	pub unknown: [i32; 3],
}

impl Rectangle {
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R) -> Result<Rectangle>
	where
		R: ReadBytesExt,
	{
		Ok(Rectangle {
			vertices: [
				buf.read_u16::<LE>()?,
				buf.read_u16::<LE>()?,
				buf.read_u16::<LE>()?,
				buf.read_u16::<LE>()?,
			],
			uvs: [
				buf.read_opaque::<2>()?,
				buf.read_opaque::<2>()?,
				buf.read_opaque::<2>()?,
				buf.read_opaque::<2>()?,
			],
			material: buf.read_i32::<LE>()?,
			unknown: [buf.read_i32::<LE>()?, buf.read_i32::<LE>()?, buf.read_i32::<LE>()?],
		})
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshPolygons {
	pub triangles: Vec<Triangle>,
	pub rectangles: Vec<Rectangle>,
}

#[cfg(feature = "import")]
pub fn read_polygons<R>(buf: &mut R, header: &Header, mesh: &MeshDescriptor, len: u64) -> Result<MeshPolygons>
where
	R: ReadBytesExt + Seek,
{
	let mut polygons = MeshPolygons::default();

	if mesh.num_triangles > 0 {
		let start = header.offsets.triangles as u64 + mesh.triangle_offset;
		check_span("triangles", start, mesh.num_triangles as u64 * TRIANGLE_SIZE, len)?;

		buf.seek(SeekFrom::Start(start))?;
		for _ in 0..mesh.num_triangles {
			polygons.triangles.push(Triangle::read(buf)?);
		}
	}

	if mesh.num_rectangles > 0 {
		let start = header.offsets.rectangles as u64 + mesh.rectangle_offset;
		check_span("rectangles", start, mesh.num_rectangles as u64 * RECTANGLE_SIZE, len)?;

		buf.seek(SeekFrom::Start(start))?;
		for _ in 0..mesh.num_rectangles {
			polygons.rectangles.push(Rectangle::read(buf)?);
		}
	}

	Ok(polygons)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Light {
	pub flags: u32,
	pub name: String,
	pub position: Vec3,
	pub angles: [f32; 2],
	pub color: Color,
	/// Light points, layout unknown
	pub points: [u8; 256],
}

impl Light {
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R, scale: f32) -> Result<Light>
	where
		R: ReadBytesExt,
	{
		Ok(Light {
			flags: buf.read_u32::<LE>()?,
			name: buf.read_fixed_str(NAME_SIZE)?,
			position: read_axis(buf)? * scale,
			angles: [buf.read_f32::<LE>()?, buf.read_f32::<LE>()?],
			color: buf.read_rgba8()?,
			points: buf.read_opaque::<256>()?,
		})
	}
}

#[cfg(feature = "import")]
pub fn read_lights<R>(buf: &mut R, header: &Header, scale: f32, len: u64) -> Result<Vec<Light>>
where
	R: ReadBytesExt + Seek,
{
	let count = header.num_lights_2;
	if count == 0 {
		return Ok(vec![]);
	}

	check_span("lights", header.offsets.lights as u64, count as u64 * LIGHT_SIZE, len)?;
	buf.seek(SeekFrom::Start(header.offsets.lights as u64))?;

	let mut lights = Vec::with_capacity(count as usize);
	for _ in 0..count {
		lights.push(Light::read(buf, scale)?);
	}

	Ok(lights)
}

/// Every record of a model file, in file order
#[derive(Clone, Debug, PartialEq)]
pub struct ModelFile {
	pub header: Header,
	pub materials: Vec<MaterialRecord>,
	pub meshes: Vec<MeshDescriptor>,
	pub vertices: Vec<RawVertex>,
	/// Polygons per mesh descriptor; left empty for invisible meshes
	pub polygons: Vec<MeshPolygons>,
	pub lights: Vec<Light>,
}

impl ModelFile {
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R, cfg: &ImportCfg) -> Result<ModelFile>
	where
		R: ReadBytesExt + Seek,
	{
		let len = stream_len(buf)?;
		buf.seek(SeekFrom::Start(0))?;

		let header = Header::read(buf, cfg.expected_signature)?;
		header.validate(len)?;
		debug!("3DO v{}.{}: {} meshes, {} materials, {} vertices, {} triangles, {} rectangles",
			header.version_major, header.version_minor, header.num_meshes, header.num_materials,
			header.num_vertices, header.num_triangles, header.num_rectangles);

		buf.seek(SeekFrom::Start(header.offsets.materials as u64))?;
		let mut materials = Vec::with_capacity(header.num_materials as usize);
		for _ in 0..header.num_materials {
			materials.push(MaterialRecord::read(buf)?);
		}

		let meshes = read_meshes(buf, &header, cfg.world_scale)?;
		let vertices = read_vertices(buf, &header, &meshes, cfg.world_scale, len)?;

		let mut polygons = Vec::with_capacity(meshes.len());
		for mesh in meshes.iter() {
			if mesh.is_invisible() {
				polygons.push(MeshPolygons::default());
			} else {
				polygons.push(read_polygons(buf, &header, mesh, len)?);
			}
		}

		let lights = if cfg.read_lights {
			read_lights(buf, &header, cfg.world_scale, len)?
		} else {
			vec![]
		};

		Ok(ModelFile {
			header: header,
			materials: materials,
			meshes: meshes,
			vertices: vertices,
			polygons: polygons,
			lights: lights,
		})
	}
}
