use std::ops::Range;

use ultraviolet::vec::Vec3;

#[derive(Clone, Debug, PartialEq)]
pub enum Face {
	Triangle([usize; 3]),
	Quad([usize; 4]),
}

impl Face {
	/// Vertex indices in winding order
	pub fn corners(&self) -> &[usize] {
		match self {
			Face::Triangle(t) => t,
			Face::Quad(q) => q,
		}
	}

	pub fn corner_count(&self) -> usize {
		self.corners().len()
	}
}

/// Joint of a skeletal hierarchy; `parent` indexes the owning bone list
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
	pub name: String,
	pub parent: Option<usize>,
	pub head: Vec3,
	pub tail: Vec3,
	pub connected: bool,
}

/// Contiguous run of vertices bound to a single bone with full weight
#[derive(Clone, Debug, PartialEq)]
pub struct VertexGroup {
	pub name: String,
	pub vertices: Range<usize>,
	pub weight: f32,
}
