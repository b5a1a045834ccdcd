use std::collections::HashMap;

use log::warn;

use crate::{
	error::{
		OmikronImportError,
		Result
	},
	model::MeshDescriptor
};

/// Parent relationships between mesh descriptors, as indices into the mesh array
#[derive(Clone, Debug, PartialEq)]
pub struct Hierarchy {
	/// Direct parent of each mesh
	pub parents: Vec<Option<usize>>,
	/// Nearest displayable ancestor of each mesh
	pub skin: Vec<Option<usize>>,
}

impl Hierarchy {
	pub fn resolve(meshes: &[MeshDescriptor]) -> Result<Hierarchy> {
		let parents = parent_table(meshes)?;
		let skin = skin_table(meshes, &parents)?;

		Ok(Hierarchy {
			parents: parents,
			skin: skin,
		})
	}
}

/// Maps each mesh's `parent_id` to the index of the mesh carrying that ID
pub fn parent_table(meshes: &[MeshDescriptor]) -> Result<Vec<Option<usize>>> {
	let mut ids = HashMap::with_capacity(meshes.len());
	for (i, mesh) in meshes.iter().enumerate() {
		if let Some(previous) = ids.insert(mesh.id, i) {
			warn!("Meshes {} and {} share ID {}, using the latter", previous, i, mesh.id);
		}
	}

	meshes.iter().enumerate().map(|(i, mesh)| {
		if mesh.parent_id == -1 {
			return Ok(None);
		}

		match ids.get(&(mesh.parent_id as u32)) {
			Some(parent) => Ok(Some(*parent)),
			None => Err(OmikronImportError::Parent {
				mesh: i,
				parent_id: mesh.parent_id,
			}),
		}
	}).collect()
}

/// Like the parent table, but joint-only ancestors are skipped by climbing further up
pub fn skin_table(meshes: &[MeshDescriptor], parents: &[Option<usize>]) -> Result<Vec<Option<usize>>> {
	(0..meshes.len()).map(|i| {
		let mut candidate = parents[i];
		let mut steps = 0;

		while let Some(c) = candidate {
			if !meshes[c].is_joint_only() {
				break;
			}

			// a chain longer than the mesh count has to revisit a mesh
			steps += 1;
			if steps > meshes.len() {
				return Err(OmikronImportError::ParentCycle(i));
			}

			candidate = parents[c];
		}

		Ok(candidate)
	}).collect()
}
