use crate::builders::{BuilderRegistry, PostprocessContext};
use crate::channels;
use crate::error::KernelError;
use crate::kernel::SkinStats;
use crate::slices::OffsetTable;
use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, Mesh, PrimitiveTopology};
use skeleton::BranchArena;

use crate::assembler::Assembly;

/// Parallel per-vertex channel arrays plus triangle indices.
///
/// Field order inside each channel is a contract with the material and
/// wind-baking systems; see the attribute docs in [`crate::channels`].
#[derive(Debug, Clone, Default)]
pub struct VertexBuffers {
	pub positions: Vec<[f32; 3]>,
	pub normals: Vec<[f32; 3]>,
	/// xyz plus handedness sign in w
	pub tangents: Vec<[f32; 4]>,
	pub surface_uv: Vec<[f32; 4]>,
	pub phase_uv: Vec<[f32; 4]>,
	pub id_uv: Vec<[f32; 4]>,
	pub center_uv: Vec<[f32; 4]>,
	pub direction_uv: Vec<[f32; 4]>,
	pub wind_uv: Vec<[f32; 4]>,
	pub indices: Vec<u32>,
}

impl VertexBuffers {
	/// Zero-filled buffers sized for the parallel phase to write into.
	pub fn zeroed(vertices: usize, indices: usize) -> Self {
		Self {
			positions: vec![[0.0; 3]; vertices],
			normals: vec![[0.0; 3]; vertices],
			tangents: vec![[0.0; 4]; vertices],
			surface_uv: vec![[0.0; 4]; vertices],
			phase_uv: vec![[0.0; 4]; vertices],
			id_uv: vec![[0.0; 4]; vertices],
			center_uv: vec![[0.0; 4]; vertices],
			direction_uv: vec![[0.0; 4]; vertices],
			wind_uv: vec![[0.0; 4]; vertices],
			indices: vec![0; indices],
		}
	}

	pub fn vertex_count(&self) -> usize {
		self.positions.len()
	}

	pub fn triangle_count(&self) -> usize {
		self.indices.len() / 3
	}

	fn channels_consistent(&self) -> bool {
		let n = self.positions.len();
		self.normals.len() == n
			&& self.tangents.len() == n
			&& self.surface_uv.len() == n
			&& self.phase_uv.len() == n
			&& self.id_uv.len() == n
			&& self.center_uv.len() == n
			&& self.direction_uv.len() == n
			&& self.wind_uv.len() == n
	}

	/// Copies one skin's vertex range and rebases its skin-local indices
	/// onto the end of these buffers.
	fn extend_range(&mut self, src: &VertexBuffers, v0: usize, nv: usize, i0: usize, ni: usize) {
		let base = self.positions.len() as u32;
		self.positions.extend_from_slice(&src.positions[v0..v0 + nv]);
		self.normals.extend_from_slice(&src.normals[v0..v0 + nv]);
		self.tangents.extend_from_slice(&src.tangents[v0..v0 + nv]);
		self.surface_uv.extend_from_slice(&src.surface_uv[v0..v0 + nv]);
		self.phase_uv.extend_from_slice(&src.phase_uv[v0..v0 + nv]);
		self.id_uv.extend_from_slice(&src.id_uv[v0..v0 + nv]);
		self.center_uv.extend_from_slice(&src.center_uv[v0..v0 + nv]);
		self.direction_uv.extend_from_slice(&src.direction_uv[v0..v0 + nv]);
		self.wind_uv.extend_from_slice(&src.wind_uv[v0..v0 + nv]);
		self.indices.extend(src.indices[i0..i0 + ni].iter().map(|&index| index + base));
	}

	/// Appends a postprocess sub-mesh. Contributions with mismatched
	/// channel lengths are rejected rather than corrupting the buffers.
	pub fn append(&mut self, sub: &VertexBuffers) {
		if !sub.channels_consistent() {
			log::warn!("postprocess sub-mesh has mismatched channel lengths, skipping");
			return;
		}
		self.extend_range(sub, 0, sub.positions.len(), 0, sub.indices.len());
	}
}

/// A postprocess hook contribution, merged after the parallel phase.
pub type SubMesh = VertexBuffers;

/// Pass-level counts reported alongside the finished mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisStats {
	pub skins: usize,
	pub segments: usize,
	pub vertices: usize,
	pub triangles: usize,
	pub failed_skins: usize,
}

/// The finished branch surface geometry.
#[derive(Debug, Clone, Default)]
pub struct TreeMesh {
	pub buffers: VertexBuffers,
}

impl TreeMesh {
	pub fn vertex_count(&self) -> usize {
		self.buffers.vertex_count()
	}

	pub fn triangle_count(&self) -> usize {
		self.buffers.triangle_count()
	}

	/// Converts into a renderable mesh with the auxiliary channels exposed
	/// as custom vertex attributes.
	pub fn to_mesh(&self) -> Mesh {
		let mut mesh = Mesh::new(
			PrimitiveTopology::TriangleList,
			RenderAssetUsages::RENDER_WORLD,
		);
		mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.buffers.positions.clone());
		mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.buffers.normals.clone());
		mesh.insert_attribute(Mesh::ATTRIBUTE_TANGENT, self.buffers.tangents.clone());
		mesh.insert_attribute(channels::ATTRIBUTE_SURFACE_UV, self.buffers.surface_uv.clone());
		mesh.insert_attribute(channels::ATTRIBUTE_PHASE_UV, self.buffers.phase_uv.clone());
		mesh.insert_attribute(channels::ATTRIBUTE_ID_UV, self.buffers.id_uv.clone());
		mesh.insert_attribute(channels::ATTRIBUTE_CENTER_UV, self.buffers.center_uv.clone());
		mesh.insert_attribute(
			channels::ATTRIBUTE_DIRECTION_UV,
			self.buffers.direction_uv.clone(),
		);
		mesh.insert_attribute(channels::ATTRIBUTE_WIND_UV, self.buffers.wind_uv.clone());
		mesh.insert_indices(Indices::U32(self.buffers.indices.clone()));
		mesh
	}
}

/// Concatenates the parallel phase's per-skin output into one mesh.
///
/// Skins whose task failed are excluded with an error log; their reserved
/// ranges are simply skipped. Postprocess hooks of surviving skins run
/// afterwards and may append extra sub-meshes.
pub fn assemble_mesh(
	assembly: &Assembly,
	results: &[Result<SkinStats, KernelError>],
	buffers: &VertexBuffers,
	table: &OffsetTable,
	arena: &BranchArena,
	registry: &BuilderRegistry,
) -> (TreeMesh, SynthesisStats) {
	let mut out = VertexBuffers::default();
	let mut failed_skins = 0;
	let mut segments = 0;

	for (i, skin) in assembly.skins.iter().enumerate() {
		match &results[i] {
			Ok(_) => {
				segments += skin.segments.len();
				out.extend_range(
					buffers,
					table.vertex_offset(i),
					table.vertex_count(i),
					table.index_offset(i),
					table.index_count(i),
				);
			}
			Err(error) => {
				log::error!("skin {:?} excluded from the mesh: {}", skin.id, error);
				failed_skins += 1;
			}
		}
	}

	for (i, skin) in assembly.skins.iter().enumerate() {
		if results[i].is_err() {
			continue;
		}
		let first_branch = arena.get(skin.id);
		let parent_skin = first_branch
			.parent
			.and_then(|id| assembly.branch_to_skin.get(&id))
			.map(|&index| &assembly.skins[index]);
		let parent_branch = first_branch.parent.map(|id| arena.get(id));

		for (range_index, range) in skin.builder_ranges.iter().enumerate() {
			let builder = registry.get(range.kind());
			let ctx = PostprocessContext {
				range_index,
				range,
				skin,
				first_branch,
				parent_skin,
				parent_branch,
			};
			if let Some(sub) = builder.postprocess(&ctx) {
				out.append(&sub);
			}
		}
	}

	let stats = SynthesisStats {
		skins: assembly.skins.len(),
		segments,
		vertices: out.vertex_count(),
		triangles: out.triangle_count(),
		failed_skins,
	};

	(TreeMesh { buffers: out }, stats)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_zeroed_sizes() {
		let buffers = VertexBuffers::zeroed(7, 9);
		assert_eq!(buffers.vertex_count(), 7);
		assert_eq!(buffers.indices.len(), 9);
		assert!(buffers.channels_consistent());
	}

	#[test]
	fn test_append_rebases_indices() {
		let mut out = VertexBuffers::zeroed(2, 0);
		let mut sub = VertexBuffers::zeroed(3, 3);
		sub.indices = vec![0, 1, 2];
		out.append(&sub);

		assert_eq!(out.vertex_count(), 5);
		assert_eq!(out.indices, vec![2, 3, 4]);
	}

	#[test]
	fn test_append_rejects_mismatched_channels() {
		let mut out = VertexBuffers::zeroed(0, 0);
		let mut sub = VertexBuffers::zeroed(3, 3);
		sub.normals.pop();
		out.append(&sub);
		assert_eq!(out.vertex_count(), 0);
	}
}
