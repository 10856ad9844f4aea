use crate::kernel::SkinCounts;
use crate::mesh::VertexBuffers;

/// Prefix sums over per-skin vertex/index counts, fixing each parallel
/// task's disjoint output range before dispatch.
#[derive(Debug, Clone)]
pub struct OffsetTable {
	/// `len + 1` entries, last one is the total
	vertex_offsets: Vec<usize>,
	index_offsets: Vec<usize>,
}

impl OffsetTable {
	pub fn from_counts(counts: &[SkinCounts]) -> Self {
		let mut vertex_offsets = Vec::with_capacity(counts.len() + 1);
		let mut index_offsets = Vec::with_capacity(counts.len() + 1);
		let mut vertices = 0;
		let mut indices = 0;
		vertex_offsets.push(0);
		index_offsets.push(0);
		for count in counts {
			vertices += count.vertices;
			indices += count.indices;
			vertex_offsets.push(vertices);
			index_offsets.push(indices);
		}
		Self { vertex_offsets, index_offsets }
	}

	pub fn len(&self) -> usize {
		self.vertex_offsets.len() - 1
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn vertex_offset(&self, skin: usize) -> usize {
		self.vertex_offsets[skin]
	}

	pub fn vertex_count(&self, skin: usize) -> usize {
		self.vertex_offsets[skin + 1] - self.vertex_offsets[skin]
	}

	pub fn index_offset(&self, skin: usize) -> usize {
		self.index_offsets[skin]
	}

	pub fn index_count(&self, skin: usize) -> usize {
		self.index_offsets[skin + 1] - self.index_offsets[skin]
	}

	pub fn total_vertices(&self) -> usize {
		*self.vertex_offsets.last().unwrap_or(&0)
	}

	pub fn total_indices(&self) -> usize {
		*self.index_offsets.last().unwrap_or(&0)
	}
}

/// One skin's bounded view into the shared output buffers. A task can only
/// reach its own range; triangle indices are written skin-local and
/// rebased during final assembly.
pub struct SkinSlices<'a> {
	pub positions: &'a mut [[f32; 3]],
	pub normals: &'a mut [[f32; 3]],
	pub tangents: &'a mut [[f32; 4]],
	pub surface_uv: &'a mut [[f32; 4]],
	pub phase_uv: &'a mut [[f32; 4]],
	pub id_uv: &'a mut [[f32; 4]],
	pub center_uv: &'a mut [[f32; 4]],
	pub direction_uv: &'a mut [[f32; 4]],
	pub wind_uv: &'a mut [[f32; 4]],
	pub indices: &'a mut [u32],
}

/// Splits the output buffers into per-skin disjoint slices following the
/// offset table. The split is total: every buffer element belongs to
/// exactly one skin.
pub fn partition<'a>(buffers: &'a mut VertexBuffers, table: &OffsetTable) -> Vec<SkinSlices<'a>> {
	let mut positions = buffers.positions.as_mut_slice();
	let mut normals = buffers.normals.as_mut_slice();
	let mut tangents = buffers.tangents.as_mut_slice();
	let mut surface_uv = buffers.surface_uv.as_mut_slice();
	let mut phase_uv = buffers.phase_uv.as_mut_slice();
	let mut id_uv = buffers.id_uv.as_mut_slice();
	let mut center_uv = buffers.center_uv.as_mut_slice();
	let mut direction_uv = buffers.direction_uv.as_mut_slice();
	let mut wind_uv = buffers.wind_uv.as_mut_slice();
	let mut indices = buffers.indices.as_mut_slice();

	let mut slices = Vec::with_capacity(table.len());
	for skin in 0..table.len() {
		let nv = table.vertex_count(skin);
		let ni = table.index_count(skin);

		let (p, rest) = positions.split_at_mut(nv);
		positions = rest;
		let (n, rest) = normals.split_at_mut(nv);
		normals = rest;
		let (t, rest) = tangents.split_at_mut(nv);
		tangents = rest;
		let (s, rest) = surface_uv.split_at_mut(nv);
		surface_uv = rest;
		let (ph, rest) = phase_uv.split_at_mut(nv);
		phase_uv = rest;
		let (id, rest) = id_uv.split_at_mut(nv);
		id_uv = rest;
		let (c, rest) = center_uv.split_at_mut(nv);
		center_uv = rest;
		let (d, rest) = direction_uv.split_at_mut(nv);
		direction_uv = rest;
		let (w, rest) = wind_uv.split_at_mut(nv);
		wind_uv = rest;
		let (ix, rest) = indices.split_at_mut(ni);
		indices = rest;

		slices.push(SkinSlices {
			positions: p,
			normals: n,
			tangents: t,
			surface_uv: s,
			phase_uv: ph,
			id_uv: id,
			center_uv: c,
			direction_uv: d,
			wind_uv: w,
			indices: ix,
		});
	}
	slices
}

#[cfg(test)]
mod tests {
	use super::*;

	fn counts() -> Vec<SkinCounts> {
		vec![
			SkinCounts { vertices: 4, indices: 6 },
			SkinCounts { vertices: 8, indices: 12 },
		]
	}

	#[test]
	fn test_prefix_sums() {
		let table = OffsetTable::from_counts(&counts());
		assert_eq!(table.len(), 2);
		assert_eq!(table.vertex_offset(1), 4);
		assert_eq!(table.vertex_count(1), 8);
		assert_eq!(table.total_vertices(), 12);
		assert_eq!(table.total_indices(), 18);
	}

	#[test]
	fn test_partition_is_disjoint_and_total() {
		let table = OffsetTable::from_counts(&counts());
		let mut buffers = VertexBuffers::zeroed(table.total_vertices(), table.total_indices());

		{
			let mut slices = partition(&mut buffers, &table);
			assert_eq!(slices.len(), 2);
			assert_eq!(slices[0].positions.len(), 4);
			assert_eq!(slices[1].positions.len(), 8);
			for (i, slice) in slices.iter_mut().enumerate() {
				for v in slice.positions.iter_mut() {
					v[0] = (i + 1) as f32;
				}
			}
		}

		assert!(buffers.positions[..4].iter().all(|v| v[0] == 1.0));
		assert!(buffers.positions[4..].iter().all(|v| v[0] == 2.0));
	}
}
