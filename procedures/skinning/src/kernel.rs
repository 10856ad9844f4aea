use crate::channels;
use crate::error::KernelError;
use crate::segment::{Segment, SegmentKind};
use crate::skin::BranchSkin;
use crate::slices::SkinSlices;
use bevy::prelude::*;
use itertools::Itertools;
use skeleton::MIN_GIRTH;
use std::f32::consts::TAU;

/// Exact output sizes for one skin, computed before dispatch. Every ring
/// carries a duplicated seam vertex; every stitched pair of rings with
/// `m` and `n` sides produces `m + n` triangles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkinCounts {
	pub vertices: usize,
	pub indices: usize,
}

pub fn counts(skin: &BranchSkin) -> SkinCounts {
	let vertices = skin.segments.iter().map(|s| s.sides as usize + 1).sum();
	let indices = skin
		.segments
		.iter()
		.tuple_windows()
		.map(|(a, b)| 3 * (a.sides as usize + b.sides as usize))
		.sum();
	SkinCounts { vertices, indices }
}

/// What one skin's task actually produced.
#[derive(Debug, Clone, Copy)]
pub struct SkinStats {
	pub vertices: usize,
	pub triangles: usize,
}

/// A stamped ring: first vertex index (skin-local) and polygon sides.
#[derive(Debug, Clone, Copy)]
struct RingRef {
	start: u32,
	sides: u32,
}

/// Transforms one skin's segment buffer into vertices, channels, and
/// triangles. Pure: reads only the skin, writes only its own slices, so
/// any number of these can run concurrently.
pub fn mesh_skin(
	skin: &BranchSkin,
	tree_length: f32,
	out: &mut SkinSlices<'_>,
) -> Result<SkinStats, KernelError> {
	let mut vertex_cursor = 0usize;
	let mut index_cursor = 0usize;
	let mut pool_cursor = 0usize;
	let mut previous: Option<RingRef> = None;

	for segment in &skin.segments {
		// the assembler clamps side counts to 3 or more; a buffer that
		// violates this cannot be meshed against the reserved counts
		if segment.sides < 3 {
			return Err(KernelError::CapacityMismatch {
				skin: skin.id,
				expected: 3,
				actual: segment.sides as usize,
			});
		}

		// shape pool reads must be contiguous in segment order; a profile
		// that contributed an unexpected vertex count shows up here
		if segment.shape_offset >= 0 {
			let offset = segment.shape_offset as usize;
			let end = offset + segment.sides as usize;
			if offset != pool_cursor || end > skin.shape_vertices.len() {
				return Err(KernelError::ShapePoolOutOfBounds {
					skin: skin.id,
					offset,
					end,
					len: skin.shape_vertices.len(),
				});
			}
			pool_cursor = end;
		}

		let ring = RingRef { start: vertex_cursor as u32, sides: segment.sides };
		stamp_ring(skin, segment, tree_length, vertex_cursor, out)?;
		vertex_cursor += segment.sides as usize + 1;

		if let Some(prev) = previous {
			index_cursor = stitch_rings(out.indices, index_cursor, prev, ring, skin.id)?;
		}
		previous = Some(ring);
	}

	if vertex_cursor != out.positions.len()
		|| index_cursor != out.indices.len()
		|| pool_cursor != skin.shape_vertices.len()
	{
		return Err(KernelError::CapacityMismatch {
			skin: skin.id,
			expected: out.positions.len(),
			actual: vertex_cursor,
		});
	}

	Ok(SkinStats { vertices: vertex_cursor, triangles: index_cursor / 3 })
}

/// Orients a ring's local xy plane into world space: x along the derived
/// right vector, y along the re-orthogonalized up, z along forward.
fn ring_basis(segment: &Segment) -> Quat {
	let forward = segment.forward.try_normalize().unwrap_or(Vec3::Y);
	let mut right = segment.up.cross(forward);
	if right.length_squared() < 1e-8 {
		let reference = if forward.y.abs() < 0.99 { Vec3::Y } else { Vec3::X };
		right = reference.cross(forward);
	}
	let right = right.normalize();
	let up = forward.cross(right);
	Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}

/// Stamps `sides + 1` vertices for one segment, the last duplicating the
/// first at the seam so texture coordinates never wrap.
fn stamp_ring(
	skin: &BranchSkin,
	segment: &Segment,
	tree_length: f32,
	cursor: usize,
	out: &mut SkinSlices<'_>,
) -> Result<(), KernelError> {
	let sides = segment.sides as usize;
	let count = sides + 1;
	if cursor + count > out.positions.len() {
		return Err(KernelError::CapacityMismatch {
			skin: skin.id,
			expected: out.positions.len(),
			actual: cursor + count,
		});
	}

	let pool = if segment.shape_offset >= 0 {
		let offset = segment.shape_offset as usize;
		Some(&skin.shape_vertices[offset..offset + sides])
	} else {
		None
	};

	let rotation = ring_basis(segment);
	let girth = segment.girth.max(MIN_GIRTH);
	let global_length =
		(skin.origin_length + segment.skin_position * skin.length) / tree_length.max(f32::EPSILON);

	for j in 0..count {
		// seam vertex reuses the first ring position exactly
		let wrapped = j % sides;
		let radial = j as f32 / sides as f32;
		let angle = TAU * wrapped as f32 / sides as f32;

		let (local, local_tangent) = match pool {
			Some(ring) => {
				let current = ring[wrapped];
				let next = ring[(wrapped + 1) % sides];
				(current, (next - current).try_normalize().unwrap_or(Vec3::X))
			}
			None => (
				Vec3::new(angle.cos(), angle.sin(), 0.0),
				Vec3::new(-angle.sin(), angle.cos(), 0.0),
			),
		};

		let position = segment.center + rotation * (local * girth);
		let tangent = rotation * local_tangent;

		let normal = match segment.kind {
			SegmentKind::EndCap => segment.forward,
			SegmentKind::BeginCap => -segment.forward,
			_ if skin.hard_normals => {
				let facet = TAU * (wrapped as f32 + 0.5) / sides as f32;
				rotation * Vec3::new(facet.cos(), facet.sin(), 0.0)
			}
			_ => (position - segment.center).try_normalize().unwrap_or(segment.forward),
		};

		let at = cursor + j;
		out.positions[at] = position.to_array();
		out.normals[at] = normal.to_array();
		out.tangents[at] = [tangent.x, tangent.y, tangent.z, 1.0];
		out.surface_uv[at] =
			channels::pack_surface_uv(radial, segment.skin_position, segment.girth);
		out.phase_uv[at] = channels::pack_phase_uv(
			segment.length_from_root,
			segment.phase_direction,
			segment.phase_position,
			segment.is_root,
		);
		out.id_uv[at] = channels::pack_id_uv(
			segment.branch,
			skin.id,
			segment.structural_id,
			channels::GEOMETRY_BRANCH,
		);
		out.center_uv[at] = channels::pack_center_uv(segment.center, segment.is_tuned);
		out.direction_uv[at] = channels::pack_direction_uv(segment.forward);
		out.wind_uv[at] = channels::pack_wind_uv(radial, global_length, segment.girth);
	}

	Ok(())
}

const RADIAL_EPSILON: f32 = 1e-5;

/// Connects the ring just stamped to the previous one.
///
/// Equal side counts close as a plain quad loop. Unequal counts run a
/// radial merge walk: the many-sided ring's next vertex is measured
/// against the midpoint of the few-sided ring's current sector, and one
/// vertex of the winning ring is consumed per triangle until both rings
/// are exhausted. The winding flips when the few-sided ring is the ring
/// just stamped, keeping every face outward on both taper directions.
fn stitch_rings(
	indices: &mut [u32],
	cursor: usize,
	prev: RingRef,
	curr: RingRef,
	skin: skeleton::BranchId,
) -> Result<usize, KernelError> {
	let needed = 3 * (prev.sides as usize + curr.sides as usize);
	if cursor + needed > indices.len() {
		return Err(KernelError::CapacityMismatch {
			skin,
			expected: indices.len(),
			actual: cursor + needed,
		});
	}

	let mut at = cursor;
	let mut emit = |indices: &mut [u32], a: u32, b: u32, c: u32| {
		indices[at] = a;
		indices[at + 1] = b;
		indices[at + 2] = c;
		at += 3;
	};

	if prev.sides == curr.sides {
		for i in 0..prev.sides {
			let p0 = prev.start + i;
			let p1 = prev.start + i + 1;
			let c0 = curr.start + i;
			let c1 = curr.start + i + 1;
			emit(indices, p0, p1, c0);
			emit(indices, p1, c1, c0);
		}
		return Ok(at);
	}

	let inverse = curr.sides < prev.sides;
	let (few, many) = if inverse { (curr, prev) } else { (prev, curr) };

	let mut ia = 0u32;
	let mut ib = 0u32;
	while ia < few.sides || ib < many.sides {
		let consume_many = if ib >= many.sides {
			false
		} else if ia >= few.sides {
			true
		} else {
			let many_next = (ib + 1) as f32 / many.sides as f32;
			let few_mid = (ia as f32 + 0.5) / few.sides as f32;
			many_next + RADIAL_EPSILON < few_mid
		};

		if consume_many {
			let (a, b) = (many.start + ib + 1, many.start + ib);
			let c = few.start + ia;
			if inverse {
				emit(indices, b, a, c);
			} else {
				emit(indices, a, b, c);
			}
			ib += 1;
		} else {
			let (a, b) = (few.start + ia, few.start + ia + 1);
			let c = many.start + ib;
			if inverse {
				emit(indices, b, a, c);
			} else {
				emit(indices, a, b, c);
			}
			ia += 1;
		}
	}

	Ok(at)
}

#[cfg(test)]
mod tests {
	use super::*;
	use skeleton::BranchId;

	fn stitch(prev_sides: u32, curr_sides: u32) -> Vec<[u32; 3]> {
		let prev = RingRef { start: 0, sides: prev_sides };
		let curr = RingRef { start: prev_sides + 1, sides: curr_sides };
		let mut indices = vec![0u32; 3 * (prev_sides as usize + curr_sides as usize)];
		let written =
			stitch_rings(&mut indices, 0, prev, curr, BranchId(0)).unwrap();
		assert_eq!(written, indices.len());
		indices.chunks(3).map(|t| [t[0], t[1], t[2]]).collect()
	}

	#[test]
	fn test_equal_rings_form_quad_loop() {
		let triangles = stitch(6, 6);
		assert_eq!(triangles.len(), 12);
	}

	#[test]
	fn test_unequal_rings_cover_both_rings() {
		// six-sided ring followed by a three-sided ring
		let triangles = stitch(6, 3);
		assert_eq!(triangles.len(), 9);

		let many_range = 0u32..7; // ring vertices 0..=6
		let few_range = 7u32..11; // ring vertices 7..=10

		// every many-ring edge is consumed exactly once: 6 triangles
		let mut many_edges = vec![0usize; 6];
		// every few-ring edge is consumed exactly once: 3 triangles
		let mut few_edges = vec![0usize; 3];

		for tri in &triangles {
			let in_many: Vec<u32> =
				tri.iter().copied().filter(|v| many_range.contains(v)).collect();
			let in_few: Vec<u32> =
				tri.iter().copied().filter(|v| few_range.contains(v)).collect();
			if in_many.len() == 2 {
				let low = in_many[0].min(in_many[1]);
				many_edges[low as usize] += 1;
			} else {
				assert_eq!(in_few.len(), 2);
				let low = (in_few[0].min(in_few[1]) - 7) as usize;
				few_edges[low] += 1;
			}
		}

		assert!(many_edges.iter().all(|&count| count == 1));
		assert!(few_edges.iter().all(|&count| count == 1));
	}

	#[test]
	fn test_unequal_walk_alternates_by_radial_midpoint() {
		let triangles = stitch(6, 3);
		// the first triangle resolves the shared 0-radial by consuming the
		// few ring, per the strict before-midpoint rule
		let first = triangles[0];
		assert!(first.contains(&7) && first.contains(&8));
	}

	fn section(kind: SegmentKind, sides: u32, y: f32, skin_position: f32, shape_offset: i32) -> Segment {
		Segment {
			branch: BranchId(0),
			structural_id: 0,
			sides,
			kind,
			center: Vec3::new(0.0, y, 0.0),
			forward: Vec3::Y,
			up: Vec3::X,
			girth: 0.5,
			skin_position,
			branch_position: skin_position,
			length_from_root: y,
			phase_direction: 0.0,
			phase_position: skin_position,
			is_root: true,
			is_tuned: false,
			shape_offset,
		}
	}

	#[test]
	fn test_star_profile_keeps_consistent_winding() {
		use crate::builders::ShapeProfile;
		use crate::mesh::VertexBuffers;
		use crate::skin::BranchSkin;
		use crate::slices::{partition, OffsetTable};
		use std::collections::HashSet;

		// a circle ring, a non-convex star, and a circle again, so the
		// merge walk runs once in each taper direction
		let mut skin = BranchSkin::new(BranchId(0), 0, 2.0, 0.0, 3, 16, false, false, 0.0, 0.01);
		skin.push_segment(section(SegmentKind::Begin, 6, 0.0, 0.0, -1));
		let offset = skin.push_shape_ring(&ShapeProfile::star(5, 0.4).ring());
		skin.push_segment(section(SegmentKind::Middle, 10, 1.0, 0.5, offset));
		skin.push_segment(section(SegmentKind::EndCap, 6, 2.0, 1.0, -1));

		let skin_counts = counts(&skin);
		let table = OffsetTable::from_counts(&[skin_counts]);
		let mut buffers = VertexBuffers::zeroed(table.total_vertices(), table.total_indices());
		let stats = {
			let mut slices = partition(&mut buffers, &table);
			mesh_skin(&skin, 2.0, &mut slices[0]).unwrap()
		};
		assert_eq!(stats.triangles, 6 + 10 + 10 + 6);

		// consistent winding: no directed edge is ever traversed twice
		let mut seen = HashSet::new();
		for tri in buffers.indices.chunks(3) {
			for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
				assert!(seen.insert((a, b)), "directed edge ({}, {}) repeats", a, b);
			}
		}

		// faces keep pointing away from the stalk axis on both directions
		let mut outward = 0.0f32;
		for tri in buffers.indices.chunks(3) {
			let v = |i: u32| Vec3::from_array(buffers.positions[i as usize]);
			let (a, b, c) = (v(tri[0]), v(tri[1]), v(tri[2]));
			let face = (b - a).cross(c - a);
			let centroid = (a + b + c) / 3.0;
			outward += face.dot(Vec3::new(centroid.x, 0.0, centroid.z));
		}
		assert!(outward > 0.0);
	}

	#[test]
	fn test_angular_spans_sum_to_full_turn() {
		for (m, n) in [(6u32, 3u32), (5, 8), (4, 4)] {
			let triangles = stitch(m, n);
			let prev_range = 0..m + 1;
			let mut prev_span = 0.0f32;
			let mut curr_span = 0.0f32;
			for tri in &triangles {
				let prev_verts: Vec<u32> =
					tri.iter().copied().filter(|v| prev_range.contains(v)).collect();
				if prev_verts.len() == 2 {
					prev_span += 1.0 / m as f32;
				} else {
					curr_span += 1.0 / n as f32;
				}
			}
			assert!((prev_span - 1.0).abs() < 1e-4, "prev span for {}x{}", m, n);
			assert!((curr_span - 1.0).abs() < 1e-4, "curr span for {}x{}", m, n);
		}
	}
}
