use bevy::mesh::MeshVertexAttribute;
use bevy::prelude::*;
use bevy::render::render_resource::VertexFormat;
use skeleton::BranchId;

/// Geometry-type tag for trunk/branch surfaces.
pub const GEOMETRY_BRANCH: f32 = 0.0;
/// Geometry-type tag for sprout surfaces, stamped by the sprout instancer.
pub const GEOMETRY_SPROUT: f32 = 1.0;

/// (radial position, accumulated skin position, radial duplicate, girth).
/// Read by the wind baker as an attenuation weight.
pub const ATTRIBUTE_SURFACE_UV: MeshVertexAttribute =
	MeshVertexAttribute::new("Vertex_SurfaceUv", 988540001, VertexFormat::Float32x4);

/// (accumulated length, packed phase direction, phase position, root flag).
pub const ATTRIBUTE_PHASE_UV: MeshVertexAttribute =
	MeshVertexAttribute::new("Vertex_PhaseUv", 988540002, VertexFormat::Float32x4);

/// (branch id, skin id, structural id, geometry-type tag). Read by
/// material/selection systems to recolor or mask sub-structures.
pub const ATTRIBUTE_ID_UV: MeshVertexAttribute =
	MeshVertexAttribute::new("Vertex_IdUv", 988540004, VertexFormat::Float32x4);

/// (center.xyz, tuned flag). Consumed by tuning visualization.
pub const ATTRIBUTE_CENTER_UV: MeshVertexAttribute =
	MeshVertexAttribute::new("Vertex_CenterUv", 988540005, VertexFormat::Float32x4);

/// (direction.xyz, 0). Overwritten in place by the wind-phase baker.
pub const ATTRIBUTE_DIRECTION_UV: MeshVertexAttribute =
	MeshVertexAttribute::new("Vertex_DirectionUv", 988540006, VertexFormat::Float32x4);

/// (radial position, global length position, girth, 0). Overwritten in
/// place by the wind-phase baker.
pub const ATTRIBUTE_WIND_UV: MeshVertexAttribute =
	MeshVertexAttribute::new("Vertex_WindUv", 988540007, VertexFormat::Float32x4);

pub fn pack_surface_uv(radial: f32, skin_position: f32, girth: f32) -> [f32; 4] {
	[radial, skin_position, radial, girth]
}

pub fn pack_phase_uv(
	length_from_root: f32,
	phase_direction: f32,
	phase_position: f32,
	is_root: bool,
) -> [f32; 4] {
	[length_from_root, phase_direction, phase_position, if is_root { 1.0 } else { 0.0 }]
}

pub fn pack_id_uv(branch: BranchId, skin: BranchId, structural_id: u32, geometry: f32) -> [f32; 4] {
	[branch.0 as f32, skin.0 as f32, structural_id as f32, geometry]
}

pub fn pack_center_uv(center: Vec3, is_tuned: bool) -> [f32; 4] {
	[center.x, center.y, center.z, if is_tuned { 1.0 } else { 0.0 }]
}

pub fn pack_direction_uv(direction: Vec3) -> [f32; 4] {
	[direction.x, direction.y, direction.z, 0.0]
}

pub fn pack_wind_uv(radial: f32, global_length: f32, girth: f32) -> [f32; 4] {
	[radial, global_length, girth, 0.0]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_surface_uv_duplicates_radial() {
		let uv = pack_surface_uv(0.25, 0.5, 0.1);
		assert_eq!(uv, [0.25, 0.5, 0.25, 0.1]);
	}

	#[test]
	fn test_id_uv_field_order() {
		let uv = pack_id_uv(BranchId(3), BranchId(1), 42, GEOMETRY_BRANCH);
		assert_eq!(uv, [3.0, 1.0, 42.0, 0.0]);
	}

	#[test]
	fn test_flags_encode_as_unit() {
		assert_eq!(pack_phase_uv(0.0, 0.0, 0.0, true)[3], 1.0);
		assert_eq!(pack_center_uv(Vec3::ZERO, false)[3], 0.0);
	}
}
