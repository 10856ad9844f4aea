pub mod assembler;
pub mod builders;
pub mod channels;
pub mod config;
pub mod easing;
pub mod error;
pub mod kernel;
pub mod mesh;
pub mod range;
pub mod relevant;
pub mod segment;
pub mod skin;
pub mod slices;

pub use assembler::{Assembly, SkinAssembler};
pub use builders::{BuilderRegistry, ShapeCatalog, ShapeProfile, SkinBuilder};
pub use config::{NormalAveraging, SkinningConfig};
pub use easing::Easing;
pub use error::KernelError;
pub use mesh::{SubMesh, SynthesisStats, TreeMesh, VertexBuffers};
pub use range::{BranchSkinRange, BuilderKind, RangeParams, ShapeParams, TrunkParams, WeldParams};
pub use segment::{Segment, SegmentKind};
pub use skin::BranchSkin;

use crate::kernel::{SkinCounts, SkinStats};
use crate::slices::{partition, OffsetTable};
use rayon::prelude::*;
use skeleton::BranchArena;

/// Runs one full synthesis pass: sequential skin assembly, a parallel
/// meshing task per skin writing into pre-partitioned disjoint slices,
/// and sequential mesh assembly after the join.
///
/// The registry is caller-owned; pass [`BuilderRegistry::with_defaults`]
/// for the built-in strategies. Output is byte-for-byte reproducible for
/// a fixed skeleton and configuration.
pub fn synthesize(
	arena: &BranchArena,
	registry: &BuilderRegistry,
	config: &SkinningConfig,
) -> (TreeMesh, SynthesisStats) {
	let start_time = std::time::Instant::now();
	let assembly = SkinAssembler::new(arena, registry, config).assemble();
	log::debug!("Skin assembly time for {} skins: {:?}", assembly.skins.len(), start_time.elapsed());

	let counts: Vec<SkinCounts> = assembly.skins.iter().map(kernel::counts).collect();
	let table = OffsetTable::from_counts(&counts);
	let mut buffers = VertexBuffers::zeroed(table.total_vertices(), table.total_indices());

	let tree_length = assembly
		.skins
		.iter()
		.map(|skin| skin.origin_length + skin.length)
		.fold(0.0f32, f32::max)
		.max(f32::EPSILON);

	let start_time = std::time::Instant::now();
	let results: Vec<Result<SkinStats, KernelError>> = {
		let slices = partition(&mut buffers, &table);
		assembly
			.skins
			.par_iter()
			.zip(slices)
			.map(|(skin, mut slice)| kernel::mesh_skin(skin, tree_length, &mut slice))
			.collect()
	};
	log::debug!("Meshing kernel time: {:?}", start_time.elapsed());

	mesh::assemble_mesh(&assembly, &results, &buffers, &table, arena, registry)
}
