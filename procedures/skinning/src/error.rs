use skeleton::BranchId;

/// Fatal conditions inside one skin's meshing task.
///
/// These abort the owning skin only; the surrounding pass keeps going and
/// the skin is dropped from the final mesh.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
	#[error("skin {skin:?}: stamped {actual} vertices but {expected} were reserved")]
	CapacityMismatch { skin: BranchId, expected: usize, actual: usize },
	#[error("skin {skin:?}: shape pool read {offset}..{end} out of bounds ({len} entries)")]
	ShapePoolOutOfBounds { skin: BranchId, offset: usize, end: usize, len: usize },
}
