use crate::branch::{Attachment, Branch, BranchId};

/// Flat storage for a tree's branches, addressed by [`BranchId`].
///
/// The arena is built once by the topology grower and stays immutable for
/// the duration of a synthesis pass. Iteration orders are insertion orders,
/// which keeps every consumer deterministic.
#[derive(Debug, Clone, Default)]
pub struct BranchArena {
	branches: Vec<Branch>,
}

impl BranchArena {
	pub fn new() -> Self {
		Self { branches: Vec::new() }
	}

	pub fn insert(&mut self, branch: Branch) -> BranchId {
		let id = BranchId(self.branches.len());
		self.branches.push(branch);
		id
	}

	/// Links `child` under `parent` at the given relative position and
	/// derives the child's level from the parent.
	pub fn attach(&mut self, parent: BranchId, child: BranchId, position: f32) {
		let parent_level = self.branches[parent.0].level;
		self.branches[child.0].parent = Some(parent);
		self.branches[child.0].level = parent_level + 1;

		let children = &mut self.branches[parent.0].children;
		children.push(Attachment { child, position });
		children.sort_by(|a, b| a.position.total_cmp(&b.position).then(a.child.cmp(&b.child)));
	}

	/// Marks `follow_up` as the seamless continuation of `branch`.
	/// The follow-up keeps the same hierarchy level as its predecessor.
	pub fn set_follow_up(&mut self, branch: BranchId, follow_up: BranchId) {
		let level = self.branches[branch.0].level;
		self.branches[branch.0].follow_up = Some(follow_up);
		self.branches[follow_up.0].parent = Some(branch);
		self.branches[follow_up.0].level = level;
	}

	pub fn get(&self, id: BranchId) -> &Branch {
		&self.branches[id.0]
	}

	pub fn get_mut(&mut self, id: BranchId) -> &mut Branch {
		&mut self.branches[id.0]
	}

	pub fn len(&self) -> usize {
		self.branches.len()
	}

	pub fn is_empty(&self) -> bool {
		self.branches.is_empty()
	}

	/// Branches with no parent, in insertion order.
	pub fn roots(&self) -> impl Iterator<Item = BranchId> + '_ {
		self.branches
			.iter()
			.enumerate()
			.filter(|(_, branch)| branch.parent.is_none())
			.map(|(i, _)| BranchId(i))
	}

	pub fn iter(&self) -> impl Iterator<Item = (BranchId, &Branch)> {
		self.branches.iter().enumerate().map(|(i, branch)| (BranchId(i), branch))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::curve::Curve;
	use crate::girth::GirthCurve;
	use bevy::prelude::*;

	fn stick(height: f32) -> Branch {
		Branch::new(
			Curve::line(Vec3::ZERO, Vec3::new(0.0, height, 0.0)),
			GirthCurve::constant(0.5),
		)
	}

	#[test]
	fn test_attach_sets_parent_and_level() {
		let mut arena = BranchArena::new();
		let trunk = arena.insert(stick(10.0).with_root(true));
		let child = arena.insert(stick(4.0));
		arena.attach(trunk, child, 0.5);

		assert_eq!(arena.get(child).parent, Some(trunk));
		assert_eq!(arena.get(child).level, 1);
		assert_eq!(arena.get(trunk).children.len(), 1);
	}

	#[test]
	fn test_children_sorted_by_position() {
		let mut arena = BranchArena::new();
		let trunk = arena.insert(stick(10.0).with_root(true));
		let high = arena.insert(stick(2.0));
		let low = arena.insert(stick(2.0));
		arena.attach(trunk, high, 0.8);
		arena.attach(trunk, low, 0.3);

		let positions: Vec<f32> =
			arena.get(trunk).children.iter().map(|a| a.position).collect();
		assert_eq!(positions, vec![0.3, 0.8]);
	}

	#[test]
	fn test_roots_excludes_attached() {
		let mut arena = BranchArena::new();
		let trunk = arena.insert(stick(10.0).with_root(true));
		let child = arena.insert(stick(4.0));
		arena.attach(trunk, child, 0.5);

		let roots: Vec<BranchId> = arena.roots().collect();
		assert_eq!(roots, vec![trunk]);
	}

	#[test]
	fn test_follow_up_keeps_level() {
		let mut arena = BranchArena::new();
		let trunk = arena.insert(stick(10.0).with_root(true));
		let continuation = arena.insert(stick(5.0));
		arena.set_follow_up(trunk, continuation);

		assert_eq!(arena.get(continuation).level, 0);
		assert_eq!(arena.get(trunk).follow_up, Some(continuation));
	}
}
