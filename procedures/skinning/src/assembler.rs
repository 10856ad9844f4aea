use crate::builders::{BuilderRegistry, PreprocessContext, RingQuery};
use crate::config::SkinningConfig;
use crate::range::{BranchSkinRange, RangeParams, range_at};
use crate::relevant::{
	RelevantPositions, PRIORITY_ATTACHMENT, PRIORITY_BREAK, PRIORITY_CURVE,
	PRIORITY_NORMAL_BLEND,
};
use crate::segment::{Segment, SegmentKind};
use crate::skin::{BranchRange, BranchSkin};
use skeleton::{Branch, BranchArena, BranchId, CurveFrame, MIN_GIRTH};
use std::collections::HashMap;
use std::f32::consts::TAU;

/// Everything the skin assembly phase hands to the kernel and the mesh
/// assembler: the skins in depth-first traversal order plus the lookup
/// from any chained branch to its owning skin.
pub struct Assembly {
	pub skins: Vec<BranchSkin>,
	pub branch_to_skin: HashMap<BranchId, usize>,
}

/// Walks the skeleton depth-first, merges follow-up chains into skins,
/// and populates each skin's segment buffer in two passes: preprocess
/// (skins created, relevant positions collected) and commit (segments
/// emitted in curve order).
pub struct SkinAssembler<'a> {
	arena: &'a BranchArena,
	registry: &'a BuilderRegistry,
	config: &'a SkinningConfig,
	skins: Vec<BranchSkin>,
	branch_to_skin: HashMap<BranchId, usize>,
	/// Per-skin upper-bound semantics for the next region dispatch
	inclusive_upper: Vec<bool>,
	structural_counter: u32,
}

impl<'a> SkinAssembler<'a> {
	pub fn new(
		arena: &'a BranchArena,
		registry: &'a BuilderRegistry,
		config: &'a SkinningConfig,
	) -> Self {
		Self {
			arena,
			registry,
			config,
			skins: Vec::new(),
			branch_to_skin: HashMap::new(),
			inclusive_upper: Vec::new(),
			structural_counter: 0,
		}
	}

	pub fn assemble(mut self) -> Assembly {
		let roots: Vec<BranchId> = self.arena.roots().collect();

		for &root in &roots {
			let skin = self.get_or_create_skin(root, 0.0);
			self.preprocess_skin(skin);
		}

		for &root in &roots {
			let skin = self.branch_to_skin[&root];
			self.skin_branch(root, skin, 0.0);
		}

		Assembly { skins: self.skins, branch_to_skin: self.branch_to_skin }
	}

	/// Returns the skin owning `first`, creating it if needed: sums the
	/// follow-up chain's lengths, lays out the branch ranges, and assigns
	/// builder ranges from the branch's structure.
	fn get_or_create_skin(&mut self, first: BranchId, origin_length: f32) -> usize {
		if let Some(&index) = self.branch_to_skin.get(&first) {
			return index;
		}

		let arena = self.arena;
		let config = self.config;
		let first_branch = arena.get(first);

		let mut chain = Vec::new();
		let mut total = 0.0;
		let mut cursor = Some(first);
		while let Some(id) = cursor {
			let branch = arena.get(id);
			chain.push((id, branch.length()));
			total += branch.length();
			cursor = branch.follow_up;
		}
		if total < f32::EPSILON {
			log::warn!("skin {:?}: zero-length branch chain", first);
			total = f32::EPSILON;
		}

		let base_frame = first_branch.curve.frame_at(0.0);
		let phase_direction =
			(base_frame.forward.z.atan2(base_frame.forward.x) / TAU).rem_euclid(1.0);

		let mut skin = BranchSkin::new(
			first,
			first_branch.level,
			total,
			origin_length,
			config.min_polygon_sides,
			config.max_polygon_sides,
			config.hard_normals,
			config.base_cap,
			phase_direction,
			config.min_relevant_spacing,
		);

		let mut accumulated = 0.0;
		for &(id, length) in &chain {
			skin.branch_ranges.push(BranchRange {
				branch: id,
				from: accumulated / total,
				to: (accumulated + length) / total,
			});
			accumulated += length;
		}
		if let Some(last) = skin.branch_ranges.last_mut() {
			last.to = 1.0;
		}

		// structural range assignment; a shaper claims the whole skin
		if first_branch.has_shaper {
			skin.add_builder_range(BranchSkinRange::new(
				0.0,
				1.0,
				RangeParams::Shape(config.shape.clone()),
			));
		} else if first_branch.is_root {
			let trunk = config.trunk.clone();
			let to = trunk.flare_length.clamp(0.0, 1.0);
			skin.add_builder_range(BranchSkinRange::new(0.0, to, RangeParams::Trunk(trunk)));
		} else if first_branch.level >= config.weld.min_level
			&& first_branch.level <= config.weld.max_level
		{
			let weld = config.weld.clone();
			let to = weld.upper_spread.clamp(0.0, 1.0);
			skin.add_builder_range(BranchSkinRange::new(0.0, to, RangeParams::Weld(weld)));
		}

		let index = self.skins.len();
		for &(id, _) in &chain {
			self.branch_to_skin.insert(id, index);
		}
		self.skins.push(skin);
		self.inclusive_upper.push(true);
		index
	}

	/// Runs every range's preprocess hook, then walks the chain inserting
	/// relevant positions and pre-creating child skins depth-first.
	fn preprocess_skin(&mut self, skin_index: usize) {
		let registry = self.registry;

		let ranges = self.skins[skin_index].builder_ranges.clone();
		{
			let skin = &mut self.skins[skin_index];
			let mut ctx = PreprocessContext {
				skin_length: skin.length,
				skin_level: skin.level,
				relevant: &mut skin.relevant,
			};
			for range in &ranges {
				registry.get(range.kind()).preprocess_range(&mut ctx, range);
			}
		}

		let first = self.skins[skin_index].id;

		// a cross-section must exist where the averaged base frame hands
		// control back to the branch's own curve
		let arena = self.arena;
		let first_branch = arena.get(first);
		if self.averaging_applies(first_branch) {
			if let Some((_, parent_girth)) = self.parent_frame(first, first_branch) {
				let skin = &mut self.skins[skin_index];
				let boundary = (parent_girth / skin.length).min(0.5);
				skin.relevant.insert(boundary, PRIORITY_NORMAL_BLEND);
			}
		}

		self.preprocess_branch(skin_index, first, 0.0);
	}

	fn preprocess_branch(&mut self, skin_index: usize, branch_id: BranchId, consumed: f32) {
		let arena = self.arena;
		let branch = arena.get(branch_id);
		let branch_length = branch.length();
		let skin_length = self.skins[skin_index].length;

		for attachment in &branch.children {
			let position = (consumed + attachment.position * branch_length) / skin_length;
			self.skins[skin_index].relevant.insert(position, PRIORITY_ATTACHMENT);
		}

		if branch.is_broken {
			if let Some(break_position) = branch.break_position {
				let position = (consumed + break_position * branch_length) / skin_length;
				self.skins[skin_index].relevant.insert(position, PRIORITY_BREAK);
			}
		}

		if let Some(follow) = branch.follow_up {
			self.preprocess_branch(skin_index, follow, consumed + branch_length);
		}

		let origin = self.skins[skin_index].origin_length;
		for attachment in &branch.children {
			let child_origin = origin + consumed + attachment.position * branch_length;
			let child = self.get_or_create_skin(attachment.child, child_origin);
			self.preprocess_skin(child);
		}
	}

	/// Commits one branch's segments onto its skin, then recurses into the
	/// follow-up (same skin) and the children (their own skins).
	fn skin_branch(&mut self, branch_id: BranchId, skin_index: usize, consumed: f32) {
		let arena = self.arena;
		let branch = arena.get(branch_id);
		let branch_length = branch.length();
		let skin_length = self.skins[skin_index].length;
		let from = consumed / skin_length;

		if consumed == 0.0 {
			if self.skins[skin_index].base_cap {
				self.emit_segment(skin_index, branch_id, SegmentKind::BeginCap, 0.0, 0.0);
			}
			self.emit_segment(skin_index, branch_id, SegmentKind::Begin, 0.0, 0.0);
		} else {
			// the follow-up link stays a plain interior cross-section
			self.emit_segment(skin_index, branch_id, SegmentKind::Middle, 0.0, from);
		}

		for position in self.interior_positions(skin_index, branch_id, consumed) {
			let (owner, branch_position) = self.skins[skin_index].branch_at(position);
			self.emit_segment(skin_index, owner, SegmentKind::Middle, branch_position, position);
		}

		match branch.follow_up {
			Some(follow) => self.skin_branch(follow, skin_index, consumed + branch_length),
			None => {
				self.emit_segment(skin_index, branch_id, SegmentKind::EndCap, 1.0, 1.0);
			}
		}

		for attachment in &branch.children {
			let child = self.branch_to_skin[&attachment.child];
			self.skin_branch(attachment.child, child, 0.0);
		}
	}

	/// Interior sample positions for one branch: the curve's adaptive
	/// subdivision unioned with the skin's relevant positions, merged
	/// under the minimum spacing window so near-duplicates never survive.
	fn interior_positions(
		&self,
		skin_index: usize,
		branch_id: BranchId,
		consumed: f32,
	) -> Vec<f32> {
		let branch = self.arena.get(branch_id);
		let skin = &self.skins[skin_index];
		let from = consumed / skin.length;
		let to = (consumed + branch.length()) / skin.length;
		let spacing = skin.relevant.min_spacing();

		let mut merged = RelevantPositions::new(spacing);
		for t in branch.curve.adaptive_positions(self.config.angle_tolerance) {
			if t <= 0.0 || t >= 1.0 {
				continue;
			}
			merged.insert(from + t * (to - from), PRIORITY_CURVE);
		}
		for entry in skin.relevant.iter() {
			if entry.position > from && entry.position < to {
				merged.insert(entry.position, entry.priority);
			}
		}

		merged
			.iter()
			.map(|entry| entry.position)
			.filter(|&position| position > from + spacing && position < to - spacing)
			.collect()
	}

	fn averaging_applies(&self, branch: &Branch) -> bool {
		let policy = self.config.normal_averaging;
		policy.enabled && branch.level > 0 && branch.level <= policy.level_limit
	}

	/// Parent frame and girth at the attachment point of `branch_id`.
	fn parent_frame(&self, branch_id: BranchId, branch: &Branch) -> Option<(CurveFrame, f32)> {
		let parent = self.arena.get(branch.parent?);
		let attachment = parent.children.iter().find(|a| a.child == branch_id)?;
		let frame = parent.curve.frame_at(attachment.position);
		let girth = parent.girth.at(attachment.position);
		Some((frame, girth))
	}

	fn emit_segment(
		&mut self,
		skin_index: usize,
		branch_id: BranchId,
		kind: SegmentKind,
		branch_position: f32,
		skin_position: f32,
	) {
		let arena = self.arena;
		let config = self.config;
		let registry = self.registry;
		let branch = arena.get(branch_id);

		let (skin_length, skin_level, min_sides, max_sides, origin_length, phase_direction) = {
			let skin = &self.skins[skin_index];
			(
				skin.length,
				skin.level,
				skin.min_sides,
				skin.max_sides,
				skin.origin_length,
				skin.phase_direction,
			)
		};

		let mut frame = branch.curve.frame_at(branch_position);
		let mut base_girth = branch.girth.at(branch_position);

		// hierarchy normal averaging blends a child's base toward the
		// parent surface at the attachment
		if matches!(kind, SegmentKind::Begin | SegmentKind::BeginCap)
			&& self.averaging_applies(branch)
		{
			if let Some((parent_frame, parent_girth)) = self.parent_frame(branch_id, branch) {
				frame.forward = (frame.forward + parent_frame.forward).normalize();
				base_girth = parent_girth;
			}
		}

		let inclusive = self.inclusive_upper[skin_index];
		let (range, at_upper) =
			match range_at(&self.skins[skin_index].builder_ranges, skin_position, inclusive) {
				Some(matched) => (matched.range.clone(), matched.at_upper_bound),
				None => (BranchSkinRange::default_range(), false),
			};
		self.inclusive_upper[skin_index] = !at_upper;

		let builder = registry.get(range.kind());
		let query = RingQuery {
			position: skin_position,
			girth: base_girth,
			level: skin_level,
			min_sides,
			max_sides,
			skin_length,
			catalog: &config.shapes,
		};

		let floor = min_sides.max(3);
		let ceiling = max_sides.max(floor);
		let sides = builder.sides_at(&range, &query).clamp(floor, ceiling);

		let girth = if kind == SegmentKind::BeginCap {
			// the base cap collapses to a closing disk
			MIN_GIRTH
		} else {
			(base_girth * builder.girth_scale(&range, &query)).max(MIN_GIRTH)
		};

		let shape_offset = match builder.shape_ring(&range, &query) {
			Some(ring) => self.skins[skin_index].push_shape_ring(&ring),
			None => -1,
		};

		// shape tips inside the eased cap window are end cross-sections
		let kind = match (&range.params, kind) {
			(RangeParams::Shape(params), SegmentKind::Middle)
				if params.top_cap_offset > 0.0
					&& range.local(skin_position) >= 1.0 - params.top_cap_offset =>
			{
				SegmentKind::End
			}
			(_, kind) => kind,
		};

		let structural_id = self.structural_counter;
		self.structural_counter += 1;

		self.skins[skin_index].push_segment(Segment {
			branch: branch_id,
			structural_id,
			sides,
			kind,
			center: frame.position,
			forward: frame.forward,
			up: frame.up,
			girth,
			skin_position,
			branch_position,
			length_from_root: origin_length + skin_position * skin_length,
			phase_direction,
			phase_position: skin_position,
			is_root: branch.is_root,
			is_tuned: branch.is_tuned,
			shape_offset,
		});
	}
}
