pub mod arena;
pub mod branch;
pub mod curve;
pub mod girth;

pub use arena::BranchArena;
pub use branch::{Attachment, Branch, BranchId};
pub use curve::{Curve, CurveFrame};
pub use girth::{GirthCurve, MIN_GIRTH};
