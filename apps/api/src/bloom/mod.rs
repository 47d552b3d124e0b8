// Bloom/format constraint checking.
// Pure lookups over a static table; used by the generator and the alignment endpoint.

pub mod constraints;

pub use constraints::{
    allowed_formats, enforce_format, is_allowed, validate_assignment_alignment,
    validate_problem_bloom_alignment, AlignmentItem, AlignmentReport, AlignmentViolation,
    FormatDecision,
};
