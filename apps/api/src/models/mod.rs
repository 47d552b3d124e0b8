pub mod assignment;
pub mod intent;

pub use assignment::{
    Assignment, AssignmentType, BloomBuckets, BloomLevel, DifficultyRange, OrganizationMode,
    Problem, ProblemArchetype, QuestionFormat, Rating, RatingLevel, Section,
};
pub use intent::{Intent, SectionSpec, SectionStrategy};
