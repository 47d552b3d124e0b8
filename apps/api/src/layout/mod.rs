// Layout: page geometry, problem height estimation, greedy pagination.
// Pure and CPU-bound; handlers run it inside tokio::task::spawn_blocking
// together with rendering.

pub mod estimator;
pub mod font_metrics;
pub mod handlers;
pub mod page;
pub mod paginator;

// Re-export the public API consumed by the renderers and handlers.
pub use estimator::{estimate_problem_height, layout_problem, AnswerArea, ProblemLayout};
pub use font_metrics::{get_metrics, FontFamily};
pub use page::{PageFormat, PageLayoutConfig, MM_PER_PT};
pub use paginator::{paginate, BlockKind, PaginatedDocument, PaginationSummary, RenderOptions};
