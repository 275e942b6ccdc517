mod calendar;
mod engine;
mod error;
mod render;
mod summary;
mod types;

pub use calendar::{MonthNames, month_labels};
pub use engine::{compute, project, validate};
pub use error::{ProjectionError, ProjectionResult};
pub use render::render_text_table;
pub use summary::summarize;
pub use types::{DisplayRow, InputSet, PeriodRecord, RateSchedule, ResultTable, Totals};
