mod date_range;
mod event;
mod event_row;

pub use date_range::{DateRange, DateRangeError, Period};
pub use event::{Event, LOCAL_DATETIME_FORMAT};
pub use event_row::{CellValue, EventRow};
