//! Data model for the run queue: the open-ended item record, terminal exit
//! statuses and the selectors used to address items in the queue.

mod item;
pub use item::{EXIT_STATUS_FIELD, Item, ItemError, UID_FIELD};

mod status;
pub use status::ExitStatus;

mod select;
pub use select::{Place, Position, PositionParseError, Select};
