pub mod audio;
pub mod events;
mod items;

pub use events::{ClientEvent, ServerEvent};
pub use items::{ContentPart, ItemResource, ItemRole, ItemStatus, ItemType, ResponseResource, SessionResource};
