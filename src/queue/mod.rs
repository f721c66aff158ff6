pub mod events;
pub mod item;
pub mod manager;

pub use events::{EventLog, QueueEvent};
pub use item::{QueueItem, Selection};
pub use manager::DownloadQueue;
