pub mod dispatcher;
pub mod memory_mirror;
pub mod record_mirror;
pub mod rest_mirror;

pub use dispatcher::{MirrorDispatcher, MirrorHealth};
pub use memory_mirror::MemoryMirror;
pub use record_mirror::{MirrorError, MirrorRow, RecordMirror};
pub use rest_mirror::RestMirror;
