pub mod batch;
pub mod event;
pub mod value;

pub use batch::RawBatch;
pub use event::{ChangeEvent, EntityKey, LatestStateRecord, Op, Payload};
pub use value::FieldValue;
