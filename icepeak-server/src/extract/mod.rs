//! Request extractors.

mod bearer;

pub use bearer::MaybeBearer;
