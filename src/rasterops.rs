pub mod opaque;
pub mod padding;

pub use opaque::force_opaque;
pub use padding::{centered_offset, fill_and_overlay};
