//! Finding audio files on disk and naming them for humans.

mod label;
mod scan;

pub use label::track_label;
pub use scan::scan;
