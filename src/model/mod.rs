pub mod category;
pub mod entry;
pub mod progression;
pub mod thresholds;
