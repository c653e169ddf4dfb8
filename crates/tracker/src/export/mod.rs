pub mod calendar;
pub mod image;

pub use calendar::event_to_ics;
pub use image::{ImageEncoder, ImagePayload, RawImage, fit_within, prepare_photo};
