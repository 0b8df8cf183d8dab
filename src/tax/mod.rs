//! GST tax computation

pub mod gst;

pub use gst::*;
