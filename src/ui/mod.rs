pub mod media;
pub mod panels;
pub mod plot;
pub mod sessions;
