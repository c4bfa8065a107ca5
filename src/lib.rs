//! Engine behind the rhyme viewer: load a multimodal recording table once,
//! then answer selections with a filtered acoustic/kinematic series pair and
//! the path of the matching video.

pub mod config;
pub mod data;
