//! Engine data structures: instances, models, textures and decoded assets.
//!
//! - `instance` holds per-instance transformation data
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `scene_graph` is the decoded, GPU-independent form of a glTF asset
//! - `texture` contains GPU texture wrapper and creation utilities

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
