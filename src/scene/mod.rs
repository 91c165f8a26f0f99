//! Declarative composition of the landing page.
//!
//! - `registry` maps model names to asset locations
//! - `placement` holds literal position / rotation / scale data
//! - `models` has one wrapper per named model
//! - `instantiate` resolves locations into shared assets and placed instances
//! - `layout` is the literal wall group, props and title
//! - `environment` describes the cube-map faces
//! - `root` ties camera, environment, controls and chrome to the layout

pub mod environment;
pub mod instantiate;
pub mod layout;
pub mod models;
pub mod placement;
pub mod registry;
pub mod root;
