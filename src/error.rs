//! Domain errors of the scene composition.
//!
//! Most of the crate propagates `anyhow::Error`; the variants here exist where
//! a caller (or a test) needs to tell a specific failure apart.

use std::{fmt, sync::Arc};

use crate::scene::environment::CubeFace;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// A model name has no entry in the registry at composition time.
    #[error("model `{name}` is not registered")]
    UnresolvedModel { name: String },

    /// Cube faces must be square and share the size of the first face.
    #[error("cube face {face} is {width}x{height}, expected {expected}x{expected}")]
    CubeFaceSize {
        face: CubeFace,
        width: u32,
        height: u32,
        expected: u32,
    },

    /// An environment path does not belong to the face slot it was put in.
    #[error("cube face slot {face} holds `{path}`")]
    CubeFaceOrder { face: CubeFace, path: String },

    #[error("malformed glyph outline: {0}")]
    Font(String),
}

/// A memoised load failure handed out by the asset cache.
///
/// Every waiter on the same location receives a clone; the message and the
/// source chain are the ones of the original loader error.
#[derive(Debug, Clone)]
pub struct SharedLoadError(pub Arc<anyhow::Error>);

impl SharedLoadError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl From<anyhow::Error> for SharedLoadError {
    fn from(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }
}

impl fmt::Display for SharedLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for SharedLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}
