//! The six-face cube-map environment used as background and ambient light.

use std::fmt;

use futures::future::try_join_all;

use crate::{
    error::SceneError,
    resources::{AssetSource, texture::load_image},
};

/// Cube faces in upload order; the discriminant is the texture layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeFace {
    Px = 0,
    Nx = 1,
    Py = 2,
    Ny = 3,
    Pz = 4,
    Nz = 5,
}

impl CubeFace {
    pub const ORDER: [CubeFace; 6] = [
        CubeFace::Px,
        CubeFace::Nx,
        CubeFace::Py,
        CubeFace::Ny,
        CubeFace::Pz,
        CubeFace::Nz,
    ];

    pub fn layer(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            CubeFace::Px => "px",
            CubeFace::Nx => "nx",
            CubeFace::Py => "py",
            CubeFace::Ny => "ny",
            CubeFace::Pz => "pz",
            CubeFace::Nz => "nz",
        }
    }
}

impl fmt::Display for CubeFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Image paths of the six faces, indexed by [`CubeFace::layer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Environment {
    files: [String; 6],
}

impl Environment {
    pub fn new(files: [&str; 6]) -> Self {
        Self {
            files: files.map(str::to_string),
        }
    }

    /// `/environment/{px,nx,py,ny,pz,nz}.png`.
    pub fn portfolio() -> Self {
        Self {
            files: CubeFace::ORDER.map(|face| format!("/environment/{}.png", face.name())),
        }
    }

    pub fn path(&self, face: CubeFace) -> &str {
        &self.files[face.layer() as usize]
    }

    pub fn faces(&self) -> impl Iterator<Item = (CubeFace, &str)> {
        CubeFace::ORDER
            .into_iter()
            .map(|face| (face, self.path(face)))
    }

    /// Every path must be named after the face slot it occupies.
    pub fn check_order(&self) -> Result<(), SceneError> {
        for (face, path) in self.faces() {
            let file = path.rsplit('/').next().unwrap_or(path);
            let stem = file.split('.').next().unwrap_or(file);
            if stem != face.name() {
                return Err(SceneError::CubeFaceOrder {
                    face,
                    path: path.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Fetch and decode all faces, in layer order.
    pub async fn load<S>(&self, source: &S) -> anyhow::Result<[image::RgbaImage; 6]>
    where
        S: AssetSource + ?Sized,
    {
        self.check_order()?;
        let images = try_join_all(self.files.iter().map(|path| load_image(path, source))).await?;
        let faces: [image::RgbaImage; 6] = images
            .try_into()
            .map_err(|_| anyhow::anyhow!("expected six cube faces"))?;
        validate_faces(&faces)?;
        log::info!(
            "Loaded environment with {0}x{0} faces",
            faces[0].width()
        );
        Ok(faces)
    }
}

/// All faces must be square and as large as the first one.
pub fn validate_faces(faces: &[image::RgbaImage; 6]) -> Result<(), SceneError> {
    let expected = faces[0].width();
    for (face, image) in CubeFace::ORDER.into_iter().zip(faces) {
        let (width, height) = image.dimensions();
        if width != expected || height != expected || width == 0 {
            return Err(SceneError::CubeFaceSize {
                face,
                width,
                height,
                expected,
            });
        }
    }
    Ok(())
}
