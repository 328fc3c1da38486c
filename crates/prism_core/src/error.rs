use thiserror::Error;

/// Errors that reject a scene before any rendering starts.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sphere radius must be positive and finite, got {radius}")]
    NonPositiveRadius { radius: f32 },

    #[error("Scene has {spheres} spheres but {materials} materials")]
    MaterialCountMismatch { spheres: usize, materials: usize },

    #[error("Material {index}: index of refraction must be positive and finite, got {ior}")]
    InvalidRefractiveIndex { index: usize, ior: f32 },

    #[error("Material {index}: roughness must not be negative, got {roughness}")]
    NegativeRoughness { index: usize, roughness: f32 },

    #[error("Invalid camera: {0}")]
    InvalidCamera(&'static str),
}

/// Result type for scene construction.
pub type SceneResult<T> = Result<T, SceneError>;
