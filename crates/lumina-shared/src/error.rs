use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image decode failed: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Image encode failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Image has no pixels")]
    Empty,
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Email is required to sign in")]
    MissingEmail,

    #[error("Session file error: {0}")]
    SessionFile(String),
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Field '{0}' cannot be changed")]
    Immutable(&'static str),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
