use hyperbone_path::PathError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Not a hypermedia resource")]
    NotHypermediaResource,

    #[error("No data provided to expand templated uri for rel '{rel}'")]
    MissingTemplateData { rel: String },

    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    #[error("cannot traverse '{step}': not a model or collection")]
    NotContainer { step: String },

    #[error("index {index} out of bounds for collection of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("path not found: {path}")]
    PathNotFound { path: String },

    #[error("collection elements must be resource documents")]
    NotAResource,

    #[error("expected a mapping of attributes")]
    NotAMapping,

    #[error("the resource owning this command has been dropped")]
    OwnerReleased,
}
