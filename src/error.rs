use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescanError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot load image: {0}")]
    Load(String),

    #[error("cannot save image: {0}")]
    Save(String),

    #[error("unsupported pixel format: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Generates factory methods for [`DescanError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl DescanError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => Config,
    /// Create an image load error.
    load => Load,
    /// Create an image save error.
    save => Save,
    /// Create an unsupported-pixel-format error.
    format => Format,
}

impl From<image::ImageError> for DescanError {
    fn from(e: image::ImageError) -> Self {
        Self::Load(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DescanError>;
