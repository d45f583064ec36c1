use {async_trait::async_trait, std::error::Error};

/// Error produced by a [`Source`].
pub type SourceError = Box<dyn Error + Send + Sync>;

/// Authoritative provider of values on a cache miss.
#[async_trait]
pub trait Source: Send + Sync {
    /// Loads the value of `key`.
    ///
    /// A missing key is reported as an error.
    async fn load(&self, key: &str) -> Result<Vec<u8>, SourceError>;
}

/// Adapter turning a plain function into a [`Source`].
///
/// ```
/// use peercache::{SourceError, SourceFn};
///
/// let source = SourceFn::new(|key: &str| -> Result<Vec<u8>, SourceError> {
///     match key {
///         "Tom" => Ok(b"630".to_vec()),
///         _ => Err(format!("{key} not exist").into()),
///     }
/// });
/// # let _ = source;
/// ```
pub struct SourceFn<F>(F);

impl<F> SourceFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>, SourceError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Source for SourceFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>, SourceError> + Send + Sync,
{
    async fn load(&self, key: &str) -> Result<Vec<u8>, SourceError> {
        (self.0)(key)
    }
}
