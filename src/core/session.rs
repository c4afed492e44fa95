use crate::core::comic::ComicScript;
use crate::core::error::ComicError;

/// The single in-memory session: what is being turned into a comic, the
/// result once there is one, and the last user-facing error.
#[derive(Debug, Default)]
pub struct Session {
    document: Option<String>,
    comic: Option<ComicScript>,
    error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation, discarding any previous comic and error.
    /// Whitespace-only documents are rejected before anything is touched.
    pub fn begin(&mut self, document: &str) -> Result<(), ComicError> {
        if document.trim().is_empty() {
            self.error = Some(ComicError::EmptyDocument.user_message());
            return Err(ComicError::EmptyDocument);
        }
        self.document = Some(document.to_string());
        self.comic = None;
        self.error = None;
        Ok(())
    }

    pub fn complete(&mut self, comic: ComicScript) {
        self.comic = Some(comic);
        self.error = None;
    }

    pub fn fail(&mut self, err: &ComicError) -> &str {
        self.error.insert(err.user_message())
    }

    /// Records an error that happened before generation started, such as a
    /// failed download.
    pub fn report(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn comic(&self) -> Option<&ComicScript> {
        self.comic.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
