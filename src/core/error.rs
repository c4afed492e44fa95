use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComicError {
    #[error("API key is missing. Please ensure the API_KEY environment variable is set.")]
    MissingApiKey,

    #[error("README content is empty. Please provide a valid URL or file.")]
    EmptyDocument,

    #[error("Script generation failed: {0}")]
    Generation(String),

    #[error("The AI failed to generate a valid comic script structure. Please try modifying your README or try again. ({0})")]
    InvalidStructure(String),
}

impl ComicError {
    pub fn generation(err: anyhow::Error) -> Self {
        ComicError::Generation(format!("{:#}", err))
    }

    /// Message shown to the user when a generation attempt is aborted.
    pub fn user_message(&self) -> String {
        match self {
            ComicError::MissingApiKey | ComicError::EmptyDocument => self.to_string(),
            _ => format!(
                "Failed to generate comic. Please check your API Key and network connection. Details: {}",
                self
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("For best results, please use the \"Raw\" URL for the GitHub README file.")]
    GithubPageUrl,

    #[error("Please select a valid .md file: {}", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("Failed to read the file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Could not fetch the README from the URL. This can happen if the URL is incorrect, the proxy is down, or due to network issues.\n\nSuggestion: The most reliable methods are to pass the .md file directly or to paste its raw content.\n\nDetails: {0}")]
    Fetch(String),

    #[error("Received empty content from the URL. The file might be empty or the proxy failed silently.")]
    EmptyContent,
}
