use anyhow::Result;
use inquire::{Confirm, Select, Text};
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use crate::services::source::DocumentSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    File,
    Url,
    Paste,
}

impl SourceKind {
    const ALL: [SourceKind; 3] = [SourceKind::File, SourceKind::Url, SourceKind::Paste];
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceKind::File => "Upload a Markdown file (.md, .markdown)",
            SourceKind::Url => "Fetch a README from a URL",
            SourceKind::Paste => "Paste README content",
        };
        f.write_str(label)
    }
}

/// Asks the user where the README should come from.
pub fn prompt_source() -> Result<DocumentSource> {
    let kind = Select::new("Where is your README?", SourceKind::ALL.to_vec()).prompt()?;

    let source = match kind {
        SourceKind::File => {
            let path = Text::new("Path to the Markdown file:")
                .with_default("README.md")
                .prompt()?;
            DocumentSource::File(PathBuf::from(path.trim()))
        }
        SourceKind::Url => {
            let url = Text::new("README URL:")
                .with_help_message("e.g. https://github.com/owner/repo/blob/main/README.md")
                .prompt()?;
            DocumentSource::Url(url.trim().to_string())
        }
        SourceKind::Paste => {
            println!("Paste your README below, then press Ctrl-D (Ctrl-Z on Windows):");
            DocumentSource::Text(read_stdin()?)
        }
    };
    Ok(source)
}

pub fn read_stdin() -> Result<String> {
    let mut content = String::new();
    std::io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

pub fn confirm_start_over() -> Result<bool> {
    Ok(Confirm::new("Generate another comic?")
        .with_default(false)
        .prompt()?)
}
