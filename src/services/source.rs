use log::{debug, info};
use std::path::{Path, PathBuf};
use url::Url;

use crate::core::config::FetchConfig;
use crate::core::error::SourceError;

/// Where the README comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File(PathBuf),
    Url(String),
    Text(String),
}

impl DocumentSource {
    pub async fn load(
        &self,
        client: &reqwest::Client,
        fetch: &FetchConfig,
    ) -> Result<String, SourceError> {
        match self {
            DocumentSource::File(path) => read_markdown_file(path).await,
            DocumentSource::Url(url) => fetch_readme(client, url, fetch).await,
            DocumentSource::Text(text) => Ok(text.clone()),
        }
    }
}

pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
}

pub async fn read_markdown_file(path: &Path) -> Result<String, SourceError> {
    if !is_markdown_file(path) {
        return Err(SourceError::UnsupportedFile(path.to_path_buf()));
    }
    info!("Reading README from {}", path.display());
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Maps a GitHub file page to its raw download URL.
///
/// `github.com/<owner>/<repo>/blob/<ref>/<path>` becomes
/// `raw.githubusercontent.com/<owner>/<repo>/<ref>/<path>`. Any other
/// `github.com` page is rejected since it serves HTML, not Markdown.
pub fn resolve_readme_url(input: &str) -> Result<Url, SourceError> {
    let url = Url::parse(input.trim())?;

    let is_github_page = matches!(url.host_str(), Some("github.com") | Some("www.github.com"));
    if !is_github_page {
        return Ok(url);
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [owner, repo, "blob", rest @ ..] if rest.len() >= 2 => {
            let raw = format!(
                "https://raw.githubusercontent.com/{}/{}/{}",
                owner,
                repo,
                rest.join("/")
            );
            debug!("Rewrote {} to {}", input, raw);
            Ok(Url::parse(&raw)?)
        }
        _ => Err(SourceError::GithubPageUrl),
    }
}

pub async fn fetch_readme(
    client: &reqwest::Client,
    input: &str,
    fetch: &FetchConfig,
) -> Result<String, SourceError> {
    let url = resolve_readme_url(input)?;
    let request_url = match fetch.proxy_url.as_deref() {
        Some(proxy) if !proxy.trim().is_empty() => format!("{}{}", proxy, url),
        _ => url.to_string(),
    };

    info!("Fetching README from {}", request_url);
    let resp = client
        .get(&request_url)
        .send()
        .await
        .map_err(|e| SourceError::Fetch(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Fetch(format!(
            "The server returned an error. Status: {}",
            status
        )));
    }

    let text = resp
        .text()
        .await
        .map_err(|e| SourceError::Fetch(e.to_string()))?;
    if text.is_empty() {
        return Err(SourceError::EmptyContent);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::fs;

    #[test]
    fn test_blob_url_rewritten_to_raw() {
        let url =
            resolve_readme_url("https://github.com/rust-lang/cargo/blob/master/README.md").unwrap();
        assert_eq!(
            url.as_str(),
            "https://raw.githubusercontent.com/rust-lang/cargo/master/README.md"
        );

        let nested =
            resolve_readme_url("https://github.com/o/r/blob/v1.2/docs/guide/README.md").unwrap();
        assert_eq!(
            nested.as_str(),
            "https://raw.githubusercontent.com/o/r/v1.2/docs/guide/README.md"
        );
    }

    #[test]
    fn test_repo_page_rejected() {
        for page in [
            "https://github.com/rust-lang/cargo",
            "https://github.com/rust-lang/cargo/tree/master/src",
            "https://github.com/rust-lang/cargo/blob/master",
        ] {
            assert!(matches!(
                resolve_readme_url(page),
                Err(SourceError::GithubPageUrl)
            ));
        }
    }

    #[test]
    fn test_other_urls_untouched() {
        let raw = "https://raw.githubusercontent.com/o/r/main/README.md";
        assert_eq!(resolve_readme_url(raw).unwrap().as_str(), raw);

        let other = "https://example.com/docs/README.md";
        assert_eq!(resolve_readme_url(other).unwrap().as_str(), other);
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            resolve_readme_url("not a url"),
            Err(SourceError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_markdown_extension() {
        assert!(is_markdown_file(Path::new("README.md")));
        assert!(is_markdown_file(Path::new("docs/Guide.MARKDOWN")));
        assert!(!is_markdown_file(Path::new("README.txt")));
        assert!(!is_markdown_file(Path::new("README")));
    }

    #[tokio::test]
    async fn test_load_file_and_text() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let md = dir.path().join("README.md");
        fs::write(&md, "# Hello")?;
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, "plain")?;

        let client = reqwest::Client::new();
        let fetch = FetchConfig::default();

        assert_eq!(
            DocumentSource::File(md).load(&client, &fetch).await?,
            "# Hello"
        );
        assert!(matches!(
            DocumentSource::File(txt).load(&client, &fetch).await,
            Err(SourceError::UnsupportedFile(_))
        ));
        assert!(matches!(
            DocumentSource::File(dir.path().join("missing.md"))
                .load(&client, &fetch)
                .await,
            Err(SourceError::Read { .. })
        ));
        assert_eq!(
            DocumentSource::Text("pasted".to_string())
                .load(&client, &fetch)
                .await?,
            "pasted"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_readme_success_and_failures() {
        let mut server = Server::new_async().await;
        let ok = server
            .mock("GET", "/README.md")
            .with_status(200)
            .with_body("# Fetched")
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/missing.md")
            .with_status(404)
            .expect(2)
            .create_async()
            .await;
        let empty = server
            .mock("GET", "/empty.md")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let fetch = FetchConfig::default();

        let text = fetch_readme(&client, &format!("{}/README.md", server.url()), &fetch)
            .await
            .unwrap();
        assert_eq!(text, "# Fetched");

        match fetch_readme(&client, &format!("{}/missing.md", server.url()), &fetch).await {
            Err(SourceError::Fetch(details)) => assert!(details.contains("404")),
            other => panic!("expected fetch error, got {:?}", other),
        }
        let err = fetch_readme(&client, &format!("{}/missing.md", server.url()), &fetch)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("paste its raw content"));

        assert!(matches!(
            fetch_readme(&client, &format!("{}/empty.md", server.url()), &fetch).await,
            Err(SourceError::EmptyContent)
        ));

        ok.assert_async().await;
        missing.assert_async().await;
        empty.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_readme_through_proxy() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                Matcher::Regex(r"^/proxy/https://example\.com/docs/README\.md$".to_string()),
            )
            .with_status(200)
            .with_body("# Proxied")
            .create_async()
            .await;

        let fetch = FetchConfig {
            proxy_url: Some(format!("{}/proxy/", server.url())),
        };
        let text = DocumentSource::Url("https://example.com/docs/README.md".to_string())
            .load(&reqwest::Client::new(), &fetch)
            .await
            .unwrap();

        assert_eq!(text, "# Proxied");
        mock.assert_async().await;
    }
}
