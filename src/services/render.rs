use anyhow::{Context, Result};
use log::info;
use minijinja::Environment;
use serde::Serialize;
use std::path::Path;

use crate::core::comic::{CharacterAssignment, ComicScript, Panel, PanelImage, SpeechBubble};
use crate::core::io::Storage;
use crate::utils::slug::slugify;

const TEMPLATE_NAME: &str = "comic.html";
const COMIC_TEMPLATE: &str = include_str!("../templates/comic.html");

/// Paths of the files written for one comic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedComic {
    pub json_path: String,
    pub html_path: String,
}

#[derive(Serialize)]
struct ComicView<'a> {
    title: &'a str,
    project_type: &'static str,
    cast: &'a [CharacterAssignment],
    panels: Vec<PanelView<'a>>,
}

#[derive(Serialize)]
struct PanelView<'a> {
    kind: &'static str,
    image: Option<&'a str>,
    failed: bool,
    alt: &'a str,
    narration: &'a str,
    speech: &'a [SpeechBubble],
}

impl<'a> From<&'a Panel> for PanelView<'a> {
    fn from(panel: &'a Panel) -> Self {
        let image = match &panel.image_url {
            Some(PanelImage::Ready(uri)) => Some(uri.as_str()),
            _ => None,
        };
        Self {
            kind: panel.kind.as_str(),
            image,
            failed: panel.image_url.as_ref().is_some_and(PanelImage::is_failed),
            alt: &panel.visual_description,
            narration: &panel.narration,
            speech: panel.speech.as_deref().unwrap_or_default(),
        }
    }
}

/// Renders the printable page. The template name ends in `.html`, so every
/// value is HTML-escaped.
pub fn render_html(comic: &ComicScript) -> Result<String> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, COMIC_TEMPLATE)?;
    let template = env.get_template(TEMPLATE_NAME)?;

    let view = ComicView {
        title: comic.title(),
        project_type: comic.project_type.as_str(),
        cast: &comic.character_map,
        panels: comic.panels.iter().map(PanelView::from).collect(),
    };
    Ok(template.render(&view)?)
}

async fn available_stem(storage: &dyn Storage, folder: &Path, base: &str) -> Result<String> {
    let mut stem = base.to_string();
    let mut n = 2;
    loop {
        let json = folder.join(format!("{}.json", stem));
        let html = folder.join(format!("{}.html", stem));
        if !storage.exists(&json.to_string_lossy()).await?
            && !storage.exists(&html.to_string_lossy()).await?
        {
            return Ok(stem);
        }
        stem = format!("{}-{}", base, n);
        n += 1;
    }
}

/// Writes the comic as JSON and as a printable HTML page, named after its
/// title. Existing files are never overwritten.
pub async fn write_comic(
    storage: &dyn Storage,
    output_folder: &str,
    comic: &ComicScript,
) -> Result<RenderedComic> {
    let folder = Path::new(output_folder);
    let stem = available_stem(storage, folder, &slugify(comic.title())).await?;

    let json_path = folder.join(format!("{}.json", stem)).to_string_lossy().to_string();
    let html_path = folder.join(format!("{}.html", stem)).to_string_lossy().to_string();

    let json = serde_json::to_string_pretty(comic)?;
    storage
        .write(&json_path, json.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", json_path))?;
    let html = render_html(comic).context("Failed to render the comic page")?;
    storage
        .write(&html_path, html.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", html_path))?;

    info!("Comic written to {} and {}", json_path, html_path);
    Ok(RenderedComic {
        json_path,
        html_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comic::{PanelType, ProjectType, IMAGE_GEN_FAILED};
    use crate::core::io::NativeStorage;

    fn sample_comic() -> ComicScript {
        ComicScript {
            project_type: ProjectType::Cli,
            character_map: vec![CharacterAssignment {
                feature: "install".to_string(),
                character: "a wise old wizard".to_string(),
            }],
            panels: vec![
                Panel {
                    kind: PanelType::Title,
                    visual_description: "logo".to_string(),
                    narration: "The <Legend> of MyTool".to_string(),
                    speech: None,
                    image_url: Some(PanelImage::Ready("data:image/jpeg;base64,AAAA".to_string())),
                },
                Panel {
                    kind: PanelType::Install,
                    visual_description: "wizard".to_string(),
                    narration: "Install it".to_string(),
                    speech: Some(vec![SpeechBubble {
                        character: "Wizard".to_string(),
                        text: "mytool install".to_string(),
                    }]),
                    image_url: Some(PanelImage::Failed),
                },
            ],
        }
    }

    #[test]
    fn test_html_shows_images_failures_and_speech() -> Result<()> {
        let html = render_html(&sample_comic())?;

        assert!(html.contains("<title>The &lt;Legend&gt; of MyTool</title>"));
        assert!(html.contains("base64,AAAA\" alt=\"logo\">"));
        assert_eq!(html.matches("<img ").count(), 1);
        assert_eq!(html.matches("Image generation failed").count(), 1);
        assert!(html.contains("<p class=\"who\">Wizard:</p>"));
        assert!(html.contains("Project Type: CLI"));
        assert!(html.contains("install as a wise old wizard"));
        assert!(!html.contains(IMAGE_GEN_FAILED));
        Ok(())
    }

    #[test]
    fn test_html_escapes_model_text() -> Result<()> {
        let mut comic = sample_comic();
        comic.panels[1].narration = "<script>alert(1)</script>".to_string();
        comic.panels[1].speech = Some(vec![SpeechBubble {
            character: "Spy \"Q\"".to_string(),
            text: "a & b".to_string(),
        }]);

        let html = render_html(&comic)?;
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(!html.contains("Spy \"Q\""));
        Ok(())
    }

    #[tokio::test]
    async fn test_write_comic_never_overwrites() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("out");
        let out_str = out.to_string_lossy().to_string();
        let storage = NativeStorage::new();
        let comic = sample_comic();

        let first = write_comic(&storage, &out_str, &comic).await?;
        assert!(first.json_path.ends_with("the-legend-of-mytool.json"));
        assert!(first.html_path.ends_with("the-legend-of-mytool.html"));

        let second = write_comic(&storage, &out_str, &comic).await?;
        assert!(second.json_path.ends_with("the-legend-of-mytool-2.json"));

        let bytes = tokio::fs::read(&first.json_path).await?;
        let back: ComicScript = serde_json::from_slice(&bytes)?;
        assert_eq!(back, comic);

        let json: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(json["panels"][1]["imageUrl"], IMAGE_GEN_FAILED);
        assert_eq!(json["projectType"], "CLI");
        Ok(())
    }
}
