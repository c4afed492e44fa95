use serde::{Deserialize, Deserializer, Serialize};

pub const IMAGE_GEN_FAILED: &str = "IMAGE_GEN_FAILED";
pub const DEFAULT_COMIC_TITLE: &str = "My ComicReadMe Comic";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectType {
    Cli,
    WebApp,
    Game,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ProjectType {
    pub const ALL: [ProjectType; 4] = [
        ProjectType::Cli,
        ProjectType::WebApp,
        ProjectType::Game,
        ProjectType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Cli => "CLI",
            ProjectType::WebApp => "WEB_APP",
            ProjectType::Game => "GAME",
            ProjectType::Unknown => "UNKNOWN",
        }
    }

    /// Image-prompt style modifier for this kind of project.
    pub fn art_style(&self) -> &'static str {
        match self {
            ProjectType::Cli => "minimalist, clean lines, black and white with a single accent color",
            ProjectType::WebApp => "tech-noir, cyberpunk, neon-drenched, moody lighting",
            ProjectType::Game => "retro sci-fi, pulpy, vibrant colors, raygun gothic aesthetic",
            ProjectType::Unknown => "classic American comic book style, bold lines, primary colors",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PanelType {
    Title,
    Overview,
    Install,
    Feature,
    Final,
}

impl PanelType {
    pub const ALL: [PanelType; 5] = [
        PanelType::Title,
        PanelType::Overview,
        PanelType::Install,
        PanelType::Feature,
        PanelType::Final,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PanelType::Title => "TITLE",
            PanelType::Overview => "OVERVIEW",
            PanelType::Install => "INSTALL",
            PanelType::Feature => "FEATURE",
            PanelType::Final => "FINAL",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CharacterAssignment {
    pub feature: String,
    pub character: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SpeechBubble {
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub text: String,
}

/// Resolved artwork for a panel.
///
/// On the wire this is a plain string: either the embeddable data URI or the
/// `IMAGE_GEN_FAILED` sentinel.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum PanelImage {
    Ready(String),
    Failed,
}

impl PanelImage {
    pub fn is_failed(&self) -> bool {
        matches!(self, PanelImage::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PanelImage::Ready(uri) => uri,
            PanelImage::Failed => IMAGE_GEN_FAILED,
        }
    }
}

impl From<String> for PanelImage {
    fn from(value: String) -> Self {
        if value == IMAGE_GEN_FAILED {
            PanelImage::Failed
        } else {
            PanelImage::Ready(value)
        }
    }
}

impl From<PanelImage> for String {
    fn from(value: PanelImage) -> Self {
        match value {
            PanelImage::Ready(uri) => uri,
            PanelImage::Failed => IMAGE_GEN_FAILED.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    #[serde(rename = "type")]
    pub kind: PanelType,
    pub visual_description: String,
    pub narration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech: Option<Vec<SpeechBubble>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<PanelImage>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComicScript {
    #[serde(default, deserialize_with = "lenient_project_type")]
    pub project_type: ProjectType,
    #[serde(default)]
    pub character_map: Vec<CharacterAssignment>,
    pub panels: Vec<Panel>,
}

/// Anything that is not one of the known project types, including `null` or a
/// non-string value, reads as `UNKNOWN`.
fn lenient_project_type<'de, D>(deserializer: D) -> Result<ProjectType, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| serde_json::from_value::<ProjectType>(v).ok())
        .unwrap_or_default())
}

impl ComicScript {
    pub fn art_style(&self) -> &'static str {
        self.project_type.art_style()
    }

    /// Narration of the first TITLE panel, used to name exports.
    pub fn title(&self) -> &str {
        self.panels
            .iter()
            .find(|p| p.kind == PanelType::Title)
            .map(|p| p.narration.trim())
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_COMIC_TITLE)
    }

    pub fn failed_image_count(&self) -> usize {
        self.panels
            .iter()
            .filter(|p| p.image_url.as_ref().is_some_and(PanelImage::is_failed))
            .count()
    }
}
