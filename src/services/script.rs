use log::{debug, error, info};
use serde_json::{json, Value};

use crate::core::comic::{ComicScript, PanelType, ProjectType};
use crate::core::error::ComicError;
use crate::services::llm::LlmClient;

pub const CHARACTERS: [&str; 6] = [
    "a wise old wizard",
    "a cheerful engineer robot",
    "a daring rocket pilot",
    "a mysterious spy with gadgets",
    "a super-intelligent octopus programmer",
    "a powerful code golem",
];

/// Turns a README into a validated `ComicScript` (no images yet) with one
/// schema-constrained text-generation request.
#[derive(Debug, Default)]
pub struct ScriptGenerator;

impl ScriptGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_prompt(&self, readme: &str) -> String {
        format!(
            "You are an expert comic book creator. Your task is to turn a GitHub README into an exciting comic book script.\n\
            \n\
            **README Content:**\n\
            ```\n\
            {readme}\n\
            ```\n\
            \n\
            **Instructions:**\n\
            1.  **Analyze Project Type:** First, determine if this is a 'CLI', 'WEB_APP', or 'GAME'. This will define the art style.\n\
            2.  **Assign Characters:** Analyze the README for key functions, features, or concepts (e.g., 'install', 'build', 'run', 'database', 'API'). \
            Assign a unique, consistent character from the provided list to each key concept. The characters should be quirky and memorable.\n\
            3.  **Create Panels:** Generate a sequence of 5-6 comic panels to explain the project.\n\
            \x20   *   **Panel 1 (TITLE):** A dynamic title page. The project name should be the comic title. Create a dramatic visual concept.\n\
            \x20   *   **Panel 2 (OVERVIEW):** An introduction to the project. What is it? Use a mascot character to explain.\n\
            \x20   *   **Panel 3 (INSTALL):** A panel explaining the installation process. Show the 'install' character in action.\n\
            \x20   *   **Panel 4+ (FEATURE):** One or two panels showcasing the main features or usage examples. Use the assigned characters.\n\
            \x20   *   **Final Panel (FINAL):** A dramatic \"Coming Soon\" or \"The End?\" splash page, teasing future developments.\n\
            4.  **Output JSON:** Structure your entire output as a single, valid JSON object that strictly adheres to the provided schema. \
            The 'panels' array must not be empty.\n\
            \n\
            **Character list to choose from:** {characters}.\n",
            readme = readme,
            characters = CHARACTERS.join(", "),
        )
    }

    pub fn response_schema(&self) -> Value {
        let project_types: Vec<&str> = ProjectType::ALL.iter().map(|t| t.as_str()).collect();
        let panel_types: Vec<&str> = PanelType::ALL.iter().map(|t| t.as_str()).collect();

        json!({
            "type": "OBJECT",
            "required": ["projectType", "characterMap", "panels"],
            "properties": {
                "projectType": {
                    "type": "STRING",
                    "enum": project_types,
                    "description": "The detected type of the project."
                },
                "characterMap": {
                    "type": "ARRAY",
                    "description": "A list of project features/functions and their assigned characters.",
                    "items": {
                        "type": "OBJECT",
                        "required": ["feature", "character"],
                        "properties": {
                            "feature": {
                                "type": "STRING",
                                "description": "The project feature, command, or concept (e.g., 'install', 'build')."
                            },
                            "character": {
                                "type": "STRING",
                                "description": "The assigned character persona for the feature."
                            }
                        }
                    }
                },
                "panels": {
                    "type": "ARRAY",
                    "description": "The sequence of comic panels.",
                    "items": {
                        "type": "OBJECT",
                        "required": ["type", "visualDescription", "narration"],
                        "properties": {
                            "type": {
                                "type": "STRING",
                                "enum": panel_types,
                                "description": "The type of the panel."
                            },
                            "visualDescription": {
                                "type": "STRING",
                                "description": "A detailed visual description for the AI image generator."
                            },
                            "narration": {
                                "type": "STRING",
                                "description": "Narrator's text box, like in a comic book."
                            },
                            "speech": {
                                "type": "ARRAY",
                                "description": "Speech bubbles for characters in the panel.",
                                "items": {
                                    "type": "OBJECT",
                                    "properties": {
                                        "character": { "type": "STRING", "description": "The character speaking." },
                                        "text": { "type": "STRING", "description": "The dialogue." }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    /// Parses model output. The schema is only a request, so `panels` is
    /// checked again here before the typed decode.
    pub fn parse_response(&self, response: &str) -> Result<ComicScript, ComicError> {
        let clean_json = strip_code_blocks(response);
        let value: Value = serde_json::from_str(&clean_json).map_err(|e| {
            error!("Script response is not valid JSON: {}", e);
            ComicError::InvalidStructure(format!("response is not valid JSON: {}", e))
        })?;

        match value.get("panels") {
            Some(Value::Array(panels)) if !panels.is_empty() => {}
            Some(Value::Array(_)) => {
                error!("Invalid script format: 'panels' array is empty");
                return Err(ComicError::InvalidStructure(
                    "'panels' array is empty".to_string(),
                ));
            }
            _ => {
                error!("Invalid script format: 'panels' array is missing or not an array");
                return Err(ComicError::InvalidStructure(
                    "'panels' array is missing or not an array".to_string(),
                ));
            }
        }

        serde_json::from_value(value).map_err(|e| {
            error!("Script does not match the comic schema: {}", e);
            ComicError::InvalidStructure(format!("script does not match the comic schema: {}", e))
        })
    }

    pub async fn generate(
        &self,
        llm: &dyn LlmClient,
        readme: &str,
    ) -> Result<ComicScript, ComicError> {
        let prompt = self.generate_prompt(readme);
        let schema = self.response_schema();

        let response = llm
            .generate_json(&prompt, &schema)
            .await
            .map_err(ComicError::generation)?;
        debug!("Received script: {}", response);

        let script = self.parse_response(&response)?;
        info!(
            "Script ready: {} project, {} panels, {} characters",
            script.project_type.as_str(),
            script.panels.len(),
            script.character_map.len()
        );
        Ok(script)
    }
}

/// Removes one surrounding Markdown code fence, with or without a `json` tag.
pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    let Some(body) = s.strip_prefix("```") else {
        return s.to_string();
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim().to_string()
}
