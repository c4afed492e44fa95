use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::sync::Arc;

use crate::core::comic::{ComicScript, PanelImage};
use crate::core::error::ComicError;
use crate::services::image::{generate_panel_image, ImageClient};
use crate::services::llm::LlmClient;
use crate::services::script::ScriptGenerator;

pub struct ComicWorkflow {
    llm: Box<dyn LlmClient>,
    images: Arc<dyn ImageClient>,
    script_generator: ScriptGenerator,
    show_progress: bool,
}

impl ComicWorkflow {
    pub fn new(llm: Box<dyn LlmClient>, images: Arc<dyn ImageClient>) -> Self {
        Self {
            llm,
            images,
            script_generator: ScriptGenerator::new(),
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Runs the whole pipeline for one README. The caller has already checked
    /// that `readme` is not blank.
    pub async fn generate(&self, readme: &str) -> Result<ComicScript, ComicError> {
        info!("Starting comic generation process...");
        println!("Writing the comic script...");
        let script = self.script_generator.generate(self.llm.as_ref(), readme).await?;

        println!("Generating images for {} panels...", script.panels.len());
        let comic = self.illustrate(script).await;

        let failed = comic.failed_image_count();
        if failed > 0 {
            warn!("{} of {} panel images failed", failed, comic.panels.len());
        }
        info!("Comic generation complete.");
        Ok(comic)
    }

    /// Requests one image per panel, all at once, and writes each result back
    /// to the panel it was requested for.
    pub async fn illustrate(&self, mut script: ComicScript) -> ComicScript {
        let style = script.art_style();
        let width = script.panels.len().max(1);

        let pb = if self.show_progress {
            ProgressBar::new(script.panels.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} panels")
        {
            pb.set_style(bar_style.progress_chars("#>-"));
        }

        let images = self.images.as_ref();
        let results: Vec<(usize, PanelImage)> =
            futures_util::stream::iter(script.panels.iter().enumerate())
                .map(|(i, panel)| {
                    let pb = pb.clone();
                    async move {
                        let image =
                            generate_panel_image(images, &panel.visual_description, style).await;
                        pb.inc(1);
                        (i, image)
                    }
                })
                .buffer_unordered(width)
                .collect()
                .await;

        pb.finish_and_clear();

        let mut slots: Vec<Option<PanelImage>> = vec![None; script.panels.len()];
        for (i, image) in results {
            slots[i] = Some(image);
        }
        for (panel, image) in script.panels.iter_mut().zip(slots) {
            panel.image_url = Some(image.unwrap_or(PanelImage::Failed));
        }

        script
    }
}
