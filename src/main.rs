use anyhow::{anyhow, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use readme2comic::core::config::{Config, DEFAULT_CONFIG_PATH};
use readme2comic::core::io::NativeStorage;
use readme2comic::core::session::Session;
use readme2comic::services::image::create_image_client;
use readme2comic::services::input;
use readme2comic::services::llm::create_llm;
use readme2comic::services::render::{write_comic, RenderedComic};
use readme2comic::services::source::DocumentSource;
use readme2comic::services::workflow::ComicWorkflow;

#[derive(Parser, Debug)]
#[command(version, about = "Turn a project README into a comic")]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Local Markdown file (.md or .markdown)
    #[arg(long, group = "source")]
    file: Option<PathBuf>,

    /// README URL; GitHub file pages are fetched from raw.githubusercontent.com
    #[arg(long, group = "source")]
    url: Option<String>,

    /// Read the README from standard input
    #[arg(long, group = "source")]
    stdin: bool,

    /// Output folder, overrides `output_folder` in the config
    #[arg(long)]
    output: Option<String>,

    /// Never prompt; run once and exit non-zero on failure
    #[arg(long)]
    unattended: bool,
}

impl Cli {
    fn source(&self) -> Result<Option<DocumentSource>> {
        if let Some(path) = &self.file {
            return Ok(Some(DocumentSource::File(path.clone())));
        }
        if let Some(url) = &self.url {
            return Ok(Some(DocumentSource::Url(url.clone())));
        }
        if self.stdin {
            return Ok(Some(DocumentSource::Text(input::read_stdin()?)));
        }
        Ok(None)
    }
}

struct App {
    config: Config,
    http: reqwest::Client,
    workflow: ComicWorkflow,
    storage: NativeStorage,
    session: Session,
}

impl App {
    /// One pass from source to files on disk. Failures are recorded in the
    /// session; returns whether the comic was written.
    async fn run_once(&mut self, source: &DocumentSource) -> bool {
        let readme = match source.load(&self.http, &self.config.fetch).await {
            Ok(text) => text,
            Err(e) => {
                self.session.report(e.to_string());
                return false;
            }
        };

        if self.session.begin(&readme).is_err() {
            return false;
        }
        info!(
            "README loaded ({} bytes)",
            self.session.document().map_or(0, str::len)
        );

        let comic = match self.workflow.generate(&readme).await {
            Ok(comic) => comic,
            Err(e) => {
                self.session.fail(&e);
                return false;
            }
        };

        match write_comic(&self.storage, &self.config.output_folder, &comic).await {
            Ok(written) => {
                self.session.complete(comic);
                self.print_summary(&written);
                true
            }
            Err(e) => {
                self.session
                    .report(format!("Comic generated but could not be saved: {:#}", e));
                false
            }
        }
    }

    fn print_summary(&self, written: &RenderedComic) {
        println!("Comic saved:");
        println!("  {}", written.html_path);
        println!("  {}", written.json_path);
        if let Some(comic) = self.session.comic() {
            let failed = comic.failed_image_count();
            if failed > 0 {
                println!(
                    "{} of {} panel images could not be generated.",
                    failed,
                    comic.panels.len()
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(output) = &cli.output {
        config.output_folder = output.clone();
    }
    config.unattended |= cli.unattended;

    if let Err(e) = config.validate() {
        eprintln!("{}", e.user_message());
        return Err(e.into());
    }
    config.ensure_directories()?;

    let llm = create_llm(&config);
    let images = create_image_client(&config);
    let workflow = ComicWorkflow::new(llm, images).with_progress(!config.unattended);

    let mut app = App {
        config,
        http: reqwest::Client::new(),
        workflow,
        storage: NativeStorage::new(),
        session: Session::new(),
    };

    let mut pending = cli.source()?;
    loop {
        let source = match pending.take() {
            Some(source) => source,
            None if app.config.unattended => DocumentSource::Text(input::read_stdin()?),
            None => input::prompt_source()?,
        };

        let written = app.run_once(&source).await;
        if let Some(message) = app.session.error() {
            eprintln!("Error: {}", message);
        }
        if app.config.unattended {
            if written {
                return Ok(());
            }
            let message = app.session.error().unwrap_or("Comic generation failed");
            return Err(anyhow!(message.to_string()));
        }

        if !input::confirm_start_over()? {
            break;
        }
        app.session.reset();
    }

    Ok(())
}
