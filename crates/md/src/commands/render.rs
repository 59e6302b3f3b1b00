//! `md render` command implementation.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use clap::Args;
use console::Term;
use md_config::{CliSettings, Config};
use md_element::{
    ElementOptions, FetchEvent, HttpTransport, MarkdownElement, SourceNode, Transport,
};
use tracing::info;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render, or `-` for stdin (default: stdin unless --src is set).
    file: Option<PathBuf>,

    /// Remote markdown location (overrides config).
    #[arg(long)]
    src: Option<String>,

    /// Render soft line breaks as <br>.
    #[arg(long)]
    breaks: bool,

    /// Disable GFM extensions (tables, strikethrough, task lists).
    #[arg(long)]
    pedantic: bool,

    /// Escape raw HTML in the markdown.
    #[arg(long)]
    sanitize: bool,

    /// Typographic quotes and dashes.
    #[arg(long)]
    smartypants: bool,

    /// Do not force sanitization of remote content.
    #[arg(long)]
    no_remote_sanitize: bool,

    /// Fetch timeout in seconds (overrides config).
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Path to configuration file (default: auto-discover md.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// The rendered HTML is written to stdout even when the remote source
    /// failed; the failure is then returned as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or input reading fails, or if the
    /// remote source could not be loaded.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = self.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            info!(path = %path.display(), "Loaded configuration");
        }

        let source = SourceNode {
            text: self.read_inline(config.source.src.is_none())?,
            src: config.source.src.clone(),
        };
        if self.verbose
            && let Some(src) = &source.src
        {
            output.info(&format!("Fetching {src}"));
        }

        let transport = Arc::new(HttpTransport::new(config.fetch.timeout()));
        let rendered = render(transport, element_options(&config), source);

        if rendered.html.is_empty() {
            output.warning("Nothing to render");
        } else {
            Term::stdout().write_line(&rendered.html)?;
        }

        match rendered.failure {
            Some(event) => Err(CliError::Fetch {
                reason: describe_failure(&event),
                url: event.url,
            }),
            None => Ok(()),
        }
    }

    /// Build CLI settings from args. Flags only override when set.
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            breaks: self.breaks.then_some(true),
            pedantic: self.pedantic.then_some(true),
            sanitize: self.sanitize.then_some(true),
            smartypants: self.smartypants.then_some(true),
            src: self.src.clone(),
            timeout_secs: self.timeout,
            disable_remote_sanitization: self.no_remote_sanitize.then_some(true),
        }
    }

    /// Read the inline source text.
    ///
    /// Stdin is read for `-`, or when no file is given and `stdin_default`
    /// is set.
    fn read_inline(&self, stdin_default: bool) -> std::io::Result<String> {
        match self.file.as_deref() {
            Some(path) if path == Path::new("-") => std::io::read_to_string(std::io::stdin()),
            Some(path) => std::fs::read_to_string(path),
            None if stdin_default => std::io::read_to_string(std::io::stdin()),
            None => Ok(String::new()),
        }
    }
}

/// Result of rendering one source.
#[derive(Debug)]
struct Rendered {
    html: String,
    /// Unhandled fetch failure, if any.
    failure: Option<FetchEvent>,
}

/// Render a source through a connected element and wait for its fetch.
///
/// Fetch failures are recorded but not cancelled, so the fallback text ends
/// up in the output.
fn render(transport: Arc<dyn Transport>, options: ElementOptions, source: SourceNode) -> Rendered {
    let failure = Rc::new(RefCell::new(None));

    let mut element = MarkdownElement::with_transport(transport);
    element.apply_options(options);
    let sink = Rc::clone(&failure);
    element.on_request_error(move |event| *sink.borrow_mut() = Some(event.detail().clone()));
    element.append_source(source);

    element.connect();
    element.wait_for_fetch();

    let html = element.output_target().content();
    let failure = failure.borrow_mut().take();
    Rendered { html, failure }
}

fn element_options(config: &Config) -> ElementOptions {
    ElementOptions {
        breaks: config.render.breaks,
        pedantic: config.render.pedantic,
        sanitize: config.render.sanitize,
        smartypants: config.render.smartypants,
        disable_remote_sanitization: Some(config.fetch.disable_remote_sanitization),
        ..Default::default()
    }
}

fn describe_failure(event: &FetchEvent) -> String {
    match (&event.error, event.status) {
        (Some(error), _) => error.clone(),
        (None, Some(status)) => format!("HTTP status {status}"),
        (None, None) => "no response".to_owned(),
    }
}
