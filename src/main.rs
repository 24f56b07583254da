use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vid2text::cli::Cli;
use vid2text::pipeline::{EventSink, PipelineEvent, TranscriptionPipeline};
use vid2text::{utils, Config, MediaSource};

/// Renders pipeline events on the terminal: stage lines, a split/segment
/// progress bar, and verbose subprocess passthrough.
struct ConsoleSink {
    bar: Option<ProgressBar>,
    verbose: bool,
}

impl ConsoleSink {
    fn new(verbose: bool) -> Self {
        Self { bar: None, verbose }
    }

    fn finish_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn bar_with_len(&mut self, len: u64) -> &ProgressBar {
        self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  [{bar:40.cyan/blue}] {pos}/{len}")
                    .unwrap(),
            );
            bar
        })
    }
}

impl EventSink for ConsoleSink {
    fn event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage } => {
                self.finish_bar();
                eprintln!("{} {}", style("•").cyan(), stage.describe());
            }
            PipelineEvent::AudioAcquired { path } => {
                eprintln!("  audio ready: {}", path.display());
            }
            PipelineEvent::LanguageDetected { code } => {
                eprintln!("  language: {}", style(&code).green());
            }
            PipelineEvent::SplitProgress { percent } => {
                self.bar_with_len(100).set_position(percent as u64);
            }
            PipelineEvent::SegmentsReady { count } => {
                self.finish_bar();
                eprintln!("  {count} segments");
            }
            PipelineEvent::SegmentProgress { processed, total } => {
                self.bar_with_len(total as u64).set_position(processed as u64);
            }
            PipelineEvent::SegmentFailed { segment } => {
                if let Some(bar) = &self.bar {
                    bar.println(format!("  {} {segment}", style("failed:").yellow()));
                } else {
                    eprintln!("  {} {segment}", style("failed:").yellow());
                }
            }
            PipelineEvent::ToolOutput { line } => {
                if self.verbose {
                    eprintln!("    {line}");
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vid2text=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    config.apply_cli(&cli);

    // Precondition failures are reported before any run state is created.
    let missing = utils::check_dependencies().await;
    if !missing.is_empty() {
        eprintln!("{}", style("Missing required tools:").red());
        for tool in &missing {
            eprintln!("  • {tool}");
        }
        std::process::exit(2);
    }

    let source = MediaSource {
        url: cli.url.trim().to_string(),
        cookies: cli.cookies.clone(),
        prefix: cli.prefix.clone(),
    };

    let pipeline = TranscriptionPipeline::new(config.clone())?;
    let mut sink = ConsoleSink::new(config.verbose_tools);
    let result = pipeline.run(&source, &mut sink).await?;
    sink.finish_bar();

    println!();
    println!("Transcript: {}", result.transcript_path.display());
    if let Some(audio) = &result.audio_path {
        println!("Audio:      {}", audio.display());
    }
    println!("Language:   {}", result.language);
    println!(
        "Segments:   {}/{} transcribed",
        result.total_segments - result.failed_segments.len(),
        result.total_segments
    );
    if !result.failed_segments.is_empty() {
        println!();
        println!("{}", style("Some segments could not be recognized:").yellow());
        for name in &result.failed_segments {
            println!("  - {name}");
        }
    }

    Ok(())
}
