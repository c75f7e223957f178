mod logger;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use logger::CliLogger;
use pdf_seal::{Anchor, SealOptions, constants::pt_to_mm};
use pdf_seal_runtime::{MessageKind, SealCommand, SealUpdate, worker_task};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "pdfseal", about = "Straddle seal stamping for PDF documents", version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp a straddle seal across the right edge of every page
    Stamp {
        /// Seal image (PNG with transparency)
        #[arg(short, long)]
        seal: PathBuf,

        /// Input PDF file
        #[arg(short, long)]
        pdf: PathBuf,

        /// Output PDF file or directory (default: next to the input, named
        /// "<name>（已盖章）.pdf")
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        seal_args: SealArgs,
    },

    /// Write the seal slices as PNG files, one per page
    Slices {
        /// Seal image (PNG with transparency)
        #[arg(short, long)]
        seal: PathBuf,

        /// Take the page count from this PDF
        #[arg(short, long, conflicts_with = "pages", required_unless_present = "pages")]
        pdf: Option<PathBuf>,

        /// Number of slices to cut
        #[arg(long)]
        pages: Option<usize>,

        /// Directory for slice-NN.png files
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Show where the seal slice lands on each page, don't generate a PDF
    Plan {
        /// Seal image (PNG with transparency)
        #[arg(short, long)]
        seal: PathBuf,

        /// Input PDF file
        #[arg(short, long)]
        pdf: PathBuf,

        #[command(flatten)]
        seal_args: SealArgs,
    },
}

#[derive(Args)]
struct SealArgs {
    /// Load options from a JSON file (flags below override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Vertical seal position: upper-third, center or lower-third
    /// (unrecognized values fall back to center)
    #[arg(long)]
    anchor: Option<String>,

    /// Physical seal diameter in mm
    #[arg(long)]
    diameter_mm: Option<f32>,

    /// Save the effective options to a JSON file
    #[arg(long)]
    save_config: Option<PathBuf>,
}

/// Anchor from the command line, falling back to center with a warning
fn anchor_from_arg(value: &str) -> Anchor {
    if value.parse::<Anchor>().is_err() {
        log::warn!("Unknown anchor '{}', using {}", value, Anchor::Center);
    }
    Anchor::parse_or_center(value)
}

impl SealArgs {
    async fn resolve(&self) -> Result<SealOptions> {
        let mut options = match &self.config {
            Some(path) => SealOptions::load(path)
                .await
                .with_context(|| format!("loading config {}", path.display()))?,
            None => SealOptions::default(),
        };
        if let Some(anchor) = &self.anchor {
            options.anchor = anchor_from_arg(anchor);
        }
        if let Some(diameter_mm) = self.diameter_mm {
            options.seal_diameter_mm = diameter_mm;
        }
        options.validate()?;

        if let Some(path) = &self.save_config {
            options.save(path).await?;
            log::info!("Saved options to {}", path.display());
        }
        Ok(options)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    CliLogger::new(CliLogger::level_for(cli.verbose, cli.quiet)).init()?;

    match cli.command {
        Commands::Stamp {
            seal,
            pdf,
            output,
            seal_args,
        } => {
            let options = seal_args.resolve().await?;
            let destination = match output {
                Some(output) => output,
                None => pdf
                    .parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
            };
            stamp(seal, pdf, destination, options).await?;
        }

        Commands::Slices {
            seal,
            pdf,
            pages,
            output_dir,
        } => {
            let seal = pdf_seal::decode_seal_async(read_input(&seal).await?).await?;
            let page_count = match (pages, pdf) {
                (Some(pages), _) => pages,
                (None, Some(pdf)) => pdf_seal::load_pdf(&pdf).await?.get_pages().len(),
                (None, None) => bail!("either --pdf or --pages is required"),
            };

            let slices = pdf_seal::slice_seal_async(seal.into(), page_count).await?;
            tokio::fs::create_dir_all(&output_dir).await?;
            for slice in &slices {
                let path = output_dir.join(format!("slice-{:02}.png", slice.index + 1));
                tokio::fs::write(&path, &slice.encoded).await?;
            }
            println!(
                "Wrote {} slices ({}x{} px) → {}",
                slices.len(),
                slices.first().map_or(0, |s| s.width_px),
                slices.first().map_or(0, |s| s.height_px),
                output_dir.display()
            );
        }

        Commands::Plan {
            seal,
            pdf,
            seal_args,
        } => {
            let options = seal_args.resolve().await?;
            let seal = pdf_seal::decode_seal_async(read_input(&seal).await?).await?;
            let doc = pdf_seal::load_pdf(&pdf).await?;
            let pages = pdf_seal::page_geometries(&doc)?;
            let slices = pdf_seal::slice_seal_async(seal.into(), pages.len()).await?;
            let placements = pdf_seal::plan_placements(
                &slices,
                &pages,
                options.anchor,
                options.seal_diameter_pt(),
            );

            println!("Placement Plan:");
            println!("  Anchor: {}", options.anchor);
            println!("  Seal diameter: {} mm", options.seal_diameter_mm);
            println!("  Slices: {}", slices.len());
            for (index, (page, rect)) in pages.iter().zip(&placements).enumerate() {
                println!(
                    "  Page {:>3}: {:.1}x{:.1} mm, slice at x={:.2} y={:.2} ({:.2}x{:.2} pt)",
                    index + 1,
                    pt_to_mm(page.width_pt),
                    pt_to_mm(page.height_pt),
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height
                );
            }
        }
    }

    Ok(())
}

/// Drive a full stamping session through the worker
async fn stamp(seal: PathBuf, pdf: PathBuf, destination: PathBuf, options: SealOptions) -> Result<()> {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(worker_task(options, command_rx, update_tx));

    let commands = [
        SealCommand::LoadSeal {
            media_type: media_type_of(&seal),
            file_name: file_name_of(&seal),
            bytes: read_input(&seal).await?,
        },
        SealCommand::LoadPdf {
            media_type: media_type_of(&pdf),
            file_name: file_name_of(&pdf),
            bytes: read_input(&pdf).await?,
        },
        SealCommand::Generate,
        SealCommand::Export { destination },
    ];

    let mut summary = StampSummary::default();
    for command in commands {
        command_tx
            .send(command)
            .context("worker stopped unexpectedly")?;
        wait_for_command(&mut update_rx, &mut summary).await?;
    }

    drop(command_tx);
    worker.await?;

    if let Some(path) = summary.exported {
        println!("Stamped {} pages → {}", summary.pages, path.display());
    }
    Ok(())
}

#[derive(Default)]
struct StampSummary {
    pages: usize,
    exported: Option<PathBuf>,
}

/// Report updates until the current command finishes
async fn wait_for_command(
    update_rx: &mut mpsc::UnboundedReceiver<SealUpdate>,
    summary: &mut StampSummary,
) -> Result<()> {
    while let Some(update) = update_rx.recv().await {
        match update {
            SealUpdate::Status { kind, message } => match kind {
                MessageKind::Error => log::error!("{}", message),
                MessageKind::Loading | MessageKind::Success => log::info!("{}", message),
            },
            SealUpdate::StepChanged { step, status } => {
                log::debug!("Step {:?}: {:?}", step, status);
            }
            SealUpdate::StageChanged { stage } => log::debug!("Stage: {:?}", stage),
            SealUpdate::Progress {
                operation,
                current,
                total,
            } => log::debug!("{}: {}/{}", operation, current, total),
            SealUpdate::Percent { percent } => log::info!("Progress: {}%", percent),
            SealUpdate::SealLoaded {
                file_name,
                width_px,
                height_px,
            } => log::debug!(
                "Seal {}: {}x{} px",
                file_name.as_deref().unwrap_or("<unnamed>"),
                width_px,
                height_px
            ),
            SealUpdate::PdfLoaded { page_count } => log::debug!("Pages: {}", page_count),
            SealUpdate::Sliced { slice_count } => log::debug!("Slices: {}", slice_count),
            SealUpdate::Generated {
                file_name,
                page_count,
                byte_len,
            } => {
                summary.pages = page_count;
                log::debug!("Generated {} ({} bytes)", file_name, byte_len);
            }
            SealUpdate::Exported { path } => summary.exported = Some(path),
            // Already surfaced through the error status message
            SealUpdate::Error { .. } => {}
            SealUpdate::Finished { command, ok } => {
                if !ok {
                    bail!("{} failed", command);
                }
                return Ok(());
            }
        }
    }

    bail!("worker stopped unexpectedly")
}

async fn read_input(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

fn media_type_of(path: &Path) -> String {
    pdf_seal::media_type_for_path(path)
        .unwrap_or("application/octet-stream")
        .to_string()
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_from_arg() {
        assert_eq!(anchor_from_arg("upper-third"), Anchor::UpperThird);
        assert_eq!(anchor_from_arg("LOWER"), Anchor::LowerThird);
        assert_eq!(anchor_from_arg("1/2"), Anchor::Center);
        assert_eq!(anchor_from_arg("sideways"), Anchor::Center);
    }

    #[test]
    fn test_unknown_anchor_flag_resolves_to_center() {
        let cli = Cli::try_parse_from([
            "pdfseal", "plan", "--seal", "seal.png", "--pdf", "doc.pdf", "--anchor", "top-ish",
        ])
        .unwrap();
        let Commands::Plan { seal_args, .. } = cli.command else {
            panic!("expected the plan command");
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let options = runtime.block_on(seal_args.resolve()).unwrap();
        assert_eq!(options.anchor, Anchor::Center);
    }
}
