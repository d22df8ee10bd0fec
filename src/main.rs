use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use poster_catalog::catalog::{CatalogStore, ExportOptions, WorkDraft, WorkStore};
use poster_catalog::export::{export_snapshot, ExportFormat};
use poster_catalog::import::{csv, ImportSession};

/// Local catalog for drama stills with bulk import/export.
#[derive(Parser)]
#[command(name = "poster-catalog", version, about)]
struct Cli {
    /// Path to the catalog database (defaults to the user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every work in the catalog
    List,
    /// Show one work in detail
    Show { id: i64 },
    /// Add a single work
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        year: i64,
        #[arg(long)]
        episode: Option<i64>,
        #[arg(long)]
        character: Option<String>,
        #[arg(long)]
        identity: Option<String>,
        #[arg(long)]
        timestamp: Option<String>,
        /// Photo files to attach, in order (first is the cover)
        #[arg(long = "photo")]
        photos: Vec<PathBuf>,
    },
    /// Delete a work by id
    Delete { id: i64 },
    /// Bulk-import works from a CSV, XLSX, JSON, or zip file
    Import {
        file: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Export the whole catalog to JSON (or a zip archive)
    Export {
        /// Recompress every photo during export
        #[arg(long)]
        compress: bool,
        /// Maximum photo width when compressing
        #[arg(long, default_value_t = 1920)]
        max_width: u32,
        /// JPEG quality in (0, 1] when compressing
        #[arg(long, default_value_t = 0.7)]
        quality: f32,
        /// Package the export as a zip archive
        #[arg(long)]
        zip: bool,
        /// Output path (defaults to a date-stamped name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the bilingual CSV import template
    Template {
        /// Output path
        #[arg(short, long, default_value = "import-template.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let mut store = match &cli.db {
        Some(path) => CatalogStore::open(path)?,
        None => CatalogStore::open_default()?,
    };

    match cli.command {
        Command::List => list(&store),
        Command::Show { id } => show(&store, id),
        Command::Add {
            title,
            year,
            episode,
            character,
            identity,
            timestamp,
            photos,
        } => add(
            &mut store, title, year, episode, character, identity, timestamp, &photos,
        ),
        Command::Delete { id } => {
            store.delete(id)?;
            println!("Deleted work {id} (if it existed).");
            Ok(())
        }
        Command::Import { file, yes } => import(&mut store, &file, yes),
        Command::Export {
            compress,
            max_width,
            quality,
            zip,
            output,
        } => export(&store, compress, max_width, quality, zip, output),
        Command::Template { output } => {
            std::fs::write(&output, csv::template())
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Template written to {}", output.display());
            Ok(())
        }
    }
}

fn list(store: &CatalogStore) -> Result<()> {
    let works = store.get_all()?;
    if works.is_empty() {
        println!("The catalog is empty.");
        return Ok(());
    }
    for work in &works {
        println!(
            "{:>4}  {} ({}){}",
            work.id,
            work.title,
            work.year,
            if work.photos.is_empty() {
                String::new()
            } else {
                format!("  [{} photos]", work.photos.len())
            }
        );
    }
    println!("{} works total.", works.len());
    Ok(())
}

fn show(store: &CatalogStore, id: i64) -> Result<()> {
    let Some(work) = store.get_by_id(id)? else {
        bail!("no work with id {id}");
    };
    println!("#{}  {} ({})", work.id, work.title, work.year);
    if let Some(episode) = work.episode {
        println!("  episode:   {episode}");
    }
    if let Some(character) = &work.character {
        println!("  character: {character}");
    }
    if let Some(identity) = &work.identity {
        println!("  identity:  {identity}");
    }
    if let Some(timestamp) = &work.timestamp {
        println!("  timestamp: {timestamp}");
    }
    println!("  photos:    {}", work.photos.len());
    println!("  created:   {}", work.created_at);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn add(
    store: &mut CatalogStore,
    title: String,
    year: i64,
    episode: Option<i64>,
    character: Option<String>,
    identity: Option<String>,
    timestamp: Option<String>,
    photo_paths: &[PathBuf],
) -> Result<()> {
    if title.trim().is_empty() {
        bail!("title must not be empty");
    }

    let mut photos = Vec::with_capacity(photo_paths.len());
    for path in photo_paths {
        photos.push(read_photo(path)?);
    }

    let id = store.add(&WorkDraft {
        title,
        year,
        episode,
        character,
        identity,
        timestamp,
        photos,
        created_at: None,
    })?;
    println!("Added work {id}.");
    Ok(())
}

/// Read an image file into an inline data URL.
fn read_photo(path: &Path) -> Result<String> {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;

    let mime = match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => bail!("unsupported photo type: {}", path.display()),
    };
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(format!("data:{mime};base64,{}", BASE64.encode(&bytes)))
}

fn import(store: &mut CatalogStore, file: &Path, yes: bool) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut session = ImportSession::new();
    let count = session.load(&bytes, &name)?;
    if count == 0 {
        println!(
            "No importable rows found ({} skipped by validation).",
            session.skipped()
        );
        return Ok(());
    }

    println!(
        "{count} candidate(s), {} row(s) skipped by validation.",
        session.skipped()
    );
    println!("Preview:");
    let shown = session.preview().len();
    for draft in session.preview() {
        println!(
            "  {} ({}){}",
            draft.title,
            draft.year,
            draft
                .character
                .as_deref()
                .map(|c| format!(" - {c}"))
                .unwrap_or_default()
        );
    }
    if count > shown {
        println!("  ... and {} more.", count - shown);
    }

    if !yes && !confirm(&format!("Import {count} record(s)? [y/N] "))? {
        println!("Import cancelled.");
        return Ok(());
    }

    let report = session.commit_with_progress(store, |done, total| {
        if done % 50 == 0 || done == total {
            println!("  committed {done}/{total}...");
        }
    });

    println!("✅ Imported {} record(s).", report.committed);
    for failure in &report.errors {
        println!(
            "⚠️  row {} ({}) failed: {}",
            failure.index + 1,
            failure.title,
            failure.error
        );
    }
    Ok(())
}

fn export(
    store: &CatalogStore,
    compress: bool,
    max_width: u32,
    quality: f32,
    zip: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    if quality <= 0.0 || quality > 1.0 {
        bail!("quality must be in (0, 1]");
    }

    let options = ExportOptions {
        compress_images: compress,
        max_width,
        quality,
    };
    let format = if zip {
        ExportFormat::Archive
    } else {
        ExportFormat::Json
    };

    let mut last_percent = 0u32;
    let result = export_snapshot(store, &options, format, |fraction| {
        let percent = (fraction * 100.0) as u32;
        if percent / 10 > last_percent / 10 {
            println!("  compressing photos... {percent}%");
        }
        last_percent = percent;
    })?;

    let path = output.unwrap_or_else(|| PathBuf::from(&result.suggested_filename));
    std::fs::write(&path, &result.bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "✅ Exported {} bytes ({}) to {}",
        result.bytes.len(),
        result.mime_type,
        path.display()
    );
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
