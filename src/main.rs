//! Main entry point for the odtzip CLI application.
//!
//! This binary prints the text body of OpenDocument files and lists or
//! extracts entries of ZIP archives, from the local filesystem or from
//! remote HTTP URLs.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use odtzip::{
    Cli, EntryHandle, HttpRangeReader, Inflator, SourceStream, ZipArchive, read_document,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // -q silences warnings, -qq silences everything
    let level = if cli.is_very_quiet() {
        log::LevelFilter::Off
    } else if cli.is_quiet() {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Warn
    };
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .init();

    if !cli.is_http_url() {
        let mut archive = ZipArchive::open(&cli.file)
            .with_context(|| format!("{}: cannot open archive", cli.file))?;
        return process_zip(&mut archive, &cli);
    }

    let reader = HttpRangeReader::new(cli.file.clone())?;
    let mut archive = ZipArchive::new(SourceStream::new(reader));
    process_zip(&mut archive, &cli)?;

    if !cli.is_quiet() {
        let fetched = archive.into_inner().source().transferred_bytes();
        eprintln!("\nTotal bytes transferred: {}", format_size(fetched));
    }

    Ok(())
}

/// Process an archive based on CLI options.
///
/// - Count mode (`-c`): print the number of entries
/// - List mode (`-l` or `-v`): display archive contents
/// - Extract mode (entry names or `--index`): write entries to disk or stdout
/// - Document mode (default): print the document's `content.xml`
fn process_zip<R: Read + Seek>(archive: &mut ZipArchive<R>, cli: &Cli) -> Result<()> {
    if cli.count {
        println!("{}", archive.count_entries()?);
        return Ok(());
    }

    if cli.list || cli.verbose {
        return list_entries(archive, cli.verbose);
    }

    if !cli.has_selection() {
        let document = read_document(archive, cli.force)
            .with_context(|| cli.file.clone())?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(document.content.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }

    let handles = select_entries(archive, cli)?;

    // Acquired once for all selected entries, released when extraction ends
    let mut inflator = Inflator::new();
    let show_names = cli.pipe && handles.len() > 1;
    for handle in handles {
        extract_entry(archive, handle, &mut inflator, cli, show_names)?;
    }

    Ok(())
}

/// Resolve the entries selected on the command line to entry handles.
///
/// Each name may match several entries; the scan resumes after every match
/// so all of them are returned, in archive order per name.
fn select_entries<R: Read + Seek>(archive: &mut ZipArchive<R>, cli: &Cli) -> Result<Vec<EntryHandle>> {
    let mut handles = Vec::new();

    if let Some(index) = cli.index {
        match archive.offset_of_index(index)? {
            Some(handle) => handles.push(handle),
            None => log::warn!("caution: no entry at index {index}"),
        }
    }

    let flags = cli.match_flags();
    for name in &cli.names {
        let mut resume = None;
        let mut matched = false;
        while let Some(handle) = archive.offset_of_name(name, flags, resume)? {
            if !handles.contains(&handle) {
                handles.push(handle);
            }
            matched = true;
            resume = Some(handle.offset());
        }
        if !matched {
            log::warn!("caution: filename not matched: {name}");
        }
    }

    Ok(handles)
}

/// Print entry names (`-l`), or a table with sizes, method, savings and
/// timestamps (`-v`) followed by a totals line.
fn list_entries<R: Read + Seek>(archive: &mut ZipArchive<R>, verbose: bool) -> Result<()> {
    if verbose {
        println!(
            "{:>10}  {:>6}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Method", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(78));
    }

    let mut totals = (0u64, 0u64);
    let mut files = 0usize;

    for entry in archive.entries() {
        let entry = entry?;
        if !verbose {
            println!("{}", entry.file_name);
            continue;
        }

        let when = entry.modified;
        println!(
            "{:>10}  {:>6}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compression_method.label(),
            entry.compressed_size,
            savings(entry.compressed_size.into(), entry.uncompressed_size.into()),
            when.calendar_year(),
            when.month + 1,
            when.day,
            when.hours,
            when.minutes,
            entry.file_name
        );

        if !entry.is_directory {
            totals.0 += u64::from(entry.uncompressed_size);
            totals.1 += u64::from(entry.compressed_size);
            files += 1;
        }
    }

    if verbose {
        let (uncompressed, compressed) = totals;
        println!("{}", "-".repeat(78));
        println!(
            "{:>10}  {:>6}  {:>10}  {}  {:>17}  {files} files",
            uncompressed,
            "",
            compressed,
            savings(compressed, uncompressed),
            ""
        );
    }

    Ok(())
}

/// Space saved by compression, right-aligned as in `unzip -v`.
fn savings(compressed: u64, uncompressed: u64) -> String {
    if uncompressed == 0 {
        return "  0%".to_string();
    }
    let saved = 100 - (compressed as i64 * 100 / uncompressed as i64);
    format!("{saved:>4}%")
}

/// Extract a single entry from the archive.
///
/// - Pipe mode (`-p`): write to stdout instead of a file
/// - Custom output directory (`-d`)
/// - Junk paths (`-j`): ignore directory structure in the archive
/// - Overwrite control (`-n`, `-o`)
fn extract_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    handle: EntryHandle,
    inflator: &mut Inflator,
    cli: &Cli,
    show_name: bool,
) -> Result<()> {
    let name = archive.name_of_lossy(handle)?;
    let is_directory = name.ends_with('/');

    if cli.pipe {
        if is_directory {
            return Ok(());
        }
        let extraction = archive.extract(handle, inflator)?;
        if extraction.is_checksum_mismatch() {
            log::warn!("{name}: bad CRC {:?}", extraction.status);
        }

        let mut stdout = std::io::stdout().lock();
        if show_name {
            stdout.write_all(format!("--- {} ---\n", name).as_bytes())?;
        }
        stdout.write_all(&extraction.payload)?;
        stdout.flush()?;
        return Ok(());
    }

    if !is_safe_path(&name) {
        log::warn!("skipping {name}: path leaves the extraction directory");
        return Ok(());
    }

    let output_path = output_path(&name, cli);

    if is_directory {
        if !cli.junk_paths {
            std::fs::create_dir_all(&output_path)?;
        }
        return Ok(());
    }

    if output_path.exists() && !(cli.overwrite && !cli.never_overwrite) {
        let hint = if cli.never_overwrite { "file exists" } else { "use -o to overwrite" };
        if !cli.is_quiet() {
            eprintln!("Skipping: {name} ({hint})");
        }
        return Ok(());
    }

    if !cli.is_quiet() {
        println!("  inflating: {name}");
    }

    let extraction = archive.extract(handle, inflator)?;
    if extraction.is_checksum_mismatch() {
        log::warn!("{name}: bad CRC {:?}", extraction.status);
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = std::fs::File::create(&output_path)
        .with_context(|| format!("cannot create {}", output_path.display()))?;
    file.write_all(&extraction.payload)?;

    if let Some(modified) = archive.modtime_of(handle)?.to_system_time() {
        file.set_modified(modified)?;
    }

    Ok(())
}

/// Determine where an entry is written, honoring `-d` and `-j`.
fn output_path(name: &str, cli: &Cli) -> PathBuf {
    let file_name = if cli.junk_paths {
        Path::new(name)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| name.to_string())
    } else {
        name.to_string()
    };

    match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Reject absolute names and names that climb out with `..`.
fn is_safe_path(name: &str) -> bool {
    use std::path::Component;

    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Render a byte count with a binary unit suffix.
fn format_size(size: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    let mut value = size as f64;
    let mut unit = None;
    for name in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = Some(name);
    }

    match unit {
        Some(unit) => format!("{value:.2} {unit}"),
        None => format!("{size} bytes"),
    }
}
