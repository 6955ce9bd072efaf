// CLI command implementations
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

use crate::cli::config::{Commands, Config};
use crate::cli::output::{OutputFormatter, ProgressBar};
use crate::cli::{CliError, CliResult};
use soundtag::field_mapping::field_for_frame;
use soundtag::id3::{self, TagContainer};
use soundtag::{
    Field, FileSource, HttpSource, KnownMetadata, LookupConfig, ReaderOptions, SoundBoard,
    SoundNumber, SoundSource, TagRecord,
};

/// Dispatch the parsed command line
pub fn run(config: &Config) -> CliResult<()> {
    let formatter = OutputFormatter::new(config.format, config.quiet);
    let options = config.reader_options();

    match &config.command {
        Commands::Lookup {
            numbers,
            root,
            base_url,
            timeout,
            known,
            config: lookup_config,
            output,
        } => {
            let lookup = lookup_settings(config, lookup_config.as_deref(), *timeout)?;
            let known = match known {
                Some(path) => KnownMetadata::load(path)?,
                None => KnownMetadata::builtin(),
            };
            let mut writer = open_writer(output.as_deref())?;

            match base_url {
                Some(url) => {
                    let source = HttpSource::new(url.clone(), lookup.timeout());
                    let board = SoundBoard::new(source, lookup, known);
                    command_lookup(&board, numbers, &formatter, &mut *writer)
                }
                None => {
                    let source = FileSource::new(root.clone().unwrap_or_else(|| PathBuf::from(".")));
                    let board = SoundBoard::new(source, lookup, known);
                    command_lookup(&board, numbers, &formatter, &mut *writer)
                }
            }
        }
        Commands::Tags {
            files,
            fields,
            output,
        } => {
            let fields = parse_fields(fields)?;
            let mut writer = open_writer(output.as_deref())?;
            command_tags(files, &fields, &options, &formatter, &mut *writer)
        }
        Commands::Detect { files } => command_detect(files, &options, &formatter),
        Commands::Frames { file } => command_frames(file, &options, &formatter),
        Commands::Scan { directory, pattern } => {
            command_scan(directory, pattern, &options, &formatter)
        }
    }
}

fn load_lookup_config(path: &Path) -> CliResult<LookupConfig> {
    let json = std::fs::read_to_string(path)
        .map_err(|_| CliError::FileNotFound(path.display().to_string()))?;
    Ok(serde_json::from_str(&json)?)
}

/// Lookup settings from the config file (or defaults), with passed flags applied on top
fn lookup_settings(
    config: &Config,
    path: Option<&Path>,
    timeout: Option<u64>,
) -> CliResult<LookupConfig> {
    let mut lookup = match path {
        Some(path) => load_lookup_config(path)?,
        None => LookupConfig::default(),
    };
    config.apply_reader_flags(&mut lookup.reader);
    if let Some(timeout) = timeout {
        lookup.timeout_secs = timeout;
    }
    Ok(lookup)
}

fn parse_fields(names: &[String]) -> CliResult<Vec<Field>> {
    names
        .iter()
        .map(|name| {
            Field::from_name(name)
                .ok_or_else(|| CliError::ParseError(format!("Unknown field: {}", name)))
        })
        .collect()
}

/// `file` plus the selected fields of a record; absent fields are `null`
fn select_fields(file: &str, tags: &TagRecord, fields: &[Field]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    map.insert("file".to_string(), file.into());
    for field in fields {
        map.insert(field.as_str().to_string(), tags.get(*field).into());
    }
    serde_json::Value::Object(map)
}

fn open_writer(output: Option<&Path>) -> CliResult<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    })
}

fn read_file(path: &Path) -> CliResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CliError::FileNotFound(path.display().to_string()),
        _ => CliError::IoError(e),
    })
}

/// Resolve display metadata for each number. A failed fetch is reported and skipped.
fn command_lookup<S: SoundSource>(
    board: &SoundBoard<S>,
    numbers: &[String],
    formatter: &OutputFormatter,
    writer: &mut dyn Write,
) -> CliResult<()> {
    let mut failures = 0;

    for input in numbers {
        let number = match SoundNumber::parse(input) {
            Ok(number) => number,
            Err(e) => {
                formatter.print_error(&e.to_string());
                failures += 1;
                continue;
            }
        };

        match board.lookup(number) {
            Ok(info) => formatter.output(&info, writer)?,
            Err(e) => {
                formatter.print_error(&format!("Sound {} could not be loaded: {}", number, e));
                failures += 1;
            }
        }
    }

    writer.flush()?;
    if failures == numbers.len() {
        return Err(CliError::Other("no sound could be looked up".to_string()));
    }
    Ok(())
}

#[derive(Serialize)]
struct FileTags<'a> {
    file: String,
    #[serde(flatten)]
    tags: &'a TagRecord,
}

/// Read tags of each file, optionally restricted to some fields
fn command_tags(
    files: &[PathBuf],
    fields: &[Field],
    options: &ReaderOptions,
    formatter: &OutputFormatter,
    writer: &mut dyn Write,
) -> CliResult<()> {
    for path in files {
        match read_file(path) {
            Ok(bytes) => {
                let tags = soundtag::read_tags(&bytes, options);
                let file = path.display().to_string();
                if fields.is_empty() {
                    formatter.output(&FileTags { file, tags: &tags }, writer)?;
                } else {
                    formatter.output_value(&select_fields(&file, &tags, fields), writer)?;
                }
            }
            Err(e) => formatter.print_error(&e.to_string()),
        }
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct Detection {
    file: String,
    containers: Vec<TagContainer>,
    id3v2_version: Option<String>,
    id3v2_size: Option<u32>,
    frames: usize,
    truncated: bool,
}

/// Report which containers each file carries
fn command_detect(
    files: &[PathBuf],
    options: &ReaderOptions,
    formatter: &OutputFormatter,
) -> CliResult<()> {
    let mut stdout = io::stdout();

    for path in files {
        let bytes = match read_file(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                formatter.print_error(&e.to_string());
                continue;
            }
        };

        let detected = id3::detect(&bytes);
        let tag = id3::parse_id3v2(&bytes, options);
        let detection = Detection {
            file: path.display().to_string(),
            containers: detected.containers(),
            id3v2_version: tag
                .as_ref()
                .map(|t| format!("2.{}.{}", t.header.version.0, t.header.version.1)),
            id3v2_size: tag.as_ref().map(|t| t.header.size),
            frames: tag.as_ref().map_or(0, |t| t.frames.len()),
            truncated: tag.as_ref().map_or(false, |t| t.truncated),
        };
        formatter.output(&detection, &mut stdout)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct FrameListing {
    id: String,
    size: u32,
    flags: u16,
    field: Option<&'static str>,
    data: String,
}

#[derive(Serialize)]
struct FrameReport {
    file: String,
    version: String,
    truncated: bool,
    frames: Vec<FrameListing>,
}

/// List raw ID3v2 frames with base64 payloads
fn command_frames(path: &Path, options: &ReaderOptions, formatter: &OutputFormatter) -> CliResult<()> {
    let bytes = read_file(path)?;
    let tag = id3::parse_id3v2(&bytes, options)
        .ok_or_else(|| CliError::Other(format!("{}: no ID3v2 tag", path.display())))?;

    let report = FrameReport {
        file: path.display().to_string(),
        version: format!("2.{}.{}", tag.header.version.0, tag.header.version.1),
        truncated: tag.truncated,
        frames: tag
            .frames
            .iter()
            .map(|frame| FrameListing {
                id: frame.frame_id.clone(),
                size: frame.size,
                flags: frame.flags,
                field: field_for_frame(&frame.frame_id).map(|field| field.as_str()),
                data: STANDARD.encode(frame.data),
            })
            .collect(),
    };

    formatter.output(&report, &mut io::stdout())
}

/// Read tags of every file matching `pattern` under `directory`
fn command_scan(
    directory: &Path,
    pattern: &str,
    options: &ReaderOptions,
    formatter: &OutputFormatter,
) -> CliResult<()> {
    let glob_pattern = format!("{}/{}", directory.display(), pattern);

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in glob::glob(&glob_pattern)
        .map_err(|e| CliError::Other(format!("Invalid glob pattern: {}", e)))?
    {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => formatter.print_error(&e.to_string()),
        }
    }
    files.sort();

    if files.is_empty() {
        formatter.print_info(&format!("No files match {}", glob_pattern));
        return Ok(());
    }
    formatter.print_info(&format!("Scanning {} files", files.len()));

    let mut progress = ProgressBar::new(files.len(), !formatter.is_quiet());
    let mut records = Vec::with_capacity(files.len());
    for path in &files {
        match read_file(path) {
            Ok(bytes) => records.push((path.display().to_string(), soundtag::read_tags(&bytes, options))),
            Err(e) => formatter.print_error(&e.to_string()),
        }
        progress.increment();
    }

    let mut stdout = io::stdout();
    for (file, tags) in &records {
        formatter.output(&FileTags { file: file.clone(), tags }, &mut stdout)?;
    }
    Ok(())
}
