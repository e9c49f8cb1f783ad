use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;

use bitrans_core::{GlossaryEntry, LlmConfig, PromptRecord, PromptSet, Segment, TranslateConfig};
use engine_logging::{engine_debug, engine_info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::decode::{decode_text, DecodeError};
use crate::persist::{write_atomic, PersistError};

pub const ARTICLE_MEMBER: &str = "article.json";
pub const WORD_TABLE_MEMBER: &str = "word_table.json";
pub const TRANSLATE_CONFIG_MEMBER: &str = "translate_config.json";
pub const LLM_CONFIG_MEMBER: &str = "llm_config.json";
pub const PROMPT_MEMBER: &str = "prompt.json";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("unsupported project file {0}; expected .txt or .trs")]
    UnsupportedFormat(String),
    #[error("invalid project archive: {0}")]
    Archive(String),
    #[error("project archive has no {0}")]
    MissingMember(&'static str),
    #[error("invalid {member}: {message}")]
    Json {
        member: &'static str,
        message: String,
    },
}

impl From<zip::result::ZipError> for ProjectError {
    fn from(err: zip::result::ZipError) -> Self {
        ProjectError::Archive(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    PlainText,
    Archive,
}

impl ProjectKind {
    pub fn from_path(path: &Path) -> Result<Self, ProjectError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("txt") => Ok(ProjectKind::PlainText),
            Some("trs") => Ok(ProjectKind::Archive),
            _ => Err(ProjectError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// A loaded project. Settings are absent for plain text files and for
/// archives that lack the corresponding member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub segments: Vec<Segment>,
    pub glossary: Vec<GlossaryEntry>,
    pub translate_config: Option<TranslateConfig>,
    pub llm_config: Option<LlmConfig>,
    pub prompts: Option<PromptSet>,
}

pub fn load_project(path: &Path) -> Result<Project, ProjectError> {
    let kind = ProjectKind::from_path(path)?;
    let bytes = fs::read(path)?;
    let project = match kind {
        ProjectKind::PlainText => {
            let decoded = decode_text(&bytes)?;
            engine_debug!("{} decoded as {}", path.display(), decoded.encoding_label);
            Project {
                segments: segments_from_text(&decoded.text),
                ..Project::default()
            }
        }
        ProjectKind::Archive => read_archive(&bytes)?,
    };
    engine_info!(
        "loaded {}: {} segments, {} glossary entries",
        path.display(),
        project.segments.len(),
        project.glossary.len()
    );
    Ok(project)
}

/// One segment per non-blank line, surrounding whitespace trimmed.
pub fn segments_from_text(text: &str) -> Vec<Segment> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Segment::new(line, ""))
        .collect()
}

pub fn read_archive(bytes: &[u8]) -> Result<Project, ProjectError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let segments = read_member(&mut archive, ARTICLE_MEMBER)?
        .ok_or(ProjectError::MissingMember(ARTICLE_MEMBER))?;
    let glossary = read_member(&mut archive, WORD_TABLE_MEMBER)?.unwrap_or_default();
    let translate_config = read_member(&mut archive, TRANSLATE_CONFIG_MEMBER)?;
    let llm_config = read_member(&mut archive, LLM_CONFIG_MEMBER)?;
    let prompts = read_member::<Vec<PromptRecord>>(&mut archive, PROMPT_MEMBER)?
        .map(|records| PromptSet::from_records(&records));
    Ok(Project {
        segments,
        glossary,
        translate_config,
        llm_config,
        prompts,
    })
}

fn read_member<T: DeserializeOwned>(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    member: &'static str,
) -> Result<Option<T>, ProjectError> {
    let mut file = match archive.by_name(member) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            engine_debug!("archive member {} absent", member);
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    serde_json::from_slice(&contents)
        .map(Some)
        .map_err(|err| ProjectError::Json {
            member,
            message: err.to_string(),
        })
}

/// Everything written to a project archive.
#[derive(Debug, Clone, Copy)]
pub struct ProjectSnapshot<'a> {
    pub segments: &'a [Segment],
    pub glossary: &'a [GlossaryEntry],
    pub translate_config: &'a TranslateConfig,
    pub llm_config: &'a LlmConfig,
    pub prompts: &'a PromptSet,
}

pub fn write_archive(snapshot: &ProjectSnapshot<'_>) -> Result<Vec<u8>, ProjectError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    write_member(&mut writer, options, ARTICLE_MEMBER, &snapshot.segments)?;
    write_member(&mut writer, options, WORD_TABLE_MEMBER, &snapshot.glossary)?;
    write_member(
        &mut writer,
        options,
        TRANSLATE_CONFIG_MEMBER,
        snapshot.translate_config,
    )?;
    write_member(&mut writer, options, LLM_CONFIG_MEMBER, snapshot.llm_config)?;
    write_member(
        &mut writer,
        options,
        PROMPT_MEMBER,
        &snapshot.prompts.to_records(),
    )?;
    Ok(writer.finish()?.into_inner())
}

fn write_member<T: Serialize + ?Sized>(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    member: &'static str,
    value: &T,
) -> Result<(), ProjectError> {
    let json = serde_json::to_vec_pretty(value).map_err(|err| ProjectError::Json {
        member,
        message: err.to_string(),
    })?;
    writer.start_file(member, options)?;
    writer.write_all(&json)?;
    Ok(())
}

/// Saves the project as an archive, atomically replacing `path`.
pub fn save_project(path: &Path, snapshot: &ProjectSnapshot<'_>) -> Result<(), ProjectError> {
    let bytes = write_archive(snapshot)?;
    write_atomic(path, &bytes)?;
    engine_info!(
        "saved {}: {} segments, {} bytes",
        path.display(),
        snapshot.segments.len(),
        bytes.len()
    );
    Ok(())
}

/// Writes the translated text, one segment per line.
pub fn export_translation(path: &Path, segments: &[Segment]) -> Result<(), ProjectError> {
    let mut text = segments
        .iter()
        .map(|segment| segment.trans.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    text.push('\n');
    write_atomic(path, text.as_bytes())?;
    engine_info!("exported translation to {}", path.display());
    Ok(())
}
