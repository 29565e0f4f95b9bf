//! File-backed template store: one YAML document per template.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

use super::defaults;
use super::model::{ReportTemplate, TemplateSummary};
use crate::error::{ReportError, Result};

const EXTENSION: &str = "yaml";

/// Template ids are used as file names, so only `[A-Za-z0-9_-]+` is allowed.
pub fn validate_template_id(id: &str) -> Result<()> {
    if !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(())
    } else {
        Err(ReportError::InvalidTemplate(format!(
            "invalid template id '{id}': use letters, digits, '_' or '-'"
        )))
    }
}

/// Stores templates as `<dir>/<id>.yaml`.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so readers see either the old or the new document.
#[derive(Debug, Clone)]
pub struct FileTemplateStore {
    dir: PathBuf,
}

impl FileTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }

    fn read(path: &Path) -> Result<ReportTemplate> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| ReportError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Summaries of every readable template, sorted by id.
    pub fn list(&self) -> Result<Vec<TemplateSummary>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_template_id(id).is_err() {
                continue;
            }
            match Self::read(&path) {
                Ok(template) => summaries.push(TemplateSummary::of(id, &template)),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable template"),
            }
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    pub fn exists(&self, id: &str) -> bool {
        validate_template_id(id).is_ok() && self.path_for(id).is_file()
    }

    pub fn get(&self, id: &str) -> Result<ReportTemplate> {
        validate_template_id(id)?;
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(ReportError::TemplateNotFound(id.to_string()));
        }
        Self::read(&path)
    }

    /// Validate, stamp `updated_at`, and replace any existing document.
    pub fn save(&self, id: &str, template: &ReportTemplate) -> Result<ReportTemplate> {
        validate_template_id(id)?;
        template.validate()?;

        let mut stored = template.clone();
        stored.template_info.updated_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        let yaml = serde_yaml::to_string(&stored).map_err(|source| ReportError::Yaml {
            path: self.path_for(id).display().to_string(),
            source,
        })?;
        write_atomic(&self.path_for(id), yaml.as_bytes())?;
        info!(template_id = id, "template saved");
        Ok(stored)
    }

    /// Remove a template. Returns false when it did not exist.
    pub fn delete(&self, id: &str) -> Result<bool> {
        validate_template_id(id)?;
        match std::fs::remove_file(self.path_for(id)) {
            Ok(()) => {
                info!(template_id = id, "template deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the built-in templates when the store holds none. Returns how
    /// many were written.
    pub fn ensure_defaults(&self) -> Result<usize> {
        if !self.list()?.is_empty() {
            debug!(dir = %self.dir.display(), "templates present, skipping defaults");
            return Ok(0);
        }
        let defaults = defaults::all();
        for (id, template) in &defaults {
            self.save(id, template)?;
        }
        info!(count = defaults.len(), dir = %self.dir.display(), "default templates created");
        Ok(defaults.len())
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("template.yaml");
    // Unique per write so concurrent saves of one id never share a temp file.
    let tmp_path = path.with_file_name(format!(
        "{file_name}.tmp.{}",
        uuid::Uuid::new_v4().simple()
    ));

    let written = std::fs::File::create(&tmp_path).and_then(|mut file| {
        file.write_all(content)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp_path, path)
    });
    if let Err(e) = written {
        if let Err(cleanup) = std::fs::remove_file(&tmp_path) {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %tmp_path.display(), error = %cleanup, "could not remove temp file");
            }
        }
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_ids_block_traversal() {
        assert!(validate_template_id("weekly_v2-final").is_ok());
        for bad in ["", "../etc/passwd", "a/b", "a.b", "sp ace"] {
            assert!(validate_template_id(bad).is_err(), "{bad}");
        }
    }
}
