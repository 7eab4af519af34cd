//! # Model Generation Module
//!
//! This module turns the parametric model template into concrete model descriptions, one per
//! scale candidate. [`ModelTemplate`] performs placeholder substitution and [`ScratchArea`]
//! manages the staging directory the rendered files are written into.
//!
//! Placeholders take the form `${name}`. Rendering is pure text substitution, so the template
//! itself is loaded once and never modified.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Pattern matching the names of staged temporary files in the scratch area.
const TMP_FILE_PATTERN: &str = r"_tmp_\.";

/// Pattern matching a `${name}` placeholder in the template text.
const PLACEHOLDER_PATTERN: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A parametric model description template.
pub struct ModelTemplate {
    /// The raw template text as read from disk.
    base: String,
}

/// The staging directory for rendered model descriptions.
///
/// Staged files carry a `_tmp_.` marker in their names so that [`ScratchArea::purge`] only ever
/// removes files this tool wrote, never user files that happen to share the directory.
pub struct ScratchArea {
    root: PathBuf,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ModelGenError {
    #[error("Could not load the model template {0:?}: {1}")]
    TemplateLoadError(PathBuf, io::Error),

    #[error("The template has no placeholder for the property {0:?}")]
    PropertyNotFound(String),

    #[error("The placeholder {0:?} was left unresolved after rendering")]
    UnresolvedProperty(String),

    #[error("Could not create the scratch directory {0:?}: {1}")]
    ScratchDirError(PathBuf, io::Error),

    #[error("Could not write the staged model {0:?}: {1}")]
    StageWriteError(PathBuf, io::Error),

    #[error("Could not purge the scratch area: {0}")]
    PurgeError(io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ModelTemplate {
    /// Load the template from the given path.
    pub fn from_file(path: &Path) -> Result<Self, ModelGenError> {
        let base = fs::read_to_string(path)
            .map_err(|e| ModelGenError::TemplateLoadError(path.into(), e))?;

        Ok(Self { base })
    }

    /// Render the template by substituting each `(name, value)` property into its placeholder.
    ///
    /// Every property must have at least one placeholder in the template, and no placeholder may
    /// remain once all properties are substituted. Substituting the same properties always
    /// produces the same text.
    pub fn render(&self, properties: &[(&str, String)]) -> Result<String, ModelGenError> {
        let mut rendered = self.base.clone();

        for (name, value) in properties {
            let placeholder = format!("${{{}}}", name);

            if !rendered.contains(&placeholder) {
                return Err(ModelGenError::PropertyNotFound((*name).into()));
            }

            rendered = rendered.replace(&placeholder, value);
        }

        // Any placeholder left over means the property list and the template disagree
        let placeholder_regex = Regex::new(PLACEHOLDER_PATTERN).unwrap();

        if let Some(caps) = placeholder_regex.captures(&rendered) {
            return Err(ModelGenError::UnresolvedProperty(caps[1].into()));
        }

        Ok(rendered)
    }
}

impl ScratchArea {
    /// Open the scratch area at the given root, creating the directory if needed.
    pub fn new(root: PathBuf) -> Result<Self, ModelGenError> {
        fs::create_dir_all(&root).map_err(|e| ModelGenError::ScratchDirError(root.clone(), e))?;

        Ok(Self { root })
    }

    /// Get the root directory of the scratch area.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a rendered model description into the scratch area.
    ///
    /// Returns the path of the staged file, which is named after the candidate index and carries
    /// the temporary file marker.
    pub fn stage(&self, candidate: usize, description: &str) -> Result<PathBuf, ModelGenError> {
        let path = self
            .root
            .join(format!("scale_model_{:03}_tmp_.xml", candidate));

        fs::write(&path, description)
            .map_err(|e| ModelGenError::StageWriteError(path.clone(), e))?;

        debug!("Staged model description at {:?}", path);

        Ok(path)
    }

    /// Remove all staged temporary files from the scratch area.
    ///
    /// Only regular files matching the temporary marker are removed. Returns the number of files
    /// removed.
    pub fn purge(&self) -> Result<usize, ModelGenError> {
        let tmp_regex = Regex::new(TMP_FILE_PATTERN).unwrap();
        let mut num_removed = 0usize;

        let entries = fs::read_dir(&self.root).map_err(ModelGenError::PurgeError)?;

        for entry in entries {
            let entry = entry.map_err(ModelGenError::PurgeError)?;
            let path = entry.path();

            let is_tmp = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => tmp_regex.is_match(name),
                None => false,
            };

            if path.is_file() && is_tmp {
                fs::remove_file(&path).map_err(ModelGenError::PurgeError)?;
                num_removed += 1;
            }
        }

        if num_removed > 0 {
            info!("Purged {} staged model(s) from the scratch area", num_removed);
        }

        Ok(num_removed)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn template(text: &str) -> ModelTemplate {
        ModelTemplate { base: text.into() }
    }

    #[test]
    fn test_render_substitutes_all_occurrences() {
        let tmpl = template("<a s=\"${scale}\"/><b s=\"${scale}\" r=\"${root}\"/>");

        let props = [("scale", String::from("0.86")), ("root", String::from(".."))];

        let rendered = tmpl.render(&props).unwrap();

        assert_eq!(rendered, "<a s=\"0.86\"/><b s=\"0.86\" r=\"..\"/>");
        assert!(!rendered.contains("${"));

        // Rendering again with the same properties gives the same text
        let rendered_again = tmpl.render(&props).unwrap();
        assert_eq!(rendered, rendered_again);
    }

    #[test]
    fn test_render_missing_placeholder() {
        let tmpl = template("<a s=\"${scale}\"/>");

        let props = [
            ("scale", String::from("0.86")),
            ("missing", String::from("nope")),
        ];

        assert!(matches!(
            tmpl.render(&props),
            Err(ModelGenError::PropertyNotFound(_))
        ));
    }

    #[test]
    fn test_render_unresolved_placeholder() {
        let tmpl = template("<a s=\"${scale}\" r=\"${root}\"/>");

        let props = [("scale", String::from("0.86"))];

        match tmpl.render(&props) {
            Err(ModelGenError::UnresolvedProperty(name)) => assert_eq!(name, "root"),
            other => panic!("expected UnresolvedProperty, got {:?}", other),
        }
    }

    #[test]
    fn test_stage_and_purge() {
        let root = std::env::temp_dir().join(format!("cor_scratch_test_{}", std::process::id()));
        let scratch = ScratchArea::new(root.clone()).unwrap();

        let staged = scratch.stage(3, "<model/>").unwrap();
        assert_eq!(
            staged.file_name().and_then(|n| n.to_str()),
            Some("scale_model_003_tmp_.xml")
        );
        assert!(staged.is_file());

        // A non-temporary file in the same directory must survive the purge
        let keeper = root.join("keep_me.xml");
        fs::write(&keeper, "<model/>").unwrap();

        assert_eq!(scratch.purge().unwrap(), 1);
        assert!(!staged.exists());
        assert!(keeper.is_file());

        fs::remove_file(&keeper).unwrap();
        fs::remove_dir(&root).unwrap();
    }
}
