//! Master vector templates.

use std::fmt;
use std::path::Path;

use log::info;
use resvg::usvg::{self, Options, Tree};

use crate::error::AssetError;

/// Stable identity of a master asset (the template's file stem).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authored vector template.
///
/// Loaded once per run and never mutated. Construction guarantees the markup
/// is non-empty and parses as an SVG document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterAsset {
    id: AssetId,
    markup: String,
}

impl MasterAsset {
    /// Creates an asset from in-memory markup.
    pub fn new(id: AssetId, markup: impl Into<String>) -> Result<Self, AssetError> {
        let markup = markup.into();
        if markup.trim().is_empty() {
            return Err(AssetError::Empty(id));
        }

        parse_tree(&id, &markup)?;
        Ok(Self { id, markup })
    }

    /// Loads a template from an `.svg` file; its stem becomes the identity.
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        info!("Loading asset: {}", path.display());

        let is_svg = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
        let stem = path.file_stem().and_then(|s| s.to_str());
        let (true, Some(stem)) = (is_svg, stem) else {
            return Err(AssetError::NotSvg(path.to_path_buf()));
        };

        let markup = std::fs::read_to_string(path).map_err(|source| AssetError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::new(AssetId::new(stem), markup)
    }

    pub fn id(&self) -> &AssetId {
        &self.id
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

/// Parses markup into a render tree, classifying failures for `id`.
pub(crate) fn parse_tree(id: &AssetId, markup: &str) -> Result<Tree, AssetError> {
    let tree = Tree::from_str(markup, &Options::default()).map_err(|e| match e {
        usvg::Error::InvalidSize => AssetError::InvalidSize(id.clone()),
        other => AssetError::Malformed {
            id: id.clone(),
            reason: other.to_string(),
        },
    })?;

    let size = tree.size();
    if !(size.width() > 0.0 && size.height() > 0.0) {
        return Err(AssetError::InvalidSize(id.clone()));
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#ff0000"/></svg>"##;

    #[test]
    fn rejects_empty_markup() {
        let err = MasterAsset::new(AssetId::new("blank"), "  \n").unwrap_err();
        assert!(matches!(err, AssetError::Empty(id) if id.as_str() == "blank"));
    }

    #[test]
    fn rejects_malformed_markup() {
        let err = MasterAsset::new(AssetId::new("broken"), "<svg><rect").unwrap_err();
        assert!(matches!(err, AssetError::Malformed { .. }));
    }

    #[test]
    fn rejects_non_positive_size() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="10"/>"#;
        let err = MasterAsset::new(AssetId::new("flat"), svg).unwrap_err();
        assert!(matches!(err, AssetError::InvalidSize(_)));
    }

    #[test]
    fn load_uses_file_stem_as_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_logo.svg");
        std::fs::write(&path, SVG).unwrap();

        let asset = MasterAsset::load(&path).unwrap();
        assert_eq!(asset.id().as_str(), "_logo");
        assert_eq!(asset.markup(), SVG);
    }

    #[test]
    fn load_rejects_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, SVG).unwrap();

        assert!(matches!(MasterAsset::load(&path), Err(AssetError::NotSvg(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = MasterAsset::load(Path::new("/nonexistent/logo.svg")).unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));
    }
}
