use crate::error::CustodianError;
use std::fs;
use std::path::Path;

/// Fields extracted from a blueprint definition file. Everything except the
/// embedded identifier carries a default so a sparse definition still yields
/// a usable index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionMetadata {
    pub id: Option<String>,
    pub name: String,
    pub author: String,
    pub category: String,
    pub version: String,
    pub tags: String,
    pub width: u32,
    pub height: u32,
    pub mod_dependencies: Vec<String>,
}

pub const DEFINITION_EXTENSION: &str = "xml";

fn parse_failure(path: &Path, reason: impl Into<String>) -> CustodianError {
    CustodianError::ParseFailure {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

fn child_text<'a>(node: roxmltree::Node<'a, 'a>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
}

fn child_text_or<'a>(node: roxmltree::Node<'a, 'a>, tag: &str, default: &'a str) -> String {
    match child_text(node, tag) {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Parse a `(width,height)` pair as written by the blueprint editor.
fn parse_size(raw: &str) -> (u32, u32) {
    let clean = raw.replace(['(', ')'], "");
    let mut parts = clean.split(',').map(|part| part.trim().parse::<u32>().ok());
    match (parts.next().flatten(), parts.next().flatten()) {
        (Some(width), Some(height)) => (width, height),
        _ => (0, 0),
    }
}

fn extract_mod_dependencies(extra_info: roxmltree::Node<'_, '_>) -> Vec<String> {
    let Some(packages) = extra_info
        .children()
        .find(|n| n.has_tag_name("modPackages"))
    else {
        return Vec::new();
    };

    let mut mods = Vec::new();
    for entry in packages.children().filter(|n| n.has_tag_name("mod")) {
        if let Some(package_id) = child_text(entry, "packageId") {
            let trimmed = package_id.trim();
            if !trimmed.is_empty() {
                mods.push(trimmed.to_string());
            }
        }
    }
    mods
}

pub fn parse_definition(path: &Path) -> Result<DefinitionMetadata, CustodianError> {
    let raw = fs::read_to_string(path).map_err(|err| parse_failure(path, err.to_string()))?;
    parse_definition_text(path, &raw)
}

pub fn parse_definition_text(
    path: &Path,
    raw: &str,
) -> Result<DefinitionMetadata, CustodianError> {
    let doc =
        roxmltree::Document::parse(raw).map_err(|err| parse_failure(path, err.to_string()))?;
    let root = doc.root_element();

    let Some(extra_info) = root.children().find(|n| n.has_tag_name("extraInfo")) else {
        return Err(parse_failure(path, "missing extraInfo element"));
    };

    let id = child_text(extra_info, "BuildingID")
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    let (width, height) = match child_text(root, "size") {
        Some(raw_size) => parse_size(raw_size),
        None => (0, 0),
    };

    Ok(DefinitionMetadata {
        id,
        name: child_text_or(extra_info, "name", "Unnamed"),
        author: child_text_or(extra_info, "author", "Unknown"),
        category: child_text_or(extra_info, "category", "Custom"),
        version: child_text_or(extra_info, "version", "1.0"),
        tags: child_text_or(extra_info, "tags", ""),
        width,
        height,
        mod_dependencies: extract_mod_dependencies(extra_info),
    })
}
