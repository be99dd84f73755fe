//! Item record parsing.
//!
//! Each item lives in `data/<slug>/` as `<slug>.yml`, with an optional
//! `<slug>.<locale>.yml` overlay whose top-level keys replace the base ones.
//! The parser itself is side-effect free and returns `ParseError`;
//! `parse_item_or_placeholder` applies the "one bad file must not break the
//! page" policy on top of it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_yaml::Mapping;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::error::ContentError;
use crate::core::safety::{localized_filename, safe_read_file, sanitize_filename};
use crate::domain::{ItemRecord, Ref, RefList};

/// Layout of `updated_at`, i.e. `yyyy-MM-dd HH:mm`
pub const UPDATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Body file extensions, in lookup order
const BODY_EXTENSIONS: [&str; 2] = ["mdx", "md"];

/// Reasons a single record could not be built
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Read(#[from] ContentError),

    #[error("Malformed YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid updated_at {value:?} in {}: expected yyyy-MM-dd HH:mm", path.display())]
    Timestamp { path: PathBuf, value: String },
}

impl ParseError {
    /// Keep a failure that callers may paper over; invalid input is handed
    /// back as the `ContentError` that must reach the caller.
    pub fn recoverable(self) -> Result<Self, ContentError> {
        match self {
            ParseError::Read(e) if e.is_invalid_input() => Err(e),
            other => Ok(other),
        }
    }
}

/// Item YAML schema
#[derive(Debug, Deserialize)]
struct ItemData {
    name: String,
    description: String,
    source_url: String,
    #[serde(default)]
    category: Option<RefList>,
    #[serde(default)]
    tags: Option<RefList>,
    #[serde(default)]
    featured: bool,
    #[serde(default)]
    icon_url: Option<String>,
    updated_at: String,
    #[serde(default)]
    promo_code: Option<serde_yaml::Value>,
    #[serde(default)]
    markdown: Option<String>,
}

/// Parse `yyyy-MM-dd HH:mm` as a UTC timestamp
pub fn parse_updated_at(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), UPDATED_AT_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Strip the extension from `<slug>.yml` / `<slug>.yaml`
pub fn slug_from_filename(filename: &str) -> &str {
    filename
        .strip_suffix(".yml")
        .or_else(|| filename.strip_suffix(".yaml"))
        .unwrap_or(filename)
}

async fn read_mapping(dir: &Path, filename: &str) -> Result<Mapping, ParseError> {
    let filename = sanitize_filename(filename)?;
    let path = dir.join(&filename);
    let content = safe_read_file(&path, dir).await?;

    // An empty document is an empty record, not a syntax error
    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }
    serde_yaml::from_str(&content).map_err(|source| ParseError::Yaml { path, source })
}

fn record_from_mapping(slug: &str, mapping: Mapping, path: &Path) -> Result<ItemRecord, ParseError> {
    let data: ItemData = serde_yaml::from_value(serde_yaml::Value::Mapping(mapping))
        .map_err(|source| ParseError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

    let last_updated = parse_updated_at(&data.updated_at).ok_or_else(|| ParseError::Timestamp {
        path: path.to_path_buf(),
        value: data.updated_at.clone(),
    })?;

    let into_entities = |refs: Option<RefList>| -> Vec<_> {
        refs.unwrap_or_default()
            .into_vec()
            .into_iter()
            .map(Ref::into_entity)
            .collect()
    };

    Ok(ItemRecord {
        slug: slug.to_string(),
        name: data.name,
        description: data.description,
        source_url: data.source_url,
        category: into_entities(data.category),
        tags: into_entities(data.tags),
        featured: data.featured,
        icon_url: data.icon_url,
        updated_at: data.updated_at,
        last_updated,
        markdown: data.markdown,
        promo_code: data.promo_code,
        placeholder: false,
    })
}

/// Parse one item's primary YAML file
pub async fn parse_item(dir: &Path, filename: &str) -> Result<ItemRecord, ParseError> {
    let slug = slug_from_filename(filename);
    let mapping = read_mapping(dir, filename).await?;
    record_from_mapping(slug, mapping, &dir.join(filename))
}

/// Read an optional overlay file; any failure means "no overlay"
pub async fn parse_translation(dir: &Path, filename: &str) -> Option<Mapping> {
    match read_mapping(dir, filename).await {
        Ok(mapping) => Some(mapping),
        Err(e) => {
            debug!(file = %filename, error = %e, "No usable translation overlay");
            None
        }
    }
}

/// Parse an item with its locale overlay merged over the base record
pub async fn load_item(dir: &Path, slug: &str, locale: Option<&str>) -> Result<ItemRecord, ParseError> {
    let filename = format!("{}.yml", slug);
    let overlay_name = locale
        .map(|locale| localized_filename(slug, locale, "yml"))
        .transpose()?;
    let mut mapping = read_mapping(dir, &filename).await?;

    if let Some(overlay_name) = overlay_name {
        if let Some(overlay) = parse_translation(dir, &overlay_name).await {
            for (key, value) in overlay {
                mapping.insert(key, value);
            }
        }
    }

    record_from_mapping(slug, mapping, &dir.join(&filename))
}

/// `load_item`, substituting a placeholder for anything but invalid input
pub async fn parse_item_or_placeholder(
    dir: &Path,
    slug: &str,
    locale: Option<&str>,
) -> Result<ItemRecord, ContentError> {
    match load_item(dir, slug, locale).await {
        Ok(record) => Ok(record),
        Err(e) => {
            let e = e.recoverable()?;
            warn!(slug = %slug, error = %e, "Substituting placeholder record");
            Ok(ItemRecord::placeholder(slug))
        }
    }
}

/// Find the item body, preferring locale-specific `.mdx`/`.md` files
pub async fn read_body(dir: &Path, slug: &str, locale: Option<&str>) -> Result<Option<String>, ContentError> {
    let mut candidates = Vec::new();
    if let Some(locale) = locale {
        for ext in BODY_EXTENSIONS {
            candidates.push(localized_filename(slug, locale, ext)?);
        }
    }
    for ext in BODY_EXTENSIONS {
        candidates.push(sanitize_filename(&format!("{}.{}", slug, ext))?);
    }

    for filename in candidates {
        match safe_read_file(&dir.join(&filename), dir).await {
            Ok(content) => return Ok(Some(content)),
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use tempfile::TempDir;

    const VALID: &str = r#"
name: Ripgrep
description: Fast search
source_url: https://github.com/BurntSushi/ripgrep
category: cli
tags: [search, rust]
featured: true
updated_at: "2024-03-05 14:30"
"#;

    #[test]
    fn test_parse_updated_at() {
        let ts = parse_updated_at("2024-03-05 14:30").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 3, 5));
        assert_eq!((ts.hour(), ts.minute()), (14, 30));

        assert!(parse_updated_at("2024-03-05").is_none());
        assert!(parse_updated_at("05/03/2024 14:30").is_none());
        assert!(parse_updated_at("2024-13-05 14:30").is_none());
    }

    #[test]
    fn test_slug_from_filename() {
        assert_eq!(slug_from_filename("ripgrep.yml"), "ripgrep");
        assert_eq!(slug_from_filename("ripgrep.yaml"), "ripgrep");
        assert_eq!(slug_from_filename("ripgrep"), "ripgrep");
    }

    #[tokio::test]
    async fn test_parse_item() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("ripgrep.yml"), VALID).unwrap();

        let item = parse_item(temp.path(), "ripgrep.yml").await.unwrap();
        assert_eq!(item.slug, "ripgrep");
        assert_eq!(item.name, "Ripgrep");
        assert!(item.featured);
        assert_eq!(item.category.len(), 1);
        assert_eq!(item.tags.len(), 2);
        assert!(!item.placeholder);
    }

    #[tokio::test]
    async fn test_parse_item_errors() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("broken.yml"), "name: [unclosed").unwrap();
        std::fs::write(
            temp.path().join("baddate.yml"),
            VALID.replace("2024-03-05 14:30", "yesterday"),
        )
        .unwrap();
        std::fs::write(temp.path().join("partial.yml"), "name: Only a name").unwrap();

        assert!(matches!(
            parse_item(temp.path(), "broken.yml").await,
            Err(ParseError::Yaml { .. })
        ));
        assert!(matches!(
            parse_item(temp.path(), "baddate.yml").await,
            Err(ParseError::Timestamp { .. })
        ));
        assert!(matches!(
            parse_item(temp.path(), "partial.yml").await,
            Err(ParseError::Yaml { .. })
        ));
        assert!(matches!(
            parse_item(temp.path(), "missing.yml").await,
            Err(ParseError::Read(e)) if e.is_not_found()
        ));
        let traversal = parse_item(temp.path(), "../x.yml").await.unwrap_err();
        assert!(matches!(traversal.recoverable(), Err(ContentError::InvalidPath { .. })));

        let broken = parse_item(temp.path(), "broken.yml").await.unwrap_err();
        assert!(matches!(broken.recoverable(), Ok(ParseError::Yaml { .. })));
    }

    #[tokio::test]
    async fn test_overlay_merges_over_base() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("ripgrep.yml"), VALID).unwrap();
        std::fs::write(
            temp.path().join("ripgrep.fr.yml"),
            "description: Recherche rapide\n",
        )
        .unwrap();

        let item = load_item(temp.path(), "ripgrep", Some("fr")).await.unwrap();
        assert_eq!(item.description, "Recherche rapide");
        assert_eq!(item.name, "Ripgrep");

        // Missing overlay falls back silently
        let item = load_item(temp.path(), "ripgrep", Some("de")).await.unwrap();
        assert_eq!(item.description, "Fast search");
    }

    #[tokio::test]
    async fn test_broken_overlay_is_ignored() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("ripgrep.yml"), VALID).unwrap();
        std::fs::write(temp.path().join("ripgrep.fr.yml"), "- just\n- a list\n").unwrap();

        assert!(parse_translation(temp.path(), "ripgrep.fr.yml").await.is_none());
        let item = load_item(temp.path(), "ripgrep", Some("fr")).await.unwrap();
        assert_eq!(item.description, "Fast search");
    }

    #[tokio::test]
    async fn test_placeholder_wrapper() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("broken.yml"), "name: [unclosed").unwrap();

        let item = parse_item_or_placeholder(temp.path(), "broken", None)
            .await
            .unwrap();
        assert!(item.placeholder);
        assert_eq!(item.name, "Broken");

        let err = parse_item_or_placeholder(temp.path(), "broken", Some("../en"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::InvalidLocale(_)));
    }

    #[tokio::test]
    async fn test_read_body_lookup_order() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        assert_eq!(read_body(dir, "item", Some("fr")).await.unwrap(), None);

        std::fs::write(dir.join("item.md"), "base md").unwrap();
        assert_eq!(read_body(dir, "item", Some("fr")).await.unwrap().unwrap(), "base md");

        std::fs::write(dir.join("item.mdx"), "base mdx").unwrap();
        assert_eq!(read_body(dir, "item", None).await.unwrap().unwrap(), "base mdx");

        std::fs::write(dir.join("item.fr.md"), "fr md").unwrap();
        assert_eq!(read_body(dir, "item", Some("fr")).await.unwrap().unwrap(), "fr md");
        assert_eq!(read_body(dir, "item", Some("de")).await.unwrap().unwrap(), "base mdx");
    }
}
