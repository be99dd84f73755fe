//! Category and tag master lists.
//!
//! A master list is a YAML array of `{id, name}` stored either as
//! `<root>/<kind>/<kind>.yml` or `<root>/<kind>.yml`. A sibling
//! `<kind>.<locale>.yml` translates names by id. Missing files are a valid
//! state and produce an empty collection.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::error::Result;
use crate::core::safety::{localized_filename, safe_read_file, sanitize_filename};
use crate::domain::{Collection, CollectionKind};

#[derive(Debug, Deserialize)]
struct MasterEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

/// Directories that may hold the master file, in lookup order
fn candidate_dirs(root: &Path, kind: CollectionKind) -> [PathBuf; 2] {
    [root.join(kind.stem()), root.to_path_buf()]
}

/// Read a list file; `Ok(None)` when it is missing or unparseable
async fn read_entries(path: &Path, root: &Path) -> Result<Option<Vec<MasterEntry>>> {
    let content = match safe_read_file(path, root).await {
        Ok(content) => content,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e),
    };

    match serde_yaml::from_str::<Option<Vec<MasterEntry>>>(&content) {
        Ok(entries) => Ok(Some(entries.unwrap_or_default())),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring malformed collection file");
            Ok(None)
        }
    }
}

/// Load one collection, translated when `locale` is set.
///
/// Counts start at zero; they are filled in by `Collection::populate` while
/// a listing scans its items.
pub async fn read_collection(
    root: &Path,
    kind: CollectionKind,
    locale: Option<&str>,
) -> Result<Collection> {
    let overlay_name = locale
        .map(|locale| localized_filename(kind.stem(), locale, "yml"))
        .transpose()?;
    let master_name = sanitize_filename(&format!("{}.yml", kind.stem()))?;

    let mut collection = Collection::new(kind);

    for dir in candidate_dirs(root, kind) {
        let Some(entries) = read_entries(&dir.join(&master_name), root).await? else {
            continue;
        };

        for entry in entries {
            let name = entry.name.unwrap_or_else(|| entry.id.clone());
            collection.insert(entry.id, name);
        }

        if let Some(overlay_name) = &overlay_name {
            match read_entries(&dir.join(overlay_name), root).await {
                Ok(Some(translations)) => {
                    for entry in translations {
                        if let Some(name) = entry.name {
                            collection.rename(&entry.id, name);
                        }
                    }
                }
                Ok(None) => {}
                Err(e) if e.is_invalid_input() => return Err(e),
                Err(e) => {
                    debug!(kind = %kind, error = %e, "Skipping collection translation");
                }
            }
        }

        debug!(kind = %kind, entries = collection.len(), dir = %dir.display(), "Loaded collection");
        return Ok(collection);
    }

    debug!(kind = %kind, "No master list found");
    Ok(collection)
}
