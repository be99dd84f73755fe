//! Safety checks for everything that reaches the filesystem.
//!
//! Slugs and locale codes come from route parameters, so they are treated
//! as untrusted input. This module provides:
//! - Filename sanitization (no directory components, no traversal)
//! - Path containment checks against a base directory
//! - Locale and slug validation
//! - `safe_read_file`, the single read entry point used by the store

use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tokio::task;

use super::error::{ContentError, Result};

/// Maximum length of a locale code
pub const MAX_LOCALE_LEN: usize = 10;

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Check a locale code against `^[a-zA-Z0-9_-]{1,10}$`
pub fn is_valid_locale(code: &str) -> bool {
    !code.is_empty() && code.len() <= MAX_LOCALE_LEN && code.chars().all(is_safe_char)
}

/// Check a slug against `^[a-zA-Z0-9_-]+$`
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.chars().all(is_safe_char)
}

/// Validate a locale, returning it unchanged
pub fn validate_locale(code: &str) -> Result<&str> {
    if is_valid_locale(code) {
        Ok(code)
    } else {
        Err(ContentError::InvalidLocale(code.to_string()))
    }
}

/// Validate a slug, returning it unchanged
pub fn validate_slug(slug: &str) -> Result<&str> {
    if is_valid_slug(slug) {
        Ok(slug)
    } else {
        Err(ContentError::InvalidSlug(slug.to_string()))
    }
}

/// Build `{stem}.{locale}.{ext}` after validating the locale
pub fn localized_filename(stem: &str, locale: &str, ext: &str) -> Result<String> {
    let locale = validate_locale(locale)?;
    sanitize_filename(&format!("{}.{}.{}", stem, locale, ext))
}

/// Reduce `name` to a bare filename.
///
/// Input containing `../`, `..\` or a bare `..` component fails outright;
/// otherwise leading directory components are stripped and the remaining
/// name is returned. A name without separators comes back unchanged.
pub fn sanitize_filename(name: &str) -> Result<String> {
    let has_traversal = name.contains("../")
        || name.contains("..\\")
        || name.split(['/', '\\']).any(|part| part == "..");
    if has_traversal {
        return Err(ContentError::invalid_path(name, "path traversal"));
    }

    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    if base.is_empty() || base == "." {
        return Err(ContentError::invalid_path(name, "empty filename"));
    }
    if base.contains('\0') {
        return Err(ContentError::invalid_path(name, "illegal character"));
    }

    Ok(base.to_string())
}

/// Resolve `path` to an absolute, symlink-free form.
///
/// Components are walked in order and each existing prefix is canonicalized,
/// so a `..` after a symlink climbs out of the link target, as the OS would.
/// Components below the first missing one are kept verbatim, so missing
/// files can still be checked.
fn resolve(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut resolved = PathBuf::new();
    // Number of trailing components that do not exist on disk
    let mut missing = 0usize;
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
                missing = missing.saturating_sub(1);
            }
            Component::Normal(name) => {
                resolved.push(name);
                if missing > 0 {
                    missing += 1;
                    continue;
                }
                match std::fs::canonicalize(&resolved) {
                    Ok(canonical) => resolved = canonical,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => missing = 1,
                    Err(e) => return Err(e),
                }
            }
        }
    }

    Ok(resolved)
}

/// Ensure `candidate` is `base` or lies beneath it, returning the resolved path.
///
/// Containment is checked per path component, so `/base2/x` is never
/// accepted for base `/base`.
pub fn validate_path(candidate: &Path, base: &Path) -> Result<PathBuf> {
    let base_resolved = base
        .canonicalize()
        .map_err(|e| ContentError::io(base, e))?;
    let resolved = resolve(candidate).map_err(|e| ContentError::io(candidate, e))?;

    if resolved.starts_with(&base_resolved) {
        Ok(resolved)
    } else {
        Err(ContentError::invalid_path(
            candidate.display().to_string(),
            format!("outside of {}", base_resolved.display()),
        ))
    }
}

/// `validate_path` on the blocking pool, for use from async code
pub async fn check_path(candidate: &Path, base: &Path) -> Result<PathBuf> {
    let (owned_candidate, owned_base) = (candidate.to_path_buf(), base.to_path_buf());
    match task::spawn_blocking(move || validate_path(&owned_candidate, &owned_base)).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(ContentError::io(
            candidate,
            io::Error::new(io::ErrorKind::Interrupted, e.to_string()),
        )),
    }
}

/// Read a UTF-8 file after checking it lives under `base`
pub async fn safe_read_file(path: &Path, base: &Path) -> Result<String> {
    let resolved = check_path(path, base).await?;
    fs::read_to_string(&resolved)
        .await
        .map_err(|e| ContentError::io(path, e))
}
