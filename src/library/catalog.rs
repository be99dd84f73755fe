//! Item store over a content directory.
//!
//! Every query re-reads the tree: items are parsed concurrently, attached to
//! freshly loaded category/tag collections (which count references as they
//! go), then sorted featured-first and newest-first.

use std::collections::HashSet;
use std::path::PathBuf;

use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::core::error::{ContentError, Result};
use crate::core::safety::{check_path, is_valid_slug, validate_locale, validate_slug};
use crate::domain::{
    Collection, CollectionEntry, CollectionKind, EntityRef, FetchOptions, ItemDetail, ItemListing,
    ItemRecord,
};

use super::collection::read_collection;
use super::record::{load_item, parse_item_or_placeholder, read_body};

/// Name of the item directory under the content root
pub const DATA_DIR: &str = "data";

/// Read-only view of a content root
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    default_locale: String,
}

impl Catalog {
    /// Create a catalog over `root`; `default_locale` never gets an overlay
    pub fn new(root: impl Into<PathBuf>, default_locale: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            default_locale: default_locale.into(),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    /// The validated locale to overlay, or `None` for the base language
    pub fn overlay_locale<'a>(&self, options: &'a FetchOptions) -> Result<Option<&'a str>> {
        match options.lang.as_deref() {
            None => Ok(None),
            Some(lang) => {
                let lang = validate_locale(lang)?;
                if lang.eq_ignore_ascii_case(&self.default_locale) {
                    Ok(None)
                } else {
                    Ok(Some(lang))
                }
            }
        }
    }

    /// Item directory names, sorted; entries that are not slugs are skipped
    pub async fn list_slugs(&self) -> Result<Vec<String>> {
        let data_dir = self.data_dir();
        let resolved = match check_path(&data_dir, &self.root).await {
            Ok(path) => path,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries = match fs::read_dir(&resolved).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ContentError::io(&data_dir, e)),
        };

        let mut slugs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ContentError::io(&data_dir, e))?
        {
            // Symlinked directories must still resolve inside the root
            let path = match check_path(&entry.path(), &self.root).await {
                Ok(path) => path,
                Err(e) => {
                    warn!(entry = %entry.path().display(), error = %e, "Skipping entry");
                    continue;
                }
            };
            let is_dir = fs::metadata(&path)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }

            match entry.file_name().to_str() {
                Some(name) if is_valid_slug(name) => slugs.push(name.to_string()),
                other => debug!(entry = ?other, "Skipping non-item directory"),
            }
        }

        slugs.sort();
        Ok(slugs)
    }

    async fn load_collections(&self, locale: Option<&str>) -> Result<(Collection, Collection)> {
        tokio::try_join!(
            read_collection(&self.root, CollectionKind::Category, locale),
            read_collection(&self.root, CollectionKind::Tag, locale),
        )
    }

    /// List every item with category/tag counts scoped to this call
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn fetch_items(&self, options: &FetchOptions) -> Result<ItemListing> {
        let locale = self.overlay_locale(options)?;
        let slugs = self.list_slugs().await?;
        let (mut categories, mut tags) = self.load_collections(locale).await?;

        let data_dir = self.data_dir();
        let mut tasks = JoinSet::new();
        for (idx, slug) in slugs.iter().enumerate() {
            let dir = data_dir.join(slug);
            let slug = slug.clone();
            let locale = locale.map(str::to_string);
            tasks.spawn(async move { (idx, load_item(&dir, &slug, locale.as_deref()).await) });
        }

        // Slots keep directory order regardless of completion order
        let mut slots: Vec<Option<ItemRecord>> = (0..slugs.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (idx, result) = match joined {
                Ok(done) => done,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    warn!(error = %e, "Item task cancelled");
                    continue;
                }
            };

            match result {
                Ok(record) => slots[idx] = Some(record),
                Err(e) => {
                    let e = e.recoverable()?;
                    warn!(slug = %slugs[idx], error = %e, "Dropping unreadable item");
                }
            }
        }

        let mut items: Vec<ItemRecord> = slots.into_iter().flatten().collect();
        for item in &mut items {
            item.category = attach(&item.category, &mut categories);
            item.tags = attach(&item.tags, &mut tags);
        }
        sort_items(&mut items);

        let mut tags = tags.into_entries();
        if options.sort_tags {
            sort_by_name(&mut tags);
        }

        debug!(total = items.len(), "Listed items");
        Ok(ItemListing {
            total: items.len(),
            items,
            categories: categories.into_entries(),
            tags,
        })
    }

    /// Load one item with its body; `None` when its directory does not exist.
    ///
    /// A directory whose YAML cannot be parsed yields a placeholder record.
    #[instrument(skip(self, options))]
    pub async fn fetch_item(&self, slug: &str, options: &FetchOptions) -> Result<Option<ItemDetail>> {
        let slug = validate_slug(slug)?;
        let locale = self.overlay_locale(options)?;

        let dir = self.data_dir().join(slug);
        let resolved = match check_path(&dir, &self.root).await {
            Ok(path) => path,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        match fs::metadata(&resolved).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ContentError::io(&dir, e)),
        }

        let mut meta = parse_item_or_placeholder(&dir, slug, locale).await?;

        let (mut categories, mut tags) = self.load_collections(locale).await?;
        meta.category = attach(&meta.category, &mut categories);
        meta.tags = attach(&meta.tags, &mut tags);

        let content = match read_body(&dir, slug, locale).await? {
            Some(body) => Some(body),
            None => meta.markdown.clone(),
        };

        Ok(Some(ItemDetail { meta, content }))
    }

    /// Items in `category`; tag counts are recomputed over the matches
    pub async fn fetch_by_category(&self, category: &str, options: &FetchOptions) -> Result<ItemListing> {
        let listing = self.fetch_items(options).await?;
        let items: Vec<ItemRecord> = listing
            .items
            .into_iter()
            .filter(|item| item.has_category(category))
            .collect();
        let tags = rescope(&listing.tags, &items, ItemRecord::has_tag);

        Ok(ItemListing {
            total: items.len(),
            items,
            categories: listing.categories,
            tags,
        })
    }

    /// Items tagged `tag`; both collections keep their unfiltered counts
    pub async fn fetch_by_tag(&self, tag: &str, options: &FetchOptions) -> Result<ItemListing> {
        let listing = self.fetch_items(options).await?;
        let items: Vec<ItemRecord> = listing
            .items
            .into_iter()
            .filter(|item| item.has_tag(tag))
            .collect();

        Ok(ItemListing {
            total: items.len(),
            items,
            categories: listing.categories,
            tags: listing.tags,
        })
    }

    /// Items in `category` tagged `tag`; tag counts are recomputed over the matches
    pub async fn fetch_by_category_and_tag(
        &self,
        category: &str,
        tag: &str,
        options: &FetchOptions,
    ) -> Result<ItemListing> {
        let listing = self.fetch_items(options).await?;
        let items: Vec<ItemRecord> = listing
            .items
            .into_iter()
            .filter(|item| item.has_category(category) && item.has_tag(tag))
            .collect();
        let tags = rescope(&listing.tags, &items, ItemRecord::has_tag);

        Ok(ItemListing {
            total: items.len(),
            items,
            categories: listing.categories,
            tags,
        })
    }
}

/// Resolve an item's references against a collection, once per id
fn attach(refs: &[EntityRef], collection: &mut Collection) -> Vec<EntityRef> {
    let mut seen = HashSet::new();
    refs.iter()
        .filter(|r| seen.insert(r.id.clone()))
        .map(|r| collection.populate(r))
        .collect()
}

/// Featured first, then most recently updated
pub fn sort_items(items: &mut [ItemRecord]) {
    items.sort_by(|a, b| {
        b.featured
            .cmp(&a.featured)
            .then_with(|| b.last_updated.cmp(&a.last_updated))
    });
}

fn sort_by_name(entries: &mut [CollectionEntry]) {
    entries.sort_by_key(|e| e.name.to_lowercase());
}

/// Recount `entries` over `items`, keeping only entries that still occur
fn rescope(
    entries: &[CollectionEntry],
    items: &[ItemRecord],
    has: fn(&ItemRecord, &str) -> bool,
) -> Vec<CollectionEntry> {
    entries
        .iter()
        .filter_map(|entry| {
            let count = items.iter().filter(|item| has(item, &entry.id)).count();
            (count > 0).then(|| CollectionEntry {
                count,
                ..entry.clone()
            })
        })
        .collect()
}
