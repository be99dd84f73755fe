//! Command-line interface for inspecting a content root.
//!
//! Provides commands for listing and filtering items, showing a single
//! item, ranking related items, and printing the resolved configuration.
//! All output is pretty-printed JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::{resolve_content_root, ROOT_ENV};
use crate::core::ContentService;
use crate::domain::FetchOptions;

/// listing - content store and related-items engine
#[derive(Parser, Debug)]
#[command(name = "listing")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Content root (defaults to ./.content)
    #[arg(long, global = true, env = ROOT_ENV)]
    pub root: Option<PathBuf>,

    /// Locale to overlay on the base content
    #[arg(long, global = true)]
    pub lang: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List items, optionally filtered by category and/or tag
    Items {
        /// Category id to filter by
        #[arg(short, long)]
        category: Option<String>,

        /// Tag id to filter by
        #[arg(short, long)]
        tag: Option<String>,

        /// Order tags by name
        #[arg(long)]
        sort_tags: bool,
    },

    /// Show one item with its body
    Show {
        /// Item slug
        slug: String,
    },

    /// Rank items related to an item
    Similar {
        /// Item slug
        slug: String,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Skip the similarity cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let root = resolve_content_root(self.root.as_deref());
        let service = ContentService::open(&root).await?;
        let options = FetchOptions {
            lang: self.lang,
            sort_tags: matches!(self.command, Commands::Items { sort_tags: true, .. }),
        };

        match self.command {
            Commands::Items { category, tag, .. } => {
                let listing = match (category, tag) {
                    (Some(category), Some(tag)) => {
                        service
                            .fetch_by_category_and_tag(&category, &tag, &options)
                            .await?
                    }
                    (Some(category), None) => service.fetch_by_category(&category, &options).await?,
                    (None, Some(tag)) => service.fetch_by_tag(&tag, &options).await?,
                    (None, None) => service.fetch_items(&options).await?,
                };
                print_json(&listing)
            }
            Commands::Show { slug } => {
                let detail = service
                    .fetch_item(&slug, &options)
                    .await?
                    .with_context(|| format!("Item '{}' not found under {}", slug, root.display()))?;
                print_json(&detail)
            }
            Commands::Similar {
                slug,
                limit,
                no_cache,
            } => {
                let detail = service
                    .fetch_item(&slug, &options)
                    .await?
                    .with_context(|| format!("Item '{}' not found under {}", slug, root.display()))?;
                let similar = service
                    .fetch_similar_items(&detail.meta, limit, &options, !no_cache)
                    .await;
                print_json(&similar)
            }
            Commands::Config => {
                #[derive(Serialize)]
                struct Resolved<'a> {
                    root: PathBuf,
                    config: &'a crate::config::SiteConfig,
                }
                print_json(&Resolved {
                    root: root.clone(),
                    config: service.config(),
                })
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", output);
    Ok(())
}
