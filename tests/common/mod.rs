//! Shared content-root fixtures for integration tests.

#![allow(dead_code)]

use std::path::Path;

use tempfile::TempDir;

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

pub fn item_yaml(name: &str, category: &str, tags: &[&str], updated_at: &str, featured: bool) -> String {
    format!(
        "name: {name}\n\
         description: About {name}\n\
         source_url: https://example.com/{name}\n\
         category: {category}\n\
         tags: [{tags}]\n\
         featured: {featured}\n\
         updated_at: \"{updated_at}\"\n",
        tags = tags.join(", "),
    )
}

pub fn add_item(root: &Path, slug: &str, category: &str, tags: &[&str], updated_at: &str) {
    write(
        root,
        &format!("data/{slug}/{slug}.yml"),
        &item_yaml(&slug.to_uppercase(), category, tags, updated_at, false),
    );
}

/// Items A (`x`, `y` / `c1`), B (`x` / `c1`) and C (`z` / `c2`), newest first
pub fn scenario() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(
        root,
        "categories/categories.yml",
        "- id: c1\n  name: Category One\n- id: c2\n  name: Category Two\n",
    );
    write(root, "tags/tags.yml", "- id: x\n  name: Ex\n- id: y\n  name: Why\n- id: z\n  name: Zed\n");

    add_item(root, "a", "c1", &["x", "y"], "2024-01-03 10:00");
    add_item(root, "b", "c1", &["x"], "2024-01-02 10:00");
    add_item(root, "c", "c2", &["z"], "2024-01-01 10:00");

    temp
}
