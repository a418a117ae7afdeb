use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use super::App;
use crate::library::ListOptions;
use crate::render::{encode_prompt_share, render_prompt_text, render_skill_markdown};
use crate::schema::{ItemPayload, ItemType, LibraryItem};

fn format_row(item: &LibraryItem) -> String {
    let mut flags = String::new();
    if item.favorite {
        flags.push_str(" ★");
    }
    if item.archived {
        flags.push_str(" [archived]");
    }
    format!(
        "{:<40} {:<8} {}{}",
        item.id,
        item.item_type().as_str(),
        item.title,
        flags
    )
}

pub fn list(
    app: &App,
    item_type: Option<String>,
    archived: bool,
    favorites: bool,
    query: Option<String>,
) -> Result<()> {
    let item_type = item_type
        .map(|t| t.parse::<ItemType>())
        .transpose()?;
    let items = app.store.list_items(&ListOptions {
        item_type,
        include_archived: archived,
        query,
        favorite_only: favorites,
    });

    if items.is_empty() {
        println!("No items found.");
        return Ok(());
    }
    for item in &items {
        println!("{}", format_row(item));
    }
    Ok(())
}

/// Markdown view of an item: skill document, chat prompt, or the forged prompt text.
pub fn render_markdown(item: &LibraryItem) -> String {
    match &item.payload {
        ItemPayload::Skill(skill) => render_skill_markdown(&skill.skill_spec, &skill.source_files),
        ItemPayload::Prompt(prompt) => render_prompt_text(&prompt.prompt_spec),
        ItemPayload::Anatomy(anatomy) => anatomy.prompt_text.clone(),
    }
}

pub fn show(app: &App, id: &str, markdown: bool) -> Result<()> {
    let item = app.require_item(id)?;
    if markdown {
        println!("{}", render_markdown(&item));
    } else {
        println!("{}", serde_json::to_string_pretty(&item)?);
    }
    Ok(())
}

/// Import one item or an array of items from a JSON file. Every item is
/// validated before anything is written.
pub fn import(app: &App, path: &str) -> Result<Vec<LibraryItem>> {
    let file = Path::new(path);
    if !file.is_file() {
        bail!("File not found: {}", path);
    }
    let content = fs::read_to_string(file)?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path))?;

    let raw = match value {
        serde_json::Value::Array(values) => values,
        other => vec![other],
    };
    let items = raw
        .into_iter()
        .enumerate()
        .map(|(i, v)| LibraryItem::parse(v).with_context(|| format!("item {} is invalid", i)))
        .collect::<Result<Vec<_>>>()?;

    let mut imported = Vec::with_capacity(items.len());
    for item in items {
        let saved = app.store.upsert_item(item)?;
        println!("Imported {} ({})", saved.id, saved.title);
        imported.push(saved);
    }
    info!("Imported {} item(s) from {}", imported.len(), path);
    Ok(imported)
}

pub fn export(app: &App, id: &str, output: Option<String>) -> Result<()> {
    let item = app.require_item(id)?;
    let json = serde_json::to_string_pretty(&item)?;
    match output {
        Some(path) => {
            fs::write(&path, format!("{}\n", json))
                .with_context(|| format!("failed to write {}", path))?;
            println!("Exported {} to {}", item.id, path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn share(app: &App, id: &str) -> Result<()> {
    let item = app.require_item(id)?;
    let Some(prompt) = item.as_prompt() else {
        bail!("Only prompt items can be shared ({} is a {})", id, item.item_type());
    };
    println!("{}", encode_prompt_share(&prompt.prompt_spec)?);
    Ok(())
}

pub fn duplicate(app: &App, id: &str) -> Result<()> {
    let copy = app
        .store
        .duplicate_item(id)?
        .with_context(|| format!("Item not found: {}", id))?;
    println!("Created {} ({})", copy.id, copy.title);
    Ok(())
}

pub fn delete(app: &App, id: &str) -> Result<()> {
    let item = app.require_item(id)?;
    app.store.delete_item(&item.id)?;
    println!("Deleted {}", item.id);
    Ok(())
}

pub fn favorite(app: &App, id: &str) -> Result<()> {
    app.require_item(id)?;
    if let Some(item) = app.store.toggle_favorite(id)? {
        let state = if item.favorite { "favorited" } else { "unfavorited" };
        println!("{} {}", item.id, state);
    }
    Ok(())
}

pub fn archive(app: &App, id: &str) -> Result<()> {
    app.require_item(id)?;
    if let Some(item) = app.store.toggle_archived(id)? {
        let state = if item.archived { "archived" } else { "restored" };
        println!("{} {}", item.id, state);
    }
    Ok(())
}

pub fn touch(app: &App, id: &str) -> Result<()> {
    app.require_item(id)?;
    if let Some(item) = app.store.touch_last_used(id)? {
        println!("{} last used at {}", item.id, item.last_used_at);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{create_prompt_item, create_skill_item, PromptItemOptions};
    use crate::schema::PromptSpec;

    async fn app(dir: &Path) -> App {
        crate::cli::test_support::boot_in(dir).await
    }

    #[tokio::test]
    async fn test_import_array_and_roundtrip_export() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;

        let items = vec![create_skill_item(10), create_skill_item(20)];
        let path = dir.path().join("items.json");
        fs::write(&path, serde_json::to_string(&items).unwrap()).unwrap();

        let imported = import(&app, path.to_str().unwrap()).unwrap();
        assert_eq!(imported.len(), 2);
        assert!(app.store.get_item(&items[1].id).is_some());

        let out = dir.path().join("out.json");
        export(&app, &items[0].id, Some(out.display().to_string())).unwrap();
        let back = LibraryItem::parse(serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap()).unwrap();
        assert_eq!(back, items[0]);
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;

        let good = create_skill_item(10);
        let mut bad = serde_json::to_value(create_skill_item(10)).unwrap();
        bad["payload"]["skillSpec"]["steps"] = serde_json::json!([]);
        let path = dir.path().join("items.json");
        fs::write(
            &path,
            serde_json::to_string(&vec![serde_json::to_value(&good).unwrap(), bad]).unwrap(),
        )
        .unwrap();

        assert!(import(&app, path.to_str().unwrap()).is_err());
        assert!(app.store.get_item(&good.id).is_none());
    }

    #[tokio::test]
    async fn test_mutations_require_existing_item() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;
        assert!(delete(&app, "nope").is_err());
        assert!(favorite(&app, "nope").is_err());
        assert!(duplicate(&app, "nope").is_err());

        favorite(&app, "skill-example-hello-world").unwrap();
        assert!(app.store.get_item("skill-example-hello-world").unwrap().favorite);
        archive(&app, "skill-example-hello-world").unwrap();
        assert!(app.store.get_item("skill-example-hello-world").unwrap().archived);
    }

    #[test]
    fn test_render_markdown_per_type() {
        let skill = create_skill_item(1);
        assert!(render_markdown(&skill).starts_with("# Untitled Skill\n\n## Purpose"));

        let mut spec = PromptSpec::default();
        spec.goal = "Write docs".to_string();
        let prompt = create_prompt_item("Docs", spec, PromptItemOptions::default(), 1);
        assert!(render_markdown(&prompt).starts_with("# Prompt Request\n## Goal\nWrite docs"));
    }

    #[test]
    fn test_format_row_flags() {
        let mut item = create_skill_item(1);
        item.favorite = true;
        item.archived = true;
        let row = format_row(&item);
        assert!(row.contains("skill"));
        assert!(row.ends_with("Untitled Skill ★ [archived]"));
    }
}
