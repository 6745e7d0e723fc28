//! Site-wide template variables.
//!
//! The `site` namespace is built once per build: configuration values, a `now`
//! timestamp and one summary list per collection. After that it is only ever
//! borrowed; each page gets a [`PageVariables`] view pairing the shared `site`
//! with its own `page`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use stencil_core::{ConfigMap, ContentItem, ContentStore};
use thiserror::Error;
use tracing::debug;

/// Description used in collection summaries when an item has none.
pub const DESCRIPTION_PLACEHOLDER: &str = "Description to come";

/// The `site` namespace as seen by templates.
pub type SiteMap = serde_json::Map<String, serde_json::Value>;

/// Collection assembly errors.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// A collection lists a title the content store does not have.
    #[error("collection '{collection}' references missing content '{title}'")]
    MissingMember { collection: String, title: String },

    /// Summary could not be converted to a template value.
    #[error("failed to serialize collection '{collection}': {source}")]
    Serialize {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Summary of a content item inside a collection listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionEntry {
    pub title: String,
    pub published: Option<DateTime<Utc>>,
    pub description: String,
    pub permalink: String,
}

impl CollectionEntry {
    fn from_item(item: &ContentItem) -> Self {
        Self {
            title: item.title.clone(),
            published: item.published,
            description: item
                .variables
                .description
                .clone()
                .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string()),
            permalink: item.permalink.clone(),
        }
    }
}

/// Base variables shared by every page of a build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteVariables {
    site: SiteMap,
}

impl SiteVariables {
    /// Merge a Unix timestamp and the configuration into one `site` map.
    ///
    /// Configuration keys are applied after `now`, so a configured `now` wins.
    #[must_use]
    pub fn new(config: &ConfigMap, now: i64) -> Self {
        let mut site = SiteMap::new();
        site.insert("now".to_string(), now.into());
        site.extend(config.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { site }
    }

    /// Build variables stamped with the current time.
    #[must_use]
    pub fn at_now(config: &ConfigMap) -> Self {
        Self::new(config, Utc::now().timestamp())
    }

    /// Add one summary list per collection under `site.<name>`.
    ///
    /// Entries follow the collection's own order. A collection name replaces
    /// any configuration key with the same name.
    pub fn assemble_collections(&mut self, store: &ContentStore) -> Result<(), CollectionError> {
        for (name, titles) in store.collections() {
            let entries = titles
                .iter()
                .map(|title| {
                    store
                        .get(title)
                        .map(CollectionEntry::from_item)
                        .ok_or_else(|| CollectionError::MissingMember {
                            collection: name.clone(),
                            title: title.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            debug!(collection = %name, entries = entries.len(), "assembled collection");

            let value =
                serde_json::to_value(entries).map_err(|source| CollectionError::Serialize {
                    collection: name.clone(),
                    source,
                })?;
            self.site.insert(name.clone(), value);
        }
        Ok(())
    }

    /// The `site` map.
    #[must_use]
    pub fn site(&self) -> &SiteMap {
        &self.site
    }

    /// Variables for rendering one page.
    #[must_use]
    pub fn for_page<'a>(&'a self, page: &'a ContentItem) -> PageVariables<'a> {
        PageVariables {
            site: &self.site,
            page,
        }
    }
}

/// `{ site, page }` for one item. Borrows the shared site map.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageVariables<'a> {
    pub site: &'a SiteMap,
    pub page: &'a ContentItem,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use stencil_core::ContentItem;

    use super::*;

    fn config() -> ConfigMap {
        let mut config = ConfigMap::new();
        config.insert("title".to_string(), json!("Blog"));
        config.insert("nav".to_string(), json!({"home": "/"}));
        config
    }

    fn store() -> ContentStore {
        let mut store = ContentStore::new();
        let mut post_a = ContentItem::render("postA", "A", ".md", "/a/");
        post_a.variables.description = Some("First".to_string());
        store.insert(post_a).unwrap();
        store
            .insert(
                ContentItem::render("postB", "B", ".md", "/b/")
                    .with_published("2024-01-14T00:00:00Z".parse().unwrap()),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_new_merges_config_and_now() {
        let vars = SiteVariables::new(&config(), 1_700_000_000);
        assert_eq!(vars.site()["now"], 1_700_000_000);
        assert_eq!(vars.site()["title"], "Blog");
        assert_eq!(vars.site()["nav"]["home"], "/");
    }

    #[test]
    fn test_config_now_wins() {
        let mut config = config();
        config.insert("now".to_string(), json!("fixed"));
        let vars = SiteVariables::new(&config, 5);
        assert_eq!(vars.site()["now"], "fixed");
    }

    #[test]
    fn test_collections_preserve_order() {
        let mut store = store();
        store.set_collection(
            "posts",
            vec!["postB".to_string(), "postA".to_string(), "postB".to_string()],
        );

        let mut vars = SiteVariables::new(&config(), 0);
        vars.assemble_collections(&store).unwrap();

        let posts = vars.site()["posts"].as_array().unwrap();
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0]["title"], "postB");
        assert_eq!(posts[1]["title"], "postA");
        assert_eq!(posts[2]["title"], "postB");
    }

    #[test]
    fn test_collection_entry_fields() {
        let mut store = store();
        store.set_collection("posts", vec!["postA".to_string(), "postB".to_string()]);

        let mut vars = SiteVariables::new(&config(), 0);
        vars.assemble_collections(&store).unwrap();

        let posts = &vars.site()["posts"];
        assert_eq!(posts[0]["description"], "First");
        assert_eq!(posts[0]["permalink"], "/a/");
        assert!(posts[0]["published"].is_null());
        assert_eq!(posts[1]["description"], DESCRIPTION_PLACEHOLDER);
        assert_eq!(posts[1]["published"], "2024-01-14T00:00:00Z");
    }

    #[test]
    fn test_missing_member_is_error() {
        let mut store = store();
        store.set_collection("posts", vec!["postA".to_string(), "ghost".to_string()]);

        let mut vars = SiteVariables::new(&config(), 0);
        let err = vars.assemble_collections(&store).unwrap_err();
        assert!(matches!(
            &err,
            CollectionError::MissingMember { collection, title }
                if collection == "posts" && title == "ghost"
        ));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_collection_shadows_config_key() {
        let mut store = store();
        store.set_collection("title", vec!["postA".to_string()]);

        let mut vars = SiteVariables::new(&config(), 0);
        vars.assemble_collections(&store).unwrap();
        assert!(vars.site()["title"].is_array());
    }

    #[test]
    fn test_page_view_serializes_site_and_page() {
        let vars = SiteVariables::new(&config(), 0);
        let item = ContentItem::render("Intro", "Hello", ".html", "/intro/");
        let value = serde_json::to_value(vars.for_page(&item)).unwrap();

        assert_eq!(value["site"]["title"], "Blog");
        assert_eq!(value["page"]["title"], "Intro");
        assert!(vars.site().get("page").is_none());
    }
}
