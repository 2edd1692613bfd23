//! `routes.json`: every experience's home, list and content urls, consumed
//! by the client-side experience switcher.

use serde_json::{Map, Value, json};

use super::SitePlan;

impl SitePlan {
    /// Serialize the plan as `{order, routes: {key: {home, list, content, contentAliases}}}`.
    ///
    /// Content ids are emitted in sorted order. Legacy passthrough entries
    /// replace same-named keys.
    pub fn routes_payload(&self) -> Value {
        let mut routes = Map::new();

        for key in &self.order {
            let mut entry = Map::new();
            if let Some(home) = self.home(key) {
                entry.insert("home".into(), home.url_path.clone().into());
            }
            if let Some(list) = self.list_page(key) {
                entry.insert("list".into(), list.url_path.clone().into());
            }

            let mut content = Map::new();
            let mut aliases = Map::new();
            for id in self.content_ids(key) {
                let Some(page) = self.content_page(key, id) else {
                    continue;
                };
                content.insert(id.to_owned(), page.url_path.clone().into());
                if !page.aliases.is_empty() {
                    let urls: Vec<Value> = page.aliases.iter().map(|a| a.url_path.clone().into()).collect();
                    aliases.insert(id.to_owned(), urls.into());
                }
            }
            if !content.is_empty() {
                entry.insert("content".into(), content.into());
            }
            if !aliases.is_empty() {
                entry.insert("contentAliases".into(), aliases.into());
            }

            if let Some(legacy) = self.legacy_routes(key) {
                if let Some(home) = &legacy.home {
                    entry.insert("home".into(), home.clone().into());
                }
                if let Some(list) = &legacy.list {
                    entry.insert("list".into(), list.clone().into());
                }
                if !legacy.content.is_empty() {
                    entry.insert("content".into(), json!(legacy.content));
                }
            }

            routes.insert(key.clone(), entry.into());
        }

        json!({ "order": self.order, "routes": routes })
    }
}
