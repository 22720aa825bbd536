use std::ops::Index;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static NULL: Value = Value::Null;

/// A LightBlue entity as returned by the server.
///
/// No schema is imposed: the mapping is kept exactly as received, key order
/// included. Indexing a missing key yields `null` so nested lookups like
/// `doc["brew"]["package"]` never panic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn create(data: Map<String, Value>) -> Self {
        Self(data)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl Index<&str> for Document {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(data: Map<String, Value>) -> Self {
        Self(data)
    }
}

macro_rules! entity {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Document);

        impl $name {
            pub fn create(data: Map<String, Value>) -> Self {
                Self(Document::create(data))
            }

            pub fn document(&self) -> &Document {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = Document;

            fn deref(&self) -> &Document {
                &self.0
            }
        }

        impl Index<&str> for $name {
            type Output = Value;

            fn index(&self, key: &str) -> &Value {
                &self.0[key]
            }
        }

        impl From<Document> for $name {
            fn from(doc: Document) -> Self {
                Self(doc)
            }
        }
    };
}

entity!(
    /// A `containerImage` entity.
    ContainerImage
);

entity!(
    /// A `containerRepository` entity.
    ContainerRepository
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn container_image_create() {
        let image = ContainerImage::create(map(json!({
            "_id": "1233829",
            "brew": {
                "completion_date": "20151210T10:09:35.000-0500",
                "build": "jboss-webserver-3-webserver30-tomcat7-openshift-docker-1.1-6",
                "package": "jboss-webserver-3-webserver30-tomcat7-openshift-docker"
            }
        })));

        assert_eq!(image["_id"], "1233829");
        assert_eq!(image["brew"]["completion_date"], "20151210T10:09:35.000-0500");
    }

    #[test]
    fn container_repository_create() {
        let repo = ContainerRepository::create(map(json!({
            "creationDate": "20160927T11:14:56.420-0400",
            "metrics": {
                "pulls_in_last_30_days": 0,
                "last_update_date": "20170223T08:28:40.913-0500"
            }
        })));

        assert_eq!(repo["creationDate"], "20160927T11:14:56.420-0400");
        assert_eq!(repo["metrics"]["pulls_in_last_30_days"], 0);
        assert_eq!(repo["metrics"]["last_update_date"], "20170223T08:28:40.913-0500");
    }

    #[test]
    fn missing_keys_read_as_null() {
        let doc = Document::create(map(json!({"a": 1})));
        assert!(doc["missing"].is_null());
        assert!(doc["missing"]["nested"].is_null());
        assert!(!doc.contains_key("missing"));
    }

    #[test]
    fn key_order_is_preserved() {
        let doc: Document = serde_json::from_str(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<&str> = doc.as_map().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn serializes_back_to_input() {
        let input = json!({"_id": "x", "brew": {"package": "p"}});
        let image = ContainerImage::create(map(input.clone()));
        assert_eq!(serde_json::to_value(&image).unwrap(), input);
    }
}
