//! Wire shapes of the content service's response envelopes.
//!
//! # Design
//! Relations arrive as `{ "data": [..] }`, `{ "data": {..} }`, `{ "data":
//! null }` or not at all when they were not populated. `Relation` folds all
//! four into one type so reshaping code asks `first()` or `entries()` and
//! never inspects field presence itself.

use serde::{Deserialize, Deserializer};

use crate::types::{Pagination, Seo};

/// A list response: `{ data: [...], meta: { pagination } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection<A> {
    #[serde(default = "Vec::new")]
    pub data: Vec<Entry<A>>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl<A> Collection<A> {
    /// Pagination as sent by the service, or an empty object.
    pub fn pagination(&self) -> Pagination {
        self.meta
            .as_ref()
            .and_then(|meta| meta.pagination.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// `{ id, attributes }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry<A> {
    #[serde(default)]
    pub id: u64,
    pub attributes: A,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RelationData<A> {
    Many(Vec<Entry<A>>),
    One(Entry<A>),
}

/// A populated (or not) relation field.
#[derive(Debug, Clone, Deserialize)]
pub struct Relation<A> {
    #[serde(default = "Option::default")]
    pub data: Option<RelationData<A>>,
}

impl<A> Relation<A> {
    pub fn first(&self) -> Option<&Entry<A>> {
        match &self.data {
            Some(RelationData::Many(entries)) => entries.first(),
            Some(RelationData::One(entry)) => Some(entry),
            None => None,
        }
    }

    pub fn entries(&self) -> &[Entry<A>] {
        match &self.data {
            Some(RelationData::Many(entries)) => entries,
            Some(RelationData::One(entry)) => std::slice::from_ref(entry),
            None => &[],
        }
    }
}

/// Uploaded file metadata. Only the relative URL is used.
#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAttributes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub cover: Option<Relation<Media>>,
    #[serde(default)]
    pub tags: Option<Relation<TagAttributes>>,
    #[serde(default)]
    pub seo: Option<Seo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagAttributes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image: Option<Relation<Media>>,
}

/// A present `null` decodes like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `GET /api/ratings/reviews/{slug}` and its `/stats` sibling.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    #[serde(default)]
    pub reviews: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub average_score: Option<f64>,
    #[serde(default)]
    pub reviews_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags_of(json: &str) -> Option<Relation<TagAttributes>> {
        let entry: Entry<PostAttributes> = serde_json::from_str(json).unwrap();
        entry.attributes.tags
    }

    #[test]
    fn unpopulated_relation_is_absent() {
        assert!(tags_of(r#"{"id":1,"attributes":{"title":"t"}}"#).is_none());
    }

    #[test]
    fn null_relation_is_absent() {
        assert!(tags_of(r#"{"id":1,"attributes":{"tags":null}}"#).is_none());
    }

    #[test]
    fn null_data_has_no_entries() {
        let tags = tags_of(r#"{"id":1,"attributes":{"tags":{"data":null}}}"#).unwrap();
        assert!(tags.entries().is_empty());
        assert!(tags.first().is_none());
    }

    #[test]
    fn list_relation_exposes_every_entry() {
        let tags = tags_of(
            r#"{"id":1,"attributes":{"tags":{"data":[
                {"id":1,"attributes":{"name":"Rust","slug":"rust"}},
                {"id":2,"attributes":{"name":"Web"}}
            ]}}}"#,
        )
        .unwrap();
        let names: Vec<_> = tags.entries().iter().map(|t| t.attributes.name.as_str()).collect();
        assert_eq!(names, ["Rust", "Web"]);
        assert_eq!(tags.entries()[1].attributes.slug, None);
    }

    #[test]
    fn single_object_relation_is_one_entry() {
        let tags = tags_of(
            r#"{"id":1,"attributes":{"tags":{"data":{"id":7,"attributes":{"name":"Solo"}}}}}"#,
        )
        .unwrap();
        assert_eq!(tags.entries().len(), 1);
        assert_eq!(tags.first().unwrap().id, 7);
    }

    #[test]
    fn collection_without_meta_has_empty_pagination() {
        let collection: Collection<PostAttributes> = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert_eq!(collection.pagination(), Pagination::default());
    }

    #[test]
    fn null_scalars_do_not_poison_the_page() {
        let collection: Collection<PostAttributes> = serde_json::from_str(
            r#"{"data":[
                {"id":1,"attributes":{"title":"Ownership","slug":"a","createdAt":"2024-01-01"}},
                {"id":2,"attributes":{"title":null,"slug":null,"createdAt":null,
                    "tags":{"data":[{"id":3,"attributes":{"name":null}}]}}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(collection.data.len(), 2);
        assert_eq!(collection.data[0].attributes.slug, "a");
        let broken = &collection.data[1].attributes;
        assert_eq!(broken.title, "");
        assert_eq!(broken.slug, "");
        assert_eq!(broken.created_at, "");
        assert_eq!(broken.tags.as_ref().unwrap().entries()[0].attributes.name, "");
    }

    #[test]
    fn review_stats_tolerate_nulls() {
        let stats: ReviewStats =
            serde_json::from_str(r#"{"averageScore":null,"reviewsCount":null}"#).unwrap();
        assert!(stats.average_score.is_none());
        assert!(stats.reviews.is_none());
    }
}
