//! Builder for the post listing query: predicates accumulate here and are
//! executed once, at the pagination boundary, by
//! [`DbClient::fetch_posts`](crate::client::DbClient::fetch_posts).

use sqlx::{Postgres, QueryBuilder};
use tagebuch_common::model::{Id, category::CategoryMarker};

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostQuery {
    category: Option<Id<CategoryMarker>>,
    search: Option<String>,
}

impl PostQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to posts whose category set contains `category`.
    #[must_use]
    pub fn category(mut self, category: Id<CategoryMarker>) -> Self {
        self.category = Some(category);
        self
    }

    /// Restricts to posts whose title or content contains `term` as a
    /// case-insensitive substring. A term that is empty after trimming
    /// leaves the query unrestricted.
    #[must_use]
    pub fn search(mut self, term: &str) -> Self {
        let trimmed = term.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        self
    }

    /// Appends the accumulated predicates to a query whose `WHERE` clause is
    /// already open and which selects `FROM posts.posts AS posts`.
    pub(crate) fn push_predicates(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        if let Some(category) = self.category {
            builder.push(
                " AND posts.post_id IN (\
                 SELECT post_categories.post_id \
                 FROM posts.post_categories AS post_categories \
                 WHERE post_categories.category_id = ",
            );
            builder.push_bind(category.get());
            builder.push(")");
        }

        if let Some(search) = &self.search {
            let pattern = like_pattern(search);
            builder.push(" AND (posts.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR posts.content ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
    }
}

/// Wraps a search term in `%` wildcards, escaping the characters `LIKE`
/// treats specially so a literal term cannot act as a pattern.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for character in term.chars() {
        if matches!(character, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(character);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use crate::query::{PostQuery, like_pattern};
    use sqlx::QueryBuilder;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("under_score"), "%under\\_score%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }

    #[test]
    fn empty_query_adds_no_predicates() {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM posts.posts AS posts WHERE TRUE");
        PostQuery::new().push_predicates(&mut builder);

        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM posts.posts AS posts WHERE TRUE"
        );
    }

    #[test]
    fn blank_search_term_is_ignored() {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM posts.posts AS posts WHERE TRUE");
        PostQuery::new().search("   ").push_predicates(&mut builder);

        assert!(!builder.sql().contains("ILIKE"));
    }

    #[test]
    fn category_and_search_predicates_are_bound() {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM posts.posts AS posts WHERE TRUE");
        PostQuery::new()
            .category(1.into())
            .search("rust")
            .push_predicates(&mut builder);

        let sql = builder.sql();
        assert!(sql.contains("post_categories.category_id = $1"));
        assert!(sql.contains("posts.title ILIKE $2"));
        assert!(sql.contains("posts.content ILIKE $3"));
    }
}
