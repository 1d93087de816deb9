//! Read-side helpers used by the store pages and the admin lists. All of them
//! are linear scans over a freshly listed table.

use serde::Serialize;

use crate::entity_model::{BlogPost, Comment, Product};
use crate::error::StoreResult;
use crate::local_store::LocalStore;

/// Content length above which a post is labelled as a long read.
pub const LONG_READ_CHARS: usize = 3000;

/// A comment together with the title of the post it belongs to, as shown on
/// the admin comments page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEntry {
    #[serde(flatten)]
    pub comment: Comment,
    pub post_title: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub games: usize,
    pub products: usize,
    pub blog_posts: usize,
    pub comments: usize,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Products whose category equals `category`, ignoring case.
pub fn products_by_category(store: &LocalStore, category: &str) -> StoreResult<Vec<Product>> {
    let wanted = category.to_lowercase();
    Ok(store
        .products()
        .list()?
        .into_iter()
        .filter(|p| p.category.to_lowercase() == wanted)
        .collect())
}

/// Products whose name or category contains `term`. An empty term matches
/// everything.
pub fn search_products(store: &LocalStore, term: &str) -> StoreResult<Vec<Product>> {
    Ok(store
        .products()
        .list()?
        .into_iter()
        .filter(|p| contains_ignore_case(&p.name, term) || contains_ignore_case(&p.category, term))
        .collect())
}

/// Posts whose title or author contains `term`.
pub fn search_posts(store: &LocalStore, term: &str) -> StoreResult<Vec<BlogPost>> {
    Ok(store
        .blog_posts()
        .list()?
        .into_iter()
        .filter(|p| contains_ignore_case(&p.title, term) || contains_ignore_case(&p.author, term))
        .collect())
}

pub fn all_comments(store: &LocalStore) -> StoreResult<Vec<CommentEntry>> {
    Ok(store
        .blog_posts()
        .list()?
        .into_iter()
        .flat_map(|post| {
            let title = post.title;
            post.comments.into_iter().map(move |comment| CommentEntry {
                comment,
                post_title: title.clone(),
            })
        })
        .collect())
}

/// Comments whose author, content or post title contains `term`.
pub fn search_comments(store: &LocalStore, term: &str) -> StoreResult<Vec<CommentEntry>> {
    Ok(all_comments(store)?
        .into_iter()
        .filter(|entry| {
            contains_ignore_case(&entry.comment.author, term)
                || contains_ignore_case(&entry.comment.content, term)
                || contains_ignore_case(&entry.post_title, term)
        })
        .collect())
}

pub fn dashboard_summary(store: &LocalStore) -> StoreResult<DashboardSummary> {
    let posts = store.blog_posts().list()?;
    Ok(DashboardSummary {
        games: store.games().count()?,
        products: store.products().count()?,
        comments: posts.iter().map(|p| p.comments.len()).sum(),
        blog_posts: posts.len(),
    })
}

/// Reading-time label for a post.
pub fn reading_time(post: &BlogPost) -> &'static str {
    if post.content.chars().count() > LONG_READ_CHARS {
        "10 min"
    } else {
        "5 min"
    }
}

/// Splits post content on blank lines, dropping empty paragraphs.
pub fn paragraphs(content: &str) -> Vec<&str> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}
