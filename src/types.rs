//! Shared types passed between build phases.
//!
//! Nothing here is persisted: records are derived from fragments or built
//! files during a phase and dropped when the phase ends.

/// Metadata read from a source fragment in `pages/`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FragmentMeta {
    /// Text of the first `<h1>`.
    pub title: String,
    /// Value of `<meta name="category">`, i.e. the output directory.
    pub category: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// The original `category`/`description`/`tags` meta elements, in that
    /// order, to be moved into the document head.
    pub head_meta: Vec<String>,
}

/// A fragment loaded from `pages/` with its metadata.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// File name inside `pages/`, also the output file name for articles.
    pub file_name: String,
    pub raw: String,
    pub meta: FragmentMeta,
}

impl Fragment {
    /// Site-relative URL of the built article.
    pub fn url(&self) -> String {
        format!("/{}/{}", self.meta.category, self.file_name)
    }
}

/// An article as listed on index pages and in related-article blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub title: String,
    pub description: String,
    /// Site-relative card image.
    pub image: String,
    /// Site-relative URL, e.g. `/ahu/ahu-bai1.html`.
    pub url: String,
    pub tags: Vec<String>,
    /// Category directory the article lives in.
    pub category: String,
}

/// A card in a grid: the unit every index page is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub description: Option<String>,
    pub image: String,
    pub href: String,
}

impl From<&ArticleRecord> for Card {
    fn from(record: &ArticleRecord) -> Self {
        Self {
            title: record.title.clone(),
            description: Some(record.description.clone()),
            image: record.image.clone(),
            href: record.url.clone(),
        }
    }
}
