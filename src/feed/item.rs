use std::fmt;

/// Author of a feed entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Person {
    pub name: String,
    pub email: Option<String>,
}

/// Name and email joined by a single space; blank parts are skipped.
impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [Some(self.name.as_str()), self.email.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        f.write_str(&parts.join(" "))
    }
}

/// One entry of a fetched feed.
///
/// Items only live for a single poll cycle. `title` is the sole key used
/// to decide whether an item was already seen; timestamps are kept as the
/// RFC 3339 strings they were rendered to and are never compared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub author: Option<Person>,
    pub link: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
}

impl Item {
    /// Shorthand used by tests and custom fetchers.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}
