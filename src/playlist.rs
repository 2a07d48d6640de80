use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub id: String,
    pub artwork_url: Option<String>,
}

impl Playlist {
    pub fn new(name: impl Into<String>, id: impl Into<String>, artwork_url: Option<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            artwork_url,
        }
    }
}

/// Target playlist names mapped to their ids.
///
/// Iteration is in lexicographic order of the name, which is what gives the
/// matcher a stable tie-break.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameIndex {
    entries: BTreeMap<String, String>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins on duplicate names.
    pub fn insert(&mut self, name: impl Into<String>, id: impl Into<String>) -> Option<String> {
        self.entries.insert(name.into(), id.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, id)| (n.as_str(), id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<&'a Playlist> for NameIndex {
    fn from_iter<I: IntoIterator<Item = &'a Playlist>>(iter: I) -> Self {
        let mut index = NameIndex::new();
        for playlist in iter {
            if let Some(previous) = index.insert(playlist.name.clone(), playlist.id.clone()) {
                log::debug!(
                    "duplicate target playlist name '{}': {} replaced by {}",
                    playlist.name,
                    previous,
                    playlist.id
                );
            }
        }
        index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub source_name: String,
    pub target_id: Option<String>,
    pub score: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub success_count: usize,
    pub fail_count: usize,
}

impl SyncOutcome {
    pub fn record<T, E>(&mut self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.success_count += 1,
            Err(_) => self.fail_count += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.success_count + self.fail_count
    }
}
