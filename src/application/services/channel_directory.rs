use std::collections::BTreeMap;
use crate::domain::entities::ChannelInfo;

/// Maps human-readable channel names to service channel ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelDirectory {
    by_name: BTreeMap<String, String>,
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole mapping.
    ///
    /// Names and ids stay unique: a later channel reusing either one is
    /// skipped.
    pub fn rebuild(&mut self, channels: impl IntoIterator<Item = ChannelInfo>) {
        self.by_name.clear();
        for channel in channels {
            if self.by_name.contains_key(&channel.name)
                || self.by_name.values().any(|id| *id == channel.id)
            {
                tracing::warn!(
                    name = %channel.name,
                    id = %channel.id,
                    "Skipping duplicate channel"
                );
                continue;
            }
            self.by_name.insert(channel.name, channel.id);
        }
    }

    /// Channel id for a name, with or without a leading `#`
    pub fn lookup(&self, name: &str) -> Option<&str> {
        let name = name.strip_prefix('#').unwrap_or(name);
        self.by_name.get(name).map(String::as_str)
    }

    /// Reverse lookup of a channel id
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.by_name
            .iter()
            .find(|(_, v)| v.as_str() == id)
            .map(|(k, _)| k.as_str())
    }

    pub fn clear(&mut self) {
        self.by_name.clear();
    }

    /// (name, id) pairs sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_name.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebuild_replaces_previous_entries() {
        let mut directory = ChannelDirectory::new();
        directory.rebuild(vec![ChannelInfo::new("C1", "general")]);
        directory.rebuild(vec![
            ChannelInfo::new("C2", "random"),
            ChannelInfo::new("C3", "ops"),
        ]);

        assert_eq!(directory.len(), 2);
        assert_eq!(directory.lookup("general"), None);
        assert_eq!(directory.lookup("ops"), Some("C3"));
        assert_eq!(directory.lookup("#random"), Some("C2"));
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let mut directory = ChannelDirectory::new();
        directory.rebuild(vec![
            ChannelInfo::new("C1", "general"),
            ChannelInfo::new("C9", "general"),
            ChannelInfo::new("C1", "other"),
        ]);

        assert_eq!(directory.len(), 1);
        assert_eq!(directory.lookup("general"), Some("C1"));
        assert_eq!(directory.name_of("C1"), Some("general"));
    }

    #[test]
    fn test_iter_is_sorted_by_name() {
        let mut directory = ChannelDirectory::new();
        directory.rebuild(vec![
            ChannelInfo::new("C2", "zeta"),
            ChannelInfo::new("C1", "alpha"),
        ]);
        let names: Vec<&str> = directory.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
