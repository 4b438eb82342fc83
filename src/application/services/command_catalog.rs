use crate::domain::entities::CatalogEntry;

/// Help listing built from the commands plugins register
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    action_char: String,
    entries: Vec<CatalogEntry>,
}

impl CommandCatalog {
    pub fn new(action_char: impl Into<String>) -> Self {
        Self {
            action_char: action_char.into(),
            entries: Vec::new(),
        }
    }

    /// Register a command, e.g. `register("restart <machine>", "restarts the target machine")`.
    ///
    /// Registering the same example again replaces its description but keeps
    /// its position in the listing.
    pub fn register(&mut self, example: impl Into<String>, about: impl Into<String>) {
        let entry = CatalogEntry::new(example, format!("{}{}", self.action_char, about.into()));
        match self.entries.iter_mut().find(|e| e.example == entry.example) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn action_char(&self) -> &str {
        &self.action_char
    }

    pub fn get(&self, example: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.example == example)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `example: about` line per command, in registration order
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return "No commands registered.".to_string();
        }
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.example, e.about))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prefixes_action_character() {
        let mut catalog = CommandCatalog::new("!");
        catalog.register("restart <machine>", "restarts the target machine");

        let rendered = catalog.render();
        assert!(rendered
            .lines()
            .any(|l| l == "restart <machine>: !restarts the target machine"));
    }

    #[test]
    fn test_render_keeps_registration_order() {
        let mut catalog = CommandCatalog::new("!");
        catalog.register("zap", "last alphabetically");
        catalog.register("alpha", "first alphabetically");

        assert_eq!(
            catalog.render(),
            "zap: !last alphabetically\nalpha: !first alphabetically"
        );
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let mut catalog = CommandCatalog::new("?");
        catalog.register("ping", "old");
        catalog.register("echo <text>", "repeats text");
        catalog.register("ping", "checks the bot is alive");

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].about, "?checks the bot is alive");
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = CommandCatalog::new("!");
        assert!(catalog.is_empty());
        assert_eq!(catalog.render(), "No commands registered.");
    }
}
