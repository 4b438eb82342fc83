//! Plugins compiled into the bot, looked up by name

pub mod channels;
pub mod echo;
pub mod ping;

use super::trait_def::PluginFactory;

/// Every built-in plugin with its constructor
pub const BUILTIN_PLUGINS: &[(&str, PluginFactory)] = &[
    ("ping", ping::create as PluginFactory),
    ("echo", echo::create as PluginFactory),
    ("channels", channels::create as PluginFactory),
];

pub fn lookup(name: &str) -> Option<PluginFactory> {
    BUILTIN_PLUGINS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, factory)| *factory)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTIN_PLUGINS.iter().map(|(n, _)| *n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_builtin() {
        assert!(lookup("ping").is_some());
        assert!(lookup("Channels").is_some());
        assert!(lookup("weather").is_none());
    }

    #[test]
    fn test_factories_build_named_plugins() {
        for (name, factory) in BUILTIN_PLUGINS {
            assert_eq!(factory().name(), *name);
        }
        assert_eq!(names().count(), BUILTIN_PLUGINS.len());
    }
}
