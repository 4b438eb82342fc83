//! Command parser - Structures a token list against a plugin's option schema

use crate::application::errors::CommandError;
use crate::domain::entities::{CommandSchema, ParsedCommand};

/// Parses whitespace-delimited command tokens into a [`ParsedCommand`]
pub struct CommandParser;

impl CommandParser {
    /// Split raw command text into tokens
    pub fn tokenize(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    /// Match `tokens` against `schema`.
    ///
    /// Every schema key takes the one token listed in its value set. Keys are
    /// tried in schema order and a token claimed by an earlier key is not
    /// offered to later ones. More than one candidate token for a key is an
    /// [`CommandError::AmbiguousMatch`]; none leaves the key absent.
    ///
    /// Unclaimed tokens become wildcards in input order, except tokens that
    /// spell a schema key name, which are dropped.
    pub fn parse<S: AsRef<str>>(
        schema: &CommandSchema,
        tokens: &[S],
    ) -> Result<ParsedCommand, CommandError> {
        let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
        let mut parsed = ParsedCommand::new();
        let mut claimed = vec![false; tokens.len()];

        for (key, values) in schema.options() {
            let hits: Vec<usize> = tokens
                .iter()
                .enumerate()
                .filter(|(i, t)| !claimed[*i] && values.contains(**t))
                .map(|(i, _)| i)
                .collect();

            match hits.as_slice() {
                [] => {}
                [i] => {
                    claimed[*i] = true;
                    parsed.insert(key, tokens[*i]);
                }
                _ => {
                    return Err(CommandError::AmbiguousMatch {
                        key: key.to_string(),
                        tokens: hits.iter().map(|i| tokens[*i].to_string()).collect(),
                    });
                }
            }
        }

        for (i, token) in tokens.iter().enumerate() {
            if claimed[i] {
                continue;
            }
            if schema.is_key(token) {
                parsed.skip_key_token();
                continue;
            }
            parsed.push_wildcard(*token);
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_schema() -> CommandSchema {
        CommandSchema::new()
            .option("command", ["start", "stop", "restart"])
            .option("target", ["machine1", "machine2"])
    }

    #[test]
    fn test_matches_keys_and_collects_wildcards() {
        let tokens = CommandParser::tokenize("start machine1 meaninglessInput");
        let parsed = CommandParser::parse(&machine_schema(), &tokens).unwrap();

        assert_eq!(parsed.get("command"), Some("start"));
        assert_eq!(parsed.get("target"), Some("machine1"));
        assert_eq!(parsed.wildcard(0), Some("meaninglessInput"));
        assert_eq!(parsed.wildcard(1), None);
    }

    #[test]
    fn test_wildcards_keep_input_order() {
        let tokens = ["zeta", "restart", "alpha", "machine2", "mid"];
        let parsed = CommandParser::parse(&machine_schema(), &tokens).unwrap();

        assert_eq!(parsed.wildcards(), &["zeta", "alpha", "mid"]);
        let map = parsed.to_map();
        assert_eq!(map.get("wildcard0").map(String::as_str), Some("zeta"));
        assert_eq!(map.get("wildcard2").map(String::as_str), Some("mid"));
    }

    #[test]
    fn test_ambiguous_match_is_an_error() {
        let tokens = ["restart", "machine1", "machine2"];
        let err = CommandParser::parse(&machine_schema(), &tokens).unwrap_err();

        assert_eq!(
            err,
            CommandError::AmbiguousMatch {
                key: "target".into(),
                tokens: vec!["machine1".into(), "machine2".into()],
            }
        );
    }

    #[test]
    fn test_repeated_token_is_ambiguous() {
        let tokens = ["stop", "stop"];
        let err = CommandParser::parse(&machine_schema(), &tokens).unwrap_err();
        assert!(matches!(err, CommandError::AmbiguousMatch { ref key, .. } if key == "command"));
    }

    #[test]
    fn test_empty_tokens() {
        let tokens: [&str; 0] = [];
        let parsed = CommandParser::parse(&machine_schema(), &tokens).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_empty_schema_makes_everything_wildcard() {
        let tokens = ["a", "b", "c"];
        let parsed = CommandParser::parse(&CommandSchema::new(), &tokens).unwrap();
        assert!(parsed.matched().is_empty());
        assert_eq!(parsed.wildcards(), &["a", "b", "c"]);
    }

    #[test]
    fn test_key_names_are_not_wildcards() {
        let tokens = ["target", "machine2"];
        let parsed = CommandParser::parse(&machine_schema(), &tokens).unwrap();
        assert_eq!(parsed.get("target"), Some("machine2"));
        assert!(parsed.wildcards().is_empty());
        assert_eq!(parsed.token_count(), 2);
    }

    #[test]
    fn test_shared_value_goes_to_first_key() {
        let schema = CommandSchema::new()
            .option("action", ["status"])
            .option("topic", ["status", "uptime"]);
        let parsed = CommandParser::parse(&schema, &["status"]).unwrap();

        assert_eq!(parsed.get("action"), Some("status"));
        assert_eq!(parsed.get("topic"), None);
        assert_eq!(parsed.token_count(), 1);
    }

    #[test]
    fn test_every_token_accounted_for_once() {
        let schema = machine_schema();
        let inputs: [&[&str]; 7] = [
            &["start"],
            &["target", "machine2"],
            &["command", "target", "leftover"],
            &["x", "y", "z"],
            &["restart", "machine1", "now", "please"],
            &["machine2", "hello", "hello", "stop"],
            &["a", "stop", "b", "machine1", "c"],
        ];

        for tokens in inputs {
            let parsed = CommandParser::parse(&schema, tokens).unwrap();
            assert_eq!(parsed.token_count(), tokens.len(), "tokens: {:?}", tokens);
        }
    }
}
