//! Password Generation Tool
//!
//! Draws characters uniformly, with replacement, from ASCII letters and digits,
//! optionally extended with a fixed symbol set. The generator is general
//! purpose, so passwords carry no cryptographic-strength guarantee.

use crate::core::random::RandomSource;
use crate::core::registry::{Arguments, ParamSpec, ParamType, ToolError, ToolHandler, ToolRegistry};

pub const TOO_SHORT: &str = "Password length must be at least 4 characters";

/// Longest password a single call may generate.
pub const MAX_LENGTH: i64 = 1024;
pub const TOO_LONG: &str = "Password length must be at most 1024 characters";

const LETTERS_AND_DIGITS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const SYMBOLS: &str = "!@#$%^&*";

/// Register the generate_password tool with the tool registry.
pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    let handler: ToolHandler = Box::new(|args: &Arguments, random: &mut dyn RandomSource| {
        Ok(generate_password(random, args.integer("length")?, args.boolean("include_symbols")?))
    });

    registry.register(
        "generate_password",
        "Generate a random secure password.",
        vec![
            ParamSpec::optional("length", ParamType::Integer, "Length of the password (4 to 1024)", 12),
            ParamSpec::optional(
                "include_symbols",
                ParamType::Boolean,
                "Whether to include special characters",
                true,
            ),
        ],
        handler,
    )
}

pub fn generate_password(random: &mut dyn RandomSource, length: i64, include_symbols: bool) -> String {
    if length < 4 {
        return TOO_SHORT.to_string();
    }
    if length > MAX_LENGTH {
        return TOO_LONG.to_string();
    }

    let mut charset: Vec<char> = LETTERS_AND_DIGITS.chars().collect();
    if include_symbols {
        charset.extend(SYMBOLS.chars());
    }

    let password: String = (0..length)
        .map(|_| charset[random.index(charset.len())])
        .collect();
    format!("🔐 Generated password: {password}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::RngSource;
    use crate::core::random::testing::ScriptedSource;
    use serde_json::json;

    const PREFIX: &str = "🔐 Generated password: ";

    fn password(out: &str) -> &str {
        out.strip_prefix(PREFIX).expect("missing prefix")
    }

    #[test]
    fn too_short_regardless_of_symbols() {
        let mut random = ScriptedSource::new(&[]);
        for length in [3, 0, -5] {
            assert_eq!(generate_password(&mut random, length, true), TOO_SHORT);
            assert_eq!(generate_password(&mut random, length, false), TOO_SHORT);
        }
    }

    #[test]
    fn length_is_capped() {
        let mut random = ScriptedSource::new(&[]);
        for length in [MAX_LENGTH + 1, 4_000_000_000_000, i64::MAX] {
            assert_eq!(generate_password(&mut random, length, true), TOO_LONG);
            assert_eq!(generate_password(&mut random, length, false), TOO_LONG);
        }

        let mut random = RngSource::seeded(3);
        let out = generate_password(&mut random, MAX_LENGTH, true);
        assert_eq!(password(&out).chars().count() as i64, MAX_LENGTH);
    }

    #[test]
    fn scripted_indices_pick_charset_positions() {
        // 0 = 'a', 26 = 'A', 52 = '0', 62 = '!', 69 = '*'
        let mut random = ScriptedSource::new(&[0, 26, 52, 62, 69]);
        assert_eq!(generate_password(&mut random, 5, true), format!("{PREFIX}aA0!*"));
    }

    #[test]
    fn length_and_charset_hold() {
        let mut random = RngSource::seeded(99);
        for length in [4, 12, 64] {
            let with = generate_password(&mut random, length, true);
            let with = password(&with);
            assert_eq!(with.chars().count() as i64, length);
            assert!(with.chars().all(|c| c.is_ascii_alphanumeric() || SYMBOLS.contains(c)));

            let without = generate_password(&mut random, length, false);
            let without = password(&without);
            assert_eq!(without.chars().count() as i64, length);
            assert!(without.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn registered_tool_defaults_to_twelve_with_symbols() {
        // 70 characters with symbols, so index 69 is only reachable when they are included.
        let mut registry = ToolRegistry::new(Box::new(ScriptedSource::new(&[69; 12])));
        register(&mut registry).unwrap();

        let out = registry.invoke("generate_password", json!({})).unwrap();
        assert_eq!(password(&out), "************");
        assert_eq!(
            registry.invoke("generate_password", json!({"length": 3, "include_symbols": false})).unwrap(),
            TOO_SHORT
        );
        assert_eq!(
            registry.invoke("generate_password", json!({"length": 4_000_000_000_000_i64})).unwrap(),
            TOO_LONG
        );
    }
}
