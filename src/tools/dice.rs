//! Dice Roll Tool
//!
//! Rolls `count` dice with `sides` faces each. Out-of-range parameters are
//! reported in the result text rather than as a protocol error.

use crate::core::random::RandomSource;
use crate::core::registry::{Arguments, ParamSpec, ParamType, ToolError, ToolHandler, ToolRegistry};

pub const INVALID_PARAMETERS: &str = "Invalid parameters: sides must be >= 2 and count must be >= 1";

/// Most dice a single call may roll.
pub const MAX_DICE: i64 = 1000;
pub const TOO_MANY_DICE: &str = "Invalid parameters: count must be <= 1000";

/// Register the roll_dice tool with the tool registry.
pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    let handler: ToolHandler = Box::new(|args: &Arguments, random: &mut dyn RandomSource| {
        Ok(roll_dice(random, args.integer("sides")?, args.integer("count")?))
    });

    registry.register(
        "roll_dice",
        "Roll one or more dice with specified number of sides.",
        vec![
            ParamSpec::optional("sides", ParamType::Integer, "Number of sides on each die", 6),
            ParamSpec::optional("count", ParamType::Integer, "Number of dice to roll (at most 1000)", 1),
        ],
        handler,
    )
}

pub fn roll_dice(random: &mut dyn RandomSource, sides: i64, count: i64) -> String {
    if sides < 2 || count < 1 {
        return INVALID_PARAMETERS.to_string();
    }
    if count > MAX_DICE {
        return TOO_MANY_DICE.to_string();
    }

    let rolls: Vec<i64> = (0..count).map(|_| random.between(1, sides)).collect();

    if let [roll] = rolls.as_slice() {
        format!("🎲 Rolled a {roll} on a {sides}-sided die")
    } else {
        // Totals of many large dice can exceed i64.
        let total: i128 = rolls.iter().map(|&r| i128::from(r)).sum();
        format!("🎲 Rolled {count} {sides}-sided dice: {rolls:?} (Total: {total})")
    }
}
