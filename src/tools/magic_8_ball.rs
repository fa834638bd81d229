//! Magic 8-Ball Tool
//!
//! Answers a yes/no question with one of the classic 8-ball phrases.

use crate::core::random::RandomSource;
use crate::core::registry::{Arguments, ParamSpec, ParamType, ToolError, ToolHandler, ToolRegistry};

pub const RESPONSES: [&str; 19] = [
    "It is certain",
    "Reply hazy, try again",
    "Don't count on it",
    "It is decidedly so",
    "My sources say no",
    "Without a doubt",
    "Outlook not so good",
    "Yes definitely",
    "Very doubtful",
    "You may rely on it",
    "Ask again later",
    "Concentrate and ask again",
    "My reply is no",
    "Outlook good",
    "Cannot predict now",
    "Most likely",
    "As I see it, yes",
    "Better not tell you now",
    "Signs point to yes",
];

/// Register the magic_8_ball tool with the tool registry.
pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    let handler: ToolHandler = Box::new(|args: &Arguments, random: &mut dyn RandomSource| {
        Ok(magic_8_ball(random, args.string("question")?))
    });

    registry.register(
        "magic_8_ball",
        "Ask the magic 8-ball a yes/no question and get a mystical answer.",
        vec![ParamSpec::required(
            "question",
            ParamType::String,
            "The question to ask the magic 8-ball",
        )],
        handler,
    )
}

pub fn magic_8_ball(random: &mut dyn RandomSource, question: &str) -> String {
    let answer = RESPONSES[random.index(RESPONSES.len())];
    format!("🎱 Question: {question}\n🔮 Magic 8-Ball says: {answer}")
}
