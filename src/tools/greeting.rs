//! Greeting Tool
//!
//! Sends a personalized greeting. The name is echoed verbatim, including the
//! empty string.

use crate::core::random::RandomSource;
use crate::core::registry::{Arguments, ParamSpec, ParamType, ToolError, ToolHandler, ToolRegistry};

/// Register the greeting tool with the tool registry.
pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    let handler: ToolHandler = Box::new(|args: &Arguments, _random: &mut dyn RandomSource| {
        Ok(greeting(args.string("name")?))
    });

    registry.register(
        "greeting",
        "Send a personalized greeting to someone.",
        vec![ParamSpec::required("name", ParamType::String, "The name of the person to greet")],
        handler,
    )
}

pub fn greeting(name: &str) -> String {
    format!("Hi {name}!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::testing::ScriptedSource;
    use serde_json::json;

    #[test]
    fn greets_by_name() {
        assert_eq!(greeting("Ada"), "Hi Ada!");
        assert_eq!(greeting(""), "Hi !");
        assert_eq!(greeting("José 🚀"), "Hi José 🚀!");
    }

    #[test]
    fn registered_tool_requires_name() {
        let mut registry = ToolRegistry::new(Box::new(ScriptedSource::new(&[])));
        register(&mut registry).unwrap();

        assert_eq!(registry.invoke("greeting", json!({"name": "Bob"})).unwrap(), "Hi Bob!");
        assert!(matches!(
            registry.invoke("greeting", json!({})),
            Err(ToolError::InvalidArguments { .. })
        ));
    }
}
