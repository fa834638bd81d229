//! Tools Module
//!
//! Every tool lives in its own module exporting a `register` function plus
//! the plain function implementing it. `register_all` builds the full
//! catalog in the order it is listed to clients.

pub mod dice;
pub mod greeting;
pub mod magic_8_ball;
pub mod password;

use crate::core::registry::{ToolError, ToolRegistry};

/// Register every tool. Fails on the first duplicate name.
pub fn register_all(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    greeting::register(registry)?;
    dice::register(registry)?;
    password::register(registry)?;
    magic_8_ball::register(registry)?;
    Ok(())
}
