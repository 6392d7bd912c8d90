//! Tool definition helpers using JSON Schema generation

use schemars::{schema_for, JsonSchema};

use crate::llm::core::{types::ToolDefinition, value::Value};

/// Create a tool definition whose input schema is generated from `T`
///
/// The `$schema` meta key is dropped; some vendors reject it.
///
/// # Example
///
/// ```rust
/// use schemars::JsonSchema;
/// use serde::Deserialize;
/// use toolrelay::llm::create_tool_definition;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct CalculatorArgs {
///     /// The operation to perform
///     operation: String,
///     /// First operand
///     a: f64,
///     /// Second operand
///     b: f64,
/// }
///
/// let definition = create_tool_definition::<CalculatorArgs>(
///     "calculator",
///     "Perform basic arithmetic operations",
/// );
/// assert_eq!(definition.name, "calculator");
/// ```
pub fn create_tool_definition<T: JsonSchema>(
    name: impl Into<String>,
    description: impl Into<String>,
) -> ToolDefinition {
    let mut schema = serde_json::to_value(schema_for!(T))
        .unwrap_or_else(|_| serde_json::json!({"type": "object"}));
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
    }

    ToolDefinition {
        name: name.into(),
        description: description.into(),
        input_schema: Value::from(schema),
    }
}
