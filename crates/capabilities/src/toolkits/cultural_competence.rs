use super::{Args, text};
use crate::dispatch::Toolkit;
use crate::error::RegistryError;
use crate::resources::ResourceBody;
use crate::schema::{FieldSpec, SchemaDescriptor};
use serde_json::json;

/// Build the cultural competence toolkit.
///
/// # Errors
///
/// Returns an error if a registration conflicts.
pub fn toolkit() -> Result<Toolkit, RegistryError> {
    let mut kit = Toolkit::new("cultural-competence-mcp", "1.0.0");

    kit.registry.register_fn(
        "validate_cultural_action",
        "Validate an action or plan for cultural competence",
        SchemaDescriptor::new()
            .field(FieldSpec::string("action").describe("The action you want to check"))
            .field(
                FieldSpec::string("context")
                    .optional()
                    .describe("Describe the cultural/situational context"),
            ),
        |args| {
            text(format!(
                "Action \"{}\" was evaluated for cultural competence.\nWellbeing prioritized: YES\nProtocol alignment: Manaakitanga & Kaitiakitanga",
                Args(args).str("action")
            ))
        },
    )?;

    kit.resources.register(
        "cultural-competence://protocols",
        "Cultural Competence Protocols",
        "Protocol details and descriptions",
        ResourceBody::Static(json!({
            "manaakitanga": {
                "name": "Hospitality & Care",
                "description": "Ensuring wellbeing and reciprocity for participants."
            },
            "kaitiakitanga": {
                "name": "Guardianship",
                "description": "Protecting data and prioritizing community benefit."
            }
        })),
    )?;

    Ok(kit)
}
