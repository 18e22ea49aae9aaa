//! Cultural compliance toolkit, served at `/api/mcp`.
//!
//! Handlers acknowledge the request and echo its inputs. No compliance decision is made
//! here; the resources only name the phases, compass points and frameworks the tools refer
//! to.

use super::{Args, text, yes_no};
use crate::dispatch::Toolkit;
use crate::error::RegistryError;
use crate::resources::ResourceBody;
use crate::schema::{FieldSpec, SchemaDescriptor};
use serde_json::json;

const PHASES: &[&str] = &[
    "planning",
    "engagement",
    "codesign",
    "prototype",
    "testing",
    "analysis",
    "return",
    "closure",
];
const COMPASS_POINTS: &[&str] = &["kei_raro", "kei_mua", "kei_runga", "kei_roto", "kei_waho"];
const PASIFIKA_FRAMEWORKS: &[&str] = &["tafatolu", "faafaletui", "both"];
const REFLEXIVITY_DAYS: &[&str] = &["tuesday", "wednesday", "friday"];

fn framework_label(framework: &str) -> &'static str {
    match framework {
        "tafatolu" => "Tafatolu",
        "faafaletui" => "Fa'afaletui",
        _ => "Tafatolu and Fa'afaletui",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Build the cultural compliance toolkit.
///
/// # Errors
///
/// Returns an error if a registration conflicts.
#[allow(clippy::too_many_lines)]
pub fn toolkit() -> Result<Toolkit, RegistryError> {
    let mut kit = Toolkit::new("true-review-cultural-compliance", "1.0.0");
    let reg = &mut kit.registry;

    reg.register_fn(
        "validate_tikanga_compliance",
        "Validate an action or decision against tikanga Māori protocols",
        SchemaDescriptor::new()
            .field(FieldSpec::string("action").describe("The proposed action or decision"))
            .field(FieldSpec::string("context").describe("Cultural and situational context"))
            .field(FieldSpec::one_of("phase", PHASES).describe("Current project phase"))
            .field(
                FieldSpec::string_array("stakeholders")
                    .optional()
                    .describe("Affected community members/groups"),
            ),
        |args| {
            let a = Args(args);
            text(format!(
                "Action \"{}\" recorded for tikanga review during the {} phase.\nContext: {}\nStakeholders: {}",
                a.str("action"),
                a.str("phase"),
                a.str("context"),
                a.joined("stakeholders", "none listed"),
            ))
        },
    )?;

    reg.register_fn(
        "ethical_compass_check",
        "Evaluate decision through Kiri Dell's Ethical Compass framework",
        SchemaDescriptor::new()
            .field(FieldSpec::string("decision").describe("The decision to evaluate"))
            .field(
                FieldSpec::one_of("compass_point", COMPASS_POINTS)
                    .optional()
                    .describe("Specific compass point to focus on"),
            )
            .field(
                FieldSpec::string("community_context").describe("Relevant community context"),
            ),
        |args| {
            let a = Args(args);
            text(format!(
                "Decision \"{}\" evaluated through the Ethical Compass (focus: {}).\nCommunity context: {}",
                a.str("decision"),
                a.opt_str("compass_point").unwrap_or("all points"),
                a.str("community_context"),
            ))
        },
    )?;

    reg.register_fn(
        "pasifika_framework_alignment",
        "Check alignment with Pasifika frameworks (Tafatolu, Fa'afaletui)",
        SchemaDescriptor::new()
            .field(FieldSpec::string("proposal").describe("Proposal or approach to evaluate"))
            .field(
                FieldSpec::one_of("framework", PASIFIKA_FRAMEWORKS)
                    .describe("Which framework(s) to apply"),
            )
            .field(
                FieldSpec::string_array("wellbeing_dimensions")
                    .optional()
                    .describe("Relevant wellbeing dimensions"),
            ),
        |args| {
            let a = Args(args);
            text(format!(
                "Proposal \"{}\" checked against {}.\nWellbeing dimensions: {}",
                a.str("proposal"),
                framework_label(a.str("framework")),
                a.joined("wellbeing_dimensions", "not specified"),
            ))
        },
    )?;

    reg.register_fn(
        "cultural_risk_assessment",
        "Assess cultural risks and provide mitigation strategies",
        SchemaDescriptor::new()
            .field(FieldSpec::string("activity").describe("Activity or process to assess"))
            .field(
                FieldSpec::string_array("risk_categories")
                    .optional()
                    .describe("Categories of risk to evaluate"),
            )
            .field(
                FieldSpec::boolean("mitigation_required")
                    .default(json!(true))
                    .describe("Whether mitigation strategies are needed"),
            ),
        |args| {
            let a = Args(args);
            text(format!(
                "Cultural risk assessment for \"{}\".\nRisk categories: {}\nMitigation strategies requested: {}",
                a.str("activity"),
                a.joined("risk_categories", "general"),
                yes_no(a.flag("mitigation_required")),
            ))
        },
    )?;

    reg.register_fn(
        "generate_reflexivity_prompt",
        "Generate culturally-informed reflexivity questions for weekly practice",
        SchemaDescriptor::new()
            .field(FieldSpec::one_of("day", REFLEXIVITY_DAYS).describe("Day of reflexivity cycle"))
            .field(FieldSpec::string("phase").describe("Current project phase"))
            .field(
                FieldSpec::string_array("recent_activities")
                    .optional()
                    .describe("Recent project activities"),
            ),
        |args| {
            let a = Args(args);
            text(format!(
                "Reflexivity prompt for {} ({} phase).\nRecent activities: {}",
                capitalize(a.str("day")),
                a.str("phase"),
                a.joined("recent_activities", "none listed"),
            ))
        },
    )?;

    reg.register_fn(
        "reciprocity_tracker",
        "Track and suggest reciprocity measures for community engagement",
        SchemaDescriptor::new()
            .field(FieldSpec::string("engagement_type").describe("Type of community engagement"))
            .field(
                FieldSpec::string_array("participants")
                    .optional()
                    .describe("Participants involved"),
            )
            .field(
                FieldSpec::string("value_extracted")
                    .describe("Value/knowledge gained from community"),
            )
            .field(
                FieldSpec::string_array("reciprocity_preferences")
                    .optional()
                    .describe("Community preferred forms of reciprocity"),
            ),
        |args| {
            let a = Args(args);
            text(format!(
                "Reciprocity recorded for {} engagement.\nValue gained: {}\nParticipants: {}\nPreferred reciprocity: {}",
                a.str("engagement_type"),
                a.str("value_extracted"),
                a.joined("participants", "none listed"),
                a.joined("reciprocity_preferences", "not specified"),
            ))
        },
    )?;

    kit.resources.register(
        "tikanga://protocols",
        "Tikanga Māori Protocols",
        "Complete tikanga protocols for True Review project",
        ResourceBody::Static(json!({ "phases": PHASES })),
    )?;
    kit.resources.register(
        "compass://ethical-framework",
        "Kiri Dell Ethical Compass",
        "Ethical compass points and cultural lenses",
        ResourceBody::Static(json!({ "compassPoints": COMPASS_POINTS })),
    )?;
    kit.resources.register(
        "pasifika://frameworks",
        "Pasifika Cultural Frameworks",
        "Tafatolu and Fa'afaletui frameworks",
        ResourceBody::Static(json!({
            "frameworks": [
                { "id": "tafatolu", "name": "Tafatolu" },
                { "id": "faafaletui", "name": "Fa'afaletui" }
            ]
        })),
    )?;

    Ok(kit)
}
