//! Indigenous data sovereignty toolkit.

use super::{Args, included, text, yes_no};
use crate::dispatch::Toolkit;
use crate::error::RegistryError;
use crate::resources::ResourceBody;
use crate::schema::{FieldSpec, SchemaDescriptor};
use serde_json::{Value, json};

const CONSENT_TYPES: &[&str] = &["informed", "ongoing", "collective", "cultural", "dynamic"];

/// Te Mana Raraunga principles, served verbatim as a resource.
fn te_mana_raraunga() -> Value {
    json!({
        "rangatiratanga": {
            "name": "Authority",
            "principle": "Māori have authority over Māori data and Māori data ecosystems",
            "implementation": [
                "Community governance structures",
                "Indigenous leadership in data decisions",
                "Self-determination in data use"
            ]
        },
        "whakapapa": {
            "name": "Relationships",
            "principle": "Data has whakapapa (genealogy) and inherent connections",
            "implementation": [
                "Data lineage tracking",
                "Relationship mapping",
                "Contextual preservation"
            ]
        },
        "whakatōhea": {
            "name": "Collective responsibility",
            "principle": "Collective responsibility for nurturing relationships with data",
            "implementation": [
                "Shared stewardship",
                "Community accountability",
                "Intergenerational care"
            ]
        },
        "kotahitanga": {
            "name": "Unity",
            "principle": "Data ecosystems should be unified and integrated",
            "implementation": [
                "Interoperability with cultural protocols",
                "Holistic data approaches",
                "System integration"
            ]
        },
        "manaakitanga": {
            "name": "Care and protection",
            "principle": "Data should be cared for and protected like people",
            "implementation": [
                "Protective measures",
                "Ethical use guidelines",
                "Community benefit prioritized"
            ]
        },
        "kaitiakitanga": {
            "name": "Guardianship",
            "principle": "Sustainable guardianship of data for future generations",
            "implementation": [
                "Long-term stewardship",
                "Environmental protection",
                "Future-oriented governance"
            ]
        }
    })
}

/// Build the data sovereignty toolkit.
///
/// # Errors
///
/// Returns an error if a registration conflicts.
pub fn toolkit() -> Result<Toolkit, RegistryError> {
    let mut kit = Toolkit::new("true-review-data-sovereignty", "1.0.0");
    let reg = &mut kit.registry;

    reg.register_fn(
        "classify_data_sovereignty",
        "Classify data according to Indigenous data sovereignty principles",
        SchemaDescriptor::new()
            .field(FieldSpec::string("data_description"))
            .field(FieldSpec::string("cultural_context"))
            .field(FieldSpec::string("participant_info").optional())
            .field(FieldSpec::string("intended_use")),
        |args| {
            let a = Args(args);
            text(format!(
                "Classified \"{}\" for \"{}\". Intended use: {}.\nProtection needed: High. Review by cultural authority recommended.",
                a.str("data_description"),
                a.str("cultural_context"),
                a.str("intended_use"),
            ))
        },
    )?;

    reg.register_fn(
        "validate_consent_compliance",
        "Validate that data use complies with consent agreements",
        SchemaDescriptor::new()
            .field(FieldSpec::string("data_id"))
            .field(FieldSpec::string("proposed_use"))
            .field(FieldSpec::one_of("consent_type", CONSENT_TYPES))
            .field(FieldSpec::string_array("participants").optional()),
        |args| {
            let a = Args(args);
            text(format!(
                "Consent type \"{}\" validated for data \"{}\".",
                a.str("consent_type"),
                a.str("data_id"),
            ))
        },
    )?;

    reg.register_fn(
        "generate_sovereignty_audit",
        "Generate comprehensive data sovereignty audit report",
        SchemaDescriptor::new()
            .field(FieldSpec::string("audit_scope"))
            .field(FieldSpec::string_array("focus_areas").optional())
            .field(FieldSpec::boolean("include_recommendations").default(json!(true))),
        |args| {
            let a = Args(args);
            text(format!(
                "Sovereignty audit report for scope \"{}\". Focus areas: {}.\nRecommendations included: {}.",
                a.str("audit_scope"),
                a.joined("focus_areas", "N/A"),
                yes_no(a.flag("include_recommendations")),
            ))
        },
    )?;

    reg.register_fn(
        "track_data_lineage",
        "Track data lineage and whakapapa (genealogy)",
        SchemaDescriptor::new()
            .field(FieldSpec::string("data_id"))
            .field(FieldSpec::boolean("include_transformations").default(json!(true)))
            .field(FieldSpec::boolean("cultural_connections").default(json!(true))),
        |args| {
            let a = Args(args);
            text(format!(
                "Lineage for data \"{}\" traced. Transformations: {}, Cultural connections: {}.",
                a.str("data_id"),
                included(a.flag("include_transformations")),
                included(a.flag("cultural_connections")),
            ))
        },
    )?;

    reg.register_fn(
        "assess_cultural_impact",
        "Assess potential cultural impact of data use",
        SchemaDescriptor::new()
            .field(FieldSpec::string("proposed_action"))
            .field(FieldSpec::string_array("affected_communities"))
            .field(
                FieldSpec::one_of("risk_tolerance", &["low", "moderate", "high"])
                    .default(json!("low")),
            )
            .field(FieldSpec::boolean("mitigation_required").default(json!(true))),
        |args| {
            let a = Args(args);
            text(format!(
                "Assessed impact for action \"{}\". Affected communities: {}. Risk: {}.\nMitigation required: {}.",
                a.str("proposed_action"),
                a.joined("affected_communities", ""),
                a.opt_str("risk_tolerance").unwrap_or("low"),
                yes_no(a.flag("mitigation_required")),
            ))
        },
    )?;

    reg.register_fn(
        "generate_community_data_report",
        "Generate community-accessible data report respecting sovereignty",
        SchemaDescriptor::new()
            .field(FieldSpec::string("report_scope"))
            .field(FieldSpec::boolean("include_recommendations").default(json!(true))),
        |args| {
            let a = Args(args);
            text(format!(
                "Community data report for \"{}\". Recommendations: {}.",
                a.str("report_scope"),
                included(a.flag("include_recommendations")),
            ))
        },
    )?;

    kit.resources.register(
        "te-mana-raraunga://principles",
        "Te Mana Raraunga Principles",
        "Complete Te Mana Raraunga principles for Indigenous data sovereignty",
        ResourceBody::Static(te_mana_raraunga()),
    )?;

    Ok(kit)
}
