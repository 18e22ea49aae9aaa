//! AI safety toolkit: scraping monitoring, tapu/noa classification records, protection
//! requests, terms reviews and community decisions.
//!
//! The taxonomy and protection tool tables below are descriptive only. Handlers quote them
//! back to the caller but never derive a classification or decision from them.

use super::{Args, included, text, yes_no};
use crate::audit::AuditLog;
use crate::dispatch::Toolkit;
use crate::error::RegistryError;
use crate::schema::{FieldSpec, SchemaDescriptor};
use serde_json::json;
use std::sync::Arc;

pub const SCRAPING_KIND: &str = "scraping_attempt";
pub const CLASSIFICATION_KIND: &str = "classification";
pub const PROTECTION_KIND: &str = "protection";
pub const TERMS_KIND: &str = "terms_validation";
pub const DECISION_KIND: &str = "decision";

struct TaxonomyEntry {
    class: &'static str,
    description: &'static str,
    ai_access: &'static str,
}

const TAXONOMY: &[TaxonomyEntry] = &[
    TaxonomyEntry {
        class: "tapu",
        description: "Sacred content requiring maximum protection",
        ai_access: "prohibited",
    },
    TaxonomyEntry {
        class: "noa",
        description: "Common content suitable for controlled sharing",
        ai_access: "controlled",
    },
    TaxonomyEntry {
        class: "whakapapa",
        description: "Genealogical/relational content requiring special handling",
        ai_access: "community-controlled",
    },
];

struct ProtectionTool {
    id: &'static str,
    name: &'static str,
    purpose: &'static str,
}

const PROTECTION_TOOLS: &[ProtectionTool] = &[
    ProtectionTool {
        id: "nightshade",
        name: "Nightshade",
        purpose: "Corrupt AI training data",
    },
    ProtectionTool {
        id: "glaze",
        name: "Glaze",
        purpose: "Protect artistic style from mimicry",
    },
];

fn taxonomy_note(class: &str) -> Option<String> {
    TAXONOMY
        .iter()
        .find(|t| t.class == class)
        .map(|t| format!("{} (AI access: {})", t.description, t.ai_access))
}

fn protection_summary(protection_type: &str) -> String {
    PROTECTION_TOOLS
        .iter()
        .filter(|t| protection_type == "both" || t.id == protection_type)
        .map(|t| format!("{} ({})", t.name, t.purpose))
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Build the AI safety toolkit.
///
/// # Errors
///
/// Returns an error if a registration conflicts.
#[allow(clippy::too_many_lines)]
pub fn toolkit(audit: Arc<AuditLog>) -> Result<Toolkit, RegistryError> {
    let mut kit = Toolkit::new("true-review-ai-safety", "1.0.0");
    let reg = &mut kit.registry;

    let log = Arc::clone(&audit);
    reg.register_fn(
        "monitor_ai_scraping",
        "Detect and log potential AI scraping attempts on True Review content",
        SchemaDescriptor::new()
            .field(
                FieldSpec::string("request_source")
                    .describe("Source IP or identifier of request"),
            )
            .field(FieldSpec::string("request_pattern").describe("Pattern of requests detected"))
            .field(
                FieldSpec::string("content_accessed")
                    .optional()
                    .describe("Type of content being accessed"),
            )
            .field(
                FieldSpec::string("user_agent")
                    .optional()
                    .describe("User agent string from request"),
            ),
        move |args| {
            let a = Args(args);
            log.record(
                SCRAPING_KIND,
                a.str("request_source"),
                json!({
                    "pattern": a.str("request_pattern"),
                    "contentAccessed": a.opt_str("content_accessed"),
                    "userAgent": a.opt_str("user_agent"),
                }),
            );
            text(format!(
                "Scraping attempt logged from {}.\nPattern: {}\nContent accessed: {}",
                a.str("request_source"),
                a.str("request_pattern"),
                a.opt_str("content_accessed").unwrap_or("unspecified"),
            ))
        },
    )?;

    let log = Arc::clone(&audit);
    reg.register_fn(
        "classify_cultural_content",
        "Classify content as tapu/noa using Dr. Karatiana's framework",
        SchemaDescriptor::new()
            .field(FieldSpec::string("content_id").describe("Unique identifier for content"))
            .field(FieldSpec::one_of(
                "content_type",
                &["image", "text", "audio", "video", "mixed"],
            ))
            .field(
                FieldSpec::string("content_description")
                    .describe("Description of cultural content"),
            )
            .field(
                FieldSpec::string_array("cultural_indicators")
                    .optional()
                    .describe("Cultural elements present"),
            )
            .field(
                FieldSpec::string("community_source")
                    .optional()
                    .describe("Community or iwi of origin"),
            )
            .field(
                FieldSpec::one_of(
                    "proposed_classification",
                    &["tapu", "noa", "whakapapa", "uncertain"],
                )
                .optional(),
            ),
        move |args| {
            let a = Args(args);
            let proposed = a.opt_str("proposed_classification").unwrap_or("uncertain");
            log.record(
                CLASSIFICATION_KIND,
                a.str("content_id"),
                json!({
                    "contentType": a.str("content_type"),
                    "proposedClassification": proposed,
                    "culturalIndicators": a.list("cultural_indicators").unwrap_or_default(),
                    "communitySource": a.opt_str("community_source"),
                }),
            );
            let mut out = format!(
                "Content \"{}\" ({}) recorded with proposed classification: {}.\nFinal classification requires community review.",
                a.str("content_id"),
                a.str("content_type"),
                proposed,
            );
            if let Some(note) = taxonomy_note(proposed) {
                out.push_str("\nFramework note: ");
                out.push_str(&note);
            }
            text(out)
        },
    )?;

    let log = Arc::clone(&audit);
    reg.register_fn(
        "implement_poisoning_protection",
        "Apply Nightshade/Glaze protection to cultural content",
        SchemaDescriptor::new()
            .field(FieldSpec::string("content_id").describe("Content to protect"))
            .field(FieldSpec::one_of(
                "protection_type",
                &["nightshade", "glaze", "both"],
            ))
            .field(
                FieldSpec::one_of("protection_level", &["light", "medium", "maximum"]).optional(),
            )
            .field(FieldSpec::one_of(
                "cultural_classification",
                &["tapu", "noa", "whakapapa"],
            ))
            .field(
                FieldSpec::boolean("community_approval")
                    .optional()
                    .describe("Community has approved protection"),
            ),
        move |args| {
            let a = Args(args);
            log.record(
                PROTECTION_KIND,
                a.str("content_id"),
                json!({
                    "protectionType": a.str("protection_type"),
                    "protectionLevel": a.opt_str("protection_level"),
                    "culturalClassification": a.str("cultural_classification"),
                    "communityApproval": a.flag("community_approval"),
                }),
            );
            text(format!(
                "Protection request recorded for \"{}\" ({}): {}.\nLevel: {}\nCommunity approval: {}",
                a.str("content_id"),
                a.str("cultural_classification"),
                protection_summary(a.str("protection_type")),
                a.opt_str("protection_level").unwrap_or("unspecified"),
                yes_no(a.flag("community_approval")),
            ))
        },
    )?;

    let log = Arc::clone(&audit);
    reg.register_fn(
        "validate_terms_compliance",
        "Check platform terms of service for AI training clauses",
        SchemaDescriptor::new()
            .field(FieldSpec::string("platform_name").describe("Name of platform/service"))
            .field(
                FieldSpec::string("terms_url")
                    .optional()
                    .describe("URL to terms of service"),
            )
            .field(
                FieldSpec::string("content_type")
                    .optional()
                    .describe("Type of content being uploaded"),
            )
            .field(
                FieldSpec::boolean("check_ai_training")
                    .default(json!(true))
                    .describe("Check for AI training permissions"),
            )
            .field(
                FieldSpec::boolean("check_ip_ownership")
                    .default(json!(true))
                    .describe("Check intellectual property clauses"),
            ),
        move |args| {
            let a = Args(args);
            log.record(
                TERMS_KIND,
                a.str("platform_name"),
                json!({
                    "termsUrl": a.opt_str("terms_url"),
                    "checkAiTraining": a.flag("check_ai_training"),
                    "checkIpOwnership": a.flag("check_ip_ownership"),
                }),
            );
            text(format!(
                "Terms review recorded for {}.\nAI training clauses: {}\nIP ownership clauses: {}",
                a.str("platform_name"),
                included(a.flag("check_ai_training")),
                included(a.flag("check_ip_ownership")),
            ))
        },
    )?;

    let log = Arc::clone(&audit);
    reg.register_fn(
        "manage_tapu_noa_decisions",
        "Record and track community decisions about tapu/noa content sharing",
        SchemaDescriptor::new()
            .field(FieldSpec::string("decision_id").describe("Unique identifier for decision"))
            .field(FieldSpec::string("content_id").describe("Content being decided upon"))
            .field(
                FieldSpec::string_array("community_consulted")
                    .describe("Communities/iwi consulted"),
            )
            .field(
                FieldSpec::string_array("decision_makers")
                    .optional()
                    .describe("Individuals involved in decision"),
            )
            .field(
                FieldSpec::string("decision_rationale")
                    .optional()
                    .describe("Reasoning behind classification"),
            )
            .field(FieldSpec::one_of(
                "final_classification",
                &["tapu", "noa", "whakapapa", "restricted"],
            ))
            .field(
                FieldSpec::object(
                    "sharing_permissions",
                    Some(
                        SchemaDescriptor::new()
                            .field(FieldSpec::boolean("online_sharing").optional())
                            .field(FieldSpec::boolean("ai_training").optional())
                            .field(FieldSpec::boolean("commercial_use").optional())
                            .field(FieldSpec::boolean("academic_use").optional()),
                    ),
                )
                .optional(),
            ),
        move |args| {
            let a = Args(args);
            let permissions = a
                .object("sharing_permissions")
                .map(|p| serde_json::Value::Object(p.clone()));
            log.record(
                DECISION_KIND,
                a.str("decision_id"),
                json!({
                    "contentId": a.str("content_id"),
                    "finalClassification": a.str("final_classification"),
                    "communityConsulted": a.list("community_consulted").unwrap_or_default(),
                    "decisionMakers": a.list("decision_makers").unwrap_or_default(),
                    "sharingPermissions": permissions,
                }),
            );
            text(format!(
                "Decision {} recorded for content \"{}\": {}.\nCommunities consulted: {}",
                a.str("decision_id"),
                a.str("content_id"),
                a.str("final_classification"),
                a.joined("community_consulted", "none listed"),
            ))
        },
    )?;

    let log = Arc::clone(&audit);
    reg.register_fn(
        "audit_protection_effectiveness",
        "Assess effectiveness of implemented AI protection measures",
        SchemaDescriptor::new()
            .field(
                FieldSpec::string("audit_period")
                    .optional()
                    .describe("Time period for audit (e.g., \"last-30-days\")"),
            )
            .field(
                FieldSpec::string_array("content_categories")
                    .optional()
                    .describe("Categories to audit"),
            )
            .field(
                FieldSpec::string_array("protection_types")
                    .optional()
                    .describe("Protection methods to assess"),
            )
            .field(
                FieldSpec::boolean("include_cultural_assessment")
                    .default(json!(true))
                    .describe("Include cultural supervision review"),
            ),
        move |args| {
            let a = Args(args);
            text(format!(
                "Protection audit ({}):\nScraping attempts logged: {}\nContent classifications: {}\nProtections applied: {}\nTerms validations: {}\nCommunity decisions: {}\nCultural supervision review: {}",
                a.opt_str("audit_period").unwrap_or("all retained records"),
                log.count(SCRAPING_KIND),
                log.count(CLASSIFICATION_KIND),
                log.count(PROTECTION_KIND),
                log.count(TERMS_KIND),
                log.count(DECISION_KIND),
                included(a.flag("include_cultural_assessment")),
            ))
        },
    )?;

    Ok(kit)
}
