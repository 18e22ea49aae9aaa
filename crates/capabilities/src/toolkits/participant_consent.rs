//! Participant consent toolkit.
//!
//! Every consent event is also written to this toolkit's [`AuditLog`] under [`CONSENT_KIND`];
//! `consent://tracking` renders the live entries on each read.

use super::{Args, text};
use crate::audit::AuditLog;
use crate::dispatch::Toolkit;
use crate::error::RegistryError;
use crate::resources::ResourceBody;
use crate::schema::{FieldSpec, SchemaDescriptor};
use serde_json::{Value, json};
use std::sync::Arc;

pub const CONSENT_KIND: &str = "consent";

const CONSENT_TYPES: &[&str] = &["informed", "ongoing", "collective", "cultural"];
const CHECK_IN_TYPES: &[&str] = &["weekly", "bi-weekly", "monthly", "milestone"];
const CONSENT_STATUSES: &[&str] = &["maintained", "modified", "withdrawn", "pending"];
const WITHDRAWAL_TYPES: &[&str] = &["complete", "partial", "data-retention", "cultural-only"];
const VALIDATION_TYPES: &[&str] = &[
    "tikanga-compliance",
    "cultural-authority",
    "collective-impact",
    "sacred-knowledge",
];
const REPORT_TYPES: &[&str] = &[
    "individual",
    "collective",
    "cultural-compliance",
    "withdrawal-summary",
];

fn object_or_null(value: Option<&rmcp::model::JsonObject>) -> Value {
    value.map_or(Value::Null, |o| Value::Object(o.clone()))
}

/// Build the participant consent toolkit.
///
/// # Errors
///
/// Returns an error if a registration conflicts.
#[allow(clippy::too_many_lines)]
pub fn toolkit(audit: Arc<AuditLog>) -> Result<Toolkit, RegistryError> {
    let mut kit = Toolkit::new("true-review-participant-consent", "1.0.0");
    let reg = &mut kit.registry;

    let log = Arc::clone(&audit);
    reg.register_fn(
        "initiate_consent_process",
        "Begin culturally-informed consent process for new participant",
        SchemaDescriptor::new()
            .field(FieldSpec::string("participantId"))
            .field(FieldSpec::one_of("consentType", CONSENT_TYPES))
            .field(
                FieldSpec::object(
                    "culturalContext",
                    Some(
                        SchemaDescriptor::new()
                            .field(FieldSpec::string("iwi").optional())
                            .field(FieldSpec::string("culturalAdvisor").optional())
                            .field(FieldSpec::string_array("specialConsiderations").optional()),
                    ),
                )
                .optional(),
            ),
        move |args| {
            let a = Args(args);
            log.record(
                CONSENT_KIND,
                a.str("participantId"),
                json!({
                    "event": "initiated",
                    "consentType": a.str("consentType"),
                    "culturalContext": object_or_null(a.object("culturalContext")),
                }),
            );
            text(format!(
                "Consent process initiated for {}, type: {}.",
                a.str("participantId"),
                a.str("consentType"),
            ))
        },
    )?;

    let log = Arc::clone(&audit);
    reg.register_fn(
        "verify_ongoing_consent",
        "Check and update ongoing consent status",
        SchemaDescriptor::new()
            .field(FieldSpec::string("participantId"))
            .field(FieldSpec::one_of("checkInType", CHECK_IN_TYPES))
            .field(FieldSpec::one_of("consentStatus", CONSENT_STATUSES)),
        move |args| {
            let a = Args(args);
            log.record(
                CONSENT_KIND,
                a.str("participantId"),
                json!({
                    "event": "verified",
                    "checkInType": a.str("checkInType"),
                    "consentStatus": a.str("consentStatus"),
                }),
            );
            text(format!(
                "Verified ongoing consent for {} - status: {}.",
                a.str("participantId"),
                a.str("consentStatus"),
            ))
        },
    )?;

    let log = Arc::clone(&audit);
    reg.register_fn(
        "process_consent_withdrawal",
        "Handle consent withdrawal with cultural protocols",
        SchemaDescriptor::new()
            .field(FieldSpec::string("participantId"))
            .field(FieldSpec::one_of("withdrawalType", WITHDRAWAL_TYPES))
            .field(
                FieldSpec::object(
                    "dataHandling",
                    Some(
                        SchemaDescriptor::new()
                            .field(FieldSpec::boolean("deleteExisting").optional())
                            .field(FieldSpec::boolean("anonymizeData").optional())
                            .field(FieldSpec::boolean("culturalDataProtection").optional()),
                    ),
                )
                .optional(),
            ),
        move |args| {
            let a = Args(args);
            log.record(
                CONSENT_KIND,
                a.str("participantId"),
                json!({
                    "event": "withdrawal",
                    "withdrawalType": a.str("withdrawalType"),
                    "dataHandling": object_or_null(a.object("dataHandling")),
                }),
            );
            text(format!(
                "Consent withdrawal ({}) processing for {}.",
                a.str("withdrawalType"),
                a.str("participantId"),
            ))
        },
    )?;

    let log = Arc::clone(&audit);
    reg.register_fn(
        "validate_cultural_compliance",
        "Validate consent process against cultural protocols",
        SchemaDescriptor::new()
            .field(FieldSpec::string("participantId"))
            .field(FieldSpec::one_of("validationType", VALIDATION_TYPES))
            .field(FieldSpec::string("validatorId")),
        move |args| {
            let a = Args(args);
            log.record(
                CONSENT_KIND,
                a.str("participantId"),
                json!({
                    "event": "cultural_validation",
                    "validationType": a.str("validationType"),
                    "validatorId": a.str("validatorId"),
                }),
            );
            text(format!(
                "Cultural compliance validated for {}, type: {}.",
                a.str("participantId"),
                a.str("validationType"),
            ))
        },
    )?;

    reg.register_fn(
        "generate_consent_report",
        "Generate consent compliance and cultural alignment report",
        SchemaDescriptor::new()
            .field(FieldSpec::one_of("reportType", REPORT_TYPES))
            .field(
                FieldSpec::object(
                    "timeRange",
                    Some(
                        SchemaDescriptor::new()
                            .field(FieldSpec::string("startDate").optional())
                            .field(FieldSpec::string("endDate").optional()),
                    ),
                )
                .optional(),
            )
            .field(FieldSpec::boolean("includeMetadata").default(json!(false))),
        |args| text(format!("Consent report generated: {}.", Args(args).str("reportType"))),
    )?;

    kit.resources.register(
        "consent://templates",
        "Consent Form Templates",
        "Culturally-informed consent form templates",
        ResourceBody::Static(json!({ "consentTypes": CONSENT_TYPES })),
    )?;
    kit.resources.register(
        "consent://protocols",
        "Cultural Consent Protocols",
        "Indigenous methodology consent protocols",
        ResourceBody::Static(json!({
            "validationTypes": VALIDATION_TYPES,
            "checkInTypes": CHECK_IN_TYPES,
        })),
    )?;
    let log = Arc::clone(&audit);
    kit.resources.register(
        "consent://tracking",
        "Consent Status Tracking",
        "Active consent records and status monitoring",
        ResourceBody::Dynamic(Arc::new(move || {
            let records = log.snapshot(Some(CONSENT_KIND));
            json!({
                "total": records.len(),
                "records": records,
            })
        })),
    )?;
    kit.resources.register(
        "consent://withdrawal",
        "Withdrawal Procedures",
        "Cultural and legal withdrawal processes",
        ResourceBody::Static(json!({
            "withdrawalTypes": WITHDRAWAL_TYPES,
            "dataHandlingOptions": ["deleteExisting", "anonymizeData", "culturalDataProtection"],
        })),
    )?;

    Ok(kit)
}
