mod common;

use common::*;
use octofhir_typeschema::*;
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_load_registers_root_and_inner_types() {
    let registry = SchemaRegistry::new();
    let schema = registry.load(&create_patient_definition()).unwrap();

    assert_eq!(schema.name, "Patient");
    assert!(registry.is_loaded("Patient"));
    assert!(registry.is_loaded("PatientContact"));
    assert_eq!(registry.names(), vec!["Patient", "PatientContact"]);
    assert_eq!(registry.len(), 2);

    let contact = registry.get("PatientContact").unwrap();
    assert_eq!(contact.parent_type.as_deref(), Some("Patient"));
    assert!(registry.is_resource_type("Patient"));
    assert!(!registry.is_resource_type("PatientContact"));
}

#[test]
fn test_get_returns_shared_schema() {
    let registry = SchemaRegistry::new();
    let loaded = registry.load(&create_patient_definition()).unwrap();
    let fetched = registry.get("Patient").unwrap();
    assert!(Arc::ptr_eq(&loaded, &fetched));
}

#[test]
fn test_last_write_wins() {
    let registry = SchemaRegistry::new();
    registry.load(&create_patient_definition()).unwrap();

    let replacement = StructureDefinition::new("Patient", "Patient").with_elements(vec![
        ElementDefinition::new("Patient"),
        ElementDefinition::new("Patient.birthDate").with_type("date"),
    ]);
    registry.load(&replacement).unwrap();

    let patient = registry.get("Patient").unwrap();
    assert!(patient.element("birthDate").is_some());
    assert!(patient.element("gender").is_none());
}

#[test]
fn test_missing_type_is_not_found() {
    let registry = SchemaRegistry::new();
    let error = registry.get("Nope").unwrap_err();
    assert!(error.is_not_found());
    assert!(!error.is_conversion());
    assert!(matches!(
        error,
        TypeSchemaError::NotFound {
            kind: LookupKind::DataType,
            ..
        }
    ));

    let error = registry.get_profile("http://example.org/missing").unwrap_err();
    assert!(matches!(
        error,
        TypeSchemaError::NotFound {
            kind: LookupKind::Profile,
            ..
        }
    ));
}

#[test]
fn test_failed_conversion_registers_nothing() {
    let registry = SchemaRegistry::new();
    let error = registry
        .load(&StructureDefinition::new("Empty", "Empty"))
        .unwrap_err();
    assert!(error.is_conversion());
    assert!(registry.is_empty());
    assert!(registry.get("Empty").unwrap_err().is_not_found());
}

#[test]
fn test_profiles_live_in_their_own_namespace() {
    let registry = SchemaRegistry::new();
    registry.load(&create_patient_definition()).unwrap();
    let profile = registry
        .load_profile(&create_patient_profile_definition())
        .unwrap();

    assert!(registry.is_profile_loaded(PATIENT_PROFILE_URL));
    assert!(Arc::ptr_eq(
        &registry.get_profile(PATIENT_PROFILE_URL).unwrap(),
        &profile
    ));

    // The base namespace only knows what was loaded without a profile
    assert!(!registry.is_loaded("patient-with-race"));
    assert!(registry
        .try_get("patient-with-race", Some(PATIENT_PROFILE_URL))
        .is_some());
    // Profile lookups fall back to base types
    let patient = registry.try_get("Patient", Some(PATIENT_PROFILE_URL)).unwrap();
    assert_eq!(patient.name, "Patient");

    let stats = registry.stats();
    assert_eq!(stats.profiles, 1);
    assert_eq!(stats.profile_namespaces, 1);
}

#[test]
fn test_index_bundle_skips_other_resources() {
    init_tracing();
    let registry = SchemaRegistry::new();
    let bundle = json!({
        "resourceType": "Bundle",
        "entry": [
            {"resource": serde_json::to_value(create_patient_definition()).unwrap()},
            {"resource": {"resourceType": "SearchParameter", "name": "gender"}},
            {"resource": serde_json::to_value(create_questionnaire_definition()).unwrap()},
            {}
        ]
    });

    let loaded = registry.index_bundle_json(bundle, None).unwrap();
    assert_eq!(loaded, 2);
    assert!(registry.is_loaded("Patient"));
    assert!(registry.is_loaded("QuestionnaireItem"));
}

#[test]
fn test_index_bundle_json_accepts_arrays() {
    let registry = SchemaRegistry::new();
    let definitions = json!([
        serde_json::to_value(create_race_extension_definition()).unwrap(),
    ]);
    let loaded = registry.index_bundle_json(definitions, Some(RACE_URL)).unwrap();
    assert_eq!(loaded, 1);
    assert!(registry.is_profile_loaded(RACE_URL));
}

#[test]
fn test_index_definitions_stops_at_first_failure() {
    let registry = SchemaRegistry::new();
    let definitions = vec![
        create_patient_definition(),
        StructureDefinition::new("Empty", "Empty"),
        create_questionnaire_definition(),
    ];

    let error = registry.index_definitions(&definitions, None).unwrap_err();
    assert!(error.is_conversion());
    assert!(registry.is_loaded("Patient"));
    assert!(!registry.is_loaded("Questionnaire"));
}

#[test]
fn test_registry_uses_compiler_half_of_full_config() {
    let config = TypeSchemaConfig::default()
        .with_compiler_config(CompilerConfig::default().with_extension_slicing_elision(false));
    let registry = SchemaRegistry::from_config(&config);
    let schema = registry
        .load_profile(&create_patient_profile_definition())
        .unwrap();

    let modifier = schema.element("modifierExtension").unwrap();
    assert!(modifier.slicing.as_ref().unwrap().slices.is_empty());
}

#[test]
fn test_concurrent_reads() {
    let registry = Arc::new(create_registry());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    assert!(registry.get("Patient").is_ok());
                    assert!(registry.try_get_profile(BLOOD_PRESSURE_URL).is_some());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
