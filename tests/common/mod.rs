use octofhir_typeschema::*;
use serde_json::json;

#[allow(dead_code)]
pub const BLOOD_PRESSURE_URL: &str = "http://example.org/fhir/StructureDefinition/observation-bp";
#[allow(dead_code)]
pub const PATIENT_PROFILE_URL: &str = "http://example.org/fhir/StructureDefinition/patient-with-race";
#[allow(dead_code)]
pub const RACE_URL: &str = "http://example.org/fhir/StructureDefinition/patient-race";

#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[allow(dead_code)]
fn element(path: &str, min: u32, max: &str, code: &str) -> ElementDefinition {
    ElementDefinition::new(path)
        .with_cardinality(min, max)
        .with_base(path, min, max)
        .with_type(code)
}

#[allow(dead_code)]
pub fn create_patient_definition() -> StructureDefinition {
    let mut gender = element("Patient.gender", 0, "1", "code");
    gender.is_summary = Some(true);

    StructureDefinition::new("Patient", "Patient")
        .with_url("http://hl7.org/fhir/StructureDefinition/Patient")
        .with_kind("resource")
        .with_description("Base StructureDefinition for Patient Type: Demographics for an individual.")
        .with_elements(vec![
            ElementDefinition::new("Patient").with_cardinality(0, "*"),
            element("Patient.id", 0, "1", "id"),
            element("Patient.identifier", 0, "*", "Identifier"),
            ElementDefinition::new("Patient.name")
                .with_cardinality(0, "1")
                .with_base("Patient.name", 0, "*")
                .with_type("HumanName"),
            gender,
            element("Patient.contact", 0, "*", "BackboneElement")
                .with_definition("A contact party for the patient."),
            element("Patient.contact.name", 0, "1", "HumanName"),
            element("Patient.contact.telecom", 0, "*", "ContactPoint"),
            element("Patient.active", 1, "1", "boolean"),
        ])
}

/// Observation profile with `systolic` and `diastolic` component slices.
#[allow(dead_code)]
pub fn create_blood_pressure_definition() -> StructureDefinition {
    let component_slice = |name: &str, code: &str| {
        vec![
            ElementDefinition::new("Observation.component")
                .with_id(format!("Observation.component:{name}"))
                .with_slice_name(name)
                .with_cardinality(1, "1")
                .with_base("Observation.component", 0, "*")
                .with_type("BackboneElement"),
            element("Observation.component.code", 1, "1", "CodeableConcept")
                .with_id(format!("Observation.component:{name}.code"))
                .with_property(
                    "patternCodeableConcept",
                    json!({"coding": [{"system": "http://loinc.org", "code": code}]}),
                ),
            element("Observation.component.value[x]", 0, "1", "Quantity")
                .with_id(format!("Observation.component:{name}.value[x]")),
        ]
    };

    let mut elements = vec![
        ElementDefinition::new("Observation").with_cardinality(0, "*"),
        element("Observation.status", 1, "1", "code"),
        element("Observation.code", 1, "1", "CodeableConcept"),
        ElementDefinition::new("Observation.component")
            .with_cardinality(2, "*")
            .with_base("Observation.component", 0, "*")
            .with_type("BackboneElement")
            .with_slicing(&[("pattern", "code")], false, "open"),
        element("Observation.component.code", 1, "1", "CodeableConcept"),
        element("Observation.component.value[x]", 0, "1", "Quantity"),
    ];
    elements.extend(component_slice("systolic", "8480-6"));
    elements.extend(component_slice("diastolic", "8462-4"));
    elements.push(element("Observation.subject", 1, "1", "Reference"));

    StructureDefinition::new("observation-bp", "Observation")
        .with_url(BLOOD_PRESSURE_URL)
        .with_kind("resource")
        .with_elements(elements)
}

#[allow(dead_code)]
pub fn create_race_extension_definition() -> StructureDefinition {
    StructureDefinition::new("PatientRace", "Extension")
        .with_url(RACE_URL)
        .with_kind("complex-type")
        .with_elements(vec![
            ElementDefinition::new("Extension").with_cardinality(0, "*"),
            element("Extension.url", 1, "1", "uri").with_property("fixedUri", json!(RACE_URL)),
            element("Extension.value[x]", 0, "1", "Coding"),
        ])
}

/// Patient profile whose `extension` list carries one `race` slice; its
/// `modifierExtension` keeps only the default url slicing.
#[allow(dead_code)]
pub fn create_patient_profile_definition() -> StructureDefinition {
    StructureDefinition::new("patient-with-race", "Patient")
        .with_url(PATIENT_PROFILE_URL)
        .with_kind("resource")
        .with_elements(vec![
            ElementDefinition::new("Patient").with_cardinality(0, "*"),
            element("Patient.extension", 0, "*", "Extension")
                .with_slicing(&[("value", "url")], false, "open"),
            ElementDefinition::new("Patient.extension")
                .with_id("Patient.extension:race")
                .with_slice_name("race")
                .with_cardinality(0, "1")
                .with_base("Patient.extension", 0, "*")
                .with_profiled_type("Extension", RACE_URL),
            element("Patient.gender", 0, "1", "code"),
            element("Patient.modifierExtension", 0, "*", "Extension")
                .with_slicing(&[("value", "url")], false, "open"),
        ])
}

/// Questionnaire whose nested `item.item` refers back to `item`.
#[allow(dead_code)]
pub fn create_questionnaire_definition() -> StructureDefinition {
    StructureDefinition::new("Questionnaire", "Questionnaire")
        .with_kind("resource")
        .with_elements(vec![
            ElementDefinition::new("Questionnaire").with_cardinality(0, "*"),
            element("Questionnaire.item", 0, "*", "BackboneElement")
                .with_definition("A particular question or group."),
            element("Questionnaire.item.linkId", 1, "1", "string"),
            ElementDefinition::new("Questionnaire.item.item")
                .with_cardinality(0, "*")
                .with_base("Questionnaire.item.item", 0, "*")
                .with_content_reference("#Questionnaire.item")
                .with_definition("Nested questionnaire items."),
            element("Questionnaire.status", 1, "1", "code"),
        ])
}

#[allow(dead_code)]
pub fn create_registry() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    registry.load(&create_patient_definition()).unwrap();
    registry.load(&create_questionnaire_definition()).unwrap();
    registry.load_profile(&create_blood_pressure_definition()).unwrap();
    registry.load_profile(&create_race_extension_definition()).unwrap();
    registry.load_profile(&create_patient_profile_definition()).unwrap();
    registry
}

/// Records every visitor callback as a flat event string.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<String>,
    pub profile_urls: Vec<(String, Option<String>)>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entered_elements(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| event.strip_prefix("enter-element "))
            .collect()
    }
}

impl SchemaVisitor for EventLog {
    fn on_enter_schema(&mut self, schema: &InternalTypeSchema) {
        self.events.push(format!("enter-schema {}", schema.name));
    }

    fn on_exit_schema(&mut self, schema: &InternalTypeSchema) {
        self.events.push(format!("exit-schema {}", schema.name));
    }

    fn on_enter_element(&mut self, path: &str, _element: &InternalSchemaElement, context: &ElementsContext) {
        self.events.push(format!("enter-element {path}"));
        self.profile_urls
            .push((path.to_string(), context.profile_url.clone()));
    }

    fn on_exit_element(&mut self, path: &str, _element: &InternalSchemaElement, _context: &ElementsContext) {
        self.events.push(format!("exit-element {path}"));
    }

    fn on_enter_slice(&mut self, path: &str, slice: &SliceDefinition, _slicing: &SlicingRules) {
        self.events.push(format!("enter-slice {path}:{}", slice.name));
    }

    fn on_exit_slice(&mut self, path: &str, slice: &SliceDefinition, _slicing: &SlicingRules) {
        self.events.push(format!("exit-slice {path}:{}", slice.name));
    }
}
