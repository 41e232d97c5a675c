use criterion::{Criterion, criterion_group, criterion_main};
use octofhir_typeschema::*;
use std::hint::black_box;

const PROFILE_URL: &str = "http://example.org/fhir/StructureDefinition/bench-observation";

fn create_large_definition() -> StructureDefinition {
    let mut elements = vec![
        ElementDefinition::new("Observation").with_cardinality(0, "*"),
        ElementDefinition::new("Observation.component")
            .with_cardinality(0, "*")
            .with_base("Observation.component", 0, "*")
            .with_type("BackboneElement")
            .with_slicing(&[("pattern", "code")], false, "open"),
        ElementDefinition::new("Observation.component.code")
            .with_cardinality(1, "1")
            .with_type("CodeableConcept"),
    ];

    for i in 0..20 {
        elements.push(
            ElementDefinition::new("Observation.component")
                .with_id(format!("Observation.component:slice{i}"))
                .with_slice_name(format!("slice{i}"))
                .with_type("BackboneElement"),
        );
        elements.push(
            ElementDefinition::new("Observation.component.code")
                .with_id(format!("Observation.component:slice{i}.code"))
                .with_cardinality(1, "1")
                .with_type("CodeableConcept"),
        );
    }

    // Sorted after `component` so the slicing closes before them
    for i in 0..100 {
        elements.push(
            ElementDefinition::new(format!("Observation.field{i}"))
                .with_cardinality(0, "1")
                .with_type("string"),
        );
    }

    StructureDefinition::new("bench-observation", "Observation")
        .with_url(PROFILE_URL)
        .with_kind("resource")
        .with_elements(elements)
}

#[derive(Default)]
struct CountingVisitor {
    elements: usize,
    slices: usize,
}

impl SchemaVisitor for CountingVisitor {
    fn on_enter_element(&mut self, _path: &str, _element: &InternalSchemaElement, _context: &ElementsContext) {
        self.elements += 1;
    }

    fn on_enter_slice(&mut self, _path: &str, _slice: &SliceDefinition, _slicing: &SlicingRules) {
        self.slices += 1;
    }
}

fn bench_compile(c: &mut Criterion) {
    let definition = create_large_definition();

    c.bench_function("compile_structure_definition", |b| {
        b.iter(|| black_box(parse_structure_definition(&definition)).unwrap())
    });
}

fn bench_crawl(c: &mut Criterion) {
    let registry = SchemaRegistry::new();
    let schema = registry.load_profile(&create_large_definition()).unwrap();

    c.bench_function("crawl_resource", |b| {
        b.iter(|| {
            let mut visitor = CountingVisitor::default();
            SchemaCrawler::new(schema.clone(), &registry, &mut visitor)
                .unwrap()
                .crawl_resource()
                .unwrap();
            black_box((visitor.elements, visitor.slices))
        })
    });
}

fn bench_registry_lookup(c: &mut Criterion) {
    let registry = SchemaRegistry::new();
    registry.load_profile(&create_large_definition()).unwrap();

    c.bench_function("registry_profile_lookup", |b| {
        b.iter(|| black_box(registry.try_get_profile(PROFILE_URL)))
    });
}

criterion_group!(benches, bench_compile, bench_crawl, bench_registry_lookup);
criterion_main!(benches);
