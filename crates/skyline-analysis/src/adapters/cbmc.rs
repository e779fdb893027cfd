//! CBMC adapter: `cbmc --xml-ui` bounded model checking.
//!
//! Exit code 10 means "violations found" and is a clean run. The XML carries
//! one `result`/`property` element per checked property with a status
//! attribute, a nested description, and a source location.

use std::collections::BTreeMap;
use std::time::Duration;

use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;
use serde_json::Value;

use skyline_core::errors::MapError;
use skyline_core::model::{CorrelationHints, EntityKind, IssueBuilder, UnifiedEntity};
use skyline_core::taxonomy::{AnalysisCategory, Severity};
use skyline_core::FxHashMap;

use crate::orchestrator::detect::ProjectIndicators;

use super::{MapContext, Mapped, RawRun, ToolAdapter};

pub struct CbmcAdapter;

#[derive(Debug, Default)]
struct PropertyRecord {
    name: String,
    status: String,
    description: String,
    file: Option<String>,
    line: Option<u32>,
}

impl ToolAdapter for CbmcAdapter {
    fn name(&self) -> &'static str {
        "cbmc"
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::FormalVerification
    }

    fn run_args(&self, ctx: &MapContext) -> Vec<String> {
        let mut args = vec![
            "--xml-ui".to_string(),
            "--bounds-check".to_string(),
            "--pointer-check".to_string(),
        ];
        args.extend(ctx.indicators.c_sources.iter().cloned());
        args
    }

    // 10 = property violations found; still a finished analysis. Every
    // other non-zero code is a failed run.
    fn clean_exit_codes(&self) -> &'static [i32] {
        &[0, 10]
    }

    fn env_additions(&self) -> Vec<(String, String)> {
        // CBMC_MAX_MEMORY is the one host knob that may pass through.
        match std::env::var("CBMC_MAX_MEMORY") {
            Ok(v) => vec![("CBMC_MAX_MEMORY".to_string(), v)],
            Err(_) => Vec::new(),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(600)
    }

    fn applies_to(&self, indicators: &ProjectIndicators) -> bool {
        indicators.has_language("c") || indicators.has_language("cpp")
    }

    fn required_metadata(&self) -> &'static [&'static str] {
        &["verification_type"]
    }

    fn map(&self, raw: &RawRun, ctx: &MapContext) -> Result<Mapped, MapError> {
        let properties = parse_properties(&raw.stdout)
            .map_err(|e| MapError::parse(self.name(), e))?;

        let mut mapped = Mapped::default();
        let mut entities: FxHashMap<String, UnifiedEntity> = FxHashMap::default();
        let mut ordinals: FxHashMap<String, u32> = FxHashMap::default();

        let mut failed: Vec<&PropertyRecord> = properties
            .iter()
            .filter(|p| p.status.eq_ignore_ascii_case("FAILURE"))
            .collect();
        failed.sort_by(|a, b| (&a.file, a.line, &a.name).cmp(&(&b.file, b.line, &b.name)));

        for prop in failed {
            let file = match &prop.file {
                Some(f) => f,
                None => {
                    tracing::warn!(property = %prop.name, "failed property without location dropped");
                    continue;
                }
            };

            let canonical = ctx.canon.normalize(file);
            let entity = match entities.get(&canonical) {
                Some(e) => e.clone(),
                None => {
                    let name = canonical.rsplit('/').next().unwrap_or(&canonical);
                    let entity = UnifiedEntity::build(
                        EntityKind::File,
                        name,
                        &canonical,
                        file,
                        self.name(),
                        1.0,
                    )
                    .map_err(|e| MapError::parse(self.name(), e.to_string()))?;
                    entities.insert(canonical.clone(), entity.clone());
                    entity
                }
            };

            let rule = strip_property_index(&prop.name);
            let title = if prop.description.is_empty() {
                format!("Verification failure: {rule}")
            } else {
                prop.description.clone()
            };

            let mut metadata = BTreeMap::new();
            metadata.insert(
                "verification_type".to_string(),
                Value::from("bounded-model-checking"),
            );
            metadata.insert("property".to_string(), Value::from(prop.name.clone()));

            let location = prop.line.filter(|l| *l >= 1);
            let column = location.map(|_| 1);

            let ordinal = ordinals.entry(entity.id.clone()).or_insert(0);
            let built = IssueBuilder::new(&entity, self.category(), self.name())
                .severity(Severity::High)
                .title(&title)
                .description(&format!("CBMC property {} failed: {title}", prop.name))
                .rule_id(rule)
                .location_parts(location, column, location, column)
                .metadata(metadata)
                .hints(CorrelationHints::with_patterns(&["memory_safety"]))
                .ordinal(*ordinal)
                .build();
            match built {
                Ok(issue) => {
                    *ordinal += 1;
                    mapped.issues.push(issue);
                }
                Err(e) => {
                    tracing::warn!(tool = self.name(), property = %prop.name, error = %e, "malformed property record dropped");
                }
            }
        }

        let mut ordered: Vec<UnifiedEntity> = entities.into_values().collect();
        ordered.sort_by(|a, b| a.canonical_path.cmp(&b.canonical_path));
        mapped.entities = ordered;

        mapped.run_extra.insert(
            "properties_checked".to_string(),
            Value::from(properties.len()),
        );

        Ok(mapped)
    }
}

/// Event-driven parse of the CBMC XML document. Accepts both the modern
/// `<result property=… status=…>` shape and the older `<property name=…>`.
fn parse_properties(xml: &str) -> Result<Vec<PropertyRecord>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut properties = Vec::new();
    let mut current: Option<PropertyRecord> = None;
    let mut in_description = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let attrs = parse_attrs(e);

                match tag.as_str() {
                    "result" | "property" => {
                        current = Some(record_from_attrs(&attrs));
                    }
                    "description" => {
                        in_description = current.is_some();
                    }
                    "location" => apply_location(&mut current, &attrs),
                    _ => {}
                }
            }
            // Self-closing elements never see a matching End event, so any
            // record they carry must be finished on the spot.
            Ok(XmlEvent::Empty(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let attrs = parse_attrs(e);

                match tag.as_str() {
                    "result" | "property" => {
                        properties.push(record_from_attrs(&attrs));
                    }
                    "location" => apply_location(&mut current, &attrs),
                    _ => {}
                }
            }
            Ok(XmlEvent::Text(ref t)) => {
                if in_description {
                    if let Some(ref mut prop) = current {
                        if prop.description.is_empty() {
                            prop.description =
                                String::from_utf8_lossy(t.as_ref()).trim().to_string();
                        }
                    }
                }
            }
            Ok(XmlEvent::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag.as_str() {
                    "description" => in_description = false,
                    "result" | "property" => {
                        if let Some(prop) = current.take() {
                            properties.push(prop);
                        }
                    }
                    _ => {}
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {e}")),
            _ => {}
        }
        buf.clear();
    }

    Ok(properties)
}

fn record_from_attrs(attrs: &FxHashMap<String, String>) -> PropertyRecord {
    PropertyRecord {
        name: attrs
            .get("property")
            .or_else(|| attrs.get("name"))
            .cloned()
            .unwrap_or_default(),
        status: attrs.get("status").cloned().unwrap_or_default(),
        ..Default::default()
    }
}

// First location wins: it names the violating source line, later ones
// belong to the trace.
fn apply_location(current: &mut Option<PropertyRecord>, attrs: &FxHashMap<String, String>) {
    if let Some(prop) = current {
        if prop.file.is_none() {
            prop.file = attrs.get("file").cloned();
            prop.line = attrs.get("line").and_then(|l| l.parse::<u32>().ok());
        }
    }
}

fn parse_attrs(e: &quick_xml::events::BytesStart) -> FxHashMap<String, String> {
    let mut attrs = FxHashMap::default();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = String::from_utf8_lossy(&attr.value).to_string();
        attrs.insert(key, value);
    }
    attrs
}

/// `main.bounds-check.1` → `bounds-check`; bare names pass through.
fn strip_property_index(name: &str) -> &str {
    let without_index = match name.rsplit_once('.') {
        Some((head, tail)) if tail.chars().all(|c| c.is_ascii_digit()) => head,
        _ => name,
    };
    match without_index.rsplit_once('.') {
        Some((_, tail)) => tail,
        None => without_index,
    }
}
