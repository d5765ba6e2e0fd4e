//! Static consistency checks over a PMU's event table
//!
//! Every check runs and every defect is reported, so a table author sees
//! the whole list at once. A descriptor that fails is never registered.

use std::collections::HashSet;

use pmuflow_raw::{FieldSpec, MAX_REGISTERS};

use crate::error::ValidationError;
use crate::events::Event;
use crate::pmu::PmuDescriptor;

/// Validate `pmu`'s layout and event table
pub fn validate(pmu: &PmuDescriptor) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_descriptor(pmu, &mut errors);
    check_layout(pmu, &mut errors);
    check_events(pmu, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn empty(what: String) -> ValidationError {
    ValidationError::EmptyDescription { what }
}

fn check_descriptor(pmu: &PmuDescriptor, errors: &mut Vec<ValidationError>) {
    if pmu.description.trim().is_empty() {
        errors.push(empty(format!("PMU {}", pmu.name)));
    }
    if pmu.events.is_empty() {
        errors.push(ValidationError::EmptyTable);
    }
    if pmu.layout.max_encoding == 0 || pmu.layout.max_encoding > MAX_REGISTERS {
        errors.push(ValidationError::BadCapacity {
            max_encoding: pmu.layout.max_encoding,
            limit: MAX_REGISTERS,
        });
    }
    for m in pmu.modifiers {
        if m.description.trim().is_empty() {
            errors.push(empty(format!("modifier {}", m.name())));
        }
    }
}

/// Every named field of the layout: code pieces, umask, bound modifiers
fn layout_fields(pmu: &PmuDescriptor) -> Vec<(String, FieldSpec)> {
    let mut fields: Vec<(String, FieldSpec)> = pmu
        .layout
        .code
        .iter()
        .enumerate()
        .map(|(i, f)| (format!("code[{i}]"), *f))
        .collect();

    fields.push(("umask".to_string(), pmu.layout.umask));
    fields.extend(
        pmu.modifiers
            .iter()
            .filter_map(|m| m.field.map(|f| (format!("modifier {}", m.name()), f))),
    );
    fields
}

fn check_layout(pmu: &PmuDescriptor, errors: &mut Vec<ValidationError>) {
    let mut sane = Vec::new();
    for (name, field) in layout_fields(pmu) {
        match field.check() {
            Ok(()) => sane.push((name, field)),
            Err(source) => errors.push(ValidationError::FieldGeometry {
                field: name,
                source,
            }),
        }
    }

    for (i, (first, a)) in sane.iter().enumerate() {
        if a.target.index() == 0 && a.mask() & pmu.layout.fixed_bits != 0 {
            errors.push(ValidationError::FieldOverlap {
                first: first.clone(),
                second: "fixed bits".to_string(),
            });
        }
        for (second, b) in &sane[i + 1..] {
            if a.overlaps(b) {
                errors.push(ValidationError::FieldOverlap {
                    first: first.clone(),
                    second: second.clone(),
                });
            }
        }
    }
}

fn check_events(pmu: &PmuDescriptor, errors: &mut Vec<ValidationError>) {
    let code_field = pmu.layout.code_field();
    let known = pmu.modifier_set();
    let mut names = HashSet::new();

    for (i, event) in pmu.events.iter().enumerate() {
        if !names.insert(event.name.to_ascii_uppercase()) {
            errors.push(ValidationError::DuplicateEvent {
                name: event.name.to_string(),
            });
        }
        if event.description.trim().is_empty() {
            errors.push(empty(format!("event {}", event.name)));
        }
        if !code_field.fits(event.code) {
            errors.push(ValidationError::CodeOverflow {
                event: event.name.to_string(),
                code: event.code,
                width: code_field.width(),
            });
        }

        let unknown = event.modifiers.difference(known);
        let mut unknown_names: Vec<String> =
            unknown.ids().map(|id| id.name().to_string()).collect();
        if unknown.unknown_bits() != 0 {
            unknown_names.push(format!("{:#x}", unknown.unknown_bits()));
        }
        for modifier in unknown_names {
            errors.push(ValidationError::UnknownModifier {
                event: event.name.to_string(),
                modifier,
            });
        }

        check_umasks(pmu, event, errors);

        if !event.umasks.is_empty() {
            for other in &pmu.events[..i] {
                if std::ptr::eq(other.umasks, event.umasks) {
                    errors.push(ValidationError::SharedUmasks {
                        first: other.name.to_string(),
                        second: event.name.to_string(),
                    });
                }
            }
        }
    }
}

fn check_umasks(pmu: &PmuDescriptor, event: &Event, errors: &mut Vec<ValidationError>) {
    let field = pmu.layout.umask;
    let mut names = HashSet::new();

    for (i, umask) in event.umasks.iter().enumerate() {
        if !names.insert(umask.name.to_ascii_uppercase()) {
            errors.push(ValidationError::DuplicateUmask {
                event: event.name.to_string(),
                umask: umask.name.to_string(),
            });
        }
        if umask.description.trim().is_empty() {
            errors.push(empty(format!("umask {}:{}", event.name, umask.name)));
        }
        if !field.fits(umask.value) {
            errors.push(ValidationError::UmaskOverflow {
                event: event.name.to_string(),
                umask: umask.name.to_string(),
                value: umask.value,
                width: field.width as u32,
            });
        }

        for other in &event.umasks[i + 1..] {
            let exclusive = umask.excludes(other);
            if !exclusive && umask.value & other.value != 0 {
                errors.push(ValidationError::UmaskOverlap {
                    event: event.name.to_string(),
                    first: umask.name.to_string(),
                    second: other.name.to_string(),
                });
            }
            if exclusive && umask.is_default() && other.is_default() {
                errors.push(ValidationError::MultipleDefaults {
                    event: event.name.to_string(),
                    group: umask.group,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ModifierId, ModifierSet, Umask};
    use crate::testing;

    fn errors_for(events: &'static [Event]) -> Vec<ValidationError> {
        validate(&testing::with_events(events)).unwrap_err()
    }

    #[test]
    fn test_fixtures_are_valid() {
        assert!(validate(&testing::rev_b()).is_ok());
        assert!(validate(&testing::rev_c()).is_ok());
        assert!(validate(&testing::aux_pmu()).is_ok());
    }

    #[test]
    fn test_duplicate_event_names() {
        static EVENTS: [Event; 2] = [
            Event::new("CYCLES", 0x76, "cycles"),
            Event::new("cycles", 0x77, "more cycles"),
        ];
        assert_eq!(
            errors_for(&EVENTS),
            vec![ValidationError::DuplicateEvent {
                name: "cycles".to_string()
            }]
        );
    }

    #[test]
    fn test_code_overflow() {
        static EVENTS: [Event; 1] = [Event::new("WIDE", 0x100, "too wide for 8 bits")];
        assert_eq!(
            errors_for(&EVENTS),
            vec![ValidationError::CodeOverflow {
                event: "WIDE".to_string(),
                code: 0x100,
                width: 8
            }]
        );
    }

    #[test]
    fn test_umask_overlap_and_overflow() {
        static UMASKS: [Umask; 3] = [
            Umask::new("A", 0x3, "a"),
            Umask::new("B", 0x2, "b"),
            Umask::new("HUGE", 0x100, "does not fit"),
        ];
        static EVENTS: [Event; 1] = [Event::new("E", 0x10, "e").with_umasks(&UMASKS)];

        let errors = errors_for(&EVENTS);
        assert!(errors.contains(&ValidationError::UmaskOverlap {
            event: "E".to_string(),
            first: "A".to_string(),
            second: "B".to_string(),
        }));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::UmaskOverflow { umask, .. } if umask == "HUGE"
        )));
    }

    #[test]
    fn test_exclusive_umasks_may_overlap() {
        static UMASKS: [Umask; 4] = [
            Umask::new("A", 0x3, "a").in_group(0),
            Umask::new("B", 0x2, "b").in_group(0),
            Umask::new("C", 0x4, "c"),
            Umask::new("ALL", 0x7, "all").no_combo(),
        ];
        static EVENTS: [Event; 1] = [Event::new("E", 0x10, "e").with_umasks(&UMASKS)];
        assert!(validate(&testing::with_events(&EVENTS)).is_ok());
    }

    #[test]
    fn test_shared_umask_table() {
        static SHARED: [Umask; 1] = [Umask::new("A", 0x1, "a")];
        static EVENTS: [Event; 2] = [
            Event::new("E1", 0x10, "e1").with_umasks(&SHARED),
            Event::new("E2", 0x11, "e2").with_umasks(&SHARED),
        ];
        assert_eq!(
            errors_for(&EVENTS),
            vec![ValidationError::SharedUmasks {
                first: "E1".to_string(),
                second: "E2".to_string()
            }]
        );
    }

    #[test]
    fn test_duplicate_umask_and_defaults() {
        static UMASKS: [Umask; 3] = [
            Umask::new("X", 0x1, "x").in_group(1).as_default(),
            Umask::new("Y", 0x2, "y").in_group(1).as_default(),
            Umask::new("x", 0x4, "dup"),
        ];
        static EVENTS: [Event; 1] = [Event::new("E", 0x10, "e").with_umasks(&UMASKS)];

        let errors = errors_for(&EVENTS);
        assert!(errors.contains(&ValidationError::MultipleDefaults {
            event: "E".to_string(),
            group: Some(1)
        }));
        assert!(errors.contains(&ValidationError::DuplicateUmask {
            event: "E".to_string(),
            umask: "x".to_string()
        }));
    }

    #[test]
    fn test_unknown_modifier_and_empty_description() {
        static EVENTS: [Event; 1] = [Event::new("E", 0x10, "")
            .with_modifiers(ModifierSet::from_bits_retain(1 << 31))];

        let errors = errors_for(&EVENTS);
        assert!(errors.contains(&ValidationError::EmptyDescription {
            what: "event E".to_string()
        }));
        assert!(errors.contains(&ValidationError::UnknownModifier {
            event: "E".to_string(),
            modifier: "0x80000000".to_string()
        }));
    }

    #[test]
    fn test_modifier_outside_pmu_subset() {
        // The test PMU does not honour host/guest
        static EVENTS: [Event; 1] = [Event::new("E", 0x10, "e")
            .with_modifiers(ModifierSet::of(&[ModifierId::User, ModifierId::Host]))];
        assert_eq!(
            errors_for(&EVENTS),
            vec![ValidationError::UnknownModifier {
                event: "E".to_string(),
                modifier: "h".to_string()
            }]
        );
    }

    #[test]
    fn test_layout_overlap_and_capacity() {
        let mut pmu = testing::rev_b();
        pmu.layout.umask = FieldSpec::primary(4, 8);
        pmu.layout.max_encoding = 0;

        let errors = validate(&pmu).unwrap_err();
        assert!(errors.contains(&ValidationError::FieldOverlap {
            first: "code[0]".to_string(),
            second: "umask".to_string(),
        }));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::BadCapacity { .. })));
    }

    #[test]
    fn test_empty_table() {
        static EVENTS: [Event; 0] = [];
        assert_eq!(errors_for(&EVENTS), vec![ValidationError::EmptyTable]);
    }
}
