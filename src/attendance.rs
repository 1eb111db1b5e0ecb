//! Attendance tasks: a person-centred task whose description carries a
//! structured block after the free text.
//!
//! ```text
//! <free text>
//!
//! ════════════════════════════════════════
//! 📋 DADOS DO ATENDIMENTO
//! ════════════════════════════════════════
//! 📂 Categoria: Benefícios
//!
//! 👤 DADOS DO COLABORADOR:
//!    Telefone: (14) 99999-0000
//!    Diretoria: Administrativa
//!    Cargo: Analista
//!    E-mail: maria@example.com
//! ════════════════════════════════════════
//! ```

use serde::Serialize;

use crate::directory::Person;

const RULE_CHAR: char = '═';
const RULE_WIDTH: usize = 40;
const ATTENDANCE_HEADER: &str = "📋 DADOS DO ATENDIMENTO";
const PERSON_HEADER: &str = "👤 DADOS DO COLABORADOR:";
const SUBCATEGORY_PREFIX: &str = "📂 Categoria:";

/// Who the attendance is about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attendee {
    pub name: String,
    /// Empty for people outside the directory
    pub matricula: String,
    pub phone: String,
    pub department: String,
    pub title: String,
    pub email: String,
}

impl From<Person> for Attendee {
    fn from(person: Person) -> Self {
        Self {
            name: person.name,
            matricula: person.matricula,
            phone: person.phone,
            department: person.department,
            title: person.title,
            email: person.email,
        }
    }
}

/// `"{name} (Mat: {id}) - {title}"`, dropping the parts that are empty.
pub fn compose_title(attendee: Option<&Attendee>, title: &str) -> String {
    let title = title.trim();
    let Some(person) = attendee.filter(|a| !a.name.trim().is_empty()) else {
        return title.to_string();
    };

    let mut out = person.name.trim().to_string();
    let matricula = person.matricula.trim();
    if !matricula.is_empty() {
        out.push_str(&format!(" (Mat: {matricula})"));
    }
    if !title.is_empty() {
        out.push_str(" - ");
        out.push_str(title);
    }
    out
}

/// Append the structured block to `base`.
pub fn compose_description(base: &str, subcategory: &str, attendee: Option<&Attendee>) -> String {
    let rule: String = std::iter::repeat(RULE_CHAR).take(RULE_WIDTH).collect();
    let mut lines = vec![
        rule.clone(),
        ATTENDANCE_HEADER.to_string(),
        rule.clone(),
        format!("{SUBCATEGORY_PREFIX} {}", subcategory.trim()),
    ];

    if let Some(person) = attendee.filter(|a| !a.name.trim().is_empty()) {
        lines.push(String::new());
        lines.push(PERSON_HEADER.to_string());
        lines.push(format!("   Telefone: {}", or_dash(&person.phone)));
        if !person.department.trim().is_empty() {
            lines.push(format!("   Diretoria: {}", person.department.trim()));
        }
        if !person.title.trim().is_empty() {
            lines.push(format!("   Cargo: {}", person.title.trim()));
        }
        lines.push(format!("   E-mail: {}", or_dash(&person.email)));
    }
    lines.push(rule);

    let block = lines.join("\n");
    let base = base.trim();
    if base.is_empty() {
        block
    } else {
        format!("{base}\n\n{block}")
    }
}

fn or_dash(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Free text before the structured block
    Notes,
    Attendance,
    Person,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub items: Vec<String>,
}

/// Parsed form of a description carrying the structured block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceView {
    pub subcategory: Option<String>,
    pub sections: Vec<Section>,
}

/// Recover the sections of a description, or `None` when it has no
/// structured block.
pub fn parse_sections(description: &str) -> Option<AttendanceView> {
    if !description.contains("DADOS DO COLABORADOR") && !description.contains("DADOS DO ATENDIMENTO")
    {
        return None;
    }

    let mut view = AttendanceView {
        subcategory: None,
        sections: Vec::new(),
    };
    let mut current = Section {
        kind: SectionKind::Notes,
        items: Vec::new(),
    };

    for line in description.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(RULE_CHAR) {
            continue;
        }
        let upper = line.to_uppercase();
        let next_kind = if line.contains('📋') && upper.contains("DADOS") {
            Some(SectionKind::Attendance)
        } else if line.contains('👤') && upper.contains("DADOS") {
            Some(SectionKind::Person)
        } else {
            None
        };

        if let Some(kind) = next_kind {
            let finished = std::mem::replace(
                &mut current,
                Section {
                    kind,
                    items: Vec::new(),
                },
            );
            if !finished.items.is_empty() {
                view.sections.push(finished);
            }
        } else if let Some(subcategory) = line.strip_prefix(SUBCATEGORY_PREFIX) {
            view.subcategory = Some(subcategory.trim().to_string());
        } else {
            current
                .items
                .push(line.trim_start_matches('•').trim().to_string());
        }
    }
    if !current.items.is_empty() {
        view.sections.push(current);
    }
    Some(view)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maria() -> Attendee {
        Attendee {
            name: "Maria Souza".into(),
            matricula: "12345".into(),
            phone: "(14) 99999-0000".into(),
            department: "Administrativa".into(),
            title: String::new(),
            email: String::new(),
        }
    }

    #[test]
    fn title_includes_name_and_registration() {
        assert_eq!(
            compose_title(Some(&maria()), " Dúvida sobre férias "),
            "Maria Souza (Mat: 12345) - Dúvida sobre férias"
        );

        let mut external = maria();
        external.matricula.clear();
        assert_eq!(compose_title(Some(&external), ""), "Maria Souza");
        assert_eq!(compose_title(None, "Só título"), "Só título");
    }

    #[test]
    fn description_block_layout() {
        let text = compose_description("Ligou pedindo informações.", "Benefícios", Some(&maria()));
        let rule = "═".repeat(40);
        let expected = format!(
            "Ligou pedindo informações.\n\n{rule}\n📋 DADOS DO ATENDIMENTO\n{rule}\n📂 Categoria: Benefícios\n\n👤 DADOS DO COLABORADOR:\n   Telefone: (14) 99999-0000\n   Diretoria: Administrativa\n   E-mail: -\n{rule}"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn sections_round_trip() {
        let text = compose_description("Ligou pedindo informações.", "Benefícios", Some(&maria()));
        let view = parse_sections(&text).expect("structured");
        assert_eq!(view.subcategory.as_deref(), Some("Benefícios"));
        assert_eq!(view.sections.len(), 2);
        assert_eq!(view.sections[0].kind, SectionKind::Notes);
        assert_eq!(view.sections[1].kind, SectionKind::Person);
        assert_eq!(
            view.sections[1].items,
            vec![
                "Telefone: (14) 99999-0000".to_string(),
                "Diretoria: Administrativa".to_string(),
                "E-mail: -".to_string(),
            ]
        );
    }

    #[test]
    fn plain_descriptions_are_not_parsed() {
        assert!(parse_sections("Apenas texto livre").is_none());
    }
}
