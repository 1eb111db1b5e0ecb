//! flow directory command implementation

use crate::cli::Globals;
use crate::context;
use crate::directory::{self, Person};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

#[derive(serde::Serialize)]
struct LookupReport {
    matricula: String,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    person: Option<Person>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

pub fn run_lookup(globals: &Globals, matricula: &str) -> Result<()> {
    let data_dir = context::resolve_data_dir(globals.data_dir.clone());
    let config = context::load_config(&data_dir, globals.config.as_deref())?;
    let person = directory::find_person(&config.directory, &data_dir, matricula);

    let mut human = match &person {
        Some(person) => {
            let mut human = HumanOutput::new(format!("flow directory lookup: {}", person.name));
            human.push_summary("phone", or_dash(&person.phone));
            human.push_summary("department", or_dash(&person.department));
            human.push_summary("title", or_dash(&person.title));
            human.push_summary("email", or_dash(&person.email));
            human
        }
        None => HumanOutput::new(format!("flow directory lookup: {matricula} not found")),
    };
    if person.is_none() {
        human.push_next_step("flow task new --attendance <subcategory> --person-name <name>");
    }

    emit_success(
        globals.output(),
        "directory lookup",
        &LookupReport {
            matricula: matricula.trim().to_string(),
            found: person.is_some(),
            display_name: person.as_ref().and_then(Person::display_name),
            person,
        },
        Some(&human),
    )
}

fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}
