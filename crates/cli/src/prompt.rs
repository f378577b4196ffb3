//! Interactive intake form.

use dialoguer::{theme::ColorfulTheme, Input, Select};
use intake_core::{FormError, IntakeForm, Submitter};
use intake_types::{Gender, PatientField, PreferredLanguage};

const ACTIONS: [&str; 3] = ["Submit", "Edit a field", "Abandon"];

/// Fixed options for fields rendered as a picker.
fn choices(field: PatientField) -> Option<Vec<&'static str>> {
    match field {
        PatientField::Gender => Some(
            [Gender::Male, Gender::Female, Gender::Other]
                .iter()
                .map(|g| g.as_str())
                .collect(),
        ),
        PatientField::PreferredLanguage => {
            Some(PreferredLanguage::ALL.iter().map(|l| l.as_str()).collect())
        }
        _ => None,
    }
}

fn ask(theme: &ColorfulTheme, form: &IntakeForm, field: PatientField) -> anyhow::Result<String> {
    let current = form.draft().value(field).to_string();
    let prompt = if field.is_required() {
        format!("{} *", field.label())
    } else {
        field.label().to_string()
    };

    if let Some(items) = choices(field) {
        let default = items.iter().position(|i| *i == current).unwrap_or(0);
        let index = Select::with_theme(theme)
            .with_prompt(prompt)
            .items(&items)
            .default(default)
            .interact()?;
        return Ok(items[index].to_string());
    }

    let mut input = Input::<String>::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty(!field.is_required());
    if !current.is_empty() {
        input = input.with_initial_text(current);
    }
    Ok(input.interact_text()?)
}

async fn answer(
    theme: &ColorfulTheme,
    form: &mut IntakeForm,
    field: PatientField,
    submitter: &dyn Submitter,
    live: bool,
) -> anyhow::Result<()> {
    let value = ask(theme, form, field)?;
    form.set(field, &value)?;
    if live {
        if let Err(e) = form.report_progress(submitter).await {
            tracing::warn!("Progress relay error: {:?}", e);
            eprintln!("{}", console::style(format!("Progress not relayed: {e}")).yellow());
        }
    }
    Ok(())
}

/// Walks every field, then loops on submit/edit/abandon until the record is sent or dropped.
pub async fn run_form(submitter: &dyn Submitter, live: bool) -> anyhow::Result<()> {
    let theme = ColorfulTheme::default();
    let mut form = IntakeForm::new();

    println!("{}", console::style("Patient Registration").bold());
    for field in PatientField::ALL {
        answer(&theme, &mut form, field, submitter, live).await?;
    }

    loop {
        let action = Select::with_theme(&theme)
            .with_prompt("What next?")
            .items(&ACTIONS)
            .default(0)
            .interact()?;

        match action {
            0 => match form.submit(submitter).await {
                Ok(res) => {
                    println!("{}", console::style(res.message).green());
                    return Ok(());
                }
                Err(FormError::MissingFields(missing)) => {
                    eprintln!("Please fill in: {}", labels(&missing));
                    for field in missing {
                        answer(&theme, &mut form, field, submitter, live).await?;
                    }
                }
                Err(e) => {
                    eprintln!(
                        "{}",
                        console::style(format!("Submission failed, your answers are kept: {e}"))
                            .red()
                    );
                }
            },
            1 => {
                let labels: Vec<&str> = PatientField::ALL.iter().map(|f| f.label()).collect();
                let index = Select::with_theme(&theme)
                    .with_prompt("Which field?")
                    .items(&labels)
                    .interact()?;
                answer(&theme, &mut form, PatientField::ALL[index], submitter, live).await?;
            }
            _ => {
                if let Err(e) = form.abandon(submitter).await {
                    eprintln!("Abandon not relayed: {e}");
                }
                println!("Form abandoned.");
                return Ok(());
            }
        }
    }
}

fn labels(fields: &[PatientField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}
