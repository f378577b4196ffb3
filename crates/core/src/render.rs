//! Terminal rendering of the dashboard.

use crate::roster::{Roster, RosterCounts};
use console::Style;
use intake_types::{PatientField, RosterEntry, StatusTag};
use std::fmt::Write;

/// Badge colour for a status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusColour {
    Green,
    Yellow,
    Gray,
}

pub fn status_colour(status: StatusTag) -> StatusColour {
    match status {
        StatusTag::Submitted => StatusColour::Green,
        StatusTag::Filling => StatusColour::Yellow,
        StatusTag::Inactive => StatusColour::Gray,
    }
}

fn badge_style(colour: StatusColour) -> Style {
    match colour {
        StatusColour::Green => Style::new().green().bold(),
        StatusColour::Yellow => Style::new().yellow().bold(),
        StatusColour::Gray => Style::new().dim(),
    }
}

pub fn render_counts(counts: &RosterCounts) -> String {
    format!(
        "Total Patients: {}   {}   {}",
        counts.total,
        Style::new()
            .green()
            .apply_to(format!("Submitted: {}", counts.submitted)),
        Style::new()
            .yellow()
            .apply_to(format!("Filling In: {}", counts.filling)),
    )
}

/// One patient card. Religion is shown only when present.
pub fn render_entry(entry: &RosterEntry) -> String {
    let record = &entry.record;
    let mut out = String::new();

    let badge = badge_style(status_colour(entry.status)).apply_to(format!("[{}]", entry.status));
    let _ = writeln!(out, "{} {}", badge, Style::new().bold().apply_to(record.full_name()));

    for field in [
        PatientField::DateOfBirth,
        PatientField::Gender,
        PatientField::Email,
        PatientField::Phone,
        PatientField::Address,
        PatientField::PreferredLanguage,
        PatientField::Nationality,
        PatientField::EmergencyContact,
        PatientField::Religion,
    ] {
        let value = record.value(field);
        if field == PatientField::Religion && value.trim().is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {:<20}{}", format!("{}:", field.label()), value);
    }
    out
}

pub fn render_roster(roster: &Roster) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", Style::new().bold().apply_to("Staff Dashboard"));
    let _ = writeln!(out, "{}", render_counts(&roster.counts()));
    let _ = writeln!(out);

    if roster.is_empty() {
        let _ = writeln!(out, "No patients found");
        return out;
    }
    for entry in roster.entries() {
        out.push_str(&render_entry(entry));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_types::{PatientId, PatientRecord};

    fn entry(religion: &str, status: StatusTag) -> RosterEntry {
        RosterEntry {
            record: PatientRecord {
                first_name: "Ann".into(),
                last_name: "Lee".into(),
                religion: religion.into(),
                ..PatientRecord::empty(PatientId::parse("p1").unwrap())
            },
            status,
        }
    }

    #[test]
    fn colours_by_status() {
        assert_eq!(status_colour(StatusTag::Submitted), StatusColour::Green);
        assert_eq!(status_colour(StatusTag::Filling), StatusColour::Yellow);
        assert_eq!(status_colour(StatusTag::Inactive), StatusColour::Gray);
    }

    #[test]
    fn religion_only_when_present() {
        let without = console::strip_ansi_codes(&render_entry(&entry("", StatusTag::Submitted)))
            .to_string();
        assert!(!without.contains("Religion"));
        assert!(without.contains("[submitted] Ann Lee"));

        let with = console::strip_ansi_codes(&render_entry(&entry("Quaker", StatusTag::Filling)))
            .to_string();
        assert!(with.contains("Religion:"));
        assert!(with.contains("Quaker"));
    }

    #[test]
    fn empty_roster_message() {
        let out = console::strip_ansi_codes(&render_roster(&Roster::new())).to_string();
        assert!(out.contains("Total Patients: 0"));
        assert!(out.contains("No patients found"));
    }

    #[test]
    fn counts_line_lists_all_three() {
        let roster = Roster::from_entries([
            entry("", StatusTag::Submitted),
            RosterEntry {
                record: PatientRecord::empty(PatientId::parse("p2").unwrap()),
                status: StatusTag::Filling,
            },
        ]);
        let line = console::strip_ansi_codes(&render_counts(&roster.counts())).to_string();
        assert_eq!(line, "Total Patients: 2   Submitted: 1   Filling In: 1");
    }
}
