use chrono::Duration;

use super::{company, day, full_draft, service};
use crate::qualifications::csv::Charset;
use crate::qualifications::domain::QualificationDraft;
use crate::qualifications::service::SearchQuery;

#[test]
fn export_produces_header_plus_one_quoted_row_per_record() {
    let service = service();
    let owner = company(&service, "Acme Corp");
    let today = day(2026, 8, 25);

    let mut expired = full_draft("REG-1");
    expired.valid_until = Some(today - Duration::days(1));
    service
        .create_qualification(owner, expired, "admin")
        .expect("created");

    let mut due = full_draft("REG-2");
    due.valid_until = Some(today + Duration::days(365));
    due.next_application_on = Some(today + Duration::days(10));
    service.create_qualification(owner, due, "admin").expect("created");

    let outcome = service
        .export_csv(
            &SearchQuery {
                company: Some(owner),
                ..SearchQuery::default()
            },
            today,
        )
        .expect("export");

    assert_eq!(outcome.rows, 2);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(outcome.payload.charset, Charset::ShiftJis);

    let text = String::from_utf8(outcome.payload.bytes).expect("ascii payload");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("\"Company Name\",\"Issuing Agency\""));
    assert!(lines[1].contains("\"2026-08-24\""));
    assert!(lines[2].contains("\"2026-09-04\""));
    // Every field is quoted.
    for line in &lines[1..] {
        assert!(line.starts_with('"') && line.ends_with('"'));
    }
}

#[test]
fn rows_missing_dates_are_excluded_and_counted() {
    let service = service();
    let owner = company(&service, "Acme Corp");
    service
        .create_qualification(owner, full_draft("REG-FULL"), "admin")
        .expect("created");
    let undated = QualificationDraft {
        registration_number: "REG-UNDATED".to_string(),
        ..QualificationDraft::default()
    };
    service
        .create_qualification(owner, undated, "admin")
        .expect("created");

    let outcome = service
        .export_csv(
            &SearchQuery {
                company: Some(owner),
                ..SearchQuery::default()
            },
            day(2026, 8, 25),
        )
        .expect("export");
    assert_eq!(outcome.rows, 1);
    assert_eq!(outcome.skipped, 1);
}

#[test]
fn export_import_round_trip_reproduces_the_records() {
    let service = service();
    let source = company(&service, "Acme Corp");
    let today = day(2026, 8, 25);

    let mut first = full_draft("REG-1");
    first.agency_id = Some(service.create_agency("Kanto Bureau").expect("agency").id);
    service
        .create_qualification(source, first, "alice")
        .expect("created");
    service
        .create_qualification(source, full_draft("REG-2"), "alice")
        .expect("created");

    let exported = service
        .export_csv(
            &SearchQuery {
                company: Some(source),
                ..SearchQuery::default()
            },
            today,
        )
        .expect("export");

    let target = company(&service, "Acme Mirror");
    let report = service
        .import_csv(target, &exported.payload.bytes, "importer")
        .expect("import");
    assert_eq!(report.imported, 2);
    assert!(report.errors.is_empty());

    let originals = service
        .search(
            &SearchQuery {
                company: Some(source),
                ..SearchQuery::default()
            },
            today,
        )
        .expect("search");
    let copies = service
        .search(
            &SearchQuery {
                company: Some(target),
                ..SearchQuery::default()
            },
            today,
        )
        .expect("search");
    assert_eq!(originals.len(), copies.len());

    for original in &originals {
        let copy = copies
            .iter()
            .find(|c| {
                c.qualification.registration_number == original.qualification.registration_number
            })
            .expect("matching registration number");
        let (a, b) = (&original.qualification, &copy.qualification);
        assert_eq!(a.valid_from, b.valid_from);
        assert_eq!(a.valid_until, b.valid_until);
        assert_eq!(a.next_application_on, b.next_application_on);
        assert_eq!(a.application_status, b.application_status);
        assert_eq!(a.notes, b.notes);
        assert_eq!(a.notification_url, b.notification_url);
        assert_eq!(original.agency_name, copy.agency_name);
        // updated_by is overwritten by the importing user.
        assert_eq!(b.updated_by, "importer");
    }
}

#[test]
fn import_reports_per_row_errors_without_aborting() {
    let service = service();
    let owner = company(&service, "Acme Corp");

    let body = "\"Company Name\",\"Issuing Agency\",\"Registration Number\",\"Valid From\",\"Valid Until\",\"Next Application Deadline\",\"Application Status\",\"Notes\",\"Notification URL\"\n\
\"Acme\",\"\",\"REG-OK-1\",\"2025-04-01\",\"2027-03-31\",\"2027-01-15\",\"\",\"\",\"\"\n\
\"Acme\",\"\",\"\",\"2025-04-01\",\"2027-03-31\",\"2027-01-15\",\"\",\"\",\"\"\n\
\"Acme\",\"\",\"REG-BAD-DATE\",\"April 1st\",\"\",\"\",\"\",\"\",\"\"\n\
\"Acme\",\"\",\"REG-OK-2\",\"\",\"\",\"\",\"\",\"\",\"\"\n";

    let report = service
        .import_csv(owner, body.as_bytes(), "importer")
        .expect("import");

    assert_eq!(report.imported, 2);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors[0].contains("row 2"));
    assert!(report.errors[0].contains("registration number"));
    assert!(report.errors[1].contains("row 3"));

    let stored = service
        .search(
            &SearchQuery {
                company: Some(owner),
                ..SearchQuery::default()
            },
            day(2026, 8, 25),
        )
        .expect("search");
    assert_eq!(stored.len(), 2);
}

#[test]
fn import_resolves_agencies_by_name() {
    let service = service();
    let owner = company(&service, "Acme Corp");
    let existing = service.create_agency("Kanto Bureau").expect("agency");

    let body = "\"Company Name\",\"Issuing Agency\",\"Registration Number\",\"Valid From\",\"Valid Until\",\"Next Application Deadline\",\"Application Status\",\"Notes\",\"Notification URL\"\n\
\"\",\"Kanto Bureau\",\"REG-1\",\"\",\"\",\"\",\"\",\"\",\"\"\n\
\"\",\"Kansai Bureau\",\"REG-2\",\"\",\"\",\"\",\"\",\"\",\"\"\n";

    let report = service
        .import_csv(owner, body.as_bytes(), "importer")
        .expect("import");
    assert_eq!(report.imported, 2);

    let agencies = service.list_agencies().expect("list");
    assert_eq!(agencies.len(), 2);
    assert!(agencies.iter().any(|a| a.id == existing.id));
    assert!(agencies.iter().any(|a| a.name == "Kansai Bureau"));
}

#[test]
fn undecodable_upload_is_a_batch_error() {
    let service = service();
    let owner = company(&service, "Acme Corp");
    let result = service.import_csv(owner, &[0xFF, 0xFE, 0x80, 0x80], "importer");
    assert!(matches!(
        result,
        Err(crate::qualifications::service::ServiceError::ImportUnreadable(_))
    ));
}
