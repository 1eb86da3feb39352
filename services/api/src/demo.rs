use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use qualtrack::error::AppError;
use qualtrack::memory::InMemoryStore;
use qualtrack::qualifications::{
    CompanyDraft, IndustryDraft, QualificationDraft, QualificationService, SearchQuery,
    StatusPolicy,
};

use crate::infra::parse_date;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for status computation (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

/// Seeds two companies and walks through derived statuses, export, and a
/// deliberately faulty import, printing each step.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let store = InMemoryStore::new();
    let service = QualificationService::new(
        Arc::new(store.clone()),
        Arc::new(store),
        StatusPolicy::default(),
    );

    let acme = service.create_company(CompanyDraft {
        name: "Acme Corp".to_string(),
        postal_code: Some("105-0011".to_string()),
        address: Some("Minato-ku, Tokyo".to_string()),
        phone: Some("03-1234-5678".to_string()),
    })?;
    let bureau = service.create_agency("Kanto Regional Development Bureau")?;

    let expired = service.create_qualification(
        acme.id,
        QualificationDraft {
            agency_id: Some(bureau.id),
            registration_number: "TOKYO-2019-0042".to_string(),
            valid_from: Some(today - Duration::days(900)),
            valid_until: Some(today - Duration::days(1)),
            next_application_on: Some(today + Duration::days(3)),
            application_status: Some("awaiting action".to_string()),
            ..QualificationDraft::default()
        },
        "demo",
    )?;
    service.add_industry(
        expired.id,
        IndustryDraft {
            industry_name: "civil engineering".to_string(),
            grade: Some("A".to_string()),
            total_score: Some("842".to_string()),
            ..IndustryDraft::default()
        },
    )?;

    service.create_qualification(
        acme.id,
        QualificationDraft {
            agency_id: Some(bureau.id),
            registration_number: "TOKYO-2024-0117".to_string(),
            valid_from: Some(today - Duration::days(30)),
            valid_until: Some(today + Duration::days(365)),
            next_application_on: Some(today + Duration::days(10)),
            ..QualificationDraft::default()
        },
        "demo",
    )?;

    println!("== Qualifications for {} (as of {today}) ==", acme.name);
    let query = SearchQuery {
        company: Some(acme.id),
        ..SearchQuery::default()
    };
    for view in service.search(&query, today)? {
        println!(
            "  {}  {:<16}  [{}] {}",
            view.qualification.registration_number,
            view.agency_name.as_deref().unwrap_or("unset"),
            view.status.color,
            view.status.label,
        );
        for industry in &view.industries {
            println!(
                "      - {} (grade {}, score {})",
                industry.industry_name,
                industry.grade.as_deref().unwrap_or("-"),
                industry
                    .total_score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
    }

    let export = service.export_csv(&query, today)?;
    println!(
        "\n== Export == {} row(s), {} skipped, charset {}",
        export.rows,
        export.skipped,
        export.payload.charset.mime_name()
    );

    let mirror = service.create_company(CompanyDraft {
        name: "Acme Mirror".to_string(),
        ..CompanyDraft::default()
    })?;
    let mut upload = export.payload.bytes.clone();
    upload.extend_from_slice(b"\"\",\"\",\"\",\"\",\"\",\"\",\"\",\"\",\"\"\n");
    let report = service.import_csv(mirror.id, &upload, "demo-import")?;
    println!(
        "== Import into {} == {} imported, {} rejected",
        mirror.name,
        report.imported,
        report.errors.len()
    );
    for error in &report.errors {
        println!("  ! {error}");
    }

    Ok(())
}
