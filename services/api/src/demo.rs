use std::path::PathBuf;
use std::sync::Arc;

use admissions::error::AppError;
use admissions::workflows::admission::{
    AdmissionService, AdmissionStatus, ApplicationSubmission, Cnic, FeeStatus, FormId,
    TransitionPayload,
};
use clap::Args;

use crate::infra::{
    default_admission_policy, InMemoryAdmissionRepository, InMemoryAuditSink,
};

const DEMO_ACTOR: &str = "demo.registrar";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print each record's full audit trail after the walkthrough
    #[arg(long)]
    pub(crate) show_audit: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RosterArgs {
    /// Status to export (e.g. pending, passed, approved)
    #[arg(long, default_value = "pending")]
    pub(crate) status: String,
    /// Write the CSV here instead of stdout
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

type DemoService = AdmissionService<InMemoryAdmissionRepository, InMemoryAuditSink>;

fn demo_service() -> Arc<DemoService> {
    Arc::new(AdmissionService::new(
        Arc::new(InMemoryAdmissionRepository::default()),
        Arc::new(InMemoryAuditSink::default()),
        default_admission_policy(),
    ))
}

fn submit(service: &DemoService, cnic: &str, full_name: &str) -> Result<FormId, AppError> {
    let record = service.submit(ApplicationSubmission {
        cnic: Cnic(cnic.to_string()),
        full_name: full_name.to_string(),
    })?;
    Ok(record.form_id)
}

fn transition(
    service: &DemoService,
    form_id: &FormId,
    target: AdmissionStatus,
    remarks: Option<&str>,
) -> Result<(), AppError> {
    let payload = match remarks {
        Some(remarks) => TransitionPayload::with_remarks(remarks),
        None => TransitionPayload::default(),
    };
    service.request_transition(form_id, target, payload, DEMO_ACTOR)?;
    Ok(())
}

/// Seed a small cohort covering the workflow's branches: one applicant walked
/// to approval, one failed at the entry test, one reverted for correction,
/// and one untouched submission.
fn seed_cohort(service: &DemoService) -> Result<Vec<FormId>, AppError> {
    let approved = submit(service, "61101-5550001-1", "Mahnoor Aziz")?;
    transition(service, &approved, AdmissionStatus::Appeared, None)?;
    service.record_entry_test_marks(&approved, 42, 50)?;
    transition(service, &approved, AdmissionStatus::Passed, None)?;
    service.assign_merit_and_department(&approved, "Merit List 1", "Computer Science")?;
    transition(service, &approved, AdmissionStatus::Selected, None)?;
    service.update_fee_status(&approved, FeeStatus::Paid)?;
    transition(service, &approved, AdmissionStatus::Enrolled, None)?;
    transition(service, &approved, AdmissionStatus::Approved, None)?;

    let failed = submit(service, "61101-5550002-3", "Bilal Ahmed")?;
    transition(service, &failed, AdmissionStatus::Appeared, None)?;
    service.record_entry_test_marks(&failed, 14, 50)?;
    transition(service, &failed, AdmissionStatus::Failed, None)?;

    let reverted = submit(service, "61101-5550003-5", "Fatima Noor")?;
    transition(
        service,
        &reverted,
        AdmissionStatus::Revert,
        Some("guardian signature missing"),
    )?;

    let pending = submit(service, "61101-5550004-7", "Daniyal Raza")?;

    Ok(vec![approved, failed, reverted, pending])
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = demo_service();

    println!("Admission workflow demo");
    println!("=======================");

    let cohort = seed_cohort(&service)?;
    for form_id in &cohort {
        let record = service.get(form_id)?;
        let view = record.status_view();
        println!(
            "{}  {:<14} status={:<12} fee={:<6} dept={}",
            view.form_id,
            view.full_name,
            view.status,
            view.fee_status,
            view.department.as_deref().unwrap_or("-"),
        );
    }

    // Guard rails: the machine refuses what the old portal silently allowed.
    let pending = &cohort[3];
    match service.request_transition(
        pending,
        AdmissionStatus::Enrolled,
        TransitionPayload::default(),
        DEMO_ACTOR,
    ) {
        Err(error) => println!("\nrejected as expected ({}): {error}", error.kind()),
        Ok(_) => println!("\nunexpected: pending form enrolled directly"),
    }

    if args.show_audit {
        for form_id in &cohort {
            let trail = service.audit_trail(form_id)?;
            println!("\naudit trail for {form_id}:");
            for entry in trail {
                println!(
                    "  {} -> {} by {} at {}{}",
                    entry.from_status.label(),
                    entry.to_status.label(),
                    entry.actor,
                    entry.at.to_rfc3339(),
                    entry
                        .remarks
                        .map(|remarks| format!(" ({remarks})"))
                        .unwrap_or_default(),
                );
            }
        }
    }

    Ok(())
}

pub(crate) fn run_roster(args: RosterArgs) -> Result<(), AppError> {
    let status = AdmissionStatus::parse(&args.status).map_err(|unknown| {
        AppError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            unknown.to_string(),
        ))
    })?;

    let service = demo_service();
    seed_cohort(&service)?;
    let records = service.list_by_status(status)?;

    let writer: Box<dyn std::io::Write> = match &args.out {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record([
            "form_id",
            "cnic",
            "full_name",
            "status",
            "fee_status",
            "entry_test_percentage",
            "merit_list",
            "department",
        ])
        .map_err(csv_io_error)?;
    for record in &records {
        let percentage = record
            .entry_test_marks
            .map(|marks| format!("{:.2}", marks.percentage))
            .unwrap_or_default();
        csv_writer
            .write_record([
                record.form_id.0.as_str(),
                record.cnic.0.as_str(),
                record.full_name.as_str(),
                record.status.label(),
                record.fee_status.label(),
                percentage.as_str(),
                record.merit_list.as_deref().unwrap_or(""),
                record.department.as_deref().unwrap_or(""),
            ])
            .map_err(csv_io_error)?;
    }
    csv_writer.flush()?;

    eprintln!("exported {} record(s) with status '{}'", records.len(), status.label());
    Ok(())
}

fn csv_io_error(error: csv::Error) -> AppError {
    AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, error))
}
