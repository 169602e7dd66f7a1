//! Run the year-end close for an entire participant block
//!
//! Loads participants and ledger rows from CSV extracts, closes every
//! participant in parallel, and writes per-participant results.
//! Accepts config via environment variables:
//!   CLOSE_PLAN_YEAR, PARTICIPANTS_CSV, LEDGER_CSV, OUT_CSV
//! Set CLOSE_JSON=1 to also print a JSON run summary

use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::io::Write;
use std::time::Instant;

use anyhow::Context;
use chrono::{Datelike, Local};
use serde::Serialize;
use vesting_system::participant::loader::{
    group_by_participant, load_ledger, load_participants,
};
use vesting_system::{CloseConfig, CloseRunner, ParticipantCase, PlanCalendar};

/// Run summary for JSON output
#[derive(Serialize)]
struct CloseSummary {
    plan_year: i32,
    participant_count: usize,
    closed_count: usize,
    failed_count: usize,
    execution_time_ms: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let start = Instant::now();
    let today = Local::now().date_naive();

    let plan_year: i32 = match env::var("CLOSE_PLAN_YEAR") {
        Ok(value) => value.parse().context("CLOSE_PLAN_YEAR must be a year")?,
        Err(_) => today.year() - 1,
    };
    let participants_path =
        env::var("PARTICIPANTS_CSV").unwrap_or_else(|_| "participants.csv".to_string());
    let ledger_path = env::var("LEDGER_CSV").unwrap_or_else(|_| "ledger.csv".to_string());
    let out_path = env::var("OUT_CSV").unwrap_or_else(|_| "year_end_close.csv".to_string());

    println!("Loading participants from {}...", participants_path);
    let participants = load_participants(&participants_path)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("failed to load participants")?;
    println!("Loading ledger from {}...", ledger_path);
    let ledger = load_ledger(&ledger_path)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("failed to load ledger")?;
    println!(
        "Loaded {} participants and {} ledger rows in {:?}",
        participants.len(),
        ledger.len(),
        start.elapsed()
    );

    let mut grouped: HashMap<u32, _> = group_by_participant(ledger);
    let cases: Vec<ParticipantCase> = participants
        .into_iter()
        .map(|(facts, prior_snapshot)| {
            let transactions = grouped.remove(&facts.participant_key).unwrap_or_default();
            ParticipantCase {
                facts,
                prior_snapshot,
                transactions,
            }
        })
        .collect();

    println!("Closing plan year {}...", plan_year);
    let close_start = Instant::now();

    let runner = CloseRunner::new(PlanCalendar::new(), CloseConfig { plan_year, today });
    let results = runner.close_all(&cases);

    println!(
        "Closed {} participants in {:?}",
        results.len(),
        close_start.elapsed()
    );

    // Write per-participant results; failed participants are reported but
    // never abort the run.
    let mut file = File::create(&out_path).context("unable to create output file")?;
    writeln!(
        file,
        "ParticipantKey,Classification,VestingState,CurrentBalance,SpecialBalance,TotalDistributions,YearsOfService,VestingPercent,VestedBalance,NewEnrollee,ZeroContributionReason,EarnedPoints,CertificateDate"
    )?;

    let mut closed_count = 0;
    let mut failed_count = 0;
    for (case, result) in cases.iter().zip(&results) {
        match result {
            Ok(close) => {
                closed_count += 1;
                writeln!(
                    file,
                    "{},{},{},{},{},{},{},{},{},{},{},{},{}",
                    close.participant_key,
                    close.classification.code(),
                    close
                        .vesting
                        .map(|v| format!("{:?}", v))
                        .unwrap_or_default(),
                    close.aggregate.current_balance,
                    close.aggregate.special_balance,
                    close.aggregate.total_distributions,
                    close.aggregate.years_of_service,
                    close.aggregate.vesting_percent,
                    close.aggregate.vested_balance,
                    close.year_end.is_new_enrollee,
                    close.year_end.zero_contribution_reason.code(),
                    close.year_end.earned_points,
                    close
                        .year_end
                        .certificate_issue_date
                        .map(|d| d.to_string())
                        .unwrap_or_default(),
                )?;
            }
            Err(err) => {
                failed_count += 1;
                eprintln!(
                    "participant {} failed: {}",
                    case.facts.participant_key, err
                );
            }
        }
    }

    println!("\nResults written to: {}", out_path);
    println!("  Closed: {}", closed_count);
    println!("  Failed: {}", failed_count);

    if env::var("CLOSE_JSON").is_ok_and(|v| v == "1") {
        let summary = CloseSummary {
            plan_year,
            participant_count: cases.len(),
            closed_count,
            failed_count,
            execution_time_ms: start.elapsed().as_millis() as u64,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
