//! Vesting System CLI
//!
//! Runs the calculation pipeline for one sample participant and prints the
//! classification, aggregate balances, and year-end deltas.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use vesting_system::ledger::{LedgerTransaction, TransactionKind, YearIteration};
use vesting_system::participant::{
    EmploymentStatus, ParticipantFacts, ParticipantYearSnapshot,
};
use vesting_system::{CloseConfig, CloseRunner, ParticipantCase, PlanCalendar};

fn contribution(id: u64, plan_year: i32, amount: Decimal) -> LedgerTransaction {
    LedgerTransaction {
        transaction_id: id,
        participant_key: 4112,
        plan_year,
        year_iteration: YearIteration::Normal,
        kind: TransactionKind::IncomingContribution,
        contribution_amount: amount,
        earnings_amount: Decimal::ZERO,
        forfeiture_amount: Decimal::ZERO,
        service_credit: Decimal::ONE,
        tax_withheld: Decimal::ZERO,
        zero_contribution_reason: None,
        comment_kind: None,
        reversed_from: None,
        transaction_date: NaiveDate::from_ymd_opt(plan_year, 12, 15)
            .expect("valid calendar date"),
    }
}

fn main() {
    env_logger::init();

    println!("Vesting System v0.1.0");
    println!("=====================\n");

    // Sample participant: enrolled 2004, still active, spans the 2007
    // schedule change.
    let facts = ParticipantFacts {
        participant_key: 4112,
        birth_date: NaiveDate::from_ymd_opt(1959, 3, 14).expect("valid calendar date"),
        termination_date: None,
        termination_code: None,
        employment_status: EmploymentStatus::Active,
        beneficiary_only: false,
    };

    let mut prior_snapshot = ParticipantYearSnapshot::new(4112, 2023);
    prior_snapshot.hours_worked = 1740;
    prior_snapshot.income = dec!(61250.00);

    let mut transactions: Vec<LedgerTransaction> = Vec::new();
    let mut next_id = 1;
    for (year, amount) in [
        (2004, dec!(850.00)),
        (2005, dec!(875.00)),
        (2006, dec!(910.00)),
        (2007, dec!(940.00)),
        (2008, dec!(975.00)),
        (2009, dec!(1010.00)),
    ] {
        transactions.push(contribution(next_id, year, amount));
        next_id += 1;
    }

    let mut earnings = contribution(next_id, 2010, Decimal::ZERO);
    earnings.kind = TransactionKind::Incoming100PctVestedEarnings;
    earnings.earnings_amount = dec!(312.40);
    earnings.service_credit = Decimal::ZERO;
    transactions.push(earnings);

    let case = ParticipantCase {
        facts,
        prior_snapshot,
        transactions,
    };

    println!("Participant: {}", case.facts.participant_key);
    println!("  Birth Date: {}", case.facts.birth_date);
    println!("  Status: {:?}", case.facts.employment_status);
    println!("  Ledger Rows: {}", case.transactions.len());
    println!();

    let runner = CloseRunner::new(
        PlanCalendar::new(),
        CloseConfig {
            plan_year: 2024,
            today: chrono::Local::now().date_naive(),
        },
    );

    let result = match runner.close_participant(&case) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("close failed: {}", err);
            std::process::exit(1);
        }
    };

    println!("Year-End Close Results (plan year 2024):");
    println!("  Classification: {:?} (code {})",
        result.classification,
        result.classification.code());
    println!("  Vesting State: {:?}", result.vesting);
    println!();
    println!("  {:>22} {:>14}", "Current Balance", "Vested Balance");
    println!("  {:>22} {:>14}",
        result.aggregate.current_balance,
        result.aggregate.vested_balance);
    println!();
    println!("  Special Balance (ETVA): {}", result.aggregate.special_balance);
    println!("  Total Distributions: {}", result.aggregate.total_distributions);
    println!("  Years of Service: {}", result.aggregate.years_of_service);
    println!("  Vesting Percent: {}%", result.aggregate.vesting_percent);
    println!();
    println!("  New Enrollee: {}", result.year_end.is_new_enrollee);
    println!("  Zero-Contribution Reason: {:?}", result.year_end.zero_contribution_reason);
    println!("  Earned Points: {}", result.year_end.earned_points);
    match result.year_end.certificate_issue_date {
        Some(date) => println!("  Certificate Issued: {}", date),
        None => println!("  Certificate Issued: (none)"),
    }
}
