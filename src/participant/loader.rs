//! Load participants and ledger rows from the plan extract CSVs

use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

use chrono::NaiveDate;
use csv::Reader;
use rust_decimal::Decimal;

use super::{
    ClassificationCode, EmploymentStatus, ParticipantFacts, ParticipantYearSnapshot,
    TerminationCode, ZeroContributionReason,
};
use crate::ledger::{CommentKind, LedgerTransaction, TransactionKind, YearIteration};

/// Raw CSV row matching the participant extract columns
#[derive(Debug, serde::Deserialize)]
struct ParticipantCsvRow {
    #[serde(rename = "ParticipantKey")]
    participant_key: u32,
    #[serde(rename = "BirthDate")]
    birth_date: NaiveDate,
    #[serde(rename = "TerminationDate")]
    termination_date: Option<NaiveDate>,
    #[serde(rename = "TerminationCode")]
    termination_code: Option<String>,
    #[serde(rename = "EmploymentStatus")]
    employment_status: String,
    #[serde(rename = "BeneficiaryOnly")]
    beneficiary_only: Option<u8>,
    #[serde(rename = "PlanYear")]
    plan_year: i32,
    #[serde(rename = "Classification")]
    classification: u8,
    #[serde(rename = "SpecialBalance")]
    special_balance: Decimal,
    #[serde(rename = "HoursWorked")]
    hours_worked: u32,
    #[serde(rename = "Income")]
    income: Decimal,
    #[serde(rename = "ZeroContributionReason")]
    zero_contribution_reason: u8,
    #[serde(rename = "VestingScheduleFlag")]
    vesting_schedule_flag: Option<u8>,
    #[serde(rename = "HasForfeited")]
    has_forfeited: Option<u8>,
}

impl ParticipantCsvRow {
    fn to_participant(
        self,
    ) -> Result<(ParticipantFacts, ParticipantYearSnapshot), Box<dyn Error>> {
        let termination_code = match self.termination_code.as_deref() {
            None | Some("") => None,
            Some("Deceased") => Some(TerminationCode::Deceased),
            Some("Resigned") => Some(TerminationCode::Resigned),
            Some("Discharged") => Some(TerminationCode::Discharged),
            Some("Retired") => Some(TerminationCode::Retired),
            Some(other) => return Err(format!("Unknown TerminationCode: {}", other).into()),
        };

        let employment_status = match self.employment_status.as_str() {
            "Active" => EmploymentStatus::Active,
            "Terminated" => EmploymentStatus::Terminated,
            other => return Err(format!("Unknown EmploymentStatus: {}", other).into()),
        };

        let facts = ParticipantFacts {
            participant_key: self.participant_key,
            birth_date: self.birth_date,
            termination_date: self.termination_date,
            termination_code,
            employment_status,
            beneficiary_only: self.beneficiary_only.unwrap_or(0) != 0,
        };

        // Classification and reason codes load tolerantly, matching the
        // batch system's treatment of stale extracts.
        let snapshot = ParticipantYearSnapshot {
            participant_key: self.participant_key,
            plan_year: self.plan_year,
            classification: ClassificationCode::from_code(self.classification),
            special_balance: self.special_balance,
            hours_worked: self.hours_worked,
            income: self.income,
            zero_contribution_reason: ZeroContributionReason::from_code(
                self.zero_contribution_reason,
            ),
            vesting_schedule_flag: self.vesting_schedule_flag.unwrap_or(0) != 0,
            has_forfeited: self.has_forfeited.unwrap_or(0) != 0,
        };

        Ok((facts, snapshot))
    }
}

/// Raw CSV row matching the ledger extract columns
#[derive(Debug, serde::Deserialize)]
struct LedgerCsvRow {
    #[serde(rename = "TransactionId")]
    transaction_id: u64,
    #[serde(rename = "ParticipantKey")]
    participant_key: u32,
    #[serde(rename = "PlanYear")]
    plan_year: i32,
    #[serde(rename = "YearIteration")]
    year_iteration: u8,
    #[serde(rename = "Kind")]
    kind: u8,
    #[serde(rename = "Contribution")]
    contribution_amount: Decimal,
    #[serde(rename = "Earnings")]
    earnings_amount: Decimal,
    #[serde(rename = "Forfeiture")]
    forfeiture_amount: Decimal,
    #[serde(rename = "ServiceCredit")]
    service_credit: Decimal,
    #[serde(rename = "TaxWithheld")]
    tax_withheld: Decimal,
    #[serde(rename = "ZeroContributionReason")]
    zero_contribution_reason: Option<u8>,
    #[serde(rename = "CommentKind")]
    comment_kind: Option<String>,
    #[serde(rename = "ReversedFrom")]
    reversed_from: Option<u64>,
    #[serde(rename = "TransactionDate")]
    transaction_date: NaiveDate,
}

impl LedgerCsvRow {
    fn to_transaction(self) -> Result<LedgerTransaction, Box<dyn Error>> {
        let kind = TransactionKind::from_code(self.kind)
            .ok_or_else(|| format!("Unknown transaction Kind code: {}", self.kind))?;

        let year_iteration = YearIteration::from_code(self.year_iteration)
            .ok_or_else(|| format!("Unknown YearIteration code: {}", self.year_iteration))?;

        let comment_kind = match self.comment_kind.as_deref() {
            None | Some("") => None,
            Some("Military") => Some(CommentKind::Military),
            Some("ClassAction") => Some(CommentKind::ClassAction),
            Some("VOnly") => Some(CommentKind::VOnly),
            Some("Forfeit") => Some(CommentKind::Forfeit),
            Some("Unforfeit") => Some(CommentKind::Unforfeit),
            Some("Reversal") => Some(CommentKind::Reversal),
            Some("Unreversal") => Some(CommentKind::Unreversal),
            Some(other) => return Err(format!("Unknown CommentKind: {}", other).into()),
        };

        Ok(LedgerTransaction {
            transaction_id: self.transaction_id,
            participant_key: self.participant_key,
            plan_year: self.plan_year,
            year_iteration,
            kind,
            contribution_amount: self.contribution_amount,
            earnings_amount: self.earnings_amount,
            forfeiture_amount: self.forfeiture_amount,
            service_credit: self.service_credit,
            tax_withheld: self.tax_withheld,
            zero_contribution_reason: self.zero_contribution_reason.map(
                ZeroContributionReason::from_code,
            ),
            comment_kind,
            reversed_from: self.reversed_from,
            transaction_date: self.transaction_date,
        })
    }
}

/// Load all participants (facts + current snapshot) from a CSV file
pub fn load_participants<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<(ParticipantFacts, ParticipantYearSnapshot)>, Box<dyn Error>> {
    load_participants_from_reader(std::fs::File::open(path)?)
}

/// Load participants from any reader (e.g. string buffer, network stream)
pub fn load_participants_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<(ParticipantFacts, ParticipantYearSnapshot)>, Box<dyn Error>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut participants = Vec::new();

    for result in csv_reader.deserialize() {
        let row: ParticipantCsvRow = result?;
        participants.push(row.to_participant()?);
    }

    Ok(participants)
}

/// Load all ledger rows from a CSV file
pub fn load_ledger<P: AsRef<Path>>(path: P) -> Result<Vec<LedgerTransaction>, Box<dyn Error>> {
    load_ledger_from_reader(std::fs::File::open(path)?)
}

/// Load ledger rows from any reader
pub fn load_ledger_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<LedgerTransaction>, Box<dyn Error>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut transactions = Vec::new();

    for result in csv_reader.deserialize() {
        let row: LedgerCsvRow = result?;
        transactions.push(row.to_transaction()?);
    }

    Ok(transactions)
}

/// Group ledger rows by participant, sorted by (plan year, transaction id).
///
/// This is the deterministic order the replay engine's first-row-per-year
/// rule depends on.
pub fn group_by_participant(
    transactions: Vec<LedgerTransaction>,
) -> HashMap<u32, Vec<LedgerTransaction>> {
    let mut grouped: HashMap<u32, Vec<LedgerTransaction>> = HashMap::new();
    for tx in transactions {
        grouped.entry(tx.participant_key).or_default().push(tx);
    }
    for rows in grouped.values_mut() {
        rows.sort_by_key(|tx| (tx.plan_year, tx.transaction_id));
    }
    grouped
}
