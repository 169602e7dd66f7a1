//! Participant data structures matching the plan administration record layout

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Enrollment/vesting classification for a participant
///
/// "Old plan" codes (1, 3) cover participants whose contribution history is
/// entirely pre-2007; "new plan" codes (2, 4) apply once any post-change
/// contribution exists. The numeric values are the legacy batch-system codes
/// and are kept only as the persistence-boundary mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationCode {
    /// No countable contribution years
    NotEnrolled,
    /// Contribution years exist, all under the pre-2007 schedule
    OldPlanHasContributions,
    /// At least one contribution under the post-2007 schedule
    NewPlanHasContributions,
    /// Pre-2007 participant with forfeiture history
    OldPlanHasForfeitureRecords,
    /// Post-2007 participant with forfeiture history
    NewPlanHasForfeitureRecords,
}

impl ClassificationCode {
    /// Map a stored numeric code to a classification.
    ///
    /// Unknown codes coerce to `NotEnrolled`. The legacy batch job never
    /// rejected a row for a bad classification and downstream reports rely
    /// on that, so this stays a coercion rather than an error.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ClassificationCode::OldPlanHasContributions,
            2 => ClassificationCode::NewPlanHasContributions,
            3 => ClassificationCode::OldPlanHasForfeitureRecords,
            4 => ClassificationCode::NewPlanHasForfeitureRecords,
            _ => ClassificationCode::NotEnrolled,
        }
    }

    /// Stored numeric code
    pub fn code(&self) -> u8 {
        match self {
            ClassificationCode::NotEnrolled => 0,
            ClassificationCode::OldPlanHasContributions => 1,
            ClassificationCode::NewPlanHasContributions => 2,
            ClassificationCode::OldPlanHasForfeitureRecords => 3,
            ClassificationCode::NewPlanHasForfeitureRecords => 4,
        }
    }

    /// Whether this code carries forfeiture history
    pub fn has_forfeiture_records(&self) -> bool {
        matches!(
            self,
            ClassificationCode::OldPlanHasForfeitureRecords
                | ClassificationCode::NewPlanHasForfeitureRecords
        )
    }

    /// Classification after a forfeiture is applied.
    ///
    /// Contribution codes move to their forfeiture counterpart. Anything
    /// else falls back to `NotEnrolled`; callers log that path because it
    /// usually means the snapshot was already inconsistent upstream.
    pub fn on_forfeit(self) -> Self {
        match self {
            ClassificationCode::OldPlanHasContributions => {
                ClassificationCode::OldPlanHasForfeitureRecords
            }
            ClassificationCode::NewPlanHasContributions => {
                ClassificationCode::NewPlanHasForfeitureRecords
            }
            _ => ClassificationCode::NotEnrolled,
        }
    }

    /// Classification after a forfeiture is backed out
    pub fn on_unforfeit(self) -> Self {
        match self {
            ClassificationCode::OldPlanHasForfeitureRecords => {
                ClassificationCode::OldPlanHasContributions
            }
            ClassificationCode::NewPlanHasForfeitureRecords => {
                ClassificationCode::NewPlanHasContributions
            }
            other => other,
        }
    }
}

impl Default for ClassificationCode {
    fn default() -> Self {
        ClassificationCode::NotEnrolled
    }
}

/// Reason a participant received no contribution for a plan year
///
/// Codes 3 and 4 are historical and no longer written; the year-end
/// calculator resets them to `Normal` when it touches a 64+ snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZeroContributionReason {
    /// No special handling
    Normal,
    /// Under age 21 with more than 1,000 hours worked
    Under21WithOver1KHours,
    /// Terminated with 1,000+ hours; the year still counts for vesting
    TerminatedOver1000HoursGetsYearVested,
    /// Historical: vesting service credited with no contribution
    VestingServiceOnly,
    /// Historical: balance carried over from the predecessor plan
    PriorPlanCarryover,
    /// 65 or older with first contribution 5+ years back; fully vested
    SixtyFivePlusFullyVested,
    /// Fully vested on the participant's 64th birthday
    SixtyFourFullyVestedOnBirthday,
}

impl ZeroContributionReason {
    /// Map a stored numeric code to a reason.
    ///
    /// Unknown codes coerce to `Normal`, preserving the forgiving behavior
    /// of the original batch job.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ZeroContributionReason::Under21WithOver1KHours,
            2 => ZeroContributionReason::TerminatedOver1000HoursGetsYearVested,
            3 => ZeroContributionReason::VestingServiceOnly,
            4 => ZeroContributionReason::PriorPlanCarryover,
            5 => ZeroContributionReason::SixtyFivePlusFullyVested,
            6 => ZeroContributionReason::SixtyFourFullyVestedOnBirthday,
            _ => ZeroContributionReason::Normal,
        }
    }

    /// Stored numeric code
    pub fn code(&self) -> u8 {
        match self {
            ZeroContributionReason::Normal => 0,
            ZeroContributionReason::Under21WithOver1KHours => 1,
            ZeroContributionReason::TerminatedOver1000HoursGetsYearVested => 2,
            ZeroContributionReason::VestingServiceOnly => 3,
            ZeroContributionReason::PriorPlanCarryover => 4,
            ZeroContributionReason::SixtyFivePlusFullyVested => 5,
            ZeroContributionReason::SixtyFourFullyVestedOnBirthday => 6,
        }
    }
}

impl Default for ZeroContributionReason {
    fn default() -> Self {
        ZeroContributionReason::Normal
    }
}

/// How a participant left employment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationCode {
    Deceased,
    Resigned,
    Discharged,
    Retired,
}

/// Employment status as of the snapshot date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentStatus {
    Active,
    Terminated,
}

/// Demographic facts for one participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantFacts {
    /// Ledger identity, stable across demographic changes
    pub participant_key: u32,

    pub birth_date: NaiveDate,

    pub termination_date: Option<NaiveDate>,

    pub termination_code: Option<TerminationCode>,

    pub employment_status: EmploymentStatus,

    /// Beneficiary record with no matching employee record
    pub beneficiary_only: bool,
}

impl ParticipantFacts {
    /// Whole years of age as of a date, birthday-aware
    pub fn age_on(&self, as_of: NaiveDate) -> u8 {
        let mut age = as_of.year() - self.birth_date.year();
        if (as_of.month(), as_of.day()) < (self.birth_date.month(), self.birth_date.day()) {
            age -= 1;
        }
        age.max(0) as u8
    }

    pub fn terminated_on_or_before(&self, date: NaiveDate) -> bool {
        self.termination_date.is_some_and(|d| d <= date)
    }

    pub fn is_deceased(&self) -> bool {
        self.termination_code == Some(TerminationCode::Deceased)
    }
}

/// One participant's snapshot for one plan year
///
/// Created at year rollover, then mutated by the replay engine, the
/// year-end calculator, and the forfeiture mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantYearSnapshot {
    pub participant_key: u32,

    pub plan_year: i32,

    pub classification: ClassificationCode,

    /// Special balance ("ETVA"): QDRO and 100%-vested amounts, tracked
    /// separately from the general balance
    pub special_balance: Decimal,

    /// Hours worked in the current plan year
    pub hours_worked: u32,

    /// Compensation for the current plan year
    pub income: Decimal,

    pub zero_contribution_reason: ZeroContributionReason,

    pub vesting_schedule_flag: bool,

    pub has_forfeited: bool,
}

impl ParticipantYearSnapshot {
    /// Fresh snapshot for a participant with no history
    pub fn new(participant_key: u32, plan_year: i32) -> Self {
        Self {
            participant_key,
            plan_year,
            classification: ClassificationCode::NotEnrolled,
            special_balance: Decimal::ZERO,
            hours_worked: 0,
            income: Decimal::ZERO,
            zero_contribution_reason: ZeroContributionReason::Normal,
            vesting_schedule_flag: false,
            has_forfeited: false,
        }
    }

    /// Next year's snapshot at rollover: classification and special balance
    /// carry forward, the per-year accumulators reset.
    pub fn rollover(&self, plan_year: i32) -> Self {
        Self {
            participant_key: self.participant_key,
            plan_year,
            classification: self.classification,
            special_balance: self.special_balance,
            hours_worked: 0,
            income: Decimal::ZERO,
            zero_contribution_reason: ZeroContributionReason::Normal,
            vesting_schedule_flag: self.vesting_schedule_flag,
            has_forfeited: self.has_forfeited,
        }
    }
}
