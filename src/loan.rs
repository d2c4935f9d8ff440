//! Loan estimator behind the simulator page.
//!
//! A quote is a pure function of the request and the rate policy: the
//! category base rate is adjusted by a few additive rules, floored at zero,
//! and fed into the standard fixed-rate amortization formula.
//!
//! Rates are handled in basis points (1/100 of a percent) so that rule
//! arithmetic is exact and a zero rate is detected without tolerance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Loan products offered on the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum LoanCategory {
    Personal,
    Auto,
    RealEstate,
    Professional,
    Student,
    Consolidation,
    /// Anything the form sends that is not one of the products above.
    Default,
}

impl LoanCategory {
    pub const ALL: [LoanCategory; 7] = [
        LoanCategory::Personal,
        LoanCategory::Auto,
        LoanCategory::RealEstate,
        LoanCategory::Professional,
        LoanCategory::Student,
        LoanCategory::Consolidation,
        LoanCategory::Default,
    ];

    /// Parse a category code. Unrecognized codes map to `Default`.
    pub fn parse(code: &str) -> LoanCategory {
        match code.trim().to_ascii_lowercase().as_str() {
            "personal" => LoanCategory::Personal,
            "auto" => LoanCategory::Auto,
            "real_estate" | "realestate" | "real-estate" => LoanCategory::RealEstate,
            "professional" => LoanCategory::Professional,
            "student" => LoanCategory::Student,
            "consolidation" => LoanCategory::Consolidation,
            _ => LoanCategory::Default,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LoanCategory::Personal => "personal",
            LoanCategory::Auto => "auto",
            LoanCategory::RealEstate => "real_estate",
            LoanCategory::Professional => "professional",
            LoanCategory::Student => "student",
            LoanCategory::Consolidation => "consolidation",
            LoanCategory::Default => "default",
        }
    }
}

impl From<String> for LoanCategory {
    fn from(code: String) -> Self {
        LoanCategory::parse(&code)
    }
}

/// Whether the borrower can provide a guarantee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Guarantee {
    Yes,
    No,
    /// Unspecified or "I don't know".
    #[default]
    Maybe,
}

impl From<String> for Guarantee {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "oui" | "true" => Guarantee::Yes,
            "no" | "non" | "false" => Guarantee::No,
            _ => Guarantee::Maybe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanQuoteRequest {
    /// Borrowed amount, in currency units
    pub amount: f64,
    pub duration_months: u32,
    pub category: LoanCategory,
    /// Declared net monthly income
    #[serde(default)]
    pub monthly_income: Option<f64>,
    #[serde(default)]
    pub has_guarantee: Guarantee,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanQuote {
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub annual_rate_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    HighIncome,
    Guarantee,
    ShortTerm,
    SmallLoan,
}

/// One rule that fired, with its effect in basis points (negative = discount).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAdjustment {
    pub kind: AdjustmentKind,
    pub basis_points: i32,
}

/// How the annual rate of a quote was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateBreakdown {
    pub category: LoanCategory,
    pub base_basis_points: i32,
    pub adjustments: Vec<AppliedAdjustment>,
    /// Final rate after adjustments and the zero floor
    pub annual_basis_points: i32,
    /// Whether the zero floor changed the rate
    pub floored: bool,
}

impl RateBreakdown {
    pub fn annual_rate_percent(&self) -> f64 {
        f64::from(self.annual_basis_points) / 100.0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum QuoteError {
    #[error("Amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    #[error("Duration must be at least one month")]
    InvalidDuration,

    #[error("Monthly income must be a non-negative number, got {0}")]
    InvalidIncome(f64),

    #[error("Quote is not representable for amount {amount} over {duration_months} months")]
    Unrepresentable { amount: f64, duration_months: u32 },
}

/// Base rates and adjustment rules, all rates in basis points.
#[derive(Debug, Clone, PartialEq)]
pub struct RatePolicy {
    pub base_rates: Vec<(LoanCategory, i32)>,
    /// Used for categories missing from `base_rates`
    pub default_rate: i32,
    pub high_income_threshold: f64,
    pub high_income_discount: i32,
    pub guarantee_discount: i32,
    pub short_term_months: u32,
    pub short_term_discount: i32,
    pub small_loan_threshold: f64,
    pub small_loan_surcharge: i32,
}

impl RatePolicy {
    /// The rates published on the simulator page.
    pub fn standard() -> Self {
        Self {
            base_rates: vec![
                (LoanCategory::Personal, 290),
                (LoanCategory::Auto, 320),
                (LoanCategory::RealEstate, 350),
                (LoanCategory::Professional, 420),
                (LoanCategory::Student, 190),
                (LoanCategory::Consolidation, 450),
                (LoanCategory::Default, 350),
            ],
            default_rate: 350,
            high_income_threshold: 4000.0,
            high_income_discount: 30,
            guarantee_discount: 50,
            short_term_months: 24,
            short_term_discount: 20,
            small_loan_threshold: 10_000.0,
            small_loan_surcharge: 30,
        }
    }

    pub fn base_rate(&self, category: LoanCategory) -> i32 {
        self.base_rates
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, rate)| *rate)
            .unwrap_or(self.default_rate)
    }

    /// Apply the adjustment rules to the category base rate.
    pub fn rate_for(&self, request: &LoanQuoteRequest) -> RateBreakdown {
        let base = self.base_rate(request.category);
        let mut adjustments = Vec::new();

        if request
            .monthly_income
            .is_some_and(|income| income > self.high_income_threshold)
        {
            adjustments.push(AppliedAdjustment {
                kind: AdjustmentKind::HighIncome,
                basis_points: -self.high_income_discount,
            });
        }
        if request.has_guarantee == Guarantee::Yes {
            adjustments.push(AppliedAdjustment {
                kind: AdjustmentKind::Guarantee,
                basis_points: -self.guarantee_discount,
            });
        }
        if request.duration_months <= self.short_term_months {
            adjustments.push(AppliedAdjustment {
                kind: AdjustmentKind::ShortTerm,
                basis_points: -self.short_term_discount,
            });
        }
        if request.amount < self.small_loan_threshold {
            adjustments.push(AppliedAdjustment {
                kind: AdjustmentKind::SmallLoan,
                basis_points: self.small_loan_surcharge,
            });
        }

        let adjusted = base + adjustments.iter().map(|a| a.basis_points).sum::<i32>();

        RateBreakdown {
            category: request.category,
            base_basis_points: base,
            adjustments,
            annual_basis_points: adjusted.max(0),
            floored: adjusted < 0,
        }
    }

    /// Compute a quote under this policy.
    pub fn quote(&self, request: &LoanQuoteRequest) -> Result<LoanQuote, QuoteError> {
        self.quote_with_breakdown(request).map(|(quote, _)| quote)
    }

    pub fn quote_with_breakdown(
        &self,
        request: &LoanQuoteRequest,
    ) -> Result<(LoanQuote, RateBreakdown), QuoteError> {
        validate(request)?;

        let breakdown = self.rate_for(request);
        let amount = request.amount;
        let months = f64::from(request.duration_months);
        let monthly_rate = breakdown.annual_rate_percent() / 100.0 / 12.0;

        let monthly_payment = if breakdown.annual_basis_points == 0 {
            amount / months
        } else {
            // Same as A·r·(1+r)^n / ((1+r)^n − 1), without overflowing for long terms.
            amount * monthly_rate / (1.0 - (1.0 + monthly_rate).powf(-months))
        };
        let repaid = monthly_payment * months;

        // Rounded from the unrounded total so it stays a whole, non-negative
        // amount even when `amount` has cents.
        let interest = (repaid - amount).round();

        let quote = LoanQuote {
            monthly_payment: monthly_payment.round(),
            total_payment: repaid.round(),
            total_interest: if interest > 0.0 { interest } else { 0.0 },
            annual_rate_percent: round2(breakdown.annual_rate_percent()),
        };

        if !(quote.monthly_payment.is_finite()
            && quote.total_payment.is_finite()
            && quote.total_interest.is_finite())
        {
            return Err(QuoteError::Unrepresentable {
                amount,
                duration_months: request.duration_months,
            });
        }

        Ok((quote, breakdown))
    }
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Compute a quote with the standard rate policy.
pub fn quote(request: &LoanQuoteRequest) -> Result<LoanQuote, QuoteError> {
    RatePolicy::standard().quote(request)
}

fn validate(request: &LoanQuoteRequest) -> Result<(), QuoteError> {
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(QuoteError::InvalidAmount(request.amount));
    }
    if request.duration_months == 0 {
        return Err(QuoteError::InvalidDuration);
    }
    if let Some(income) = request.monthly_income {
        if !income.is_finite() || income < 0.0 {
            return Err(QuoteError::InvalidIncome(income));
        }
    }
    Ok(())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
