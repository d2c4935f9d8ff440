//! Contact and financing-request forms.
//!
//! Each submission produces two emails: a notification to the internal
//! address and a confirmation to the submitter, in the submitter's language.
//! Every user-supplied value is HTML-escaped before it reaches a template.

use crate::email::{EmailClient, OutgoingEmail};
use crate::i18n::{interpolate, LocaleTable};
use crate::loan::{Guarantee, LoanCategory, LoanQuote, LoanQuoteRequest, RatePolicy};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    /// Language of the page the form was sent from
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl PersonalInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalInfo {
    pub employment_status: String,
    #[serde(default)]
    pub employer: Option<String>,
    #[serde(default)]
    pub monthly_income: Option<f64>,
    #[serde(default)]
    pub other_income: Option<f64>,
    #[serde(default)]
    pub monthly_charges: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingInfo {
    pub category: LoanCategory,
    pub amount: f64,
    pub duration_months: u32,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub has_guarantee: Guarantee,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingRequest {
    pub personal: PersonalInfo,
    pub professional: ProfessionalInfo,
    pub financing: FinancingInfo,
    #[serde(default)]
    pub language: Option<String>,
}

impl FinancingRequest {
    /// The simulator input matching this request.
    pub fn quote_request(&self) -> LoanQuoteRequest {
        LoanQuoteRequest {
            amount: self.financing.amount,
            duration_months: self.financing.duration_months,
            category: self.financing.category,
            monthly_income: self.professional.monthly_income,
            has_guarantee: self.financing.has_guarantee,
        }
    }
}

/// Subject and body of a rendered email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub subject: String,
    pub html: String,
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("Missing required field: {}", field);
    }
    Ok(())
}

fn require_email(value: &str, field: &str) -> Result<()> {
    require(value, field)?;
    let trimmed = value.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => bail!("Invalid email address in field: {}", field),
    }
}

impl ContactForm {
    pub fn validate(&self) -> Result<()> {
        require(&self.name, "name")?;
        require_email(&self.email, "email")?;
        require(&self.message, "message")?;
        Ok(())
    }
}

impl FinancingRequest {
    pub fn validate(&self) -> Result<()> {
        require(&self.personal.first_name, "personal.firstName")?;
        require(&self.personal.last_name, "personal.lastName")?;
        require_email(&self.personal.email, "personal.email")?;
        require(&self.personal.phone, "personal.phone")?;
        require(
            &self.professional.employment_status,
            "professional.employmentStatus",
        )?;
        Ok(())
    }
}

// ==================== Templates ====================

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n\
<body style=\"font-family: Arial, sans-serif; color: #1f2937; max-width: 600px; margin: 0 auto;\">\n\
<h2 style=\"color: #0f4c81;\">{}</h2>\n{}\n</body>\n</html>",
        escape_html(title),
        escape_html(title),
        body
    )
}

fn row(label: &str, value: &str) -> String {
    format!(
        "<tr><td style=\"padding: 4px 12px 4px 0; font-weight: bold;\">{}</td><td>{}</td></tr>",
        escape_html(label),
        escape_html(value)
    )
}

fn optional_row(label: &str, value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => row(label, v),
        None => String::new(),
    }
}

fn money(value: f64) -> String {
    format!("{:.0}", value)
}

fn paragraphs(text: &str) -> String {
    text.lines()
        .map(|line| format!("<p>{}</p>", escape_html(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn guarantee_label(guarantee: Guarantee) -> &'static str {
    match guarantee {
        Guarantee::Yes => "simulator.guarantee.yes",
        Guarantee::No => "simulator.guarantee.no",
        Guarantee::Maybe => "simulator.guarantee.maybe",
    }
}

pub fn contact_notification(table: &LocaleTable, form: &ContactForm, now: DateTime<Utc>) -> Rendered {
    let lang = table.default_language();
    let name = form.name.trim();
    let subject = interpolate(
        table.resolve(lang, "email.contact.notification_subject"),
        &[("name", name)],
    );

    let rows = [
        row(table.resolve(lang, "contact.name"), name),
        row(table.resolve(lang, "contact.email"), form.email.trim()),
        optional_row(table.resolve(lang, "request.fields.phone"), form.phone.as_deref()),
        optional_row(table.resolve(lang, "contact.subject"), form.subject.as_deref()),
        row(
            table.resolve(lang, "email.sent_at"),
            &now.format("%d/%m/%Y %H:%M UTC").to_string(),
        ),
    ]
    .concat();

    let body = format!(
        "<table>{}</table>\n<h3>{}</h3>\n{}",
        rows,
        escape_html(table.resolve(lang, "contact.message")),
        paragraphs(&form.message)
    );

    Rendered {
        html: layout(&subject, &body),
        subject,
    }
}

pub fn contact_confirmation(table: &LocaleTable, form: &ContactForm, language: &str) -> Rendered {
    let subject = table
        .resolve(language, "email.contact.confirmation_subject")
        .to_string();
    let name = escape_html(form.name.trim());
    let greeting = interpolate(
        table.resolve(language, "email.contact.greeting"),
        &[("name", name.as_str())],
    );

    let body = format!(
        "<p>{}</p>\n<p>{}</p>\n<blockquote style=\"border-left: 3px solid #0f4c81; padding-left: 12px;\">{}</blockquote>\n<p>{}</p>",
        greeting,
        escape_html(table.resolve(language, "email.contact.confirmation_body")),
        paragraphs(&form.message),
        escape_html(table.resolve(language, "email.signature"))
    );

    Rendered {
        html: layout(&subject, &body),
        subject,
    }
}

pub fn financing_notification(
    table: &LocaleTable,
    request: &FinancingRequest,
    quote: Option<&LoanQuote>,
    now: DateTime<Utc>,
) -> Rendered {
    let lang = table.default_language();
    let t = |key: &'static str| table.resolve(lang, key);
    let name = request.personal.full_name();
    let subject = interpolate(
        t("email.request.notification_subject"),
        &[("name", name.as_str())],
    );

    let personal = &request.personal;
    let professional = &request.professional;
    let financing = &request.financing;

    let personal_rows = [
        row(t("request.fields.first_name"), &personal.first_name),
        row(t("request.fields.last_name"), &personal.last_name),
        row(t("request.fields.email"), &personal.email),
        row(t("request.fields.phone"), &personal.phone),
        optional_row(t("request.fields.birth_date"), personal.birth_date.as_deref()),
        optional_row(t("request.fields.address"), personal.address.as_deref()),
        optional_row(t("request.fields.city"), personal.city.as_deref()),
        optional_row(t("request.fields.postal_code"), personal.postal_code.as_deref()),
        optional_row(t("request.fields.country"), personal.country.as_deref()),
    ]
    .concat();

    let professional_rows = [
        row(t("request.fields.employment_status"), &professional.employment_status),
        optional_row(t("request.fields.employer"), professional.employer.as_deref()),
        optional_row(
            t("request.fields.monthly_income"),
            professional.monthly_income.map(money).as_deref(),
        ),
        optional_row(
            t("request.fields.other_income"),
            professional.other_income.map(money).as_deref(),
        ),
        optional_row(
            t("request.fields.monthly_charges"),
            professional.monthly_charges.map(money).as_deref(),
        ),
    ]
    .concat();

    let mut financing_rows = [
        row(t("simulator.category"), financing.category.code()),
        row(t("simulator.amount"), &money(financing.amount)),
        row(t("simulator.duration"), &financing.duration_months.to_string()),
        optional_row(t("request.fields.purpose"), financing.purpose.as_deref()),
        row(t("simulator.guarantee.label"), t(guarantee_label(financing.has_guarantee))),
    ]
    .concat();

    if let Some(quote) = quote {
        financing_rows.push_str(&row(t("simulator.result.rate"), &format!("{:.2} %", quote.annual_rate_percent)));
        financing_rows.push_str(&row(t("simulator.result.monthly"), &money(quote.monthly_payment)));
        financing_rows.push_str(&row(t("simulator.result.total"), &money(quote.total_payment)));
    }

    let received_on = now.format("%d/%m/%Y %H:%M UTC").to_string();
    let received = interpolate(t("email.received_at"), &[("date", received_on.as_str())]);

    let body = format!(
        "<h3>{}</h3>\n<table>{}</table>\n<h3>{}</h3>\n<table>{}</table>\n<h3>{}</h3>\n<table>{}</table>\n<p>{}</p>",
        escape_html(t("request.steps.personal")),
        personal_rows,
        escape_html(t("request.steps.professional")),
        professional_rows,
        escape_html(t("request.steps.financing")),
        financing_rows,
        escape_html(&received)
    );

    Rendered {
        html: layout(&subject, &body),
        subject,
    }
}

pub fn financing_confirmation(
    table: &LocaleTable,
    request: &FinancingRequest,
    quote: Option<&LoanQuote>,
    language: &str,
) -> Rendered {
    let subject = table
        .resolve(language, "email.request.confirmation_subject")
        .to_string();
    let first_name = escape_html(request.personal.first_name.trim());
    let greeting = interpolate(
        table.resolve(language, "email.contact.greeting"),
        &[("name", first_name.as_str())],
    );

    let estimate = quote
        .map(|quote| {
            let monthly = money(quote.monthly_payment);
            let duration = request.financing.duration_months.to_string();
            let rate = format!("{:.2}", quote.annual_rate_percent);
            let text = interpolate(
                table.resolve(language, "email.request.estimate"),
                &[
                    ("monthly", monthly.as_str()),
                    ("duration", duration.as_str()),
                    ("rate", rate.as_str()),
                ],
            );
            format!(
                "<p>{}</p>\n<p style=\"font-size: 12px; color: #6b7280;\">{}</p>\n",
                escape_html(&text),
                escape_html(table.resolve(language, "simulator.disclaimer"))
            )
        })
        .unwrap_or_default();

    let body = format!(
        "<p>{}</p>\n<p>{}</p>\n{}<p style=\"font-size: 12px; color: #6b7280;\">{}</p>\n<p>{}</p>",
        greeting,
        escape_html(table.resolve(language, "email.request.confirmation_body")),
        estimate,
        escape_html(table.resolve(language, "legal.warning")),
        escape_html(table.resolve(language, "email.signature"))
    );

    Rendered {
        html: layout(&subject, &body),
        subject,
    }
}

// ==================== Relay ====================

/// Language for the confirmation email: the form's own, if supported.
fn confirmation_language<'a>(table: &'a LocaleTable, requested: Option<&'a str>, fallback: &'a str) -> &'a str {
    match requested {
        Some(code) if table.tree(code).is_some() => code,
        _ => fallback,
    }
}

/// Validate a contact form and send both emails.
pub async fn relay_contact(
    client: &EmailClient,
    notification_to: &str,
    table: &LocaleTable,
    form: &ContactForm,
    fallback_language: &str,
) -> Result<()> {
    form.validate()?;
    let language = confirmation_language(table, form.language.as_deref(), fallback_language);

    let notification = contact_notification(table, form, Utc::now());
    client
        .send(&OutgoingEmail {
            to: notification_to.to_string(),
            subject: notification.subject,
            html: notification.html,
            reply_to: Some(form.email.trim().to_string()),
        })
        .await
        .context("Failed to send contact notification")?;

    let confirmation = contact_confirmation(table, form, language);
    client
        .send(&OutgoingEmail {
            to: form.email.trim().to_string(),
            subject: confirmation.subject,
            html: confirmation.html,
            reply_to: None,
        })
        .await
        .context("Failed to send contact confirmation")?;

    info!("Contact form relayed for {}", form.email.trim());
    Ok(())
}

/// Validate a financing request and send both emails.
///
/// The indicative quote is attached only when the request is within the
/// simulator's domain; otherwise the emails go out without it.
pub async fn relay_financing_request(
    client: &EmailClient,
    notification_to: &str,
    table: &LocaleTable,
    policy: &RatePolicy,
    request: &FinancingRequest,
    fallback_language: &str,
) -> Result<()> {
    request.validate()?;
    let language = confirmation_language(table, request.language.as_deref(), fallback_language);

    let quote = match policy.quote(&request.quote_request()) {
        Ok(quote) => Some(quote),
        Err(e) => {
            warn!("No estimate for financing request: {}", e);
            None
        }
    };

    let notification = financing_notification(table, request, quote.as_ref(), Utc::now());
    client
        .send(&OutgoingEmail {
            to: notification_to.to_string(),
            subject: notification.subject,
            html: notification.html,
            reply_to: Some(request.personal.email.trim().to_string()),
        })
        .await
        .context("Failed to send financing request notification")?;

    let confirmation = financing_confirmation(table, request, quote.as_ref(), language);
    client
        .send(&OutgoingEmail {
            to: request.personal.email.trim().to_string(),
            subject: confirmation.subject,
            html: confirmation.html,
            reply_to: None,
        })
        .await
        .context("Failed to send financing request confirmation")?;

    info!(
        "Financing request relayed for {} ({}, {} over {} months)",
        request.personal.email.trim(),
        request.financing.category.code(),
        request.financing.amount,
        request.financing.duration_months
    );
    Ok(())
}
