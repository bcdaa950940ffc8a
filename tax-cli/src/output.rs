//! Plain-text rendering for the terminal.

use std::fmt::Write;

use rust_decimal::Decimal;
use tax_core::calculations::{format_percent, format_rupees};
use tax_core::{AssessmentYear, CtcConfiguration, IncomeBreakdown, PfPolicy, ScenarioVersion};

use crate::app::ComparisonReport;

const RULE: &str = "----------------------------------------------";

fn row(
    out: &mut String,
    label: &str,
    value: impl AsRef<str>,
) {
    let _ = writeln!(out, "  {label:<32}{:>14}", value.as_ref());
}

fn rate(fraction: Decimal) -> String {
    format_percent(fraction * Decimal::ONE_HUNDRED, 2)
}

pub fn pf_policy(policy: &PfPolicy) -> String {
    match policy {
        PfPolicy::Percentage(p) => format!("{}% of CTC", p.normalize()),
        PfPolicy::Fixed(amount) => format!("{}/month", format_rupees(*amount)),
    }
}

pub fn breakdown(
    b: &IncomeBreakdown,
    assessment_year: &str,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "AY {assessment_year} (new regime), CTC {}", format_rupees(b.ctc));
    let _ = writeln!(out, "{RULE}");
    row(&mut out, "Employer PF (monthly)", format_rupees(b.employer_pf_monthly));
    row(&mut out, "Employee PF (monthly)", format_rupees(b.employee_pf_monthly));
    row(&mut out, "Gross after employer PF", format_rupees(b.gross_annual_after_employer_pf));
    row(&mut out, "Taxable income", format_rupees(b.taxable_income));

    let _ = writeln!(out, "{RULE}");
    for line in &b.slab_lines {
        let label = format!(
            "{} - {} @ {}",
            format_rupees(line.lower),
            line.upper
                .amount()
                .map_or_else(|| "above".to_string(), format_rupees),
            rate(line.rate),
        );
        row(&mut out, &label, format_rupees(line.contribution));
    }
    row(&mut out, "Slab tax", format_rupees(b.slab_tax_total));
    if !b.rebate_applied.is_zero() {
        row(&mut out, "Rebate u/s 87A", format!("-{}", format_rupees(b.rebate_applied)));
    }
    row(&mut out, "Cess", format_rupees(b.cess));
    row(&mut out, "Total tax (annual)", format_rupees(b.total_tax_annual));
    row(&mut out, "Effective rate", format_percent(b.effective_tax_rate(), 2));

    let _ = writeln!(out, "{RULE}");
    row(&mut out, "Gross monthly", format_rupees(b.gross_monthly));
    row(&mut out, "Tax monthly", format_rupees(b.tax_monthly));
    row(&mut out, "In-hand monthly", format_rupees(b.net_monthly));

    for warning in b.warnings() {
        let _ = writeln!(out, "warning: {warning}");
    }
    out
}

pub fn comparison(report: &ComparisonReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "AY {} (new regime), PF {}",
        report.assessment_year,
        pf_policy(&report.pf_policy)
    );
    let _ = writeln!(
        out,
        "Current CTC {} -> in-hand {}/month",
        format_rupees(report.baseline.ctc),
        format_rupees(report.baseline.net_monthly)
    );
    let _ = writeln!(
        out,
        "\n  {:<3}{:>14}{:>10}{:>14}{:>14}{:>14}",
        "#", "CTC", "Hike", "Tax/year", "In-hand/mo", "Extra/mo"
    );
    for (idx, (option, result)) in report.options.iter().zip(&report.results).enumerate() {
        let _ = writeln!(
            out,
            "  {:<3}{:>14}{:>10}{:>14}{:>14}{:>14}",
            idx + 1,
            format_rupees(result.ctc),
            format_percent(result.hike_percent, 1),
            format_rupees(option.total_tax_annual),
            format_rupees(result.net_monthly),
            format_rupees(result.extra_monthly_cash),
        );
    }
    if report.dropped > 0 {
        let _ = writeln!(out, "({} more salaries ignored)", report.dropped);
    }
    if !report.summary.is_empty() {
        let _ = writeln!(out, "\n{}", report.summary);
    }
    out
}

pub fn years(years: &[AssessmentYear]) -> String {
    if years.is_empty() {
        return "No assessment years configured.\n".to_string();
    }
    years.iter().map(|y| format!("{}\n", y.label)).collect()
}

pub fn versions(versions: &[ScenarioVersion]) -> String {
    if versions.is_empty() {
        return "No saved scenarios.\n".to_string();
    }
    versions
        .iter()
        .map(|v| format!("v{:<4} {}\n", v.version, v.saved_at.format("%Y-%m-%d %H:%M:%S UTC")))
        .collect()
}

pub fn scenario(s: &CtcConfiguration) -> String {
    let salaries: Vec<String> = s.expected_salaries.iter().map(|&c| format_rupees(c)).collect();
    format!(
        "Scenario v{} saved {}\n  AY {}, PF {}\n  Current CTC {}\n  Expected {}\n",
        s.version,
        s.saved_at.format("%Y-%m-%d %H:%M:%S UTC"),
        s.assessment_year,
        pf_policy(&s.pf_policy),
        format_rupees(s.previous_salary),
        salaries.join(", "),
    )
}
