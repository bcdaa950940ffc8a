use serde::{Deserialize, Serialize};

/// An assessment year as offered to consumers, e.g. `2026-27` labelled
/// `AY 2026-27`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentYear {
    pub year: String,
    pub label: String,
}

impl AssessmentYear {
    pub fn new(year: impl Into<String>) -> Self {
        let year = year.into();
        let label = format!("AY {year}");
        Self { year, label }
    }

    /// Calendar year the assessment year starts in (`"2026-27"` → 2026).
    pub fn start_year(&self) -> Option<i32> {
        self.year.split('-').next()?.trim().parse().ok()
    }

    /// Sorts newest first. Years without a parseable start year go last.
    pub fn sort_newest_first(years: &mut [AssessmentYear]) {
        years.sort_by(|a, b| {
            b.start_year()
                .cmp(&a.start_year())
                .then_with(|| b.year.cmp(&a.year))
        });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn label_prefixes_ay() {
        assert_eq!(AssessmentYear::new("2026-27").label, "AY 2026-27");
    }

    #[test]
    fn start_year_parses_leading_component() {
        assert_eq!(AssessmentYear::new("2024-25").start_year(), Some(2024));
        assert_eq!(AssessmentYear::new("current").start_year(), None);
    }

    #[test]
    fn sort_newest_first_orders_by_start_year() {
        let mut years = vec![
            AssessmentYear::new("2023-24"),
            AssessmentYear::new("2026-27"),
            AssessmentYear::new("legacy"),
            AssessmentYear::new("2024-25"),
        ];

        AssessmentYear::sort_newest_first(&mut years);

        let ordered: Vec<_> = years.iter().map(|y| y.year.as_str()).collect();
        assert_eq!(ordered, vec!["2026-27", "2024-25", "2023-24", "legacy"]);
    }
}
