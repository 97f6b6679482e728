//! Spending analytics over personal expenses.
//!
//! Pure reductions: callers load the expenses, these functions only fold them.

use chrono::{Datelike, NaiveDate};

use crate::{EngineError, Expense, ExpenseCategory, MoneyCents, ResultEngine};

/// Months covered by the monthly chart.
pub const CHART_MONTHS: u32 = 6;

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total: MoneyCents,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    /// Short label, e.g. `Jan 2026`.
    pub label: String,
    pub total: MoneyCents,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryShare {
    pub category: ExpenseCategory,
    pub total: MoneyCents,
    /// Share of the overall total, in percent.
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Insights {
    pub total: MoneyCents,
    pub count: usize,
    /// Average per expense, rounded to the cent.
    pub average: MoneyCents,
    pub this_month: MoneyCents,
    pub last_month: MoneyCents,
    /// Change of this month against last month, in percent. 0 when last month
    /// had no spending.
    pub monthly_change_pct: f64,
    pub top_category: Option<CategoryShare>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: MoneyCents,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub total: MoneyCents,
    pub count: usize,
    pub categories: Vec<CategoryTotal>,
    /// Newest day first.
    pub days: Vec<DailyTotal>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseAnalytics {
    pub categories: Vec<CategoryTotal>,
    pub months: Vec<MonthlyTotal>,
    pub insights: Insights,
}

/// Per-category totals, largest first. Categories without expenses are left
/// out.
///
/// Every reduction in this module fails with [`EngineError::InvalidAmount`]
/// when a total overflows.
pub fn category_totals<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> ResultEngine<Vec<CategoryTotal>> {
    let mut totals: Vec<CategoryTotal> = ExpenseCategory::ALL
        .into_iter()
        .map(|category| CategoryTotal {
            category,
            total: MoneyCents::ZERO,
            count: 0,
        })
        .collect();

    for expense in expenses {
        if let Some(slot) = totals.iter_mut().find(|t| t.category == expense.category) {
            slot.total = add(slot.total, expense.amount)?;
            slot.count += 1;
        }
    }

    totals.retain(|t| t.count > 0);
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    Ok(totals)
}

/// Totals for the `months` calendar months ending with `today`'s month,
/// oldest first.
pub fn monthly_totals(
    expenses: &[Expense],
    today: NaiveDate,
    months: u32,
) -> ResultEngine<Vec<MonthlyTotal>> {
    (0..months)
        .rev()
        .map(|back| {
            let (year, month) = months_back(today.year(), today.month(), back);
            let (total, count) = fold_month(expenses, year, month)?;
            Ok(MonthlyTotal {
                year,
                month,
                label: month_label(year, month),
                total,
                count,
            })
        })
        .collect()
}

/// Headline numbers for the analytics dashboard.
pub fn insights(expenses: &[Expense], today: NaiveDate) -> ResultEngine<Insights> {
    let total = MoneyCents::total(expenses.iter().map(|e| e.amount))?;
    let count = expenses.len();
    let average = if count == 0 {
        MoneyCents::ZERO
    } else {
        MoneyCents::new((total.cents() as f64 / count as f64).round() as i64)
    };

    let (this_month, _) = fold_month(expenses, today.year(), today.month())?;
    let (prev_year, prev_month) = months_back(today.year(), today.month(), 1);
    let (last_month, _) = fold_month(expenses, prev_year, prev_month)?;

    let monthly_change_pct = if last_month.is_positive() {
        (this_month.cents() as f64 - last_month.cents() as f64) / last_month.cents() as f64
            * 100.0
    } else {
        0.0
    };

    let top_category = category_totals(expenses)?.into_iter().next().map(|top| {
        let percentage = if total.is_positive() {
            top.total.cents() as f64 / total.cents() as f64 * 100.0
        } else {
            0.0
        };
        CategoryShare {
            category: top.category,
            total: top.total,
            percentage,
        }
    });

    Ok(Insights {
        total,
        count,
        average,
        this_month,
        last_month,
        monthly_change_pct,
        top_category,
    })
}

/// Everything the monthly view needs for one calendar month.
///
/// # Errors
///
/// [`EngineError::InvalidDate`] when `month` is not in `1..=12`,
/// [`EngineError::InvalidAmount`] when a total overflows.
pub fn month_summary(expenses: &[Expense], year: i32, month: u32) -> ResultEngine<MonthSummary> {
    if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
        return Err(EngineError::InvalidDate(format!("{year}-{month:02}")));
    }

    let in_month: Vec<&Expense> = expenses
        .iter()
        .filter(|e| e.date.year() == year && e.date.month() == month)
        .collect();

    let mut days: Vec<DailyTotal> = Vec::new();
    for expense in &in_month {
        match days.iter_mut().find(|d| d.date == expense.date) {
            Some(day) => {
                day.total = add(day.total, expense.amount)?;
                day.count += 1;
            }
            None => days.push(DailyTotal {
                date: expense.date,
                total: expense.amount,
                count: 1,
            }),
        }
    }
    days.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(MonthSummary {
        year,
        month,
        total: MoneyCents::total(in_month.iter().map(|e| e.amount))?,
        count: in_month.len(),
        categories: category_totals(in_month.iter().copied())?,
        days,
    })
}

/// Category totals, the six-month chart and the insights in one pass over the
/// caller's data.
pub fn expense_analytics(expenses: &[Expense], today: NaiveDate) -> ResultEngine<ExpenseAnalytics> {
    Ok(ExpenseAnalytics {
        categories: category_totals(expenses)?,
        months: monthly_totals(expenses, today, CHART_MONTHS)?,
        insights: insights(expenses, today)?,
    })
}

fn add(total: MoneyCents, amount: MoneyCents) -> ResultEngine<MoneyCents> {
    total
        .checked_add(amount)
        .ok_or_else(|| EngineError::InvalidAmount("total too large".to_string()))
}

fn fold_month(expenses: &[Expense], year: i32, month: u32) -> ResultEngine<(MoneyCents, usize)> {
    expenses
        .iter()
        .filter(|e| e.date.year() == year && e.date.month() == month)
        .try_fold((MoneyCents::ZERO, 0), |(total, count), e| {
            Ok((add(total, e.amount)?, count + 1))
        })
}

fn months_back(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.format("%b %Y").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(cents: i64, category: ExpenseCategory, date: NaiveDate) -> Expense {
        Expense::new("item", MoneyCents::new(cents), category, date)
    }

    fn sample() -> Vec<Expense> {
        vec![
            expense(1200, ExpenseCategory::Food, day(2026, 3, 2)),
            expense(800, ExpenseCategory::Food, day(2026, 3, 2)),
            expense(5000, ExpenseCategory::Utilities, day(2026, 3, 15)),
            expense(1000, ExpenseCategory::Transport, day(2026, 2, 10)),
            expense(3000, ExpenseCategory::Food, day(2025, 12, 24)),
            expense(9900, ExpenseCategory::Shopping, day(2025, 1, 5)),
        ]
    }

    #[test]
    fn categories_sorted_by_total() {
        let totals = category_totals(&sample()).unwrap();
        let order: Vec<ExpenseCategory> = totals.iter().map(|t| t.category).collect();
        assert_eq!(
            order,
            vec![
                ExpenseCategory::Shopping,
                ExpenseCategory::Food,
                ExpenseCategory::Utilities,
                ExpenseCategory::Transport,
            ]
        );
        assert_eq!(totals[1].total, MoneyCents::new(5000));
        assert_eq!(totals[1].count, 3);
    }

    #[test]
    fn six_month_window_crosses_year_boundary() {
        let months = monthly_totals(&sample(), day(2026, 3, 20), CHART_MONTHS).unwrap();
        let labels: Vec<&str> = months.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Oct 2025", "Nov 2025", "Dec 2025", "Jan 2026", "Feb 2026", "Mar 2026"]
        );
        assert_eq!(months[2].total, MoneyCents::new(3000));
        assert_eq!(months[5].total, MoneyCents::new(7000));
        assert_eq!(months[5].count, 3);
        // January 2025 is outside the window.
        let window_total = MoneyCents::total(months.iter().map(|m| m.total)).unwrap();
        assert_eq!(window_total, MoneyCents::new(11000));
    }

    #[test]
    fn insights_compare_with_last_month() {
        let insights = insights(&sample(), day(2026, 3, 20)).unwrap();

        assert_eq!(insights.total, MoneyCents::new(20900));
        assert_eq!(insights.count, 6);
        assert_eq!(insights.average, MoneyCents::new(3483));
        assert_eq!(insights.this_month, MoneyCents::new(7000));
        assert_eq!(insights.last_month, MoneyCents::new(1000));
        assert!((insights.monthly_change_pct - 600.0).abs() < 1e-9);

        let top = insights.top_category.unwrap();
        assert_eq!(top.category, ExpenseCategory::Shopping);
        assert!((top.percentage - 9900.0 / 20900.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn insights_on_empty_input() {
        let insights = insights(&[], day(2026, 1, 1)).unwrap();
        assert_eq!(insights.total, MoneyCents::ZERO);
        assert_eq!(insights.average, MoneyCents::ZERO);
        assert_eq!(insights.monthly_change_pct, 0.0);
        assert!(insights.top_category.is_none());
    }

    #[test]
    fn month_summary_groups_days() {
        let summary = month_summary(&sample(), 2026, 3).unwrap();

        assert_eq!(summary.total, MoneyCents::new(7000));
        assert_eq!(summary.count, 3);
        assert_eq!(summary.days.len(), 2);
        assert_eq!(summary.days[0].date, day(2026, 3, 15));
        assert_eq!(summary.days[1].total, MoneyCents::new(2000));
        assert_eq!(summary.days[1].count, 2);
        assert_eq!(summary.categories[0].category, ExpenseCategory::Utilities);
    }

    #[test]
    fn month_summary_rejects_bad_month() {
        assert!(matches!(
            month_summary(&sample(), 2026, 13),
            Err(EngineError::InvalidDate(_))
        ));
    }

    #[test]
    fn overflowing_totals_are_errors() {
        let huge = MoneyCents::new(i64::MAX / 2 + 1);
        let expenses = vec![
            Expense::new("a", huge, ExpenseCategory::Food, day(2026, 3, 1)),
            Expense::new("b", huge, ExpenseCategory::Food, day(2026, 3, 1)),
        ];

        assert!(matches!(
            category_totals(&expenses),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            insights(&expenses, day(2026, 3, 20)),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            month_summary(&expenses, 2026, 3),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(expense_analytics(&expenses, day(2026, 3, 20)).is_err());
    }

    #[test]
    fn months_back_wraps() {
        assert_eq!(months_back(2026, 1, 1), (2025, 12));
        assert_eq!(months_back(2026, 3, 0), (2026, 3));
        assert_eq!(months_back(2026, 3, 14), (2025, 1));
    }
}
