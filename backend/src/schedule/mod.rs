//! Derived dashboard state: expense instances and notifications.
//!
//! Everything here is a pure function over already-loaded rows so it can be
//! recomputed on every request without touching the database.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{
    ExpenseInstance, Notification, NotificationKind, OperationalCost, Quote, QuoteStatus,
    Recurrence,
};

/// Widest date range accepted when listing expense instances.
pub const MAX_RANGE_DAYS: i64 = 366;

/// Build the id of the occurrence of `cost_id` due on `due_date`.
pub fn instance_id(cost_id: &str, due_date: NaiveDate) -> String {
    format!("{}:{}", cost_id, due_date.format("%Y-%m-%d"))
}

/// Split an instance id back into its cost id and due date.
pub fn parse_instance_id(id: &str) -> Option<(&str, NaiveDate)> {
    let (cost_id, date) = id.rsplit_once(':')?;
    if cost_id.is_empty() {
        return None;
    }
    let due_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((cost_id, due_date))
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Due dates of `cost` that fall inside `[from, to]`, never before its start
/// date nor after its end date.
fn occurrences(cost: &OperationalCost, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let first = cost.start_date.max(from);
    let last = cost.end_date.map_or(to, |end| end.min(to));
    if first > last {
        return Vec::new();
    }

    let in_range = |d: &NaiveDate| *d >= first && *d <= last;

    match cost.recurrence {
        Recurrence::Once => Some(cost.start_date).filter(in_range).into_iter().collect(),
        Recurrence::Monthly => {
            let mut dates = Vec::new();
            let (mut year, mut month) = (first.year(), first.month());
            while (year, month) <= (last.year(), last.month()) {
                if let Some(date) = clamped_date(year, month, cost.due_day).filter(in_range) {
                    dates.push(date);
                }
                if month == 12 {
                    year += 1;
                    month = 1;
                } else {
                    month += 1;
                }
            }
            dates
        }
        Recurrence::Yearly => (first.year()..=last.year())
            .filter_map(|year| clamped_date(year, cost.start_date.month(), cost.due_day))
            .filter(in_range)
            .collect(),
    }
}

/// Expand operational costs into dated, unpaid instances inside `[from, to]`,
/// sorted by due date then description.
pub fn generate_instances(
    costs: &[OperationalCost],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<ExpenseInstance> {
    let mut seen = HashSet::new();
    let mut instances = Vec::new();

    for cost in costs.iter().filter(|c| c.active) {
        for due_date in occurrences(cost, from, to) {
            let id = instance_id(&cost.id, due_date);
            if !seen.insert(id.clone()) {
                continue;
            }
            instances.push(ExpenseInstance {
                id,
                cost_id: cost.id.clone(),
                description: cost.description.clone(),
                category: cost.category.clone(),
                amount_cents: cost.amount_cents,
                due_date,
                paid: false,
                paid_at: None,
            });
        }
    }

    instances.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| a.description.cmp(&b.description))
    });
    instances
}

/// Render cents as a plain decimal amount, e.g. `12345` -> `123.45`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Build dashboard reminders for unpaid expenses and quotes about to expire.
///
/// Unpaid instances due before `today` are overdue; those due within
/// `window_days` are due soon. Sent quotes whose validity ends inside the
/// window are expiring. Ids are unique and the list is sorted by due date.
pub fn build_notifications(
    instances: &[ExpenseInstance],
    quotes: &[Quote],
    today: NaiveDate,
    window_days: i64,
) -> Vec<Notification> {
    let horizon = today + Duration::days(window_days);
    let mut seen = HashSet::new();
    let mut notifications = Vec::new();

    let mut push = |kind: NotificationKind, reference_id: &str, message: String, due_date| {
        let id = format!("{}:{}", kind.as_str(), reference_id);
        if seen.insert(id.clone()) {
            notifications.push(Notification {
                id,
                kind,
                reference_id: reference_id.to_string(),
                message,
                due_date,
            });
        }
    };

    for instance in instances.iter().filter(|i| !i.paid) {
        if instance.due_date < today {
            push(
                NotificationKind::ExpenseOverdue,
                &instance.id,
                format!(
                    "{} ({}) is overdue since {}",
                    instance.description,
                    format_cents(instance.amount_cents),
                    instance.due_date
                ),
                instance.due_date,
            );
        } else if instance.due_date <= horizon {
            push(
                NotificationKind::ExpenseDueSoon,
                &instance.id,
                format!(
                    "{} ({}) is due on {}",
                    instance.description,
                    format_cents(instance.amount_cents),
                    instance.due_date
                ),
                instance.due_date,
            );
        }
    }

    for quote in quotes.iter().filter(|q| q.status == QuoteStatus::Sent) {
        let Some(valid_until) = quote.valid_until else {
            continue;
        };
        if valid_until >= today && valid_until <= horizon {
            push(
                NotificationKind::QuoteExpiring,
                &quote.id,
                format!(
                    "Quote of {} expires on {}",
                    format_cents(quote.totals.total_cents),
                    valid_until
                ),
                valid_until,
            );
        }
    }

    notifications.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
    notifications
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuoteTotals;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cost(id: &str, recurrence: Recurrence, due_day: u32, start: NaiveDate) -> OperationalCost {
        OperationalCost {
            id: id.to_string(),
            description: format!("Cost {}", id),
            category: None,
            amount_cents: 10_000,
            recurrence,
            due_day,
            start_date: start,
            end_date: None,
            active: true,
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            version: 1,
        }
    }

    #[test]
    fn test_monthly_due_day_is_clamped_to_month_length() {
        let rent = cost("rent", Recurrence::Monthly, 31, date(2026, 1, 1));
        let instances = generate_instances(&[rent], date(2026, 1, 1), date(2026, 4, 30));

        let dates: Vec<_> = instances.iter().map(|i| i.due_date).collect();
        assert_eq!(
            dates,
            vec![
                date(2026, 1, 31),
                date(2026, 2, 28),
                date(2026, 3, 31),
                date(2026, 4, 30)
            ]
        );
        assert_eq!(instances[1].id, "rent:2026-02-28");
    }

    #[test]
    fn test_leap_february() {
        assert_eq!(days_in_month(2028, 2), 29);
        assert_eq!(days_in_month(2026, 2), 28);
        assert_eq!(days_in_month(2026, 12), 31);
    }

    #[test]
    fn test_no_occurrence_before_start_or_after_end() {
        let mut power = cost("power", Recurrence::Monthly, 10, date(2026, 3, 20));
        power.end_date = Some(date(2026, 6, 9));
        let instances = generate_instances(&[power], date(2026, 1, 1), date(2026, 12, 31));

        let dates: Vec<_> = instances.iter().map(|i| i.due_date).collect();
        assert_eq!(dates, vec![date(2026, 4, 10), date(2026, 5, 10)]);
    }

    #[test]
    fn test_once_and_yearly() {
        let tool = cost("tool", Recurrence::Once, 1, date(2026, 5, 17));
        let license = cost("license", Recurrence::Yearly, 15, date(2025, 8, 1));

        let instances = generate_instances(
            &[tool.clone(), license],
            date(2025, 1, 1),
            date(2027, 12, 31),
        );
        let ids: Vec<_> = instances.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "license:2025-08-15",
                "tool:2026-05-17",
                "license:2026-08-15",
                "license:2027-08-15"
            ]
        );

        assert!(generate_instances(&[tool], date(2026, 6, 1), date(2026, 6, 30)).is_empty());
    }

    #[test]
    fn test_inactive_and_duplicate_costs() {
        let mut off = cost("off", Recurrence::Monthly, 5, date(2026, 1, 1));
        off.active = false;
        let dup = cost("dup", Recurrence::Monthly, 5, date(2026, 1, 1));

        let instances = generate_instances(
            &[off, dup.clone(), dup],
            date(2026, 1, 1),
            date(2026, 1, 31),
        );
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].cost_id, "dup");
    }

    #[test]
    fn test_instance_id_round_trip() {
        let id = instance_id("0b5d-42", date(2026, 2, 28));
        assert_eq!(parse_instance_id(&id), Some(("0b5d-42", date(2026, 2, 28))));
        assert_eq!(parse_instance_id("no-date"), None);
        assert_eq!(parse_instance_id(":2026-02-28"), None);
        assert_eq!(parse_instance_id("abc:2026-02-30"), None);
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(12_345), "123.45");
        assert_eq!(format_cents(7), "0.07");
        assert_eq!(format_cents(-150), "-1.50");
    }

    #[test]
    fn test_notifications_classify_and_skip_paid() {
        let rent = cost("rent", Recurrence::Monthly, 5, date(2026, 1, 1));
        let mut instances = generate_instances(&[rent], date(2026, 1, 1), date(2026, 4, 30));
        // January paid, February and March unpaid, April beyond the window.
        instances[0].paid = true;

        let today = date(2026, 3, 1);
        let notes = build_notifications(&instances, &[], today, 7);

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].kind, NotificationKind::ExpenseOverdue);
        assert_eq!(notes[0].reference_id, "rent:2026-02-05");
        assert_eq!(notes[1].kind, NotificationKind::ExpenseDueSoon);
        assert_eq!(notes[1].id, "expenseDueSoon:rent:2026-03-05");
        assert!(notes[1].message.contains("100.00"));
    }

    #[test]
    fn test_notifications_for_expiring_sent_quotes() {
        let quote = |id: &str, status, valid_until| Quote {
            id: id.to_string(),
            client_id: "client".to_string(),
            items: Vec::new(),
            discount_cents: 0,
            payment_method_id: None,
            status,
            notes: None,
            valid_until,
            totals: QuoteTotals::default(),
            created_at: String::new(),
            updated_at: String::new(),
            version: 1,
        };
        let today = date(2026, 3, 1);
        let quotes = vec![
            quote("q1", QuoteStatus::Sent, Some(date(2026, 3, 3))),
            quote("q1", QuoteStatus::Sent, Some(date(2026, 3, 3))),
            quote("q2", QuoteStatus::Draft, Some(date(2026, 3, 3))),
            quote("q3", QuoteStatus::Sent, Some(date(2026, 2, 27))),
            quote("q4", QuoteStatus::Sent, None),
            quote("q5", QuoteStatus::Sent, Some(date(2026, 4, 1))),
        ];

        let notes = build_notifications(&[], &quotes, today, 7);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "quoteExpiring:q1");
    }
}
