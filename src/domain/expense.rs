// Expense schemas and validation

use crate::db::schema::Expense;
use crate::domain::money::Money;
use crate::errors::{AppError, Result};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

const MAX_NAME_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 500;
const FORBIDDEN_NAME_CHARS: &str = "<>{}[]\\/";
const MIN_AMOUNT: Money = Money::from_cents(1);
const MAX_AMOUNT: Money = Money::from_cents(99_999_999);

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseCreate {
    pub name: String,
    pub amount: Money,
    #[serde(default)]
    pub expense_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    pub category_id: Uuid,
}

/// Validated expense fields ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub name: String,
    pub amount: Money,
    pub expense_date: NaiveDate,
    pub description: Option<String>,
    pub is_recurring: bool,
    pub category_id: Uuid,
}

impl ExpenseCreate {
    pub fn validate(self, today: NaiveDate) -> Result<NewExpense> {
        let name = validate_name(&self.name)?;

        if self.amount < MIN_AMOUNT || self.amount > MAX_AMOUNT {
            return Err(AppError::InvalidInput(format!(
                "amount must be between {} and {}",
                MIN_AMOUNT, MAX_AMOUNT
            )));
        }

        let expense_date = self.expense_date.unwrap_or(today);
        validate_expense_date(expense_date, today)?;

        validate_description(self.description.as_deref())?;

        Ok(NewExpense {
            name,
            amount: self.amount,
            expense_date,
            description: self.description,
            is_recurring: self.is_recurring,
            category_id: self.category_id,
        })
    }
}

/// Maps a present field to `Some`, including an explicit `null`. Paired with
/// `#[serde(default)]`, an absent field stays `None`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update; absent fields are left unchanged. `description` can be
/// cleared with an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub expense_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
}

impl ExpenseUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(amount) = self.amount {
            if amount < Money::default() {
                return Err(AppError::InvalidInput(
                    "amount must be greater than or equal to 0".to_string(),
                ));
            }
        }

        if let Some(name) = &self.name {
            if name.chars().count() > MAX_NAME_LENGTH {
                return Err(AppError::InvalidInput(format!(
                    "name must be at most {} characters",
                    MAX_NAME_LENGTH
                )));
            }
        }

        validate_description(self.description.as_ref().and_then(Option::as_deref))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub amount: Money,
    pub expense_date: NaiveDate,
    pub is_recurring: bool,
}

impl From<Expense> for ExpenseRead {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            user_id: expense.user_id,
            category_id: expense.category_id,
            name: expense.name,
            description: expense.description,
            amount: Money::from_cents(expense.amount_cents),
            expense_date: expense.expense_date,
            is_recurring: expense.is_recurring,
        }
    }
}

fn validate_name(name: &str) -> Result<String> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "name must be between 1 and {} characters",
            MAX_NAME_LENGTH
        )));
    }

    if name.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Name cannot be empty or just whitespace".to_string(),
        ));
    }

    if name.chars().any(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(AppError::InvalidInput(format!(
            "Name cannot contain these characters: {}",
            FORBIDDEN_NAME_CHARS
        )));
    }

    Ok(name.trim().to_string())
}

fn validate_expense_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    let out_of_range =
        || AppError::InvalidInput("Expense date must be within one year of current date".to_string());

    let min = today.checked_sub_months(Months::new(12)).ok_or_else(out_of_range)?;
    let max = today.checked_add_months(Months::new(12)).ok_or_else(out_of_range)?;

    if date < min || date > max {
        return Err(out_of_range());
    }

    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<()> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LENGTH => Err(AppError::InvalidInput(
            format!("description must be at most {} characters", MAX_DESCRIPTION_LENGTH),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn create(name: &str, amount: &str) -> ExpenseCreate {
        ExpenseCreate {
            name: name.to_string(),
            amount: amount.parse().unwrap(),
            expense_date: None,
            description: None,
            is_recurring: false,
            category_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_defaults_and_trimming() {
        let expense = create("  Lunch  ", "12.50").validate(today()).unwrap();

        assert_eq!(expense.name, "Lunch");
        assert_eq!(expense.amount.cents(), 1250);
        assert_eq!(expense.expense_date, today());
        assert!(!expense.is_recurring);
    }

    #[test]
    fn test_json_defaults() {
        let body = format!(
            r#"{{"name": "Coffee", "amount": 3.5, "category_id": "{}"}}"#,
            Uuid::new_v4()
        );
        let expense: ExpenseCreate = serde_json::from_str(&body).unwrap();

        assert_eq!(expense.amount.cents(), 350);
        assert!(expense.expense_date.is_none());
        assert!(!expense.is_recurring);
    }

    #[test]
    fn test_amount_bounds() {
        assert!(create("x", "0.01").validate(today()).is_ok());
        assert!(create("x", "999999.99").validate(today()).is_ok());
        assert!(matches!(
            create("x", "0").validate(today()),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            create("x", "1000000").validate(today()),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_name_rules() {
        let err = create("   ", "1").validate(today()).unwrap_err();
        assert_eq!(err.to_string(), "Name cannot be empty or just whitespace");

        let err = create("<script>", "1").validate(today()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Name cannot contain these characters: <>{}[]\\/"
        );

        assert!(create(&"n".repeat(101), "1").validate(today()).is_err());
    }

    #[test]
    fn test_date_window() {
        let mut expense = create("Rent", "100");

        expense.expense_date = NaiveDate::from_ymd_opt(2023, 6, 15);
        assert!(expense.clone().validate(today()).is_ok());

        expense.expense_date = NaiveDate::from_ymd_opt(2023, 6, 14);
        let err = expense.clone().validate(today()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expense date must be within one year of current date"
        );

        expense.expense_date = NaiveDate::from_ymd_opt(2025, 6, 16);
        assert!(expense.validate(today()).is_err());
    }

    #[test]
    fn test_leap_day_window() {
        let leap_day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let mut expense = create("Rent", "100");
        expense.expense_date = NaiveDate::from_ymd_opt(2023, 2, 28);
        assert!(expense.validate(leap_day).is_ok());
    }

    #[test]
    fn test_update_amount_may_be_zero() {
        let update = ExpenseUpdate {
            amount: Some(Money::from_cents(0)),
            ..ExpenseUpdate::default()
        };
        assert!(update.validate().is_ok());

        let update = ExpenseUpdate {
            amount: Some(Money::from_cents(-1)),
            ..ExpenseUpdate::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let absent: ExpenseUpdate = serde_json::from_str(r#"{"name": "Lunch"}"#).unwrap();
        assert_eq!(absent.description, None);

        let cleared: ExpenseUpdate = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));
        assert!(cleared.validate().is_ok());

        let set: ExpenseUpdate = serde_json::from_str(r#"{"description": "Team lunch"}"#).unwrap();
        assert_eq!(set.description, Some(Some("Team lunch".to_string())));
    }

    #[test]
    fn test_update_description_length_checked() {
        let update = ExpenseUpdate {
            description: Some(Some("x".repeat(501))),
            ..ExpenseUpdate::default()
        };
        assert!(matches!(update.validate(), Err(AppError::InvalidInput(_))));
    }
}
