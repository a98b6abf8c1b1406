use axum::{
    Extension,
    extract::State,
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::IntoResponse,
};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use time::format_description::well_known::Rfc3339;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::expenses::{DateOrder, list_expenses};
use crate::models::{Expense, PublicUser};

pub const CSV_HEADER: [&str; 4] = ["Title", "Amount", "Category", "Date"];

/// Renders expenses as CSV in the order given. Fields containing commas,
/// quotes or line breaks are quoted; there is no terminator after the last row.
pub fn expenses_to_csv(expenses: &[Expense]) -> ApiResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let csv_error = |e: csv::Error| ApiError::internal(format!("csv write failed: {}", e));

    writer.write_record(CSV_HEADER).map_err(csv_error)?;
    for expense in expenses {
        let date = expense
            .date
            .format(&Rfc3339)
            .map_err(|e| ApiError::internal(format!("date formatting failed: {}", e)))?;
        let amount = expense.amount.to_string();
        writer
            .write_record([
                expense.title.as_str(),
                amount.as_str(),
                expense.category.as_str(),
                date.as_str(),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::internal(format!("csv flush failed: {}", e)))?;
    let mut csv = String::from_utf8(bytes)
        .map_err(|e| ApiError::internal(format!("csv is not utf-8: {}", e)))?;

    if csv.ends_with('\n') {
        csv.pop();
    }
    Ok(csv)
}

pub async fn export_csv(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
) -> ApiResult<impl IntoResponse> {
    let expenses = list_expenses(&state.db, &user.id, DateOrder::OldestFirst).await?;
    if expenses.is_empty() {
        return Err(ApiError::not_found("No expenses found to export"));
    }

    let csv = expenses_to_csv(&expenses)?;
    tracing::debug!(user_id = %user.id, rows = expenses.len(), "exported expenses");

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"expenses.csv\""),
        ],
        csv,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn expense(title: &str, amount: f64, category: &str) -> Expense {
        Expense {
            id: "e1".to_string(),
            title: title.to_string(),
            amount,
            category: category.to_string(),
            date: datetime!(2024-03-01 09:15:00 UTC),
            user: "u1".to_string(),
        }
    }

    #[test]
    fn plain_rows_are_not_quoted() {
        let csv = expenses_to_csv(&[expense("Food", 500.0, "Groceries")]).unwrap();

        assert_eq!(
            csv,
            "Title,Amount,Category,Date\nFood,500,Groceries,2024-03-01T09:15:00Z"
        );
    }

    #[test]
    fn fractional_amounts_keep_their_decimals() {
        let csv = expenses_to_csv(&[expense("Coffee", 3.75, "Dining")]).unwrap();

        assert!(csv.ends_with("Coffee,3.75,Dining,2024-03-01T09:15:00Z"));
    }

    #[test]
    fn commas_quotes_and_newlines_are_escaped() {
        let csv = expenses_to_csv(&[
            expense("Rice, beans", 12.0, "Food"),
            expense("The \"good\" stuff", 1.0, "Treats\nand more"),
        ])
        .unwrap();

        let lines: Vec<&str> = csv.splitn(2, '\n').collect();
        assert_eq!(lines[0], "Title,Amount,Category,Date");
        assert_eq!(
            lines[1],
            "\"Rice, beans\",12,Food,2024-03-01T09:15:00Z\n\"The \"\"good\"\" stuff\",1,\"Treats\nand more\",2024-03-01T09:15:00Z"
        );
    }

    #[test]
    fn empty_input_yields_only_the_header() {
        assert_eq!(expenses_to_csv(&[]).unwrap(), "Title,Amount,Category,Date");
    }
}
