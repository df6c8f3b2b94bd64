//! Review-request seeding.
//!
//! Patients registered on a given day who have never received a successful
//! review request get a PENDING record inserted; the regular new-work pass
//! in the same run then delivers it.

use chrono::NaiveDate;
use sqlx::PgPool;

use courier_common::error::CourierError;
use courier_common::types::MessageCategory;

use crate::store;

#[derive(Debug, sqlx::FromRow)]
struct PatientRow {
    name: String,
    mobile_number: String,
}

/// Insert review-request records for patients registered on `registered_on`
/// whose number has no SUCCESS review request yet. Returns how many records
/// were seeded.
pub async fn seed_review_requests(
    pool: &PgPool,
    review_link: &str,
    registered_on: NaiveDate,
) -> Result<u64, CourierError> {
    let mut tx = pool.begin().await?;

    let patients: Vec<PatientRow> = sqlx::query_as(
        r#"
        SELECT p.name, p.mobile_number
        FROM patients p
        WHERE p.created_at::date = $1
          AND p.mobile_number IS NOT NULL
          AND NOT EXISTS (
              SELECT 1 FROM message_queue m
              WHERE m.recipient = p.mobile_number
                AND m.category = 'REVIEW_REQUEST'
                AND m.status = 'SUCCESS'
          )
        "#,
    )
    .bind(registered_on)
    .fetch_all(&mut *tx)
    .await?;

    let mut seeded = 0u64;
    for patient in &patients {
        let body = render_request(&patient.name, review_link);
        store::insert_message(
            &mut tx,
            &patient.mobile_number,
            &body,
            MessageCategory::ReviewRequest,
        )
        .await?;
        seeded += 1;
    }

    tx.commit().await?;

    if seeded > 0 {
        tracing::info!(seeded, date = %registered_on, "Seeded review requests");
    }
    Ok(seeded)
}

fn render_request(name: &str, review_link: &str) -> String {
    format!(
        "Dear {name},\n\n\
         Thank you for choosing our services! Your feedback matters to us.\n\
         Please take a moment to share your experience: {review_link}\n\n\
         Your review helps us serve you better."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_name_and_link() {
        let body = render_request("Asha", "https://g.page/r/abc");
        assert!(body.contains("Dear Asha"));
        assert!(body.contains("https://g.page/r/abc"));
    }
}
