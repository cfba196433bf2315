use std::io::Write;

use anyhow::Result;
use chrono::Utc;

use crate::application::{CreditService, UserSnapshot};
use crate::domain::{User, format_cents};

/// Writes one user's ledgers out as CSV or JSON.
pub struct Exporter<'a> {
    service: &'a CreditService,
    user: &'a User,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a CreditService, user: &'a User) -> Self {
        Self { service, user }
    }

    /// Export the user's shop transactions to CSV, newest first.
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let transactions = self.service.list_all_transactions(self.user).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "transaction_date",
            "shop",
            "type",
            "amount",
            "description",
            "created_at",
        ])?;

        for row in &transactions {
            let tx = &row.transaction;
            csv_writer.write_record([
                tx.id.to_string(),
                tx.transaction_date.to_rfc3339(),
                row.shop_name.clone(),
                tx.kind.to_string(),
                format_cents(tx.amount_cents),
                tx.description.clone(),
                tx.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(transactions.len())
    }

    /// Export the user's lend/repayment records to CSV, newest first.
    pub async fn export_lend_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let lendings = self.service.list_all_lend_transactions(self.user).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "transaction_date",
            "borrower_name",
            "borrower_mobile",
            "type",
            "amount",
            "description",
            "created_at",
        ])?;

        for lend in &lendings {
            csv_writer.write_record([
                lend.id.to_string(),
                lend.transaction_date.to_rfc3339(),
                lend.borrower_name.clone(),
                lend.borrower_mobile.to_string(),
                lend.kind.to_string(),
                format_cents(lend.amount_cents),
                lend.description.clone(),
                lend.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(lendings.len())
    }

    /// Export per-borrower outstanding balances to CSV.
    pub async fn export_borrowers_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let report = self.service.my_borrowers(self.user).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "borrower_name",
            "borrower_mobile",
            "total_lent",
            "total_repaid",
            "outstanding",
            "transactions",
            "last_activity",
        ])?;

        for borrower in &report.borrowers {
            csv_writer.write_record([
                borrower.display_name.clone(),
                borrower.counterparty.to_string(),
                format_cents(borrower.total_increase),
                format_cents(borrower.total_decrease),
                format_cents(borrower.outstanding),
                borrower.transaction_count.to_string(),
                borrower.last_activity_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(report.borrowers.len())
    }

    /// Export everything the user owns as one JSON document.
    pub async fn export_snapshot_json<W: Write>(&self, mut writer: W) -> Result<UserSnapshot> {
        let shops = self.service.list_owned_shops(self.user).await?;
        let transactions = self
            .service
            .list_all_transactions(self.user)
            .await?
            .into_iter()
            .map(|row| row.transaction)
            .collect();
        let lend_transactions = self.service.list_all_lend_transactions(self.user).await?;

        let snapshot = UserSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            user: self.user.clone(),
            shops,
            transactions,
            lend_transactions,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
