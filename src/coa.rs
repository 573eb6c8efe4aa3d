use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::trial_balance::TrialBalanceAccount;

pub const ACTIVE_STATUS: &str = "Active";

/// One line of the chart-of-accounts import file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoaRecord {
    #[serde(rename = "Account Type")]
    pub account_type: String,
    #[serde(rename = "Account Name")]
    pub account_name: String,
    #[serde(rename = "Account Code")]
    pub account_code: String,
    #[serde(rename = "Status")]
    pub status: &'static str,
    #[serde(rename = "Unique ID")]
    pub unique_id: String,
}

impl CoaRecord {
    pub fn from_account(account: TrialBalanceAccount, account_type: String) -> Self {
        Self {
            account_type,
            account_name: account.name,
            account_code: account.code,
            status: ACTIVE_STATUS,
            unique_id: String::new(),
        }
    }
}

/// Pairs accounts with their labels positionally.
pub fn build_records(accounts: Vec<TrialBalanceAccount>, labels: Vec<String>) -> Vec<CoaRecord> {
    debug_assert_eq!(accounts.len(), labels.len());
    accounts
        .into_iter()
        .zip(labels)
        .map(|(account, label)| CoaRecord::from_account(account, label))
        .collect()
}

pub fn write_csv<W: Write>(records: &[CoaRecord], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if records.is_empty() {
        csv.write_record(["Account Type", "Account Name", "Account Code", "Status", "Unique ID"])?;
    }
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::CLASSIFICATION_ERROR;

    fn accounts() -> Vec<TrialBalanceAccount> {
        vec![
            TrialBalanceAccount {
                code: "1000".to_string(),
                name: "Cash on Hand".to_string(),
            },
            TrialBalanceAccount {
                code: "4000".to_string(),
                name: "Sales, Retail".to_string(),
            },
        ]
    }

    #[test]
    fn records_keep_account_order() {
        let records = build_records(
            accounts(),
            vec![
                "Asset - Cash".to_string(),
                CLASSIFICATION_ERROR.to_string(),
            ],
        );

        assert_eq!(records[0].account_type, "Asset - Cash");
        assert_eq!(records[0].account_code, "1000");
        assert_eq!(records[1].account_type, CLASSIFICATION_ERROR);
        assert_eq!(records[1].account_name, "Sales, Retail");
        assert!(records.iter().all(|r| r.status == "Active" && r.unique_id.is_empty()));
    }

    #[test]
    fn csv_has_header_and_quoted_fields() {
        let records = build_records(
            accounts(),
            vec![
                "Asset - Cash".to_string(),
                "Revenue - Operating Revenue".to_string(),
            ],
        );
        let mut out = Vec::new();

        write_csv(&records, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Account Type,Account Name,Account Code,Status,Unique ID\n\
             Asset - Cash,Cash on Hand,1000,Active,\n\
             Revenue - Operating Revenue,\"Sales, Retail\",4000,Active,\n"
        );
    }

    #[test]
    fn empty_mapping_still_has_header() {
        let mut out = Vec::new();
        write_csv(&[], &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Account Type,Account Name,Account Code,Status,Unique ID\n"
        );
    }
}
