// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use classpoints_rs::{
    AccountId, ApprovalEngine, BehaviorSign, Decision, ReviewPayload, Reviewable, ReviewableId,
    Reward,
};
use csv::{ReaderBuilder, Trim, Writer};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// ClassPoints Engine - Replay review operations from a CSV file
///
/// Reads engine operations from a CSV file and outputs account states to
/// stdout. Supports account opening, submissions (quest, behavior, question),
/// approvals, and rejections.
#[derive(Parser, Debug)]
#[command(name = "classpoints-rs")]
#[command(about = "An approval and rewards engine that replays operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,id,account,reviewer,kind,sign,currency,experience,subject,grade
    /// Example: cargo run -- operations.csv > accounts.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Open input file
    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    // Process operations from CSV
    let engine = match process_operations(BufReader::new(file)) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error processing operations: {}", e);
            process::exit(1);
        }
    };

    // Write results to stdout
    if let Err(e) = write_accounts(&engine, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// One engine operation decoded from a CSV row.
#[derive(Debug)]
enum Operation {
    OpenAccount(AccountId),
    Submit(Reviewable),
    Decide {
        id: ReviewableId,
        decision: Decision,
        reviewer: AccountId,
    },
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, id, account, reviewer, kind, sign, currency, experience,
/// subject, grade`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    id: u32,
    #[serde(deserialize_with = "csv::invalid_option", default)]
    account: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option", default)]
    reviewer: Option<u32>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    sign: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option", default)]
    currency: Option<i64>,
    #[serde(deserialize_with = "csv::invalid_option", default)]
    experience: Option<i64>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    grade: Option<String>,
}

impl CsvRecord {
    /// Converts a CSV record to an engine operation.
    ///
    /// Returns `None` for unknown ops or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        match self.op.to_lowercase().as_str() {
            "open" => Some(Operation::OpenAccount(AccountId(self.id))),
            "submit" => {
                let subject_account = AccountId(self.account?);
                let reward = Reward::new(self.currency.unwrap_or(0), self.experience.unwrap_or(0));
                let payload = match self.kind?.to_lowercase().as_str() {
                    "quest" => ReviewPayload::QuestSubmission {
                        quest_id: self.id,
                        note: String::new(),
                    },
                    "behavior" => {
                        let sign = match self.sign?.to_lowercase().as_str() {
                            "positive" => BehaviorSign::Positive,
                            "negative" => BehaviorSign::Negative,
                            _ => return None,
                        };
                        ReviewPayload::BehaviorRecord {
                            sign,
                            note: String::new(),
                        }
                    }
                    "question" => ReviewPayload::Question {
                        subject: self.subject?,
                        grade: self.grade?,
                        text: String::new(),
                    },
                    _ => return None,
                };
                // The contributor is the subject account in this replay format.
                Some(Operation::Submit(Reviewable::new(
                    ReviewableId(self.id),
                    subject_account,
                    subject_account,
                    reward,
                    payload,
                )))
            }
            "approve" => Some(Operation::Decide {
                id: ReviewableId(self.id),
                decision: Decision::Approve,
                reviewer: AccountId(self.reviewer?),
            }),
            "reject" => Some(Operation::Decide {
                id: ReviewableId(self.id),
                decision: Decision::Reject,
                reviewer: AccountId(self.reviewer?),
            }),
            _ => None,
        }
    }
}

/// Process engine operations from a CSV reader.
///
/// Streaming parsing handles arbitrarily large CSV files without loading the
/// entire file into memory. Malformed rows and failed operations are
/// silently skipped (logged in debug builds).
///
/// # CSV Format
///
/// Expected columns: `op, id, account, reviewer, kind, sign, currency,
/// experience, subject, grade`
///
/// # Example
///
/// ```csv
/// op,id,account,reviewer,kind,sign,currency,experience,subject,grade
/// open,1,,,,,,,,
/// open,2,,,,,,,,
/// submit,10,1,,quest,,10,100,,
/// approve,10,,2,,,,,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
/// Individual operation errors don't stop processing.
pub fn process_operations<R: Read>(reader: R) -> Result<ApprovalEngine, csv::Error> {
    let engine = ApprovalEngine::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " open "
        .flexible(true) // Allow trailing fields to be omitted
        .has_headers(true) // Skip first row as header
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(op) = record.into_operation() else {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping invalid operation record");
                    continue;
                };

                // Apply the operation, ignoring errors (silent failure)
                let applied = match op {
                    Operation::OpenAccount(id) => engine.ledger().open_account(id),
                    Operation::Submit(reviewable) => engine.submit(reviewable),
                    Operation::Decide {
                        id,
                        decision,
                        reviewer,
                    } => engine.decide(id, decision, reviewer).map(|_| ()),
                };
                if let Err(_e) = applied {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping operation: {}", _e);
                }
            }
            Err(_e) => {
                // Skip malformed rows
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", _e);
                continue;
            }
        }
    }

    Ok(engine)
}

/// Write account states to a CSV writer.
///
/// # CSV Format
///
/// Columns: `account, currency, experience, level`
///
/// # Example
///
/// ```csv
/// account,currency,experience,level
/// 1,10,100,1
/// 2,0,0,1
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_accounts<W: Write>(engine: &ApprovalEngine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    // Get all account snapshots and serialize each one
    for account in engine.ledger().accounts() {
        wtr.serialize(account.value())?;
    }

    // Flush to ensure all data is written
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_open_and_submit_and_approve() {
        let csv = "op,id,account,reviewer,kind,sign,currency,experience,subject,grade\n\
                   open,1,,,,,,,,\n\
                   open,2,,,,,,,,\n\
                   submit,10,1,,quest,,10,100,,\n\
                   approve,10,,2,,,,,,\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        let account = engine.ledger().get_account(&AccountId(1)).unwrap();
        assert_eq!(account.currency(), 10);
        assert_eq!(account.experience(), 100);
    }

    #[test]
    fn parse_negative_behavior_debits() {
        let csv = "op,id,account,reviewer,kind,sign,currency,experience,subject,grade\n\
                   open,1,,,,,,,,\n\
                   open,2,,,,,,,,\n\
                   submit,10,1,,quest,,50,0,,\n\
                   approve,10,,2,,,,,,\n\
                   submit,11,1,,behavior,negative,20,0,,\n\
                   approve,11,,2,,,,,,\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        let account = engine.ledger().get_account(&AccountId(1)).unwrap();
        assert_eq!(account.currency(), 30);
    }

    #[test]
    fn parse_reject_leaves_balance_untouched() {
        let csv = "op,id,account,reviewer,kind,sign,currency,experience,subject,grade\n\
                   open,1,,,,,,,,\n\
                   open,2,,,,,,,,\n\
                   submit,10,1,,quest,,10,100,,\n\
                   reject,10,,2,,,,,,\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        let account = engine.ledger().get_account(&AccountId(1)).unwrap();
        assert_eq!(account.currency(), 0);
        assert_eq!(account.experience(), 0);
    }

    #[test]
    fn parse_question_submission() {
        let csv = "op,id,account,reviewer,kind,sign,currency,experience,subject,grade\n\
                   open,1,,,,,,,,\n\
                   submit,10,1,,question,,5,25,Math,Grade9\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        assert_eq!(engine.store().len(), 1);
        assert!(engine.store().get(&ReviewableId(10)).unwrap().is_pending());
    }

    #[test]
    fn skip_malformed_rows() {
        let csv = "op,id,account,reviewer,kind,sign,currency,experience,subject,grade\n\
                   open,1,,,,,,,,\n\
                   bogus,row,data,,,,,,,\n\
                   open,2,,,,,,,,\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        assert!(engine.ledger().get_account(&AccountId(1)).is_some());
        assert!(engine.ledger().get_account(&AccountId(2)).is_some());
    }

    #[test]
    fn parse_with_whitespace() {
        let csv = "op,id,account,reviewer,kind,sign,currency,experience,subject,grade\n\
                    open , 1 ,,,,,,,,\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        assert!(engine.ledger().get_account(&AccountId(1)).is_some());
    }

    #[test]
    fn write_accounts_to_csv() {
        let csv_input = "op,id,account,reviewer,kind,sign,currency,experience,subject,grade\n\
                         open,1,,,,,,,,\n\
                         open,2,,,,,,,,\n";
        let reader = Cursor::new(csv_input);
        let engine = process_operations(reader).unwrap();

        let mut output = Vec::new();
        write_accounts(&engine, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("account,currency,experience,level"));
    }
}
