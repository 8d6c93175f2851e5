use crate::application::ledger::Command;
use crate::domain::ticket::parse_visit_date;
use crate::error::{LedgerError, Result};
use csv::StringRecord;
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;

/// Reads ledger commands from a headerless CSV source.
///
/// The first field names the command, the rest are its positional arguments:
///
/// ```text
/// user, <name>[, <email>[, <phone>]]
/// temple, <name>, <location>
/// contact, <user>[, <email>[, <phone>]]
/// book, <user>, <temple>, <visit date>
/// pay, <ticket>, <amount>, <mode>
/// book_and_pay, <user>, <temple>, <visit date>, <amount>, <mode>
/// status, <payment>, <pending|success|failed>
/// ```
///
/// Lines starting with `#` are skipped.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and parses commands, one result per line.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_records()
            .map(|record| record.map_err(LedgerError::from).and_then(|r| parse(&r)))
    }
}

fn parse(record: &StringRecord) -> Result<Command> {
    let fields = Fields(record);
    let command = match fields.required(0, "command")? {
        "user" => Command::RegisterUser {
            name: fields.required(1, "name")?.to_string(),
            email: fields.optional(2),
            phone: fields.optional(3),
        },
        "temple" => Command::RegisterTemple {
            name: fields.required(1, "name")?.to_string(),
            location: fields.required(2, "location")?.to_string(),
        },
        "contact" => Command::UpdateContact {
            user: fields.parse::<u64>(1, "user")?.into(),
            email: fields.optional(2),
            phone: fields.optional(3),
        },
        "book" => Command::Book {
            user: fields.parse::<u64>(1, "user")?.into(),
            temple: fields.parse::<u64>(2, "temple")?.into(),
            visit_date: parse_visit_date(fields.required(3, "visit date")?)?,
        },
        "pay" => Command::Pay {
            ticket: fields.parse::<u64>(1, "ticket")?.into(),
            amount: fields.parse::<Decimal>(2, "amount")?,
            mode: fields.required(3, "mode")?.to_string(),
        },
        "book_and_pay" => Command::BookAndPay {
            user: fields.parse::<u64>(1, "user")?.into(),
            temple: fields.parse::<u64>(2, "temple")?.into(),
            visit_date: parse_visit_date(fields.required(3, "visit date")?)?,
            amount: fields.parse::<Decimal>(4, "amount")?,
            mode: fields.required(5, "mode")?.to_string(),
        },
        "status" => Command::SetStatus {
            payment: fields.parse::<u64>(1, "payment")?.into(),
            status: fields.required(2, "status")?.parse()?,
        },
        other => {
            return Err(LedgerError::InvalidArgument(format!(
                "unknown command '{other}'"
            )));
        }
    };
    Ok(command)
}

struct Fields<'a>(&'a StringRecord);

impl Fields<'_> {
    fn optional(&self, index: usize) -> Option<String> {
        self.0
            .get(index)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn required(&self, index: usize, name: &str) -> Result<&str> {
        self.0
            .get(index)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| LedgerError::InvalidArgument(format!("missing {name}")))
    }

    fn parse<T: FromStr>(&self, index: usize, name: &str) -> Result<T> {
        let raw = self.required(index, name)?;
        raw.parse()
            .map_err(|_| LedgerError::InvalidArgument(format!("invalid {name} '{raw}'")))
    }
}
