//! Loading ratings from tabular text files.
//!
//! The accepted format is one rating per line, fields separated by tabs or
//! spaces:
//!
//! ```text
//! user_id  item_id  rating  [timestamp]
//! ```
//!
//! User and item ids are 1-based, as in the MovieLens `u.data` file. They are
//! mapped to 0-based matrix indices by subtracting one, so the resulting
//! matrix has `max(user_id)` rows and `max(item_id)` columns. Blank lines are
//! skipped. If the same `(user, item)` pair appears twice the later line wins.

use factorec_core::{error::MfError, ratings::RatingsMatrix, types::Scalar};
use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};
use thiserror::Error;

/// Errors raised while reading ratings.
#[derive(Debug, Error)]
pub enum DataError {
    /// Reading the input failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A line could not be parsed.
    #[error("Line {line}: {reason}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What was wrong with the line
        reason: String,
    },

    /// The parsed records do not form a valid ratings matrix.
    #[error(transparent)]
    Mf(#[from] MfError),
}

impl DataError {
    fn parse<S: Into<String>>(line: usize, reason: S) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }
}

/// One parsed rating with its original 1-based ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingRecord<T: Scalar> {
    /// 1-based user id
    pub user: usize,
    /// 1-based item id
    pub item: usize,
    /// Rating value, never zero
    pub rating: T,
    /// Optional fourth column
    pub timestamp: Option<u64>,
}

/// Parsed ratings, before conversion to a matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingsTable<T: Scalar> {
    records: Vec<RatingRecord<T>>,
    n_users: usize,
    n_items: usize,
}

impl<T: Scalar> RatingsTable<T> {
    /// Builds a table from records with 1-based ids.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if an id is zero or a rating is zero or
    /// non-finite.
    pub fn from_records(records: Vec<RatingRecord<T>>) -> Result<Self, MfError> {
        let mut n_users = 0;
        let mut n_items = 0;
        for record in &records {
            if record.user == 0 || record.item == 0 {
                return Err(MfError::invalid_argument("records", "ids are 1-based"));
            }
            if record.rating == T::zero() || !num_traits::Float::is_finite(record.rating) {
                return Err(MfError::invalid_argument(
                    "records",
                    format!("rating {} is not a finite non-zero value", record.rating),
                ));
            }
            n_users = n_users.max(record.user);
            n_items = n_items.max(record.item);
        }
        Ok(Self {
            records,
            n_users,
            n_items,
        })
    }

    /// Parsed records in input order.
    pub fn records(&self) -> &[RatingRecord<T>] {
        &self.records
    }

    /// Largest user id seen.
    pub fn n_users(&self) -> usize {
        self.n_users
    }

    /// Largest item id seen.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no record was parsed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds the dense `n_users × n_items` matrix with 0-based indices.
    pub fn to_matrix(&self) -> Result<RatingsMatrix<T>, MfError> {
        let triples: Vec<(usize, usize, T)> = self
            .records
            .iter()
            .map(|r| (r.user - 1, r.item - 1, r.rating))
            .collect();
        RatingsMatrix::from_records(&triples, self.n_users, self.n_items)
    }
}

/// Parses ratings from a reader.
///
/// # Errors
///
/// Returns `DataError::Parse` with the 1-based line number for lines that
/// do not have 3 or 4 fields, zero or non-numeric ids, ratings that are zero
/// or not finite numbers, and non-integer timestamps.
pub fn parse_records<T: Scalar, R: BufRead>(reader: R) -> Result<RatingsTable<T>, DataError> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 3 && fields.len() != 4 {
            return Err(DataError::parse(
                line_no,
                format!("expected 3 or 4 fields, got {}", fields.len()),
            ));
        }

        let user = parse_id(fields[0], "user", line_no)?;
        let item = parse_id(fields[1], "item", line_no)?;
        let rating: f64 = fields[2]
            .parse()
            .map_err(|_| DataError::parse(line_no, format!("invalid rating `{}`", fields[2])))?;
        if !rating.is_finite() || rating == 0.0 {
            return Err(DataError::parse(
                line_no,
                format!("rating must be finite and non-zero, got {}", fields[2]),
            ));
        }
        let timestamp = match fields.get(3) {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                DataError::parse(line_no, format!("invalid timestamp `{}`", raw))
            })?),
            None => None,
        };

        records.push(RatingRecord {
            user,
            item,
            rating: <T as Scalar>::from_f64(rating),
            timestamp,
        });
    }
    Ok(RatingsTable::from_records(records)?)
}

fn parse_id(raw: &str, what: &str, line: usize) -> Result<usize, DataError> {
    let id: usize = raw
        .parse()
        .map_err(|_| DataError::parse(line, format!("invalid {} id `{}`", what, raw)))?;
    if id == 0 {
        return Err(DataError::parse(line, format!("{} ids are 1-based, got 0", what)));
    }
    Ok(id)
}

/// Reads a ratings file and builds its matrix.
pub fn load_ratings<T: Scalar, P: AsRef<Path>>(path: P) -> Result<RatingsMatrix<T>, DataError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let table = parse_records(BufReader::new(file))?;
    let matrix = table.to_matrix()?;
    tracing::info!(
        path = %path.display(),
        records = table.len(),
        summary = %DatasetSummary::of(&matrix),
        "ratings loaded"
    );
    Ok(matrix)
}

/// Size and fill of a ratings matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetSummary {
    /// Rows
    pub n_users: usize,
    /// Columns
    pub n_items: usize,
    /// Observed cells
    pub observed: usize,
}

impl DatasetSummary {
    /// Summarizes `ratings`.
    pub fn of<T: Scalar>(ratings: &RatingsMatrix<T>) -> Self {
        Self {
            n_users: ratings.n_users(),
            n_items: ratings.n_items(),
            observed: ratings.nnz(),
        }
    }

    /// Percentage of observed cells.
    pub fn density_percent(&self) -> f64 {
        let cells = self.n_users * self.n_items;
        if cells == 0 {
            0.0
        } else {
            self.observed as f64 / cells as f64 * 100.0
        }
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} users, {} items, Sparsity: {:.2}%",
            self.n_users,
            self.n_items,
            self.density_percent()
        )
    }
}
