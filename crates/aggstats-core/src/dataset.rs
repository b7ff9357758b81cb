//! Dataset providers and column views
//!
//! The engine never owns data. A [`Dataset`] hands out its records through one
//! forward iterator. A [`NumericColumnView`] reads a single field from each
//! record and classifies the cell; a [`PairedSample`] reads both fields of a
//! bivariate statistic from the same record and drops any record missing
//! either value. Every statistic is one forward pass over the records.

use crate::errors::{StatsError, StatsResult};
use crate::types::{EngineOptions, MissingPolicy, NanPolicy, Value};
use std::cell::RefCell;

static MISSING: Value = Value::Missing;

/// Named-field lookup on a single record
pub trait FieldLookup {
    /// Value of `field`, or `None` if the record does not carry it
    fn get(&self, field: &str) -> Option<&Value>;
}

impl<T: FieldLookup + ?Sized> FieldLookup for &T {
    fn get(&self, field: &str) -> Option<&Value> {
        (**self).get(field)
    }
}

/// A source of records that can be scanned front to back
pub trait Dataset {
    /// One record as yielded by [`records`](Dataset::records)
    type Row<'a>: FieldLookup
    where
        Self: 'a;

    /// Whether `field` is part of the dataset schema
    fn has_field(&self, field: &str) -> bool;

    /// Forward iterator over all records, in record order
    ///
    /// A record that does not carry a schema field reads as `Value::Missing`
    /// for that field.
    fn records(&self) -> Box<dyn Iterator<Item = Self::Row<'_>> + '_>;
}

// ============================================================================
// Record-oriented table
// ============================================================================

/// One row: an ordered mapping from field name to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; replaces an existing value for the same field
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldLookup for Record {
    fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}

/// In-memory table of records with an explicit schema
#[derive(Debug, Clone, Default)]
pub struct RowTable {
    schema: Vec<String>,
    rows: Vec<Record>,
}

impl RowTable {
    /// Empty table with the given schema
    pub fn new<S: Into<String>>(schema: impl IntoIterator<Item = S>) -> Self {
        Self {
            schema: schema.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Table whose schema is the union of the records' fields, in first-seen order
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut schema: Vec<String> = Vec::new();
        for record in &records {
            for name in record.field_names() {
                if !schema.iter().any(|s| s == name) {
                    schema.push(name.to_string());
                }
            }
        }
        Self {
            schema,
            rows: records,
        }
    }

    /// Append a record; every field it carries must be in the schema
    pub fn push(&mut self, record: Record) -> StatsResult<()> {
        if let Some(unknown) = record.field_names().find(|name| !self.has_field(name)) {
            return Err(StatsError::FieldNotFound {
                field: unknown.to_string(),
            });
        }
        self.rows.push(record);
        Ok(())
    }

    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Dataset for RowTable {
    type Row<'a> = &'a Record;

    fn has_field(&self, field: &str) -> bool {
        self.schema.iter().any(|s| s == field)
    }

    fn records(&self) -> Box<dyn Iterator<Item = Self::Row<'_>> + '_> {
        Box::new(self.rows.iter())
    }
}

// ============================================================================
// Column-oriented table
// ============================================================================

/// In-memory table stored as equal-length named columns
#[derive(Debug, Clone, Default)]
pub struct ColumnTable {
    columns: Vec<(String, Vec<Value>)>,
}

impl ColumnTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a column; its length must match the other columns
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> StatsResult<Self> {
        let name = name.into();
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if let Some((_, other)) = self.columns.iter().find(|(n, _)| *n != name) {
            if other.len() != values.len() {
                return Err(StatsError::DimensionMismatch {
                    left: other.len(),
                    right: values.len(),
                });
            }
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = values,
            None => self.columns.push((name, values)),
        }
        Ok(self)
    }

    /// Build from plain numeric slices; NaN entries read as missing under the
    /// default NaN policy
    pub fn from_f64<S: AsRef<[f64]>>(columns: &[(&str, S)]) -> StatsResult<Self> {
        columns
            .iter()
            .try_fold(ColumnTable::new(), |table, (name, data)| {
                table.with_column(*name, data.as_ref().iter().copied())
            })
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |(_, values)| values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One row of a [`ColumnTable`], resolved lazily per field
#[derive(Debug, Clone, Copy)]
pub struct ColumnRow<'a> {
    table: &'a ColumnTable,
    index: usize,
}

impl FieldLookup for ColumnRow<'_> {
    fn get(&self, field: &str) -> Option<&Value> {
        self.table
            .column(field)
            .and_then(|values| values.get(self.index))
    }
}

impl Dataset for ColumnTable {
    type Row<'a> = ColumnRow<'a>;

    fn has_field(&self, field: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == field)
    }

    fn records(&self) -> Box<dyn Iterator<Item = Self::Row<'_>> + '_> {
        Box::new((0..self.len()).map(move |index| ColumnRow { table: self, index }))
    }
}

// ============================================================================
// Streaming source
// ============================================================================

/// Single-use dataset over a caller-supplied record iterator
///
/// The first call to [`Dataset::records`] takes the iterator; later calls see
/// no records. Nothing is buffered, so a stream answers exactly one query.
pub struct RecordStream<I> {
    schema: Vec<String>,
    source: RefCell<Option<I>>,
}

impl<I> RecordStream<I>
where
    I: Iterator,
    I::Item: FieldLookup,
{
    pub fn new<S: Into<String>>(
        schema: impl IntoIterator<Item = S>,
        records: impl IntoIterator<IntoIter = I>,
    ) -> Self {
        Self {
            schema: schema.into_iter().map(Into::into).collect(),
            source: RefCell::new(Some(records.into_iter())),
        }
    }

    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    /// Whether the records have already been handed out
    pub fn is_consumed(&self) -> bool {
        self.source.borrow().is_none()
    }
}

impl<I> Dataset for RecordStream<I>
where
    I: Iterator,
    I::Item: FieldLookup,
{
    type Row<'a> = I::Item where Self: 'a;

    fn has_field(&self, field: &str) -> bool {
        self.schema.iter().any(|s| s == field)
    }

    fn records(&self) -> Box<dyn Iterator<Item = Self::Row<'_>> + '_> {
        match self.source.borrow_mut().take() {
            Some(records) => Box::new(records),
            None => Box::new(std::iter::empty()),
        }
    }
}

// ============================================================================
// Views
// ============================================================================

/// Classifies the cells of one field under the engine options
#[derive(Debug, Clone)]
struct FieldReader<'a> {
    field: &'a str,
    options: EngineOptions,
    missing: usize,
}

impl<'a> FieldReader<'a> {
    fn new<D: Dataset + ?Sized>(
        dataset: &D,
        field: &'a str,
        options: EngineOptions,
    ) -> StatsResult<Self> {
        if !dataset.has_field(field) {
            return Err(StatsError::FieldNotFound {
                field: field.to_string(),
            });
        }
        Ok(Self {
            field,
            options,
            missing: 0,
        })
    }

    fn read<R: FieldLookup>(&mut self, row: usize, record: &R) -> StatsResult<Option<f64>> {
        let cell = self.classify(row, record.get(self.field).unwrap_or(&MISSING));
        if matches!(cell, Ok(None)) {
            self.missing += 1;
        }
        cell
    }

    fn classify(&self, row: usize, value: &Value) -> StatsResult<Option<f64>> {
        let v = match value {
            Value::Missing => {
                return match self.options.missing {
                    MissingPolicy::Skip => Ok(None),
                    MissingPolicy::Error => Err(StatsError::MissingValue {
                        field: self.field.to_string(),
                        row,
                    }),
                };
            }
            Value::Text(_) => {
                return Err(StatsError::TypeMismatch {
                    field: self.field.to_string(),
                    row,
                    found: value.kind_name(),
                });
            }
            other => other.as_f64().unwrap_or(f64::NAN),
        };

        if v.is_nan() {
            return match self.options.nan {
                NanPolicy::DropNaN => Ok(None),
                NanPolicy::ErrorOnNaN => Err(StatsError::InvalidValue {
                    field: self.field.to_string(),
                    row,
                    value: v,
                }),
            };
        }
        if v.is_infinite() {
            return Err(StatsError::InvalidValue {
                field: self.field.to_string(),
                row,
                value: v,
            });
        }
        Ok(Some(v))
    }
}

/// Numeric reading of one field across all records
///
/// Yields `Ok(Some(v))` for usable observations, `Ok(None)` for cells excluded
/// as missing (including NaN under `NanPolicy::DropNaN`), and an error for
/// non-numeric content or cells rejected by a strict policy.
pub struct NumericColumnView<'a, D: Dataset + ?Sized + 'a> {
    records: Box<dyn Iterator<Item = D::Row<'a>> + 'a>,
    reader: FieldReader<'a>,
    rows: usize,
}

impl<'a, D: Dataset + ?Sized + 'a> NumericColumnView<'a, D> {
    pub fn new(dataset: &'a D, field: &'a str, options: EngineOptions) -> StatsResult<Self> {
        let reader = FieldReader::new(dataset, field, options)?;
        Ok(Self {
            records: dataset.records(),
            reader,
            rows: 0,
        })
    }

    pub fn field(&self) -> &str {
        self.reader.field
    }

    /// Rows read so far
    pub fn rows_read(&self) -> usize {
        self.rows
    }

    /// Rows read so far that were missing
    pub fn missing(&self) -> usize {
        self.reader.missing
    }
}

impl<'a, D: Dataset + ?Sized + 'a> Iterator for NumericColumnView<'a, D> {
    type Item = StatsResult<Option<f64>>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        let row = self.rows;
        self.rows += 1;
        Some(self.reader.read(row, &record))
    }
}

/// (x, y) pairs read from the same record, for records where both are present
///
/// Both cells of every record are classified, so a non-numeric value fails the
/// scan even on a record that would have been excluded for the other field.
pub struct PairedSample<'a, D: Dataset + ?Sized + 'a> {
    records: Box<dyn Iterator<Item = D::Row<'a>> + 'a>,
    x: FieldReader<'a>,
    y: FieldReader<'a>,
    rows: usize,
    excluded: usize,
    done: bool,
}

impl<'a, D: Dataset + ?Sized + 'a> PairedSample<'a, D> {
    pub fn new(
        dataset: &'a D,
        field_x: &'a str,
        field_y: &'a str,
        options: EngineOptions,
    ) -> StatsResult<Self> {
        let x = FieldReader::new(dataset, field_x, options)?;
        let y = FieldReader::new(dataset, field_y, options)?;
        Ok(Self {
            records: dataset.records(),
            x,
            y,
            rows: 0,
            excluded: 0,
            done: false,
        })
    }

    /// Rows read so far
    pub fn rows_read(&self) -> usize {
        self.rows
    }

    /// Records dropped so far because either value was missing
    pub fn excluded(&self) -> usize {
        self.excluded
    }
}

impl<'a, D: Dataset + ?Sized + 'a> Iterator for PairedSample<'a, D> {
    type Item = StatsResult<(f64, f64)>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let Some(record) = self.records.next() else {
                self.done = true;
                break;
            };
            let row = self.rows;
            self.rows += 1;
            let x = self.x.read(row, &record);
            let y = self.y.read(row, &record);
            match x.and_then(|x| y.map(|y| (x, y))) {
                Ok((Some(x), Some(y))) => return Some(Ok((x, y))),
                Ok(_) => self.excluded += 1,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
