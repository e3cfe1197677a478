//! Conversion of PostgreSQL rows into gateway rows.

use chrono::NaiveDateTime;
use sqlstep_migrate::{Row, SqlValue};
use tokio_postgres::types::{FromSql, Type};

use crate::error::{PgError, PgResult};

/// Convert a tokio-postgres row into a driver-neutral [`Row`].
pub fn to_row(row: &tokio_postgres::Row) -> PgResult<Row> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = column_value(row, idx, column.name(), column.type_())?;
        out.push(column.name(), value);
    }
    Ok(out)
}

fn column_value(
    row: &tokio_postgres::Row,
    idx: usize,
    name: &str,
    ty: &Type,
) -> PgResult<SqlValue> {
    let value: SqlValue = match *ty {
        Type::BOOL => get::<bool>(row, idx, name)?.into(),
        Type::INT2 => get::<i16>(row, idx, name)?.map(i64::from).into(),
        Type::INT4 => get::<i32>(row, idx, name)?.map(i64::from).into(),
        Type::INT8 => get::<i64>(row, idx, name)?.into(),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            get::<String>(row, idx, name)?.into()
        }
        Type::TIMESTAMP => get::<NaiveDateTime>(row, idx, name)?
            .map_or(SqlValue::Null, SqlValue::Timestamp),
        _ => {
            return Err(PgError::UnsupportedType {
                column: name.to_string(),
                type_name: ty.to_string(),
            });
        }
    };
    Ok(value)
}

fn get<T>(row: &tokio_postgres::Row, idx: usize, name: &str) -> PgResult<Option<T>>
where
    T: for<'a> FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx).map_err(|e| PgError::Decode {
        column: name.to_string(),
        message: e.to_string(),
    })
}
