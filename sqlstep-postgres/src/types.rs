//! Type conversions for PostgreSQL parameters.

use sqlstep_migrate::SqlValue;
use tokio_postgres::types::ToSql;

/// Convert a SqlValue to a type that can be used as a PostgreSQL parameter.
///
/// `Null` binds as a NULL text value, so it only fits text-typed
/// placeholders.
pub fn sql_value_to_param(value: &SqlValue) -> Box<dyn ToSql + Sync + Send> {
    match value {
        SqlValue::Null => Box::new(Option::<String>::None),
        SqlValue::Bool(b) => Box::new(*b),
        SqlValue::Int(i) => Box::new(*i),
        SqlValue::Text(s) => Box::new(s.clone()),
        SqlValue::Timestamp(t) => Box::new(*t),
    }
}

/// Convert SqlValues to PostgreSQL parameters.
pub fn sql_values_to_params(values: &[SqlValue]) -> Vec<Box<dyn ToSql + Sync + Send>> {
    values.iter().map(sql_value_to_param).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_postgres::types::Type;

    #[test]
    fn test_param_types() {
        let params = sql_values_to_params(&[
            SqlValue::Int(42),
            SqlValue::Text("1_init.sql".to_string()),
            SqlValue::Bool(true),
            SqlValue::Null,
        ]);
        assert_eq!(params.len(), 4);

        fn accepts<T: ToSql>(_: &T, ty: &Type) -> bool {
            T::accepts(ty)
        }
        assert!(accepts(&42i64, &Type::INT8));
        assert!(!accepts(&42i64, &Type::INT4));
        assert!(accepts(&Option::<String>::None, &Type::VARCHAR));
    }
}
