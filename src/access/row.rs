use crate::access::row_codec::RowData;
use crate::access::value::Value;
use crate::catalog::TableSchema;
use std::fmt;

/// Which columns a scan returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `*`: every column in schema order.
    All,
    /// The listed columns in the listed order.
    Columns(Vec<String>),
}

impl Projection {
    pub fn columns<S: AsRef<str>>(names: &[S]) -> Self {
        if names.is_empty() {
            Projection::All
        } else {
            Projection::Columns(names.iter().map(|n| n.as_ref().to_string()).collect())
        }
    }
}

/// An ordered, projected row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn project(data: &RowData, schema: &TableSchema, projection: &Projection) -> Self {
        let value_of = |name: &str| data.get(name).cloned().unwrap_or(Value::Null);
        let fields = match projection {
            Projection::All => schema
                .columns()
                .iter()
                .map(|c| (c.name.clone(), value_of(c.name.as_str())))
                .collect(),
            Projection::Columns(names) => names
                .iter()
                .map(|name| (name.clone(), value_of(name.as_str())))
                .collect(),
        };
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.fields {
            write!(f, "{}: {}|", name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DataType;
    use crate::catalog::Column;

    fn setup() -> (RowData, TableSchema) {
        let schema = TableSchema::with_columns(
            "tmp",
            vec![
                Column::new("a", DataType::Varchar, true),
                Column::new("b", DataType::Number, false),
                Column::new("c", DataType::Varchar, false),
            ],
        );
        let mut data = RowData::new();
        data.insert("c".to_string(), Value::String("x".to_string()));
        data.insert("a".to_string(), Value::String("a1".to_string()));
        data.insert("b".to_string(), Value::Number(1));
        (data, schema)
    }

    #[test]
    fn test_project_all_uses_schema_order() {
        let (data, schema) = setup();
        let row = Row::project(&data, &schema, &Projection::All);
        let names: Vec<&str> = row.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(row.to_string(), "a: a1|b: 1|c: x|");
    }

    #[test]
    fn test_project_subset_uses_requested_order() {
        let (data, schema) = setup();
        let row = Row::project(&data, &schema, &Projection::columns(&["c", "a"]));
        assert_eq!(row.len(), 2);
        assert_eq!(row.to_string(), "c: x|a: a1|");
        assert_eq!(row.get("a"), Some(&Value::String("a1".to_string())));
        assert_eq!(row.get("b"), None);
    }

    #[test]
    fn test_empty_column_list_means_all() {
        let empty: [&str; 0] = [];
        assert_eq!(Projection::columns(&empty), Projection::All);
    }
}
