use std::fmt;

/// Quotes a MySQL identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// A fully qualified MySQL table name: database (schema) plus table.
#[derive(Debug, Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct TableName {
    pub schema: String,
    pub name: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> TableName {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Returns the name quoted for direct use in SQL, e.g. `` `kea`.`hosts` ``.
    pub fn as_quoted_identifier(&self) -> String {
        format!(
            "{}.{}",
            quote_identifier(&self.schema),
            quote_identifier(&self.name)
        )
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Value family of a column, derived from `information_schema.columns.data_type`.
///
/// Decides which Rust type a column value is decoded into.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ColumnKind {
    SignedInteger,
    UnsignedInteger,
    Float,
    Double,
    Decimal,
    Text,
    Binary,
    Date,
    Time,
    DateTime,
    Json,
    /// Anything else (`bit`, `year`, spatial types, ...), handled as raw bytes.
    Other,
}

impl ColumnKind {
    /// Classifies a column from its `data_type` and full `column_type` strings.
    pub fn classify(data_type: &str, column_type: &str) -> ColumnKind {
        match data_type.to_ascii_lowercase().as_str() {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => {
                if column_type.to_ascii_lowercase().contains("unsigned") {
                    ColumnKind::UnsignedInteger
                } else {
                    ColumnKind::SignedInteger
                }
            }
            "float" => ColumnKind::Float,
            "double" | "real" => ColumnKind::Double,
            "decimal" | "numeric" => ColumnKind::Decimal,
            "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "enum"
            | "set" => ColumnKind::Text,
            "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
                ColumnKind::Binary
            }
            "date" => ColumnKind::Date,
            "time" => ColumnKind::Time,
            "datetime" | "timestamp" => ColumnKind::DateTime,
            "json" => ColumnKind::Json,
            _ => ColumnKind::Other,
        }
    }
}

/// Metadata of a single column of a MySQL table.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    /// Bare type name, e.g. `int`.
    pub data_type: String,
    /// Full type, e.g. `int(10) unsigned`.
    pub column_type: String,
    pub nullable: bool,
    pub primary: bool,
}

impl ColumnSchema {
    pub fn new(
        name: impl Into<String>,
        data_type: impl Into<String>,
        column_type: impl Into<String>,
        nullable: bool,
        primary: bool,
    ) -> ColumnSchema {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            column_type: column_type.into(),
            nullable,
            primary,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        ColumnKind::classify(&self.data_type, &self.column_type)
    }
}

/// Columns of a table, in ordinal order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TableSchema {
    pub name: TableName,
    pub column_schemas: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(name: TableName, column_schemas: Vec<ColumnSchema>) -> Self {
        Self {
            name,
            column_schemas,
        }
    }

    pub fn num_columns(&self) -> usize {
        self.column_schemas.len()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.column_schemas.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.column_schemas.iter().map(|column| column.name.as_str())
    }

    /// Returns the column list quoted for a `SELECT`, in ordinal order.
    pub fn quoted_column_list(&self) -> String {
        self.column_schemas
            .iter()
            .map(|column| quote_identifier(&column.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
