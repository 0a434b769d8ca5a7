//! pagedb command line tool

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use pagedb::access::{DataType, Projection, Value};
use pagedb::catalog::Column;
use pagedb::database::{Database, DatabaseConfig};
use std::path::PathBuf;

/// pagedb - a single-file-per-table B-tree storage engine
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data directory
    #[arg(short = 'D', long, default_value = "./pagedb_data")]
    data_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a table from column definitions like `id:NUMBER:key name:VARCHAR`
    Create {
        table: String,
        #[arg(required = true)]
        columns: Vec<String>,
    },
    /// Insert one row from assignments like `id=1 name=alice`
    Insert {
        table: String,
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Print every row, optionally projected onto some columns
    Select { table: String, columns: Vec<String> },
    /// Print the row with the given key
    Get { table: String, key: String },
    /// Delete every row of a table
    Delete { table: String },
    /// Drop a table and its data
    Drop { table: String },
    /// List tables
    Tables,
    /// Print a table's B-tree page by page
    Dump { table: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut db = Database::open(DatabaseConfig::new(&args.data_dir))
        .context("Failed to open database")?;

    match args.command {
        Command::Create { table, columns } => {
            let columns = columns
                .iter()
                .map(|def| parse_column(def))
                .collect::<Result<Vec<_>>>()?;
            db.create_table(&table, columns)?;
            println!("Table '{}' created", table);
        }
        Command::Insert { table, assignments } => {
            let schema = db.table_schema(&table)?;
            let mut names = Vec::with_capacity(assignments.len());
            let mut values = Vec::with_capacity(assignments.len());
            for assignment in &assignments {
                let Some((name, text)) = assignment.split_once('=') else {
                    bail!("Expected `column=value`, got '{}'", assignment);
                };
                let Some(column) = schema.column(name) else {
                    bail!("Unknown column '{}'", name);
                };
                names.push(name.to_string());
                values.push(parse_value(text, column.data_type)?);
            }
            db.insert_row(&table, &names, &values)?;
        }
        Command::Select { table, columns } => {
            for row in db.scan_project(&table, &Projection::columns(&columns))? {
                println!("{}", row);
            }
        }
        Command::Get { table, key } => {
            let schema = db.table_schema(&table)?;
            let Some(key_column) = schema.key_column() else {
                bail!("Table '{}' has no key", table);
            };
            let key = parse_value(&key, key_column.data_type)?;
            match db.get_row(&table, &key)? {
                Some(row) => println!("{}", row),
                None => println!("No row with key {}", key),
            }
        }
        Command::Delete { table } => db.delete_all(&table)?,
        Command::Drop { table } => {
            db.drop_table(&table)?;
            println!("Table '{}' dropped", table);
        }
        Command::Tables => {
            for name in db.list_tables() {
                println!("{}", name);
            }
        }
        Command::Dump { table } => print!("{}", db.dump_table(&table)?),
    }

    Ok(())
}

/// `name:TYPE` or `name:TYPE:key`
fn parse_column(def: &str) -> Result<Column> {
    let mut parts = def.split(':');
    let (Some(name), Some(type_name)) = (parts.next(), parts.next()) else {
        bail!("Expected `name:TYPE[:key]`, got '{}'", def);
    };
    let Some(data_type) = DataType::from_name(type_name) else {
        bail!("Unknown type '{}' for column '{}'", type_name, name);
    };
    let is_key = match parts.next() {
        None => false,
        Some(flag) if flag.eq_ignore_ascii_case("key") => true,
        Some(flag) => bail!("Unknown column flag '{}'", flag),
    };
    if parts.next().is_some() {
        bail!("Expected `name:TYPE[:key]`, got '{}'", def);
    }
    Ok(Column::new(name, data_type, is_key))
}

fn parse_value(text: &str, data_type: DataType) -> Result<Value> {
    match Value::parse(text, data_type) {
        Some(value) => Ok(value),
        None => bail!("'{}' is not a valid {}", text, data_type),
    }
}
