//! # Administrator Seeder
//!
//! Creates the first administrator so someone can log in and register the
//! rest through the API.
//!
//! ## Usage
//! ```bash
//! cargo run -p orderdesk-db --bin seed -- --email root@example.com --password hunter22
//!
//! # Custom name and database path
//! cargo run -p orderdesk-db --bin seed -- -n "Back Office" -e ops@example.com -p s3cret! -d ./data/orderdesk.db
//! ```
//!
//! Credentials go through the same validation gate as `POST /createUser`.

use std::env;

use orderdesk_core::validation::{validate, Mode, ADMINISTRATOR};
use orderdesk_core::NewAdministrator;
use orderdesk_db::{Database, DbConfig, DbError};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut name = String::from("Administrator");
    let mut email: Option<String> = None;
    let mut password: Option<String> = None;
    let mut db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| String::from("./orderdesk.db"));

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--name" | "-n" => {
                if let Some(v) = value {
                    name = v;
                    i += 1;
                }
            }
            "--email" | "-e" => {
                if value.is_some() {
                    email = value;
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if value.is_some() {
                    password = value;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(v) = value {
                    db_path = v;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let (Some(email), Some(password)) = (email, password) else {
        print_help();
        return Err("--email and --password are required".into());
    };

    let payload = json!({ "name": name, "email": email, "password": password });
    let sanitized = match validate(&ADMINISTRATOR, Mode::Create, &payload) {
        Ok(map) => map,
        Err(errors) => {
            for violation in errors.violations() {
                eprintln!("✗ {}", violation.message);
            }
            return Err(errors.into());
        }
    };
    let new: NewAdministrator = serde_json::from_value(serde_json::Value::Object(sanitized))?;

    println!("🌱 Orderdesk Administrator Seeder");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    match db.administrators().create(&new).await {
        Ok(admin) => {
            println!("✓ Administrator {} <{}> created", admin.name, admin.email);
            println!("  Total administrators: {}", db.administrators().count().await?);
        }
        Err(DbError::UniqueViolation { value, .. }) => {
            println!("⚠ Administrator {} already exists, nothing to do", value);
        }
        Err(e) => return Err(e.into()),
    }

    db.close().await;
    Ok(())
}

fn print_help() {
    println!("Orderdesk Administrator Seeder");
    println!();
    println!("Usage: seed --email <EMAIL> --password <PASSWORD> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -n, --name <NAME>          Display name (default: Administrator)");
    println!("  -e, --email <EMAIL>        Login email");
    println!("  -p, --password <PASSWORD>  Password (at least 6 characters)");
    println!("  -d, --db <PATH>            Database file path (default: $DATABASE_PATH or ./orderdesk.db)");
    println!("  -h, --help                 Show this help message");
}
