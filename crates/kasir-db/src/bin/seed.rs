//! # Seed Data Generator
//!
//! Populates a database with an admin account and sample products for
//! development.
//!
//! ## Usage
//! ```bash
//! # Default database and credentials
//! cargo run -p kasir-db --bin seed
//!
//! # Specify database path
//! cargo run -p kasir-db --bin seed -- --db ./data/kasir.db
//!
//! # Custom admin login
//! cargo run -p kasir-db --bin seed -- --email owner@toko.id --password Rahasia1
//! ```
//!
//! ## Generated Data
//! - One admin user (default `admin@kasirnest.id` / `Admin123`)
//! - One cashier user (`kasir@kasirnest.id` / `Kasir123`)
//! - A handful of products per category with Rupiah prices and barcodes

use kasir_core::{Category, Money, Product, Role};
use kasir_db::{generate_product_id, Database, DbConfig, DbError};
use std::env;

/// Sample products per category: (name, price in rupiah, stock).
const CATALOG: &[(Category, &[(&str, i64, i64)])] = &[
    (
        Category::Food,
        &[
            ("Kopi Susu Gula Aren", 18_000, 40),
            ("Teh Botol", 5_000, 120),
            ("Indomie Goreng", 3_500, 200),
            ("Roti Tawar", 16_000, 25),
            ("Keripik Singkong", 12_000, 60),
        ],
    ),
    (
        Category::Electronic,
        &[
            ("Kabel USB-C 1m", 35_000, 30),
            ("Baterai AA isi 4", 28_000, 50),
            ("Earphone", 75_000, 12),
        ],
    ),
    (
        Category::Fashion,
        &[
            ("Kaos Polos Hitam", 55_000, 20),
            ("Topi Baseball", 45_000, 8),
            ("Kaus Kaki", 15_000, 40),
        ],
    ),
    (
        Category::Health,
        &[
            ("Masker Medis isi 50", 25_000, 35),
            ("Hand Sanitizer 100ml", 18_500, 45),
            ("Minyak Kayu Putih", 22_000, 3),
        ],
    ),
    (
        Category::Household,
        &[
            ("Sabun Cuci Piring", 14_000, 50),
            ("Sapu Ijuk", 30_000, 10),
            ("Tisu Gulung isi 10", 38_000, 4),
        ],
    ),
    (
        Category::Stationery,
        &[
            ("Buku Tulis 38 Lembar", 4_500, 150),
            ("Pulpen Hitam", 3_000, 200),
            ("Pensil 2B", 2_500, 0),
        ],
    ),
    (
        Category::Other,
        &[("Kantong Belanja", 1_000, 500), ("Pulsa 10rb", 11_500, 999)],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kasir_dev.db");
    let mut email = String::from("admin@kasirnest.id");
    let mut password = String::from("Admin123");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--email" | "-e" => {
                if i + 1 < args.len() {
                    email = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("KasirNest Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./kasir_dev.db)");
                println!("  -e, --email <EMAIL>      Admin email (default: admin@kasirnest.id)");
                println!("  -p, --password <PASS>    Admin password (default: Admin123)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 KasirNest Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Users
    println!();
    println!("Creating users...");
    for (email, name, role, password) in [
        (email.as_str(), "Administrator", Role::Admin, password.as_str()),
        ("kasir@kasirnest.id", "Kasir Satu", Role::Cashier, "Kasir123"),
    ] {
        match db.users().create(email, name, role, password).await {
            Ok(user) => println!("  + {} ({})", user.email, user.role),
            Err(DbError::UniqueViolation { .. }) => println!("  = {} already exists", email),
            Err(e) => return Err(e.into()),
        }
    }

    // Products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!();
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping product seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    for (category_idx, (category, items)) in CATALOG.iter().enumerate() {
        for (item_idx, (name, rupiah, stock)) in items.iter().enumerate() {
            let mut product = Product::new(
                generate_product_id(),
                *name,
                Money::from_rupiah(*rupiah),
                *stock,
                *category,
            );
            // EAN-13 shaped, checksum not computed
            product.barcode = Some(format!("899{:02}{:08}", category_idx, item_idx));

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }
            generated += 1;
        }
        println!("  {}: {} products", category.display_name(), items.len());
    }

    println!();
    println!("✓ Generated {} products", generated);

    let low = db.products().count_low_stock(5).await?;
    println!("  Low stock (≤ 5): {}", low);

    let search_results = db.products().search("kopi", 10).await?;
    println!("  Search 'kopi': {} results", search_results.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
