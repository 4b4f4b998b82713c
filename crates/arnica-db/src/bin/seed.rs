//! # Seed Data Generator
//!
//! Populates the database with a development dataset: branches,
//! categories, suppliers, a pharmacy catalog with stock batches,
//! delivery slots for the coming week, and a demo staff roster.
//!
//! ## Usage
//! ```bash
//! # Default catalog size
//! cargo run -p arnica-db --bin seed
//!
//! # Custom catalog size
//! cargo run -p arnica-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p arnica-db --bin seed -- --db ./data/arnica.db
//! ```
//!
//! Product data is deterministic (no RNG): SKUs, prices, stock
//! quantities, and expiry dates are derived from the seed index, so two
//! runs against fresh databases produce the same dataset.

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

use arnica_core::{
    Branch, Category, DeliverySlot, Employee, EmployeeRole, InventoryBatch, Product, Supplier,
};
use arnica_db::{Database, DbConfig};

/// Branches: (id, name, address).
const BRANCHES: &[(&str, &str, &str)] = &[
    ("br-gulberg", "Gulberg Branch", "14-B Main Boulevard, Gulberg III, Lahore"),
    ("br-dha", "DHA Branch", "22-C Phase 5, DHA, Lahore"),
    ("br-clifton", "Clifton Branch", "7 Khayaban-e-Roomi, Clifton, Karachi"),
];

/// Suppliers: (id, name, contact email).
const SUPPLIERS: &[(&str, &str, &str)] = &[
    ("sup-getz", "Getz Pharma", "orders@getzpharma.example"),
    ("sup-searle", "Searle Pakistan", "supply@searle.example"),
    ("sup-abbott", "Abbott Laboratories", "trade@abbott.example"),
    ("sup-hilton", "Hilton Pharma", "sales@hiltonpharma.example"),
];

/// Catalog groups: (category id, category name, prescription required,
/// products as (name, active ingredient, base price cents)).
const CATALOG: &[(&str, &str, bool, &[(&str, &str, i64)])] = &[
    (
        "cat-pain",
        "Pain Relief",
        false,
        &[
            ("Panadol 500mg", "paracetamol", 180),
            ("Brufen 200mg", "ibuprofen", 220),
            ("Disprin 300mg", "aspirin", 120),
            ("Synflex 275mg", "naproxen sodium", 340),
            ("Voltral Gel 1%", "diclofenac diethylamine", 420),
        ],
    ),
    (
        "cat-coldflu",
        "Cold & Flu",
        false,
        &[
            ("Actifed DM Syrup", "dextromethorphan", 310),
            ("Coferb Syrup", "thyme extract", 280),
            ("Arinac Forte", "ibuprofen + pseudoephedrine", 260),
            ("Xynosine Nasal Spray", "xylometazoline", 330),
            ("Strepsils Honey", "amylmetacresol", 200),
        ],
    ),
    (
        "cat-vitamins",
        "Vitamins & Supplements",
        false,
        &[
            ("Surbex-Z", "vitamin B complex + zinc", 450),
            ("CaC-1000 Plus", "calcium + vitamin C", 380),
            ("Sunny-D Drops", "cholecalciferol", 520),
            ("Folic Acid 5mg", "folic acid", 150),
            ("Ferosoft Syrup", "iron polymaltose", 340),
        ],
    ),
    (
        "cat-firstaid",
        "First Aid",
        false,
        &[
            ("Pyodine Solution 60ml", "povidone iodine", 190),
            ("Bandage Roll 7.5cm", "cotton gauze", 90),
            ("Dettol Antiseptic 250ml", "chloroxylenol", 310),
            ("Burnol Cream", "cetrimide", 240),
            ("Surgical Tape 2.5cm", "zinc oxide adhesive", 110),
        ],
    ),
    (
        "cat-antibiotics",
        "Antibiotics",
        true,
        &[
            ("Amoxil 500mg", "amoxicillin", 540),
            ("Zithromax 250mg", "azithromycin", 780),
            ("Ciproxin 500mg", "ciprofloxacin", 650),
            ("Augmentin 625mg", "amoxicillin + clavulanate", 920),
            ("Flagyl 400mg", "metronidazole", 380),
        ],
    ),
    (
        "cat-chronic",
        "Chronic Care",
        true,
        &[
            ("Glucophage 500mg", "metformin", 290),
            ("Lipiget 20mg", "atorvastatin", 560),
            ("Norvasc 5mg", "amlodipine", 480),
            ("Cozaar 50mg", "losartan potassium", 610),
            ("Inderal 40mg", "propranolol", 260),
        ],
    ),
];

/// Pack variants: (label suffix, price addon cents).
const PACKS: &[(&str, i64)] = &[
    ("10 Tablets", 0),
    ("20 Tablets", 140),
    ("30 Tablets", 260),
    ("Family Pack", 480),
];

/// Delivery windows offered every day at every branch.
const WINDOWS: &[&str] = &["09:00-12:00", "12:00-15:00", "15:00-18:00", "18:00-21:00"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 120;
    let mut db_path = String::from("./arnica_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(120);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Arnica Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 120)");
                println!("  -d, --db <PATH>    Database file path (default: ./arnica_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Arnica Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let today = now.date_naive();

    // Branches
    for (id, name, address) in BRANCHES {
        db.branches()
            .insert(&Branch {
                id: id.to_string(),
                name: name.to_string(),
                address: address.to_string(),
                phone: Some(format!("+92-42-35{:06}", id.len() * 71_003)),
                is_active: true,
                created_at: now,
            })
            .await?;
    }
    println!("✓ {} branches", BRANCHES.len());

    // Suppliers
    for (id, name, email) in SUPPLIERS {
        db.suppliers()
            .insert(&Supplier {
                id: id.to_string(),
                name: name.to_string(),
                contact_email: Some(email.to_string()),
                phone: None,
                created_at: now,
            })
            .await?;
    }
    println!("✓ {} suppliers", SUPPLIERS.len());

    // Categories
    for (id, name, _, _) in CATALOG {
        db.categories()
            .insert(&Category {
                id: id.to_string(),
                name: name.to_string(),
                description: None,
                image_path: None,
                created_at: now,
            })
            .await?;
    }
    println!("✓ {} categories", CATALOG.len());

    // Products
    println!();
    println!("Generating products...");

    let mut product_ids: Vec<String> = Vec::with_capacity(count);
    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_idx, (category_id, _, requires_rx, products)) in
        CATALOG.iter().enumerate()
    {
        for (product_idx, (name, ingredient, base_price)) in products.iter().enumerate() {
            for (pack_idx, (pack, price_addon)) in PACKS.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = category_idx * 1000 + product_idx * 20 + pack_idx;
                let supplier_id = SUPPLIERS[seed % SUPPLIERS.len()].0;
                let product = generate_product(
                    category_id,
                    supplier_id,
                    name,
                    ingredient,
                    pack,
                    base_price + price_addon,
                    *requires_rx,
                    seed,
                );

                let product_id = product.id.clone();
                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }
                product_ids.push(product_id);

                generated += 1;
                if generated % 50 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    // Stock batches at every branch; a third of products get a second,
    // shorter-dated batch so expiry reports have something to show.
    let mut batches = 0;
    for (branch_idx, (branch_id, _, _)) in BRANCHES.iter().enumerate() {
        for (product_idx, product_id) in product_ids.iter().enumerate() {
            let seed = branch_idx * 10 + product_idx;

            db.inventory()
                .insert_batch(&InventoryBatch {
                    id: Uuid::new_v4().to_string(),
                    branch_id: branch_id.to_string(),
                    product_id: product_id.clone(),
                    quantity: 10 + ((seed * 7) % 110) as i64,
                    expiry_date: today + Duration::days(60 + (seed % 300) as i64),
                    received_at: now,
                })
                .await?;
            batches += 1;

            if seed % 3 == 0 {
                db.inventory()
                    .insert_batch(&InventoryBatch {
                        id: Uuid::new_v4().to_string(),
                        branch_id: branch_id.to_string(),
                        product_id: product_id.clone(),
                        quantity: 5 + (seed % 20) as i64,
                        expiry_date: today + Duration::days(10 + (seed % 40) as i64),
                        received_at: now,
                    })
                    .await?;
                batches += 1;
            }
        }
    }

    // Delivery slots for the coming week
    let mut slots = 0;
    for (branch_id, _, _) in BRANCHES {
        for day in 1..=7 {
            for window in WINDOWS {
                db.delivery()
                    .insert_slot(&DeliverySlot {
                        id: Uuid::new_v4().to_string(),
                        branch_id: branch_id.to_string(),
                        slot_date: today + Duration::days(day),
                        window: window.to_string(),
                        capacity: 5,
                        booked: 0,
                        created_at: now,
                    })
                    .await?;
                slots += 1;
            }
        }
    }

    // Demo staff: an admin at the first branch, then a manager,
    // pharmacist, and driver per branch.
    let mut staff = 0;
    let roster: &[(&str, EmployeeRole)] = &[
        ("Manager", EmployeeRole::Manager),
        ("Pharmacist", EmployeeRole::Pharmacist),
        ("Driver", EmployeeRole::Driver),
    ];
    for (branch_idx, (branch_id, branch_name, _)) in BRANCHES.iter().enumerate() {
        if branch_idx == 0 {
            db.employees()
                .insert(&demo_employee("emp-admin", "Arnica Admin", EmployeeRole::Admin, branch_id))
                .await?;
            staff += 1;
        }
        for (title, role) in roster {
            let id = format!("emp-{}-{}", title.to_lowercase(), branch_idx + 1);
            let name = format!("{} {}", branch_name, title);
            db.employees().insert(&demo_employee(&id, &name, *role, branch_id)).await?;
            staff += 1;
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);
    println!("✓ {} stock batches, {} delivery slots, {} employees", batches, slots, staff);
    println!(
        "  Rate: {:.0} rows/second",
        (generated + batches + slots + staff) as f64 / elapsed.as_secs_f64()
    );

    // Verify the catalog answers queries
    println!();
    println!("Verifying...");
    let results = db.products().search("panadol", None, 10, 0).await?;
    println!("  Search 'panadol': {} results", results.len());

    let levels = db.inventory().stock_levels(BRANCHES[0].0, today).await?;
    println!("  Stocked products at {}: {}", BRANCHES[0].1, levels.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds a single catalog product with a deterministic SKU and price.
#[allow(clippy::too_many_arguments)]
fn generate_product(
    category_id: &str,
    supplier_id: &str,
    name: &str,
    ingredient: &str,
    pack: &str,
    price_cents: i64,
    requires_prescription: bool,
    seed: usize,
) -> Product {
    let now = Utc::now();

    let prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{:04}", prefix, seed);

    Product {
        id: Uuid::new_v4().to_string(),
        sku,
        name: format!("{} ({})", name, pack),
        description: Some(format!("{} with {}", name, ingredient)),
        category_id: Some(category_id.to_string()),
        supplier_id: Some(supplier_id.to_string()),
        price_cents,
        requires_prescription,
        active_ingredient: Some(ingredient.to_string()),
        image_path: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn demo_employee(id: &str, name: &str, role: EmployeeRole, branch_id: &str) -> Employee {
    let now = Utc::now();
    Employee {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@arnica.example", id),
        role,
        branch_id: branch_id.to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
