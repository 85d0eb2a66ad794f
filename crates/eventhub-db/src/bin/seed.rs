//! # Seed Data Generator
//!
//! Populates the database with development data.
//!
//! ## Usage
//! ```bash
//! # 12 events (default)
//! cargo run -p eventhub-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p eventhub-db --bin seed -- --count 40 --db ./data/eventhub.db
//! ```
//!
//! ## Generated Data
//! - One admin, two organizers, three customers (`*@eventhub.dev`)
//! - Venues in four cities
//! - Events spread over the next weeks, across categories
//! - Discount code `WELCOME10` (10%, 100 uses, 30 days)

use chrono::{Duration, Utc};
use std::env;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use eventhub_core::{Discount, Event, Role, User, Venue};
use eventhub_db::{Database, DbConfig};

const CATEGORIES: &[&str] = &["music", "theatre", "sports", "tech", "comedy", "food"];

const VENUES: &[(&str, &str, &str, i64)] = &[
    ("Riverside Arena", "12 Quay Road", "Lisbon", 5000),
    ("The Blue Room", "4 Harbour Lane", "Porto", 250),
    ("Grand Hall", "1 Palace Square", "Madrid", 1200),
    ("Warehouse 9", "9 Dock Street", "Lisbon", 600),
];

const TITLES: &[&str] = &[
    "Summer Sounds",
    "Hamlet Reimagined",
    "City Derby",
    "RustConf Europe",
    "Late Night Laughs",
    "Street Food Fair",
    "Jazz on the Quay",
    "Opera Gala",
    "Marathon Expo",
    "Cloud Native Day",
    "Improv Jam",
    "Wine & Cheese Evening",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 12;
    let mut db_path = String::from("./eventhub_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(12);
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
                println!("EventHub Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of events to generate (default: 12)");
                println!("  -d, --db <PATH>    Database file path (default: ./eventhub_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 EventHub Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Events:   {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.users().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} users", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Users
    println!();
    println!("Creating users...");
    let admin = user("Ada Admin", "admin@eventhub.dev", Role::Admin);
    let organizers = [
        user("Olga Organizer", "olga@eventhub.dev", Role::Organizer),
        user("Omar Organizer", "omar@eventhub.dev", Role::Organizer),
    ];
    let customers = [
        user("Carla Customer", "carla@eventhub.dev", Role::Customer),
        user("Chen Customer", "chen@eventhub.dev", Role::Customer),
        user("Cody Customer", "cody@eventhub.dev", Role::Customer),
    ];
    for u in std::iter::once(&admin)
        .chain(organizers.iter())
        .chain(customers.iter())
    {
        db.users().insert(u).await?;
        println!("  {:<10} {:<22} {}", format!("{:?}", u.role), u.email, u.id);
    }

    // Venues
    println!();
    println!("Creating venues...");
    let mut venues = Vec::with_capacity(VENUES.len());
    for (name, address, city, capacity) in VENUES {
        let now = Utc::now();
        let venue = Venue {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            address: address.to_string(),
            city: city.to_string(),
            capacity: *capacity,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.venues().insert(&venue).await?;
        println!("  {} ({}, {} seats)", venue.name, venue.city, venue.capacity);
        venues.push(venue);
    }

    // Events
    println!();
    println!("Generating events...");
    let start = std::time::Instant::now();
    let mut generated = 0;
    for n in 0..count {
        let event = generate_event(n, &organizers[n % organizers.len()], &venues[n % venues.len()]);
        if let Err(e) = db.events().insert(&event).await {
            eprintln!("Failed to insert {}: {}", event.title, e);
            continue;
        }
        generated += 1;
    }
    println!("✓ Generated {} events in {:?}", generated, start.elapsed());

    // Discount
    let now = Utc::now();
    let welcome = Discount {
        id: Uuid::new_v4().to_string(),
        code: "WELCOME10".to_string(),
        percentage_bps: 1000,
        event_id: None,
        valid_from: now,
        valid_until: now + Duration::days(30),
        max_uses: Some(100),
        times_used: 0,
        is_active: true,
        created_at: now,
    };
    db.discounts().insert(&welcome).await?;
    println!("✓ Discount code {} (10%)", welcome.code);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn user(name: &str, email: &str, role: Role) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        loyalty_points: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Generates one event with deterministic but varied data.
fn generate_event(seed: usize, organizer: &User, venue: &Venue) -> Event {
    let now = Utc::now();
    let title = TITLES[seed % TITLES.len()];
    let title = if seed < TITLES.len() {
        title.to_string()
    } else {
        format!("{} #{}", title, seed / TITLES.len() + 1)
    };

    // Starts 2..=60 days out at 19:00-ish, lasts 2-4 hours
    let start_date = now + Duration::days(2 + (seed as i64 * 5) % 59) + Duration::hours(19);
    let end_date = start_date + Duration::hours(2 + (seed as i64 % 3));

    // $10.00 - $89.50
    let price_cents = 1000 + ((seed as i64 * 1750) % 7950);

    // 50% - 100% of the venue
    let total_tickets = (venue.capacity * (50 + (seed as i64 * 13) % 51) / 100).max(1);

    Event {
        id: Uuid::new_v4().to_string(),
        organizer_id: organizer.id.clone(),
        venue_id: venue.id.clone(),
        title,
        description: Some(format!("{} at {}", CATEGORIES[seed % CATEGORIES.len()], venue.name)),
        category: CATEGORIES[seed % CATEGORIES.len()].to_string(),
        start_date,
        end_date,
        price_cents,
        total_tickets,
        available_tickets: total_tickets,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
