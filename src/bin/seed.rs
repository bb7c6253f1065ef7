use chrono::Utc;
use sea_orm::{
    DatabaseConnection, EntityTrait, Set,
    sea_query::OnConflict,
};
use travel_checkout::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        Cars, Flights, Hotels, Packages, cars, flights, hotels, packages,
    },
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    seed_flights(&orm).await?;
    seed_hotels(&orm).await?;
    seed_packages(&orm).await?;
    seed_cars(&orm).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_flights(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let seeds = [
        ("AR 1302 EZE-BRC", "Aerolineas Argentinas", "EZE", "BRC", 18_500_000),
        ("LA 2441 EZE-GRU", "LATAM", "EZE", "GRU", 32_000_000),
        ("IB 6844 EZE-MAD", "Iberia", "EZE", "MAD", 115_000_000),
    ];

    for (name, airline, origin, destination, price) in seeds {
        let row = flights::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.into()),
            airline: Set(airline.into()),
            origin: Set(origin.into()),
            destination: Set(destination.into()),
            price: Set(price),
            created_at: Set(Utc::now().into()),
        };
        Flights::insert(row)
            .on_conflict(OnConflict::column(flights::Column::Name).do_nothing().to_owned())
            .exec_without_returning(orm)
            .await?;
    }

    println!("Seeded flights");
    Ok(())
}

async fn seed_hotels(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let seeds = [
        ("Llao Llao Resort", "Bariloche", 42_000_000),
        ("Copacabana Palace", "Rio de Janeiro", 55_000_000),
    ];

    for (name, city, price) in seeds {
        let row = hotels::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.into()),
            city: Set(city.into()),
            price: Set(price),
            created_at: Set(Utc::now().into()),
        };
        Hotels::insert(row)
            .on_conflict(OnConflict::column(hotels::Column::Name).do_nothing().to_owned())
            .exec_without_returning(orm)
            .await?;
    }

    println!("Seeded hotels");
    Ok(())
}

async fn seed_packages(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let seeds = [
        ("Patagonia Week", "Flight, 6 nights and lake excursions", 98_000_000),
        ("Carnival in Rio", "Flight, 4 nights and sambadrome tickets", 120_000_000),
    ];

    for (name, description, price) in seeds {
        let row = packages::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.into()),
            description: Set(Some(description.into())),
            price: Set(price),
            created_at: Set(Utc::now().into()),
        };
        Packages::insert(row)
            .on_conflict(OnConflict::column(packages::Column::Name).do_nothing().to_owned())
            .exec_without_returning(orm)
            .await?;
    }

    println!("Seeded packages");
    Ok(())
}

async fn seed_cars(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let seeds = [
        ("Compact 4x2", "Fiat", 4_500_000),
        ("SUV 4x4", "Toyota", 9_800_000),
    ];

    for (name, brand, price) in seeds {
        let row = cars::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.into()),
            brand: Set(brand.into()),
            price: Set(price),
            created_at: Set(Utc::now().into()),
        };
        Cars::insert(row)
            .on_conflict(OnConflict::column(cars::Column::Name).do_nothing().to_owned())
            .exec_without_returning(orm)
            .await?;
    }

    println!("Seeded cars");
    Ok(())
}
