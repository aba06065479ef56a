use pizza_delivery_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        Pizzas, Users, pizzas,
        sea_orm_active_enums::Role,
        users,
    },
    security::password::hash_password,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin", "admin@example.com", "admin123", Role::Admin).await?;
    let customer_id =
        ensure_user(&orm, "customer", "customer@example.com", "customer123", Role::Customer).await?;
    let rider_id = ensure_user(
        &orm,
        "rider",
        "rider@example.com",
        "rider123",
        Role::DeliveryPartner,
    )
    .await?;
    seed_pizzas(&orm).await?;

    println!(
        "Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}, Rider ID: {rider_id}"
    );
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    // Existing accounts keep their password; only the role is reasserted.
    if let Some(existing) = Users::find()
        .filter(users::Column::Username.eq(username))
        .one(orm)
        .await?
    {
        if existing.role != role {
            let mut active: users::ActiveModel = existing.clone().into();
            active.role = Set(role);
            active.update(orm).await?;
        }
        println!("User {username} already present (role={role})");
        return Ok(existing.id);
    }

    let password_hash = hash_password(password)?;
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        role: Set(role),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;

    println!("Ensured user {username} (role={role})");
    Ok(user.id)
}

async fn seed_pizzas(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let menu = [
        ("Margherita", "Tomato, mozzarella and basil", Decimal::new(899, 2)),
        ("Pepperoni", "Spicy pepperoni over mozzarella", Decimal::new(1099, 2)),
        ("Quattro Formaggi", "Four cheeses, no sauce", Decimal::new(1249, 2)),
        ("Funghi", "Mushrooms, garlic and thyme", Decimal::new(999, 2)),
    ];

    let mut inserted = 0;
    for (name, description, price) in menu {
        let exists = Pizzas::find()
            .filter(pizzas::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        pizzas::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            price: Set(price),
            is_available: Set(true),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(orm)
        .await?;
        inserted += 1;
    }

    println!("Seeded pizzas ({inserted} new)");
    Ok(())
}
