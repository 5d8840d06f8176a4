// hortifruti-server/src/seed.rs

//! Demo catalog for local runs on the in-memory store (`SEED_CATALOG=true`).

use chrono::{DateTime, Utc};
use hortifruti_core::domain::Product;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::errors::Result;
use crate::store::Store;

struct SeedSupplier {
  name: &'static str,
  products: &'static [(&'static str, &'static str, i64, i32)],
}

const SUPPLIERS: &[SeedSupplier] = &[
  SeedSupplier {
    name: "Sítio Boa Vista",
    products: &[
      ("Banana prata (dúzia)", "frutas", 799, 40),
      ("Mamão formosa", "frutas", 650, 15),
      ("Laranja pera (kg)", "frutas", 499, 60),
    ],
  },
  SeedSupplier {
    name: "Horta do Zé",
    products: &[
      ("Alface crespa", "verduras", 350, 30),
      ("Couve manteiga (maço)", "verduras", 400, 25),
      ("Cheiro-verde", "temperos", 250, 50),
    ],
  },
  SeedSupplier {
    name: "Chácara Santa Luzia",
    products: &[
      ("Tomate italiano (kg)", "legumes", 899, 20),
      ("Cenoura (kg)", "legumes", 550, 35),
    ],
  },
];

pub fn demo_catalog(now: DateTime<Utc>) -> Vec<Product> {
  SUPPLIERS
    .iter()
    .flat_map(|supplier| {
      let supplier_id = Uuid::new_v4();
      supplier.products.iter().map(move |(name, category, cents, stock)| Product {
        id: Uuid::new_v4(),
        supplier_id,
        supplier_name: supplier.name.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        price: Decimal::new(*cents, 2),
        stock: *stock,
        image_url: None,
        created_at: now,
      })
    })
    .collect()
}

pub async fn seed_catalog(store: &dyn Store) -> Result<usize> {
  let products = demo_catalog(Utc::now());
  for product in &products {
    store.insert_product(product).await?;
  }
  info!(count = products.len(), "Demo catalog seeded.");
  Ok(products.len())
}
