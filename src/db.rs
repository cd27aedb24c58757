use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;

use crate::config::Config;
use crate::models::{Mascota, MascotaInput, MascotaPatch};

/// Table and column names for the mascotas table, consumed by both the
/// startup DDL and every query below.
pub struct TableSpec {
    pub name: &'static str,
    pub id: &'static str,
    pub nombre: &'static str,
    pub especie: &'static str,
    pub edad: &'static str,
}

pub const MASCOTAS: TableSpec = TableSpec {
    name: "mascotas",
    id: "id",
    nombre: "nombre",
    especie: "especie",
    edad: "edad",
};

impl TableSpec {
    /// Idempotent creation DDL; safe to run on every startup.
    pub fn create_ddl(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n\
             \x20   {} SERIAL PRIMARY KEY,\n\
             \x20   {} TEXT NOT NULL,\n\
             \x20   {} TEXT NOT NULL,\n\
             \x20   {} INTEGER NOT NULL\n\
             )",
            self.name, self.id, self.nombre, self.especie, self.edad
        )
    }

    /// Column list for SELECT and RETURNING clauses.
    pub fn columns(&self) -> String {
        format!("{}, {}, {}, {}", self.id, self.nombre, self.especie, self.edad)
    }
}

const CREATE_TABLE_MAX_ATTEMPTS: u32 = 10;
const CREATE_TABLE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Shareable Postgres handle for use across async handlers
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Create the connection pool and make sure the `mascotas` table exists.
    ///
    /// Pool construction establishes an initial connection and is fatal on
    /// failure. Table creation is retried on a fixed schedule because
    /// Postgres may accept connections before it is ready to run DDL
    /// (typically while its container is still initializing).
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.database_url)
            .await
            .context("Failed to connect to Postgres")?;

        tracing::info!("Connected to Postgres");

        let db = Self { pool };
        db.ensure_table().await?;
        Ok(db)
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Wrap an existing pool without touching the database.
    #[cfg(test)]
    pub(crate) fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Release the pool. Paired with `from_config`; runs on every normal
    /// shutdown path.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Postgres pool closed");
    }

    async fn ensure_table(&self) -> Result<()> {
        let ddl = MASCOTAS.create_ddl();
        let mut attempt = 1;
        loop {
            match sqlx::query(&ddl).execute(&self.pool).await {
                Ok(_) => {
                    tracing::info!("Table '{}' is ready", MASCOTAS.name);
                    return Ok(());
                }
                Err(err) if attempt < CREATE_TABLE_MAX_ATTEMPTS => {
                    tracing::warn!(
                        "Table creation attempt {}/{} failed: {}",
                        attempt,
                        CREATE_TABLE_MAX_ATTEMPTS,
                        err
                    );
                    attempt += 1;
                    tokio::time::sleep(CREATE_TABLE_RETRY_DELAY).await;
                }
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!(
                            "Failed to create table '{}' after {} attempts",
                            MASCOTAS.name, CREATE_TABLE_MAX_ATTEMPTS
                        )
                    });
                }
            }
        }
    }

    /// Insert one row and return it with the id Postgres assigned.
    pub async fn insert(&self, input: &MascotaInput) -> Result<Mascota> {
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}) VALUES ($1, $2, $3) RETURNING {}",
            MASCOTAS.name,
            MASCOTAS.nombre,
            MASCOTAS.especie,
            MASCOTAS.edad,
            MASCOTAS.columns()
        );

        let mascota = sqlx::query_as::<_, Mascota>(&sql)
            .bind(&input.nombre)
            .bind(&input.especie)
            .bind(input.edad)
            .fetch_one(&self.pool)
            .await
            .context("Failed to insert mascota")?;

        tracing::debug!("Inserted mascota with id: {}", mascota.id);
        Ok(mascota)
    }

    /// Fetch every row. No ORDER BY: result ordering is whatever Postgres
    /// returns.
    pub async fn list(&self) -> Result<Vec<Mascota>> {
        let sql = format!("SELECT {} FROM {}", MASCOTAS.columns(), MASCOTAS.name);

        let mascotas = sqlx::query_as::<_, Mascota>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list mascotas")?;

        Ok(mascotas)
    }

    /// Fetch a single row by id.
    ///
    /// # Returns
    /// * `Ok(Some(mascota))` - Row found
    /// * `Ok(None)` - No row with that id
    /// * `Err(_)` - Query failed
    pub async fn get(&self, id: i32) -> Result<Option<Mascota>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            MASCOTAS.columns(),
            MASCOTAS.name,
            MASCOTAS.id
        );

        let mascota = sqlx::query_as::<_, Mascota>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch mascota")?;

        Ok(mascota)
    }

    /// Overwrite the three descriptive fields of a row. The id column is
    /// never part of the SET list. Returns `None` if the row disappeared
    /// between the caller's existence check and this write.
    pub async fn replace(&self, id: i32, input: &MascotaInput) -> Result<Option<Mascota>> {
        let sql = format!(
            "UPDATE {} SET {} = $1, {} = $2, {} = $3 WHERE {} = $4 RETURNING {}",
            MASCOTAS.name,
            MASCOTAS.nombre,
            MASCOTAS.especie,
            MASCOTAS.edad,
            MASCOTAS.id,
            MASCOTAS.columns()
        );

        let mascota = sqlx::query_as::<_, Mascota>(&sql)
            .bind(&input.nombre)
            .bind(&input.especie)
            .bind(input.edad)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to replace mascota")?;

        Ok(mascota)
    }

    /// Apply a partial change set. Only the fields present in the patch
    /// appear in the UPDATE statement; the caller must reject an empty patch
    /// before calling.
    pub async fn patch(&self, id: i32, patch: &MascotaPatch) -> Result<Option<Mascota>> {
        let mut query = patch_update(id, patch);

        let mascota = query
            .build_query_as::<Mascota>()
            .fetch_optional(&self.pool)
            .await
            .context("Failed to patch mascota")?;

        Ok(mascota)
    }

    /// Perform a health check by executing a trivial round-trip query.
    ///
    /// # Returns
    /// * `Ok(())` - Database is reachable and responsive
    /// * `Err(_)` - Connection or query failed, or no row came back
    pub async fn health_check(&self) -> Result<()> {
        let row = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_optional(&self.pool)
            .await
            .context("Failed to execute health check query")?;

        if row.is_some() {
            tracing::debug!("Health check query succeeded");
            Ok(())
        } else {
            Err(anyhow::anyhow!("Health check query returned no results"))
        }
    }
}

/// Build the dynamic UPDATE for a partial change set. Omitted fields never
/// reach the SET list.
fn patch_update<'a>(id: i32, patch: &'a MascotaPatch) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", MASCOTAS.name));

    {
        let mut fields = builder.separated(", ");
        if let Some(nombre) = &patch.nombre {
            fields
                .push(format!("{} = ", MASCOTAS.nombre))
                .push_bind_unseparated(nombre);
        }
        if let Some(especie) = &patch.especie {
            fields
                .push(format!("{} = ", MASCOTAS.especie))
                .push_bind_unseparated(especie);
        }
        if let Some(edad) = patch.edad {
            fields
                .push(format!("{} = ", MASCOTAS.edad))
                .push_bind_unseparated(edad);
        }
    }

    builder.push(format!(" WHERE {} = ", MASCOTAS.id));
    builder.push_bind(id);
    builder.push(format!(" RETURNING {}", MASCOTAS.columns()));
    builder
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn test_create_ddl_is_idempotent_and_complete() {
        let ddl = MASCOTAS.create_ddl();
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS mascotas"));
        assert!(ddl.contains("id SERIAL PRIMARY KEY"));
        assert!(ddl.contains("nombre TEXT NOT NULL"));
        assert!(ddl.contains("especie TEXT NOT NULL"));
        assert!(ddl.contains("edad INTEGER NOT NULL"));
    }

    #[test]
    fn test_columns_order_matches_record() {
        assert_eq!(MASCOTAS.columns(), "id, nombre, especie, edad");
    }

    #[test]
    fn test_patch_update_single_field() {
        let patch = MascotaPatch {
            edad: Some(4),
            ..Default::default()
        };
        let builder = patch_update(1, &patch);
        assert_eq!(
            builder.sql(),
            "UPDATE mascotas SET edad = $1 WHERE id = $2 RETURNING id, nombre, especie, edad"
        );
    }

    #[test]
    fn test_patch_update_all_fields() {
        let patch = MascotaPatch {
            nombre: Some("Firulais".to_string()),
            especie: Some("perro".to_string()),
            edad: Some(3),
        };
        let builder = patch_update(7, &patch);
        assert_eq!(
            builder.sql(),
            "UPDATE mascotas SET nombre = $1, especie = $2, edad = $3 \
             WHERE id = $4 RETURNING id, nombre, especie, edad"
        );
    }

    #[test]
    fn test_patch_update_skips_omitted_fields() {
        let patch = MascotaPatch {
            nombre: Some("Michi".to_string()),
            ..Default::default()
        };
        let builder = patch_update(2, &patch);
        let sql = builder.sql();
        let set_clause = &sql[..sql.find(" WHERE").unwrap()];
        assert_eq!(set_clause, "UPDATE mascotas SET nombre = $1");
    }

    #[test]
    fn test_db_is_clonable() {
        // Required for sharing across axum handlers
        fn assert_clone<T: Clone>() {}
        assert_clone::<Db>();
    }

    #[test]
    fn test_db_is_send_sync() {
        // Required for use in async handlers
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Db>();
    }

    /// Connect to the test database, or skip the calling test when no
    /// Postgres is reachable.
    pub(crate) async fn test_db() -> Option<Db> {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .unwrap_or_else(|_| crate::config::DEFAULT_DATABASE_URL.to_string());

        let config = Config {
            database_url,
            health_db: false,
            service_port: 8000,
            service_host: "0.0.0.0".to_string(),
            index_path: "index.html".to_string(),
        };

        match Db::from_config(&config).await {
            Ok(db) => Some(db),
            Err(err) => {
                println!("Test skipped (Postgres not reachable): {err:#}");
                None
            }
        }
    }

    #[tokio::test]
    async fn test_insert_then_get_round_trip() {
        let Some(db) = test_db().await else { return };

        let input = MascotaInput {
            nombre: "Rocky".to_string(),
            especie: "perro".to_string(),
            edad: 5,
        };

        let inserted = db.insert(&input).await.unwrap();
        assert!(inserted.id > 0, "Postgres must assign an id");
        assert_eq!(inserted.nombre, "Rocky");

        let fetched = db.get(inserted.id).await.unwrap();
        assert_eq!(fetched, Some(inserted));
    }

    #[tokio::test]
    async fn test_get_missing_id_returns_none() {
        let Some(db) = test_db().await else { return };

        let fetched = db.get(i32::MAX).await.unwrap();
        assert_eq!(fetched, None);
    }

    #[tokio::test]
    async fn test_patch_leaves_other_fields_unchanged() {
        let Some(db) = test_db().await else { return };

        let inserted = db
            .insert(&MascotaInput {
                nombre: "Luna".to_string(),
                especie: "gato".to_string(),
                edad: 2,
            })
            .await
            .unwrap();

        let patch = MascotaPatch {
            edad: Some(3),
            ..Default::default()
        };
        let updated = db.patch(inserted.id, &patch).await.unwrap().unwrap();

        assert_eq!(updated.id, inserted.id);
        assert_eq!(updated.nombre, "Luna");
        assert_eq!(updated.especie, "gato");
        assert_eq!(updated.edad, 3);
    }

    #[tokio::test]
    async fn test_replace_overwrites_all_fields_but_not_id() {
        let Some(db) = test_db().await else { return };

        let inserted = db
            .insert(&MascotaInput {
                nombre: "Coco".to_string(),
                especie: "loro".to_string(),
                edad: 1,
            })
            .await
            .unwrap();

        let replaced = db
            .replace(
                inserted.id,
                &MascotaInput {
                    nombre: "Coco II".to_string(),
                    especie: "cacatúa".to_string(),
                    edad: 2,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced.id, inserted.id);
        assert_eq!(replaced.nombre, "Coco II");
        assert_eq!(replaced.especie, "cacatúa");
        assert_eq!(replaced.edad, 2);
    }

    #[tokio::test]
    async fn test_replace_missing_id_returns_none() {
        let Some(db) = test_db().await else { return };

        let result = db
            .replace(
                i32::MAX,
                &MascotaInput {
                    nombre: "Nadie".to_string(),
                    especie: "perro".to_string(),
                    edad: 1,
                },
            )
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_health_check_succeeds() {
        let Some(db) = test_db().await else { return };

        db.health_check().await.unwrap();
    }
}
