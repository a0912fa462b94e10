//! PostgreSQL backend: containers are databases, clones use
//! `CREATE DATABASE ... WITH TEMPLATE`.

use log::debug;
use postgres::error::SqlState;
use postgres::{Client, NoTls};

use crate::error::{Error, Result};
use crate::store::{Metadata, SnapshotStore};
use crate::types::ConnectOptions;

/// Options for [`PgStore`].
#[derive(Debug, Clone)]
pub struct PgOptions {
    pub connect: ConnectOptions,
    /// Database used for server-level statements.
    pub maintenance_db: String,
    /// Key/value table holding the metadata in each database.
    pub table: String,
    /// Prefix prepended to every metadata key.
    pub key_prefix: String,
}

impl Default for PgOptions {
    fn default() -> Self {
        Self {
            connect: ConnectOptions::default(),
            maintenance_db: "postgres".into(),
            table: "ir_config_parameter".into(),
            key_prefix: "odb.".into(),
        }
    }
}

/// A [`SnapshotStore`] over one PostgreSQL server.
///
/// Every call opens a short-lived connection, so listing a history costs one
/// connection per database.
#[derive(Debug, Clone)]
pub struct PgStore {
    options: PgOptions,
}

impl PgStore {
    pub fn new(options: PgOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PgOptions {
        &self.options
    }

    fn connect(&self, dbname: &str) -> Result<Client> {
        let conn = self.options.connect.connection_string(dbname);
        Client::connect(&conn, NoTls).map_err(|e| map_pg(dbname, e))
    }

    fn maintenance(&self) -> Result<Client> {
        self.connect(&self.options.maintenance_db)
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.options.key_prefix, key)
    }
}

impl SnapshotStore for PgStore {
    fn exists(&self, name: &str) -> Result<bool> {
        let mut client = self.maintenance()?;
        let rows = client
            .query("SELECT 1 FROM pg_database WHERE datname = $1", &[&name])
            .map_err(|e| map_pg(name, e))?;
        Ok(!rows.is_empty())
    }

    fn containers(&self) -> Result<Vec<String>> {
        let mut client = self.maintenance()?;
        let rows = client
            .query(
                "SELECT datname FROM pg_database \
                 WHERE datallowconn AND NOT datistemplate ORDER BY datname",
                &[],
            )
            .map_err(Error::store)?;
        Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
    }

    fn create(&self, name: &str) -> Result<()> {
        let mut client = self.maintenance()?;
        client
            .batch_execute(&format!("CREATE DATABASE {}", quote_ident(name)))
            .map_err(|e| map_pg(name, e))?;
        let mut db = self.connect(name)?;
        db.batch_execute(&format!(
            "CREATE TABLE IF NOT EXISTS {} (key character varying(256), value text)",
            quote_ident(&self.options.table)
        ))
        .map_err(|e| map_pg(name, e))?;
        Ok(())
    }

    fn evict(&self, name: &str) -> Result<usize> {
        let mut client = self.maintenance()?;
        let rows = client
            .query(
                "SELECT pg_terminate_backend(pg_stat_activity.pid) \
                 FROM pg_stat_activity \
                 WHERE pg_stat_activity.datname = $1 \
                 AND pid <> pg_backend_pid()",
                &[&name],
            )
            .map_err(|e| map_pg(name, e))?;
        Ok(rows.iter().filter(|row| row.get::<_, bool>(0)).count())
    }

    fn clone_container(&self, source: &str, target: &str) -> Result<()> {
        let mut client = self.maintenance()?;
        debug!("CREATE DATABASE {} WITH TEMPLATE {}", target, source);
        client
            .batch_execute(&format!(
                "CREATE DATABASE {} WITH TEMPLATE {}",
                quote_ident(target),
                quote_ident(source)
            ))
            .map_err(|e| map_pg(target, e))
    }

    fn destroy(&self, name: &str) -> Result<()> {
        let mut client = self.maintenance()?;
        client
            .batch_execute(&format!("DROP DATABASE {}", quote_ident(name)))
            .map_err(|e| map_pg(name, e))
    }

    fn metadata(&self, name: &str) -> Result<Metadata> {
        let mut client = self.connect(name)?;
        let prefix = &self.options.key_prefix;
        let sql = format!(
            "SELECT key, value FROM {} WHERE left(key, length($1)) = $1",
            quote_ident(&self.options.table)
        );
        let rows = match client.query(sql.as_str(), &[prefix]) {
            Ok(rows) => rows,
            Err(e) if e.code() == Some(&SqlState::UNDEFINED_TABLE) => return Ok(Metadata::new()),
            Err(e) => return Err(map_pg(name, e)),
        };
        let mut meta = Metadata::new();
        for row in rows {
            let key: String = row.get(0);
            let value: Option<String> = row.get(1);
            if let (Some(short), Some(value)) = (key.strip_prefix(prefix.as_str()), value) {
                meta.insert(short.to_string(), value);
            }
        }
        Ok(meta)
    }

    fn set_meta(&self, name: &str, key: &str, value: &str) -> Result<()> {
        let mut client = self.connect(name)?;
        let table = quote_ident(&self.options.table);
        let key = self.key(key);
        let updated = client
            .execute(
                format!("UPDATE {} SET value = $1 WHERE key = $2", table).as_str(),
                &[&value, &key],
            )
            .map_err(|e| map_pg(name, e))?;
        if updated == 0 {
            client
                .execute(
                    format!("INSERT INTO {} (key, value) VALUES ($1, $2)", table).as_str(),
                    &[&key, &value],
                )
                .map_err(|e| map_pg(name, e))?;
        }
        Ok(())
    }

    fn unset_meta(&self, name: &str, key: &str) -> Result<()> {
        let mut client = self.connect(name)?;
        let key = self.key(key);
        client
            .execute(
                format!("DELETE FROM {} WHERE key = $1", quote_ident(&self.options.table)).as_str(),
                &[&key],
            )
            .map_err(|e| map_pg(name, e))?;
        Ok(())
    }
}

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn map_pg(name: &str, err: postgres::Error) -> Error {
    match err.code() {
        Some(code) if *code == SqlState::INVALID_CATALOG_NAME => {
            Error::not_found(format!("database '{}'", name))
        }
        Some(code) if *code == SqlState::DUPLICATE_DATABASE => Error::already_exists(name),
        Some(code) if *code == SqlState::OBJECT_IN_USE => Error::busy(name),
        _ => Error::store(err),
    }
}
