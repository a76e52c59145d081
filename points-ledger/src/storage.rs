//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `accounts` - User ledger records (key: big-endian user id)
//!
//! The store holds one record per user that has ever been touched.
//! Records are written whole; a multi-record mutation (transfer) goes
//! through a single `WriteBatch` so both sides commit or neither does.

use crate::{
    error::{Error, Result},
    types::{UserId, UserRecord},
    Config,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Options, WriteBatch, DB};
use std::sync::Arc;

/// Column family names
const CF_ACCOUNTS: &str = "accounts";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Point lookups dominate, level compaction is fine
        db_opts.set_compaction_style(DBCompactionStyle::Level);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(
            CF_ACCOUNTS,
            Self::cf_options_accounts(),
        )];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_accounts() -> Options {
        let mut opts = Options::default();
        // Records are small and frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_accounts(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_ACCOUNTS)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", CF_ACCOUNTS)))
    }

    // Account operations

    /// Get account record, if the user has ever been touched
    pub fn get_account(&self, user_id: UserId) -> Result<Option<UserRecord>> {
        let cf = self.cf_accounts()?;

        match self.db.get_cf(cf, user_id.key_bytes())? {
            Some(value) => {
                let record: UserRecord = bincode::deserialize(&value)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Put account record (single-record atomic write)
    pub fn put_account(&self, record: &UserRecord) -> Result<()> {
        let cf = self.cf_accounts()?;
        let value = bincode::serialize(record)?;

        self.db.put_cf(cf, record.user_id.key_bytes(), &value)?;

        tracing::debug!(
            user_id = %record.user_id,
            points = record.points,
            "Account record written"
        );

        Ok(())
    }

    /// Put two account records atomically (transfer commit)
    ///
    /// Both records land in one `WriteBatch`, so a debit is never
    /// visible without its matching credit.
    pub fn put_accounts_atomic(&self, first: &UserRecord, second: &UserRecord) -> Result<()> {
        let cf = self.cf_accounts()?;
        let mut batch = WriteBatch::default();

        batch.put_cf(cf, first.user_id.key_bytes(), bincode::serialize(first)?);
        batch.put_cf(cf, second.user_id.key_bytes(), bincode::serialize(second)?);

        self.db.write(batch)?;

        Ok(())
    }

    /// Approximate number of accounts (fast, RocksDB estimate)
    pub fn account_count(&self) -> Result<u64> {
        let cf = self.cf_accounts()?;
        let count = self
            .db
            .property_int_value_cf(cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);

        Ok(count)
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}
