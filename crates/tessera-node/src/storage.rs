//! RocksDB storage backend for the Tessera node.
//!
//! Unspent outputs live in the `outputs` column family keyed by their
//! output id string. The protocol parameters the ledger was created with
//! live in `meta`.

use anyhow::Result;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;

use tessera_core::OutputId;
use tessera_ledger::{AppliedTransaction, Output, ProtocolParameters};

const CF_OUTPUTS: &str = "outputs";
const CF_META: &str = "meta";

const KEY_PARAMETERS: &[u8] = b"protocol_parameters";

/// RocksDB-backed storage for the Tessera node.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_OUTPUTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    fn cf(&self, cf_name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", cf_name))
    }

    pub fn put_parameters(&self, params: &ProtocolParameters) -> Result<()> {
        let cf = self.cf(CF_META)?;
        self.db.put_cf(cf, KEY_PARAMETERS, serde_json::to_vec(params)?)?;
        Ok(())
    }

    pub fn get_parameters(&self) -> Result<Option<ProtocolParameters>> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(cf, KEY_PARAMETERS)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_output(&self, id: &OutputId, output: &Output) -> Result<()> {
        let cf = self.cf(CF_OUTPUTS)?;
        self.db
            .put_cf(cf, id.to_string().as_bytes(), serde_json::to_vec(output)?)?;
        Ok(())
    }

    /// Every stored unspent output.
    pub fn load_outputs(&self) -> Result<Vec<(OutputId, Output)>> {
        let cf = self.cf(CF_OUTPUTS)?;
        let mut outputs = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = entry?;
            let id: OutputId = std::str::from_utf8(&key)?.parse()?;
            outputs.push((id, serde_json::from_slice(&value)?));
        }
        Ok(outputs)
    }

    /// Persist the outputs a transaction spent and created in one batch.
    pub fn apply(&self, applied: &AppliedTransaction) -> Result<()> {
        let cf = self.cf(CF_OUTPUTS)?;
        let mut batch = WriteBatch::default();
        for id in &applied.spent {
            batch.delete_cf(cf, id.to_string().as_bytes());
        }
        for (id, output) in &applied.created {
            batch.put_cf(cf, id.to_string().as_bytes(), serde_json::to_vec(output)?);
        }
        self.db.write(batch)?;
        Ok(())
    }
}
