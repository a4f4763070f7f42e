// std imports
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

// 3rd party imports
use serde::de::DeserializeOwned;
use tracing::debug;

// internal imports
use crate::configuration::StoreConfiguration;
use crate::constants::{PEPTIDE_TABLE, PROTEIN_TABLE};
use crate::errors::store_error::StoreError;
use crate::matches::assumption::AssumptionsMap;
use crate::matches::identification_match::IdentificationMatch;
use crate::matches::match_parameter::MatchParameter;
use crate::matches::peptide_match::PeptideMatch;
use crate::matches::protein_match::ProteinMatch;
use crate::matches::spectrum_match::{spectrum_file_from_key, SpectrumMatch};
use crate::progress::ProgressSink;
use crate::storage::object_store::ObjectStore;
use crate::storage::objects_cache::ObjectsCache;
use crate::storage::table_names::{
    assumptions_table, classify_table_name, peptide_parameters_table, protein_parameters_table,
    psm_parameters_table, psm_table, raw_assumptions_table, TableKind,
};

/// Names of the dynamically created tables, grouped by kind. The two
/// canonical tables `proteins` and `peptides` are not tracked here.
///
#[derive(Debug, Default)]
struct TableRegistry {
    psm_tables: HashSet<String>,
    assumptions_tables: HashSet<String>,
    raw_assumptions_tables: HashSet<String>,
    psm_parameters_tables: HashSet<String>,
    peptide_parameters_tables: HashSet<String>,
    protein_parameters_tables: HashSet<String>,
}

impl TableRegistry {
    fn tables(&self, kind: TableKind) -> Option<&HashSet<String>> {
        match kind {
            TableKind::Psms => Some(&self.psm_tables),
            TableKind::Assumptions => Some(&self.assumptions_tables),
            TableKind::RawAssumptions => Some(&self.raw_assumptions_tables),
            TableKind::PsmParameters => Some(&self.psm_parameters_tables),
            TableKind::PeptideParameters => Some(&self.peptide_parameters_tables),
            TableKind::ProteinParameters => Some(&self.protein_parameters_tables),
            TableKind::Proteins | TableKind::Peptides => None,
        }
    }

    fn tables_mut(&mut self, kind: TableKind) -> Option<&mut HashSet<String>> {
        match kind {
            TableKind::Psms => Some(&mut self.psm_tables),
            TableKind::Assumptions => Some(&mut self.assumptions_tables),
            TableKind::RawAssumptions => Some(&mut self.raw_assumptions_tables),
            TableKind::PsmParameters => Some(&mut self.psm_parameters_tables),
            TableKind::PeptideParameters => Some(&mut self.peptide_parameters_tables),
            TableKind::ProteinParameters => Some(&mut self.protein_parameters_tables),
            TableKind::Proteins | TableKind::Peptides => None,
        }
    }
}

/// Identification match database, routing protein matches, peptide
/// matches, spectrum matches, assumption maps and match parameters to
/// their tables in the underlying object store. Spectrum keyed data is
/// partitioned into one table per MS run file, parameters additionally
/// by parameter kind, so tables stay small enough for whole table loads.
/// Tables are created lazily on first write under a registry mutex,
/// reopening a database re-derives the registry from the persisted
/// table names.
///
pub struct IdentificationDb<S: ObjectStore> {
    /// Database name
    name: String,
    /// Parent folder of the database
    folder: PathBuf,
    store: S,
    registry: Mutex<TableRegistry>,
}

impl<S: ObjectStore> IdentificationDb<S> {
    /// Opens an identification database. With `delete_old` any existing
    /// database of that name is wiped and the canonical `proteins` and
    /// `peptides` tables are created. Without it the database is reopened
    /// and the table registry re-derived from the persisted table names.
    ///
    /// # Arguments
    /// * `folder` - Parent folder for project databases
    /// * `name` - Database name within the folder
    /// * `delete_old` - Whether to start from a wiped database
    /// * `cache` - Shared object cache
    ///
    pub fn new(
        folder: &Path,
        name: &str,
        delete_old: bool,
        cache: Arc<ObjectsCache>,
    ) -> Result<Self, StoreError> {
        let store = S::connect(folder, name, delete_old, cache)?;
        let db = Self {
            name: name.to_string(),
            folder: folder.to_path_buf(),
            store,
            registry: Mutex::new(TableRegistry::default()),
        };
        if delete_old {
            db.store.add_table(PROTEIN_TABLE)?;
            db.store.add_table(PEPTIDE_TABLE)?;
        } else {
            db.seed_registry()?;
        }
        Ok(db)
    }

    /// Opens an identification database from a configuration
    ///
    /// # Arguments
    /// * `configuration` - Folder, name and cache sizing
    /// * `delete_old` - Whether to start from a wiped database
    ///
    pub fn from_configuration(
        configuration: &StoreConfiguration,
        delete_old: bool,
    ) -> Result<Self, StoreError> {
        let cache = Arc::new(ObjectsCache::new(&configuration.cache));
        Self::new(
            &configuration.folder,
            &configuration.name,
            delete_old,
            cache,
        )
    }

    /// Reconnects a closed database, re-attaching a cache handle
    ///
    /// # Arguments
    /// * `folder` - Parent folder for project databases
    /// * `delete_old` - Whether to start from a wiped database
    /// * `cache` - Shared object cache
    ///
    pub fn restore_connection(
        &mut self,
        folder: &Path,
        delete_old: bool,
        cache: Arc<ObjectsCache>,
    ) -> Result<(), StoreError> {
        self.store
            .establish_connection(folder, &self.name, delete_old, cache)?;
        self.folder = folder.to_path_buf();
        if delete_old {
            self.store.add_table(PROTEIN_TABLE)?;
            self.store.add_table(PEPTIDE_TABLE)?;
            let mut registry = self.lock_registry("resetting the table registry")?;
            *registry = TableRegistry::default();
        } else {
            self.seed_registry()?;
        }
        Ok(())
    }

    /// Checks whether the underlying store holds an open connection
    ///
    pub fn is_connection_active(&self) -> bool {
        self.store.is_connection_active()
    }

    /// Writes pending cache entries back and releases the connection.
    /// Further calls are no-ops.
    ///
    pub fn close(&mut self) -> Result<(), StoreError> {
        self.store.close()
    }

    /// Returns the database name
    ///
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent folder of the database
    ///
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Returns the underlying object store
    ///
    pub fn object_store(&self) -> &S {
        &self.store
    }

    fn lock_registry(
        &self,
        when: &'static str,
    ) -> Result<MutexGuard<'_, TableRegistry>, StoreError> {
        self.registry
            .lock()
            .map_err(|_| StoreError::Interrupted(format!("locking the table registry for {}", when)))
    }

    /// Creates a table unless the registry already knows it. The lock is
    /// held across the store call so racing writers produce exactly one
    /// creation and never observe a half-created table.
    ///
    fn check_table(&self, table: &str, kind: TableKind) -> Result<(), StoreError> {
        let mut registry = self.lock_registry("creating a table")?;
        let tables = match registry.tables_mut(kind) {
            Some(tables) => tables,
            // the canonical tables exist since construction
            None => return Ok(()),
        };
        if tables.contains(table) {
            return Ok(());
        }
        self.store.add_table(table)?;
        tables.insert(table.to_string());
        debug!("created table `{}`", table);
        Ok(())
    }

    /// Rebuilds the registry by classifying the persisted table names
    ///
    fn seed_registry(&self) -> Result<(), StoreError> {
        let table_names = self.store.table_names()?;
        let mut registry = self.lock_registry("seeding the table registry")?;
        *registry = TableRegistry::default();
        for table in table_names {
            if let Some(kind) = classify_table_name(&table) {
                if let Some(tables) = registry.tables_mut(kind) {
                    tables.insert(table);
                }
            }
        }
        Ok(())
    }

    fn registered(&self, kind: TableKind, table: &str) -> Result<bool, StoreError> {
        let registry = self.lock_registry("probing the table registry")?;
        Ok(registry
            .tables(kind)
            .map(|tables| tables.contains(table))
            .unwrap_or(false))
    }

    fn registered_tables(&self, kind: TableKind) -> Result<Vec<String>, StoreError> {
        let registry = self.lock_registry("listing tables")?;
        Ok(registry
            .tables(kind)
            .map(|tables| tables.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Returns the table names of a kind. The canonical kinds yield their
    /// static names, the dynamic kinds the registered tables.
    ///
    /// # Arguments
    /// * `kind` - Kind of table
    ///
    pub fn tables_of_kind(&self, kind: TableKind) -> Result<Vec<String>, StoreError> {
        match kind {
            TableKind::Proteins => Ok(vec![PROTEIN_TABLE.to_string()]),
            TableKind::Peptides => Ok(vec![PEPTIDE_TABLE.to_string()]),
            _ => self.registered_tables(kind),
        }
    }

    /// Fetches any stored object by table and key, cache first
    ///
    /// # Arguments
    /// * `table` - Table name
    /// * `key` - Object key
    /// * `use_db` - Whether to fall through to the engine on a cache miss
    ///
    pub fn get_object<T: DeserializeOwned>(
        &self,
        table: &str,
        key: &str,
        use_db: bool,
    ) -> Result<Option<T>, StoreError> {
        self.store.retrieve_object(table, key, use_db)
    }

    /// Stores a match of any category
    ///
    /// # Arguments
    /// * `identification_match` - Match to store
    ///
    pub fn add_match(&self, identification_match: &IdentificationMatch) -> Result<(), StoreError> {
        match identification_match {
            IdentificationMatch::Protein(protein) => self.add_protein_match(protein),
            IdentificationMatch::Peptide(peptide) => self.add_peptide_match(peptide),
            IdentificationMatch::Spectrum(psm) => self.add_spectrum_match(psm),
        }
    }

    /// Overwrites a stored match of any category
    ///
    /// # Arguments
    /// * `identification_match` - New state of the match
    ///
    pub fn update_match(
        &self,
        identification_match: &IdentificationMatch,
    ) -> Result<(), StoreError> {
        match identification_match {
            IdentificationMatch::Protein(protein) => self.update_protein_match(protein),
            IdentificationMatch::Peptide(peptide) => self.update_peptide_match(peptide),
            IdentificationMatch::Spectrum(psm) => self.update_spectrum_match(psm),
        }
    }

    // spectrum matches

    /// Stores a spectrum match in the table of its MS run file, creating
    /// the table on first use. Re-adding a key overwrites.
    ///
    /// # Arguments
    /// * `psm` - Spectrum match to store
    ///
    pub fn add_spectrum_match(&self, psm: &SpectrumMatch) -> Result<(), StoreError> {
        let table = psm_table(psm.spectrum_file());
        self.check_table(&table, TableKind::Psms)?;
        self.store.insert_object(&table, &psm.key(), psm, true)
    }

    /// Overwrites a stored spectrum match
    ///
    /// # Arguments
    /// * `psm` - New state of the spectrum match
    ///
    pub fn update_spectrum_match(&self, psm: &SpectrumMatch) -> Result<(), StoreError> {
        let table = psm_table(psm.spectrum_file());
        self.store.update_object(&table, &psm.key(), psm)
    }

    /// Fetches a spectrum match by key
    ///
    /// # Arguments
    /// * `key` - Spectrum match key
    /// * `use_db` - Whether to fall through to the engine on a cache miss
    ///
    pub fn get_spectrum_match(
        &self,
        key: &str,
        use_db: bool,
    ) -> Result<Option<SpectrumMatch>, StoreError> {
        let table = psm_table(spectrum_file_from_key(key)?);
        self.store.retrieve_object(&table, key, use_db)
    }

    /// Removes a spectrum match, sweeping every known spectrum match
    /// table and spectrum match parameter table. Returns whether a match
    /// was stored under the key.
    ///
    /// # Arguments
    /// * `key` - Spectrum match key
    ///
    pub fn remove_spectrum_match(&self, key: &str) -> Result<bool, StoreError> {
        let (psm_tables, parameter_tables) = {
            let registry = self.lock_registry("removing a spectrum match")?;
            (
                registry.psm_tables.iter().cloned().collect::<Vec<_>>(),
                registry
                    .psm_parameters_tables
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>(),
            )
        };
        let mut removed = false;
        for table in &psm_tables {
            removed |= self.store.delete_object(table, key)?;
        }
        for table in &parameter_tables {
            self.store.delete_object(table, key)?;
        }
        Ok(removed)
    }

    /// Checks whether a spectrum match exists, cache or engine
    ///
    /// # Arguments
    /// * `key` - Spectrum match key
    ///
    pub fn spectrum_match_loaded(&self, key: &str) -> Result<bool, StoreError> {
        let table = psm_table(spectrum_file_from_key(key)?);
        self.store.in_db(&table, key, true)
    }

    /// Checks whether the spectrum match table of an MS run file exists
    ///
    /// # Arguments
    /// * `spectrum_file` - Name of the MS run file
    ///
    pub fn spectrum_match_table_created(&self, spectrum_file: &str) -> Result<bool, StoreError> {
        self.registered(TableKind::Psms, &psm_table(spectrum_file))
    }

    // peptide matches

    /// Stores a peptide match. Re-adding a key overwrites.
    ///
    /// # Arguments
    /// * `peptide` - Peptide match to store
    ///
    pub fn add_peptide_match(&self, peptide: &PeptideMatch) -> Result<(), StoreError> {
        self.store
            .insert_object(PEPTIDE_TABLE, peptide.key(), peptide, true)
    }

    /// Overwrites a stored peptide match
    ///
    /// # Arguments
    /// * `peptide` - New state of the peptide match
    ///
    pub fn update_peptide_match(&self, peptide: &PeptideMatch) -> Result<(), StoreError> {
        self.store
            .update_object(PEPTIDE_TABLE, peptide.key(), peptide)
    }

    /// Fetches a peptide match by key
    ///
    /// # Arguments
    /// * `key` - Peptide match key
    /// * `use_db` - Whether to fall through to the engine on a cache miss
    ///
    pub fn get_peptide_match(
        &self,
        key: &str,
        use_db: bool,
    ) -> Result<Option<PeptideMatch>, StoreError> {
        self.store.retrieve_object(PEPTIDE_TABLE, key, use_db)
    }

    /// Removes a peptide match and its entries in every known peptide
    /// parameter table. Returns whether a match was stored under the key.
    ///
    /// # Arguments
    /// * `key` - Peptide match key
    ///
    pub fn remove_peptide_match(&self, key: &str) -> Result<bool, StoreError> {
        let parameter_tables = self.registered_tables(TableKind::PeptideParameters)?;
        let removed = self.store.delete_object(PEPTIDE_TABLE, key)?;
        for table in &parameter_tables {
            self.store.delete_object(table, key)?;
        }
        Ok(removed)
    }

    /// Checks whether a peptide match exists, cache or engine
    ///
    /// # Arguments
    /// * `key` - Peptide match key
    ///
    pub fn peptide_match_loaded(&self, key: &str) -> Result<bool, StoreError> {
        self.store.in_db(PEPTIDE_TABLE, key, true)
    }

    // protein matches

    /// Stores a protein match. Re-adding a key overwrites.
    ///
    /// # Arguments
    /// * `protein` - Protein match to store
    ///
    pub fn add_protein_match(&self, protein: &ProteinMatch) -> Result<(), StoreError> {
        self.store
            .insert_object(PROTEIN_TABLE, &protein.key(), protein, true)
    }

    /// Overwrites a stored protein match
    ///
    /// # Arguments
    /// * `protein` - New state of the protein match
    ///
    pub fn update_protein_match(&self, protein: &ProteinMatch) -> Result<(), StoreError> {
        self.store
            .update_object(PROTEIN_TABLE, &protein.key(), protein)
    }

    /// Fetches a protein match by key
    ///
    /// # Arguments
    /// * `key` - Protein match key
    /// * `use_db` - Whether to fall through to the engine on a cache miss
    ///
    pub fn get_protein_match(
        &self,
        key: &str,
        use_db: bool,
    ) -> Result<Option<ProteinMatch>, StoreError> {
        self.store.retrieve_object(PROTEIN_TABLE, key, use_db)
    }

    /// Removes a protein match and its entries in every known protein
    /// parameter table. Returns whether a match was stored under the key.
    ///
    /// # Arguments
    /// * `key` - Protein match key
    ///
    pub fn remove_protein_match(&self, key: &str) -> Result<bool, StoreError> {
        let parameter_tables = self.registered_tables(TableKind::ProteinParameters)?;
        let removed = self.store.delete_object(PROTEIN_TABLE, key)?;
        for table in &parameter_tables {
            self.store.delete_object(table, key)?;
        }
        Ok(removed)
    }

    /// Checks whether a protein match exists, cache or engine
    ///
    /// # Arguments
    /// * `key` - Protein match key
    ///
    pub fn protein_match_loaded(&self, key: &str) -> Result<bool, StoreError> {
        self.store.in_db(PROTEIN_TABLE, key, true)
    }

    // assumption maps

    /// Stores the assumption map of a spectrum in the assumptions table
    /// of its MS run file
    ///
    /// # Arguments
    /// * `spectrum_key` - Spectrum match key
    /// * `assumptions` - Advocate to score to assumptions map
    ///
    pub fn add_assumptions(
        &self,
        spectrum_key: &str,
        assumptions: &AssumptionsMap,
    ) -> Result<(), StoreError> {
        let table = assumptions_table(spectrum_file_from_key(spectrum_key)?);
        self.check_table(&table, TableKind::Assumptions)?;
        self.store
            .insert_object(&table, spectrum_key, assumptions, true)
    }

    /// Overwrites the stored assumption map of a spectrum
    ///
    /// # Arguments
    /// * `spectrum_key` - Spectrum match key
    /// * `assumptions` - New advocate to score to assumptions map
    ///
    pub fn update_assumptions(
        &self,
        spectrum_key: &str,
        assumptions: &AssumptionsMap,
    ) -> Result<(), StoreError> {
        let table = assumptions_table(spectrum_file_from_key(spectrum_key)?);
        self.store.update_object(&table, spectrum_key, assumptions)
    }

    /// Fetches the assumption map of a spectrum
    ///
    /// # Arguments
    /// * `spectrum_key` - Spectrum match key
    /// * `use_db` - Whether to fall through to the engine on a cache miss
    ///
    pub fn get_assumptions(
        &self,
        spectrum_key: &str,
        use_db: bool,
    ) -> Result<Option<AssumptionsMap>, StoreError> {
        let table = assumptions_table(spectrum_file_from_key(spectrum_key)?);
        self.store.retrieve_object(&table, spectrum_key, use_db)
    }

    /// Removes the assumption map of a spectrum, sweeping every known
    /// assumptions table. Returns whether a map was stored under the key.
    ///
    /// # Arguments
    /// * `spectrum_key` - Spectrum match key
    ///
    pub fn remove_assumptions(&self, spectrum_key: &str) -> Result<bool, StoreError> {
        let tables = self.registered_tables(TableKind::Assumptions)?;
        let mut removed = false;
        for table in &tables {
            removed |= self.store.delete_object(table, spectrum_key)?;
        }
        Ok(removed)
    }

    /// Stores the raw, pre-filtering assumption map of a spectrum
    ///
    /// # Arguments
    /// * `spectrum_key` - Spectrum match key
    /// * `assumptions` - Advocate to score to assumptions map
    ///
    pub fn add_raw_assumptions(
        &self,
        spectrum_key: &str,
        assumptions: &AssumptionsMap,
    ) -> Result<(), StoreError> {
        let table = raw_assumptions_table(spectrum_file_from_key(spectrum_key)?);
        self.check_table(&table, TableKind::RawAssumptions)?;
        self.store
            .insert_object(&table, spectrum_key, assumptions, true)
    }

    /// Overwrites the stored raw assumption map of a spectrum
    ///
    /// # Arguments
    /// * `spectrum_key` - Spectrum match key
    /// * `assumptions` - New advocate to score to assumptions map
    ///
    pub fn update_raw_assumptions(
        &self,
        spectrum_key: &str,
        assumptions: &AssumptionsMap,
    ) -> Result<(), StoreError> {
        let table = raw_assumptions_table(spectrum_file_from_key(spectrum_key)?);
        self.store.update_object(&table, spectrum_key, assumptions)
    }

    /// Fetches the raw assumption map of a spectrum
    ///
    /// # Arguments
    /// * `spectrum_key` - Spectrum match key
    /// * `use_db` - Whether to fall through to the engine on a cache miss
    ///
    pub fn get_raw_assumptions(
        &self,
        spectrum_key: &str,
        use_db: bool,
    ) -> Result<Option<AssumptionsMap>, StoreError> {
        let table = raw_assumptions_table(spectrum_file_from_key(spectrum_key)?);
        self.store.retrieve_object(&table, spectrum_key, use_db)
    }

    /// Removes the raw assumption map of a spectrum, sweeping every known
    /// raw assumptions table. Returns whether a map was stored under the
    /// key.
    ///
    /// # Arguments
    /// * `spectrum_key` - Spectrum match key
    ///
    pub fn remove_raw_assumptions(&self, spectrum_key: &str) -> Result<bool, StoreError> {
        let tables = self.registered_tables(TableKind::RawAssumptions)?;
        let mut removed = false;
        for table in &tables {
            removed |= self.store.delete_object(table, spectrum_key)?;
        }
        Ok(removed)
    }

    // match parameters

    /// Stores a parameter of a spectrum match, in the table of the
    /// parameter kind and MS run file
    ///
    /// # Arguments
    /// * `spectrum_key` - Spectrum match key
    /// * `parameter` - Parameter value
    ///
    pub fn add_spectrum_match_parameter<P: MatchParameter>(
        &self,
        spectrum_key: &str,
        parameter: &P,
    ) -> Result<(), StoreError> {
        let table = psm_parameters_table(P::KIND.key(), spectrum_file_from_key(spectrum_key)?);
        self.check_table(&table, TableKind::PsmParameters)?;
        self.store
            .insert_object(&table, spectrum_key, parameter, true)
    }

    /// Overwrites a stored parameter of a spectrum match
    ///
    /// # Arguments
    /// * `spectrum_key` - Spectrum match key
    /// * `parameter` - New parameter value
    ///
    pub fn update_spectrum_match_parameter<P: MatchParameter>(
        &self,
        spectrum_key: &str,
        parameter: &P,
    ) -> Result<(), StoreError> {
        let table = psm_parameters_table(P::KIND.key(), spectrum_file_from_key(spectrum_key)?);
        self.store.update_object(&table, spectrum_key, parameter)
    }

    /// Fetches a parameter of a spectrum match
    ///
    /// # Arguments
    /// * `spectrum_key` - Spectrum match key
    /// * `use_db` - Whether to fall through to the engine on a cache miss
    ///
    pub fn get_spectrum_match_parameter<P: MatchParameter>(
        &self,
        spectrum_key: &str,
        use_db: bool,
    ) -> Result<Option<P>, StoreError> {
        let table = psm_parameters_table(P::KIND.key(), spectrum_file_from_key(spectrum_key)?);
        self.store.retrieve_object(&table, spectrum_key, use_db)
    }

    /// Removes a parameter of a spectrum match. Returns whether a value
    /// was stored under the key.
    ///
    /// # Arguments
    /// * `spectrum_key` - Spectrum match key
    ///
    pub fn remove_spectrum_match_parameter<P: MatchParameter>(
        &self,
        spectrum_key: &str,
    ) -> Result<bool, StoreError> {
        let table = psm_parameters_table(P::KIND.key(), spectrum_file_from_key(spectrum_key)?);
        if !self.registered(TableKind::PsmParameters, &table)? {
            return Ok(false);
        }
        self.store.delete_object(&table, spectrum_key)
    }

    /// Stores a parameter of a peptide match, in the table of the
    /// parameter kind
    ///
    /// # Arguments
    /// * `peptide_key` - Peptide match key
    /// * `parameter` - Parameter value
    ///
    pub fn add_peptide_match_parameter<P: MatchParameter>(
        &self,
        peptide_key: &str,
        parameter: &P,
    ) -> Result<(), StoreError> {
        let table = peptide_parameters_table(P::KIND.key());
        self.check_table(&table, TableKind::PeptideParameters)?;
        self.store.insert_object(&table, peptide_key, parameter, true)
    }

    /// Overwrites a stored parameter of a peptide match
    ///
    /// # Arguments
    /// * `peptide_key` - Peptide match key
    /// * `parameter` - New parameter value
    ///
    pub fn update_peptide_match_parameter<P: MatchParameter>(
        &self,
        peptide_key: &str,
        parameter: &P,
    ) -> Result<(), StoreError> {
        let table = peptide_parameters_table(P::KIND.key());
        self.store.update_object(&table, peptide_key, parameter)
    }

    /// Fetches a parameter of a peptide match
    ///
    /// # Arguments
    /// * `peptide_key` - Peptide match key
    /// * `use_db` - Whether to fall through to the engine on a cache miss
    ///
    pub fn get_peptide_match_parameter<P: MatchParameter>(
        &self,
        peptide_key: &str,
        use_db: bool,
    ) -> Result<Option<P>, StoreError> {
        let table = peptide_parameters_table(P::KIND.key());
        self.store.retrieve_object(&table, peptide_key, use_db)
    }

    /// Removes a parameter of a peptide match. Returns whether a value
    /// was stored under the key.
    ///
    /// # Arguments
    /// * `peptide_key` - Peptide match key
    ///
    pub fn remove_peptide_match_parameter<P: MatchParameter>(
        &self,
        peptide_key: &str,
    ) -> Result<bool, StoreError> {
        let table = peptide_parameters_table(P::KIND.key());
        if !self.registered(TableKind::PeptideParameters, &table)? {
            return Ok(false);
        }
        self.store.delete_object(&table, peptide_key)
    }

    /// Stores a parameter of a protein match, in the table of the
    /// parameter kind
    ///
    /// # Arguments
    /// * `protein_key` - Protein match key
    /// * `parameter` - Parameter value
    ///
    pub fn add_protein_match_parameter<P: MatchParameter>(
        &self,
        protein_key: &str,
        parameter: &P,
    ) -> Result<(), StoreError> {
        let table = protein_parameters_table(P::KIND.key());
        self.check_table(&table, TableKind::ProteinParameters)?;
        self.store.insert_object(&table, protein_key, parameter, true)
    }

    /// Overwrites a stored parameter of a protein match
    ///
    /// # Arguments
    /// * `protein_key` - Protein match key
    /// * `parameter` - New parameter value
    ///
    pub fn update_protein_match_parameter<P: MatchParameter>(
        &self,
        protein_key: &str,
        parameter: &P,
    ) -> Result<(), StoreError> {
        let table = protein_parameters_table(P::KIND.key());
        self.store.update_object(&table, protein_key, parameter)
    }

    /// Fetches a parameter of a protein match
    ///
    /// # Arguments
    /// * `protein_key` - Protein match key
    /// * `use_db` - Whether to fall through to the engine on a cache miss
    ///
    pub fn get_protein_match_parameter<P: MatchParameter>(
        &self,
        protein_key: &str,
        use_db: bool,
    ) -> Result<Option<P>, StoreError> {
        let table = protein_parameters_table(P::KIND.key());
        self.store.retrieve_object(&table, protein_key, use_db)
    }

    /// Removes a parameter of a protein match. Returns whether a value
    /// was stored under the key.
    ///
    /// # Arguments
    /// * `protein_key` - Protein match key
    ///
    pub fn remove_protein_match_parameter<P: MatchParameter>(
        &self,
        protein_key: &str,
    ) -> Result<bool, StoreError> {
        let table = protein_parameters_table(P::KIND.key());
        if !self.registered(TableKind::ProteinParameters, &table)? {
            return Ok(false);
        }
        self.store.delete_object(&table, protein_key)
    }

    // bulk loads

    /// Warms the cache with spectrum matches
    ///
    /// # Arguments
    /// * `keys` - Spectrum match keys to load
    /// * `progress` - Sink for progress reporting and cancellation
    ///
    pub fn load_spectrum_matches(
        &self,
        keys: &[String],
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        self.load_spectrum_keyed(keys, psm_table, progress)
    }

    /// Warms the cache with every spectrum match of an MS run file
    ///
    /// # Arguments
    /// * `spectrum_file` - Name of the MS run file
    /// * `progress` - Sink for progress reporting and cancellation
    ///
    pub fn load_spectrum_matches_for_file(
        &self,
        spectrum_file: &str,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        self.load_whole_table(&psm_table(spectrum_file), progress)
    }

    /// Warms the cache with assumption maps
    ///
    /// # Arguments
    /// * `keys` - Spectrum match keys to load the maps of
    /// * `progress` - Sink for progress reporting and cancellation
    ///
    pub fn load_assumptions(
        &self,
        keys: &[String],
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        self.load_spectrum_keyed(keys, assumptions_table, progress)
    }

    /// Warms the cache with every assumption map of an MS run file
    ///
    /// # Arguments
    /// * `spectrum_file` - Name of the MS run file
    /// * `progress` - Sink for progress reporting and cancellation
    ///
    pub fn load_assumptions_for_file(
        &self,
        spectrum_file: &str,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        self.load_whole_table(&assumptions_table(spectrum_file), progress)
    }

    /// Warms the cache with raw assumption maps
    ///
    /// # Arguments
    /// * `keys` - Spectrum match keys to load the maps of
    /// * `progress` - Sink for progress reporting and cancellation
    ///
    pub fn load_raw_assumptions(
        &self,
        keys: &[String],
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        self.load_spectrum_keyed(keys, raw_assumptions_table, progress)
    }

    /// Warms the cache with every raw assumption map of an MS run file
    ///
    /// # Arguments
    /// * `spectrum_file` - Name of the MS run file
    /// * `progress` - Sink for progress reporting and cancellation
    ///
    pub fn load_raw_assumptions_for_file(
        &self,
        spectrum_file: &str,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        self.load_whole_table(&raw_assumptions_table(spectrum_file), progress)
    }

    /// Warms the cache with spectrum match parameters of one kind
    ///
    /// # Arguments
    /// * `keys` - Spectrum match keys to load the parameters of
    /// * `progress` - Sink for progress reporting and cancellation
    ///
    pub fn load_spectrum_match_parameters<P: MatchParameter>(
        &self,
        keys: &[String],
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        self.load_spectrum_keyed(
            keys,
            |spectrum_file| psm_parameters_table(P::KIND.key(), spectrum_file),
            progress,
        )
    }

    /// Warms the cache with every parameter of one kind of an MS run file
    ///
    /// # Arguments
    /// * `spectrum_file` - Name of the MS run file
    /// * `progress` - Sink for progress reporting and cancellation
    ///
    pub fn load_spectrum_match_parameters_for_file<P: MatchParameter>(
        &self,
        spectrum_file: &str,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        self.load_whole_table(&psm_parameters_table(P::KIND.key(), spectrum_file), progress)
    }

    /// Warms the cache with peptide matches, the whole table when `keys`
    /// is `None`
    ///
    /// # Arguments
    /// * `keys` - Peptide match keys to load, `None` for all
    /// * `progress` - Sink for progress reporting and cancellation
    ///
    pub fn load_peptide_matches(
        &self,
        keys: Option<&[String]>,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        self.load_static_table(PEPTIDE_TABLE, keys, progress)
    }

    /// Warms the cache with protein matches, the whole table when `keys`
    /// is `None`
    ///
    /// # Arguments
    /// * `keys` - Protein match keys to load, `None` for all
    /// * `progress` - Sink for progress reporting and cancellation
    ///
    pub fn load_protein_matches(
        &self,
        keys: Option<&[String]>,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        self.load_static_table(PROTEIN_TABLE, keys, progress)
    }

    /// Warms the cache with peptide match parameters of one kind
    ///
    /// # Arguments
    /// * `keys` - Peptide match keys to load the parameters of, `None` for all
    /// * `progress` - Sink for progress reporting and cancellation
    ///
    pub fn load_peptide_match_parameters<P: MatchParameter>(
        &self,
        keys: Option<&[String]>,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        self.load_static_table(&peptide_parameters_table(P::KIND.key()), keys, progress)
    }

    /// Warms the cache with protein match parameters of one kind
    ///
    /// # Arguments
    /// * `keys` - Protein match keys to load the parameters of, `None` for all
    /// * `progress` - Sink for progress reporting and cancellation
    ///
    pub fn load_protein_match_parameters<P: MatchParameter>(
        &self,
        keys: Option<&[String]>,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        self.load_static_table(&protein_parameters_table(P::KIND.key()), keys, progress)
    }

    /// Loads spectrum keyed objects by partitioning the keys into their
    /// per file tables, then one store load per table. Tables missing
    /// from the store are skipped, reopened projects may be asked for
    /// files which were never searched. Cancellation is polled during
    /// partitioning and before each table, a canceled load returns the
    /// partial count without error.
    ///
    fn load_spectrum_keyed(
        &self,
        keys: &[String],
        table_of: impl Fn(&str) -> String,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        if let Some(progress) = progress {
            // one tick per key for partitioning, one per key for loading
            progress.set_total(2 * keys.len() as u64);
        }
        let mut partitions: HashMap<String, Vec<String>> = HashMap::new();
        for key in keys {
            if let Some(progress) = progress {
                if progress.is_canceled() {
                    return Ok(0);
                }
            }
            let table = table_of(spectrum_file_from_key(key)?);
            partitions.entry(table).or_default().push(key.clone());
            if let Some(progress) = progress {
                progress.increment();
            }
        }
        let mut loaded = 0;
        for (table, table_keys) in partitions {
            if let Some(progress) = progress {
                if progress.is_canceled() {
                    return Ok(loaded);
                }
            }
            if !self.store.has_table(&table)? {
                if let Some(progress) = progress {
                    progress.increase(table_keys.len() as u64);
                }
                continue;
            }
            loaded += self
                .store
                .load_objects(&table, Some(&table_keys), progress)?;
        }
        Ok(loaded)
    }

    fn load_whole_table(
        &self,
        table: &str,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        if let Some(progress) = progress {
            if progress.is_canceled() {
                return Ok(0);
            }
        }
        if !self.store.has_table(table)? {
            return Ok(0);
        }
        self.store.load_objects(table, None, progress)
    }

    fn load_static_table(
        &self,
        table: &str,
        keys: Option<&[String]>,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        if let Some(progress) = progress {
            if let Some(keys) = keys {
                progress.set_total(keys.len() as u64);
            }
            if progress.is_canceled() {
                return Ok(0);
            }
        }
        if !self.store.has_table(table)? {
            return Ok(0);
        }
        self.store.load_objects(table, keys, progress)
    }
}
