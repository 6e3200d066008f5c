//! # In-Memory State Repository
//!
//! [`StateRepository`] over plain maps. Used by tests and by embedders that
//! replay transitions without persistent storage. Locks only make the
//! adapter `Sync`; callers still serialize overlapping applies.

use crate::domain::{DataContract, Document, FetchedTransaction, Identity, InstantLock, OutPoint};
use crate::ports::outbound::{DocumentQuery, RepositoryError, StateRepository};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Hash, Identifier, PublicKeyHash};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use tracing::debug;

type DocumentKey = (Identifier, String);

/// Map-backed repository.
pub struct InMemoryStateRepository {
    contracts: RwLock<HashMap<Identifier, DataContract>>,
    documents: RwLock<HashMap<DocumentKey, BTreeMap<Identifier, Document>>>,
    identities: RwLock<HashMap<Identifier, Identity>>,
    key_hashes: RwLock<HashMap<PublicKeyHash, Identifier>>,
    transactions: RwLock<HashMap<Hash, FetchedTransaction>>,
    used_out_points: RwLock<HashSet<OutPoint>>,
    block_time_ms: AtomicU64,
    block_height: AtomicU64,
    core_chain_locked_height: AtomicU32,
    instant_locks_valid: AtomicBool,
    transaction_fetches: AtomicUsize,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self {
            contracts: RwLock::new(HashMap::new()),
            documents: RwLock::new(HashMap::new()),
            identities: RwLock::new(HashMap::new()),
            key_hashes: RwLock::new(HashMap::new()),
            transactions: RwLock::new(HashMap::new()),
            used_out_points: RwLock::new(HashSet::new()),
            block_time_ms: AtomicU64::new(0),
            block_height: AtomicU64::new(1),
            core_chain_locked_height: AtomicU32::new(1),
            instant_locks_valid: AtomicBool::new(true),
            transaction_fetches: AtomicUsize::new(0),
        }
    }

    /// Repository whose latest block was produced at `block_time_ms`.
    pub fn with_block_time(block_time_ms: u64) -> Self {
        let repository = Self::new();
        repository.set_block_time(block_time_ms);
        repository
    }

    pub fn set_block_time(&self, block_time_ms: u64) {
        self.block_time_ms.store(block_time_ms, Ordering::SeqCst);
    }

    pub fn set_block_height(&self, height: u64) {
        self.block_height.store(height, Ordering::SeqCst);
    }

    pub fn set_core_chain_locked_height(&self, height: u32) {
        self.core_chain_locked_height.store(height, Ordering::SeqCst);
    }

    /// Make instant lock signature checks pass or fail.
    pub fn set_instant_locks_valid(&self, valid: bool) {
        self.instant_locks_valid.store(valid, Ordering::SeqCst);
    }

    /// Register a Layer-1 transaction under its id.
    pub fn add_transaction(&self, txid: Hash, transaction: FetchedTransaction) {
        self.transactions.write().insert(txid, transaction);
    }

    /// Number of `fetch_transaction` calls served.
    pub fn transaction_fetch_count(&self) -> usize {
        self.transaction_fetches.load(Ordering::SeqCst)
    }

    /// Number of stored documents of one (contract, type).
    pub fn document_count(&self, contract_id: &Identifier, document_type: &str) -> usize {
        self.documents
            .read()
            .get(&(*contract_id, document_type.to_string()))
            .map_or(0, BTreeMap::len)
    }
}

impl Default for InMemoryStateRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateRepository for InMemoryStateRepository {
    async fn fetch_data_contract(
        &self,
        id: &Identifier,
    ) -> Result<Option<DataContract>, RepositoryError> {
        Ok(self.contracts.read().get(id).cloned())
    }

    async fn store_data_contract(&self, contract: DataContract) -> Result<(), RepositoryError> {
        debug!(contract_id = %contract.id, "Storing data contract");
        self.contracts.write().insert(contract.id, contract);
        Ok(())
    }

    async fn fetch_documents(
        &self,
        contract_id: &Identifier,
        document_type: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, RepositoryError> {
        let documents = self.documents.read();
        Ok(documents
            .get(&(*contract_id, document_type.to_string()))
            .map(|by_id| {
                by_id
                    .values()
                    .filter(|document| query.matches(document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn store_document(&self, document: Document) -> Result<(), RepositoryError> {
        debug!(document_id = %document.id, revision = document.revision, "Storing document");
        self.documents
            .write()
            .entry((document.data_contract_id, document.document_type.clone()))
            .or_default()
            .insert(document.id, document);
        Ok(())
    }

    async fn remove_document(
        &self,
        contract_id: &Identifier,
        document_type: &str,
        id: &Identifier,
    ) -> Result<(), RepositoryError> {
        debug!(document_id = %id, "Removing document");
        if let Some(by_id) = self
            .documents
            .write()
            .get_mut(&(*contract_id, document_type.to_string()))
        {
            by_id.remove(id);
        }
        Ok(())
    }

    async fn fetch_identity(&self, id: &Identifier) -> Result<Option<Identity>, RepositoryError> {
        Ok(self.identities.read().get(id).cloned())
    }

    async fn store_identity(&self, identity: Identity) -> Result<(), RepositoryError> {
        debug!(identity_id = %identity.id, balance = identity.balance, "Storing identity");
        self.identities.write().insert(identity.id, identity);
        Ok(())
    }

    async fn fetch_identity_ids_by_public_key_hashes(
        &self,
        hashes: &[PublicKeyHash],
    ) -> Result<HashMap<PublicKeyHash, Identifier>, RepositoryError> {
        let key_hashes = self.key_hashes.read();
        Ok(hashes
            .iter()
            .filter_map(|hash| key_hashes.get(hash).map(|id| (*hash, *id)))
            .collect())
    }

    async fn store_identity_public_key_hashes(
        &self,
        identity_id: &Identifier,
        hashes: &[PublicKeyHash],
    ) -> Result<(), RepositoryError> {
        let mut key_hashes = self.key_hashes.write();
        for hash in hashes {
            key_hashes.insert(*hash, *identity_id);
        }
        Ok(())
    }

    async fn fetch_transaction(
        &self,
        txid: &Hash,
    ) -> Result<Option<FetchedTransaction>, RepositoryError> {
        self.transaction_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.transactions.read().get(txid).cloned())
    }

    async fn verify_instant_lock(&self, _lock: &InstantLock) -> Result<bool, RepositoryError> {
        Ok(self.instant_locks_valid.load(Ordering::SeqCst))
    }

    async fn is_asset_lock_transaction_out_point_already_used(
        &self,
        out_point: &OutPoint,
    ) -> Result<bool, RepositoryError> {
        Ok(self.used_out_points.read().contains(out_point))
    }

    async fn mark_asset_lock_transaction_out_point_as_used(
        &self,
        out_point: &OutPoint,
    ) -> Result<(), RepositoryError> {
        self.used_out_points.write().insert(*out_point);
        Ok(())
    }

    async fn fetch_latest_platform_block_time(&self) -> Result<u64, RepositoryError> {
        Ok(self.block_time_ms.load(Ordering::SeqCst))
    }

    async fn fetch_latest_platform_block_height(&self) -> Result<u64, RepositoryError> {
        Ok(self.block_height.load(Ordering::SeqCst))
    }

    async fn fetch_latest_platform_core_chain_locked_height(
        &self,
    ) -> Result<u32, RepositoryError> {
        Ok(self.core_chain_locked_height.load(Ordering::SeqCst))
    }
}
