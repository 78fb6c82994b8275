// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Lazy catalog
//!
//! An injectable handle over an arena of catalog nodes. Querying a level that
//! was never fetched does not block: the node moves from `Stub` to `Loading`
//! once, a load task is spawned on the current tokio runtime, and the caller
//! gets the current (possibly empty) children plus a [`LoadHandle`] it can
//! await. When no runtime is current the load is queued until [`LazyCatalog::drain`].
//!
//! A finished load swaps the node's whole children slice under a short write
//! lock, so readers see either the old or the new list.
//!
//! ```rust,ignore
//! let catalog = LazyCatalog::new(Arc::new(loader));
//! let listing = catalog.databases(LoadPolicy::LOAD);
//! if let Some(pending) = listing.pending {
//!     pending.wait().await;
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use sqlctx_ir::ObjectKind;
use tokio::sync::watch;
use tracing::{debug, instrument, trace, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::node::{LoadState, Node, NodeDetail, NodeId, NodeInfo, NodeKind, NodePath};
use crate::r#trait::{CatalogLoader, EngineFeatures};

/// Consumer notified after each finished load
///
/// The catalog holds listeners weakly: once the consumer is dropped the
/// notification is skipped.
pub trait CatalogListener: Send + Sync {
    fn on_catalog_loaded(&self, node: NodeId);
}

/// Whether a query may schedule a load of an unloaded level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadPolicy {
    pub skip_load: bool,
}

impl LoadPolicy {
    pub const LOAD: LoadPolicy = LoadPolicy { skip_load: false };
    pub const SKIP: LoadPolicy = LoadPolicy { skip_load: true };
}

/// Future side of a scheduled load
#[derive(Debug, Clone)]
pub struct LoadHandle {
    node: NodeId,
    done: watch::Receiver<bool>,
}

impl LoadHandle {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_finished(&self) -> bool {
        *self.done.borrow()
    }

    /// Wait until the load has been published
    pub async fn wait(mut self) {
        // a dropped sender means the task is gone; nothing left to wait for
        let _ = self.done.wait_for(|finished| *finished).await;
    }
}

/// Outcome of asking for a node to be loaded
#[derive(Debug, Clone)]
pub enum LoadStatus {
    /// No load needed; carries the settled state
    Ready(LoadState),
    Pending(LoadHandle),
}

/// Children of a node as currently published
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub nodes: Vec<NodeInfo>,
    /// Set while the level is loading
    pub pending: Option<LoadHandle>,
}

impl Listing {
    pub fn find(&self, name: &str) -> Option<&NodeInfo> {
        self.nodes.iter().find(|n| n.is_named(name))
    }

    fn lookup(self, name: &str) -> Lookup {
        let node = self.find(name).cloned();
        Lookup {
            node,
            pending: self.pending,
        }
    }
}

/// Result of looking up one child by name
#[derive(Debug, Clone, Default)]
pub struct Lookup {
    pub node: Option<NodeInfo>,
    pub pending: Option<LoadHandle>,
}

/// Options fixed when a catalog is built
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    pub connected_database: Option<String>,
    /// Upper bound for a single loader call
    pub load_timeout: Option<Duration>,
}

impl CatalogOptions {
    pub fn with_connected_database(mut self, database: impl Into<String>) -> Self {
        self.connected_database = Some(database.into());
        self
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = Some(timeout);
        self
    }
}

struct ChildSpec {
    name: String,
    kind: NodeKind,
    detail: NodeDetail,
}

impl ChildSpec {
    fn named(name: String, kind: NodeKind) -> Self {
        Self {
            name,
            kind,
            detail: NodeDetail::None,
        }
    }
}

struct Shared {
    loader: Arc<dyn CatalogLoader>,
    features: EngineFeatures,
    load_timeout: Option<Duration>,
    arena: RwLock<Vec<Node>>,
    inflight: Mutex<HashMap<NodeId, watch::Receiver<bool>>>,
    queued: Mutex<Vec<(NodeId, watch::Sender<bool>)>>,
    listeners: Mutex<Vec<Weak<dyn CatalogListener>>>,
    connected_database: RwLock<Option<String>>,
}

/// Process-wide catalog handle; clones share the same arena
#[derive(Clone)]
pub struct LazyCatalog {
    shared: Arc<Shared>,
}

impl fmt::Debug for LazyCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCatalog")
            .field("features", &self.shared.features)
            .field("nodes", &self.shared.arena.read().len())
            .field("pending", &self.pending_loads())
            .finish()
    }
}

impl LazyCatalog {
    /// Create a catalog holding only the server root
    pub fn new(loader: Arc<dyn CatalogLoader>) -> Self {
        Self::with_options(loader, CatalogOptions::default())
    }

    pub fn with_options(loader: Arc<dyn CatalogLoader>, options: CatalogOptions) -> Self {
        let features = loader.features();
        let root = Node::new(String::new(), NodeKind::Server, None, NodeDetail::None);
        Self {
            shared: Arc::new(Shared {
                loader,
                features,
                load_timeout: options.load_timeout,
                arena: RwLock::new(vec![root]),
                inflight: Mutex::new(HashMap::new()),
                queued: Mutex::new(Vec::new()),
                listeners: Mutex::new(Vec::new()),
                connected_database: RwLock::new(options.connected_database),
            }),
        }
    }

    pub fn features(&self) -> &EngineFeatures {
        &self.shared.features
    }

    pub fn default_schema(&self) -> Option<&str> {
        self.shared.features.default_schema.as_deref()
    }

    pub fn connected_database(&self) -> Option<String> {
        self.shared.connected_database.read().clone()
    }

    pub fn set_connected_database(&self, database: Option<String>) {
        *self.shared.connected_database.write() = database;
    }

    /// Register a listener; the catalog keeps only a weak reference
    pub fn add_listener<L: CatalogListener + 'static>(&self, listener: &Arc<L>) {
        let weak = Arc::downgrade(listener);
        let weak: Weak<dyn CatalogListener> = weak;
        self.shared.listeners.lock().push(weak);
    }

    pub fn node(&self, id: NodeId) -> Option<NodeInfo> {
        self.shared.arena.read().get(id.index()).map(|n| n.info(id))
    }

    pub fn state(&self, id: NodeId) -> Option<LoadState> {
        self.shared.arena.read().get(id.index()).map(|n| n.state)
    }

    /// Database, schema and object names above `id`, including its own
    pub fn path(&self, id: NodeId) -> NodePath {
        self.shared.path(id).map(|(_, path)| path).unwrap_or_default()
    }

    /// Number of loads scheduled or running
    pub fn pending_loads(&self) -> usize {
        self.shared.inflight.lock().len()
    }

    /// Schedule a load of `id` unless it is loading or settled
    ///
    /// Idempotent: while a load is in flight every caller gets a handle to the
    /// same load.
    pub fn load(&self, id: NodeId) -> CatalogResult<LoadStatus> {
        let mut arena = self.shared.arena.write();
        let node = arena.get_mut(id.index()).ok_or(CatalogError::UnknownNode(id.0))?;
        match node.state {
            LoadState::Stub => {
                node.state = LoadState::Loading;
                let handle = self.shared.begin(id);
                drop(arena);
                Ok(LoadStatus::Pending(self.schedule(handle)))
            }
            LoadState::Loading => Ok(self
                .shared
                .in_flight(id)
                .map_or(LoadStatus::Ready(LoadState::Loading), LoadStatus::Pending)),
            settled => Ok(LoadStatus::Ready(settled)),
        }
    }

    /// Fetch a node's children again
    ///
    /// Old children stay visible until the new list is published. Children
    /// that keep their name keep their id and load state. Children the new
    /// list drops are retired: their subtrees are released and their ids stay
    /// reserved, so a stale id never names a different node. Retired nodes
    /// cannot be refreshed.
    pub fn refresh(&self, id: NodeId) -> CatalogResult<LoadHandle> {
        let mut arena = self.shared.arena.write();
        let node = arena
            .get_mut(id.index())
            .filter(|node| !node.retired)
            .ok_or(CatalogError::UnknownNode(id.0))?;
        if node.kind.is_leaf() {
            let (_, done) = watch::channel(true);
            return Ok(LoadHandle { node: id, done });
        }
        if node.state == LoadState::Loading {
            if let Some(handle) = self.shared.in_flight(id) {
                return Ok(handle);
            }
        }
        node.state = LoadState::Loading;
        debug!(node = id.0, name = %node.name, "refreshing catalog node");
        let handle = self.shared.begin(id);
        drop(arena);
        Ok(self.schedule(handle))
    }

    /// Run loads queued while no runtime was current; returns how many ran
    pub async fn drain(&self) -> usize {
        let queued = std::mem::take(&mut *self.shared.queued.lock());
        let count = queued.len();
        for (id, done) in queued {
            run_load(self.shared.clone(), id, done).await;
        }
        count
    }

    /// Wait until no load is queued or in flight
    pub async fn settle(&self) {
        loop {
            self.drain().await;
            let handles: Vec<LoadHandle> = {
                let inflight = self.shared.inflight.lock();
                inflight
                    .iter()
                    .map(|(node, done)| LoadHandle {
                        node: *node,
                        done: done.clone(),
                    })
                    .collect()
            };
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                handle.wait().await;
            }
        }
    }

    /// Children of `id`; an unloaded level is scheduled unless the policy skips it
    pub fn children(&self, id: NodeId, policy: LoadPolicy) -> Listing {
        let (state, children) = {
            let arena = self.shared.arena.read();
            match arena.get(id.index()) {
                Some(node) => (node.state, node.children.clone()),
                None => return Listing::default(),
            }
        };

        let pending = match state {
            LoadState::Stub if !policy.skip_load => match self.load(id) {
                Ok(LoadStatus::Pending(handle)) => Some(handle),
                _ => None,
            },
            LoadState::Loading => self.shared.in_flight(id),
            _ => None,
        };

        let arena = self.shared.arena.read();
        let nodes = children
            .iter()
            .filter_map(|child| arena.get(child.index()).map(|n| n.info(*child)))
            .collect();
        Listing { nodes, pending }
    }

    pub fn child(&self, id: NodeId, name: &str, policy: LoadPolicy) -> Lookup {
        self.children(id, policy).lookup(name)
    }

    pub fn databases(&self, policy: LoadPolicy) -> Listing {
        self.children(NodeId::ROOT, policy)
    }

    pub fn database(&self, name: &str, policy: LoadPolicy) -> Lookup {
        self.child(NodeId::ROOT, name, policy)
    }

    /// Node of the connected database, if one is set and known
    pub fn connected_database_node(&self, policy: LoadPolicy) -> Lookup {
        match self.connected_database() {
            Some(name) => self.database(&name, policy),
            None => Lookup::default(),
        }
    }

    /// Schemas of a database; empty for engines without a schema level
    pub fn schemas(&self, database: NodeId, policy: LoadPolicy) -> Listing {
        if !self.shared.features.schemas {
            return Listing::default();
        }
        self.children(database, policy)
    }

    pub fn schema(&self, database: NodeId, name: &str, policy: LoadPolicy) -> Lookup {
        self.schemas(database, policy).lookup(name)
    }

    /// Node holding a database's unqualified objects
    ///
    /// The default schema for schema-aware engines, the database otherwise.
    pub fn default_container(&self, database: NodeId, policy: LoadPolicy) -> Lookup {
        if !self.shared.features.schemas {
            return Lookup {
                node: self.node(database),
                pending: None,
            };
        }
        match self.default_schema() {
            Some(schema) => self.schema(database, schema, policy),
            None => Lookup::default(),
        }
    }

    /// Objects of a schema (or a schema-less database), optionally of one kind
    pub fn objects(&self, container: NodeId, kind: Option<ObjectKind>, policy: LoadPolicy) -> Listing {
        let mut listing = self.children(container, policy);
        listing.nodes.retain(|n| match (n.object_kind(), kind) {
            (Some(found), Some(wanted)) => found == wanted,
            (Some(_), None) => true,
            (None, _) => false,
        });
        listing
    }

    pub fn tables(&self, container: NodeId, policy: LoadPolicy) -> Listing {
        self.objects(container, Some(ObjectKind::Table), policy)
    }

    pub fn views(&self, container: NodeId, policy: LoadPolicy) -> Listing {
        self.objects(container, Some(ObjectKind::View), policy)
    }

    pub fn procedures(&self, container: NodeId, policy: LoadPolicy) -> Listing {
        self.objects(container, Some(ObjectKind::Procedure), policy)
    }

    pub fn functions(&self, container: NodeId, policy: LoadPolicy) -> Listing {
        self.objects(container, Some(ObjectKind::Function), policy)
    }

    pub fn synonyms(&self, container: NodeId, policy: LoadPolicy) -> Listing {
        self.objects(container, Some(ObjectKind::Synonym), policy)
    }

    pub fn object(&self, container: NodeId, name: &str, policy: LoadPolicy) -> Lookup {
        self.objects(container, None, policy).lookup(name)
    }

    /// Columns of a table, view or synonym
    pub fn columns(&self, object: NodeId, policy: LoadPolicy) -> Listing {
        let mut listing = self.children(object, policy);
        listing.nodes.retain(|n| n.kind == NodeKind::Column);
        listing
    }

    /// Parameters of a procedure or function, in ordinal order
    pub fn parameters(&self, routine: NodeId, policy: LoadPolicy) -> Listing {
        let mut listing = self.children(routine, policy);
        listing.nodes.retain(|n| n.kind == NodeKind::Parameter);
        listing
            .nodes
            .sort_by_key(|n| n.parameter().map_or(u32::MAX, |p| p.ordinal));
        listing
    }

    /// Containers of a database whose objects are already loaded
    ///
    /// Never schedules a load.
    pub fn loaded_containers(&self, database: NodeId) -> Vec<NodeInfo> {
        if !self.shared.features.schemas {
            return self
                .node(database)
                .filter(|n| n.state == LoadState::Loaded)
                .into_iter()
                .collect();
        }
        self.schemas(database, LoadPolicy::SKIP)
            .nodes
            .into_iter()
            .filter(|n| n.state == LoadState::Loaded)
            .collect()
    }

    fn schedule(&self, handle: (LoadHandle, watch::Sender<bool>)) -> LoadHandle {
        let (handle, done) = handle;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(run_load(self.shared.clone(), handle.node, done));
            }
            Err(_) => {
                trace!(node = handle.node.0, "no runtime, queueing catalog load");
                self.shared.queued.lock().push((handle.node, done));
            }
        }
        handle
    }
}

impl Shared {
    /// Register an in-flight load; the caller holds the arena write lock
    fn begin(&self, id: NodeId) -> (LoadHandle, watch::Sender<bool>) {
        let (done, receiver) = watch::channel(false);
        self.inflight.lock().insert(id, receiver.clone());
        (
            LoadHandle {
                node: id,
                done: receiver,
            },
            done,
        )
    }

    fn in_flight(&self, id: NodeId) -> Option<LoadHandle> {
        self.inflight.lock().get(&id).map(|done| LoadHandle {
            node: id,
            done: done.clone(),
        })
    }

    fn path(&self, id: NodeId) -> Option<(NodeKind, NodePath)> {
        let arena = self.arena.read();
        let kind = arena.get(id.index())?.kind;
        let mut path = NodePath::default();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = arena.get(current.index())?;
            match node.kind {
                NodeKind::Database => path.database = Some(node.name.clone()),
                NodeKind::Schema => path.schema = Some(node.name.clone()),
                NodeKind::Object(_) => path.object = Some(node.name.clone()),
                _ => {}
            }
            cursor = node.parent;
        }
        Some((kind, path))
    }

    fn publish(&self, id: NodeId, result: CatalogResult<Vec<ChildSpec>>) -> LoadState {
        let mut arena = self.arena.write();
        if arena.get(id.index()).is_none_or(|node| node.retired) {
            // the node was dropped by a refresh of its parent while loading
            self.inflight.lock().remove(&id);
            return LoadState::Failed;
        }

        let state = match result {
            Ok(loaded) => {
                let existing: HashMap<(String, NodeKind), NodeId> = arena[id.index()]
                    .children
                    .iter()
                    .map(|child| {
                        let node = &arena[child.index()];
                        ((node.name.to_lowercase(), node.kind), *child)
                    })
                    .collect();

                let mut children = Vec::with_capacity(loaded.len());
                for entry in loaded {
                    match existing.get(&(entry.name.to_lowercase(), entry.kind)) {
                        Some(child) => {
                            arena[child.index()].detail = entry.detail;
                            children.push(*child);
                        }
                        None => {
                            let child = NodeId(arena.len() as u32);
                            arena.push(Node::new(entry.name, entry.kind, Some(id), entry.detail));
                            children.push(child);
                        }
                    }
                }
                let kept: HashSet<NodeId> = children.iter().copied().collect();
                let dropped: Vec<NodeId> = existing.into_values().filter(|c| !kept.contains(c)).collect();
                let retired = retire(&mut arena, dropped);
                debug!(children = children.len(), retired, "catalog level loaded");
                arena[id.index()].children = Arc::from(children);
                LoadState::Loaded
            }
            Err(err) => {
                warn!(error = %err, "catalog load failed");
                LoadState::Failed
            }
        };

        arena[id.index()].state = state;
        self.inflight.lock().remove(&id);
        state
    }

    fn notify(&self, id: NodeId) {
        let listeners: Vec<Arc<dyn CatalogListener>> = {
            let mut registered = self.listeners.lock();
            registered.retain(|listener| listener.strong_count() > 0);
            registered.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in listeners {
            listener.on_catalog_loaded(id);
        }
    }
}

/// Retire `roots` and everything below them; returns how many nodes retired
fn retire(arena: &mut [Node], roots: Vec<NodeId>) -> usize {
    let mut stack = roots;
    let mut count = 0;
    while let Some(id) = stack.pop() {
        let Some(node) = arena.get_mut(id.index()) else {
            continue;
        };
        if node.retired {
            continue;
        }
        stack.extend(node.children.iter().copied());
        node.retired = true;
        node.state = LoadState::Failed;
        node.children = Arc::from(Vec::new());
        node.detail = NodeDetail::None;
        count += 1;
    }
    count
}

#[instrument(skip(shared, done), fields(node = id.0))]
async fn run_load(shared: Arc<Shared>, id: NodeId, done: watch::Sender<bool>) {
    let result = match shared.path(id) {
        Some((kind, path)) => {
            let fetch = fetch_children(shared.loader.as_ref(), &shared.features, kind, &path);
            match shared.load_timeout {
                Some(limit) => tokio::time::timeout(limit, fetch)
                    .await
                    .unwrap_or_else(|_| Err(CatalogError::QueryTimeout(limit.as_secs()))),
                None => fetch.await,
            }
        }
        None => Err(CatalogError::UnknownNode(id.0)),
    };

    shared.publish(id, result);
    shared.notify(id);
    // receivers may all be gone
    let _ = done.send(true);
}

async fn fetch_children(
    loader: &dyn CatalogLoader,
    features: &EngineFeatures,
    kind: NodeKind,
    path: &NodePath,
) -> CatalogResult<Vec<ChildSpec>> {
    let database = path.database.as_deref().unwrap_or_default();
    let schema = path.schema.as_deref();
    match kind {
        NodeKind::Server => Ok(loader
            .list_databases()
            .await?
            .into_iter()
            .map(|name| ChildSpec::named(name, NodeKind::Database))
            .collect()),
        NodeKind::Database if features.schemas => Ok(loader
            .list_schemas(database)
            .await?
            .into_iter()
            .map(|name| ChildSpec::named(name, NodeKind::Schema))
            .collect()),
        NodeKind::Database | NodeKind::Schema => Ok(loader
            .list_objects(database, schema)
            .await?
            .into_iter()
            .map(|object| ChildSpec {
                name: object.name.clone(),
                kind: NodeKind::Object(object.kind),
                detail: NodeDetail::Object(object),
            })
            .collect()),
        NodeKind::Object(object) => {
            let name = path.object.as_deref().unwrap_or_default();
            if object.has_parameters() {
                Ok(loader
                    .get_parameters(database, schema, name)
                    .await?
                    .into_iter()
                    .map(|parameter| ChildSpec {
                        name: parameter.name.clone(),
                        kind: NodeKind::Parameter,
                        detail: NodeDetail::Parameter(parameter),
                    })
                    .collect())
            } else {
                Ok(loader
                    .get_columns(database, schema, name)
                    .await?
                    .into_iter()
                    .map(|column| ChildSpec {
                        name: column.name.clone(),
                        kind: NodeKind::Column,
                        detail: NodeDetail::Column(column),
                    })
                    .collect())
            }
        }
        NodeKind::Column | NodeKind::Parameter => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::r#static::StaticLoader;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DOC: &str = r#"
dialect: sqlserver
databases:
  - name: Hr
    schemas:
      - name: dbo
        tables:
          - name: Employees
            columns:
              - { name: EmployeeID, type: int, primary_key: true }
              - { name: FirstName, type: nvarchar(50) }
        procedures:
          - name: usp_GetEmployee
            parameters:
              - { name: "@Active", type: bit, ordinal: 2 }
              - { name: "@EmployeeID", type: int, ordinal: 1 }
  - name: Sales
"#;

    fn catalog() -> LazyCatalog {
        let loader = StaticLoader::from_yaml_str(DOC).unwrap();
        LazyCatalog::with_options(Arc::new(loader), CatalogOptions::default().with_connected_database("Hr"))
    }

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl CatalogListener for Counter {
        fn on_catalog_loaded(&self, _node: NodeId) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_first_query_is_pending() {
        let catalog = catalog();
        let listing = catalog.databases(LoadPolicy::LOAD);
        assert!(listing.nodes.is_empty());
        let pending = listing.pending.expect("load scheduled");
        pending.wait().await;

        let listing = catalog.databases(LoadPolicy::LOAD);
        assert!(listing.pending.is_none());
        let names: Vec<&str> = listing.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Hr", "Sales"]);
        assert_eq!(catalog.state(NodeId::ROOT), Some(LoadState::Loaded));
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let catalog = catalog();
        let first = catalog.load(NodeId::ROOT).unwrap();
        let second = catalog.load(NodeId::ROOT).unwrap();
        assert!(matches!(first, LoadStatus::Pending(_)));
        assert!(matches!(second, LoadStatus::Pending(_)));
        assert_eq!(catalog.pending_loads(), 1);
        catalog.settle().await;
        assert!(matches!(catalog.load(NodeId::ROOT).unwrap(), LoadStatus::Ready(LoadState::Loaded)));
    }

    #[tokio::test]
    async fn test_skip_policy_does_not_schedule() {
        let catalog = catalog();
        let listing = catalog.databases(LoadPolicy::SKIP);
        assert!(listing.pending.is_none());
        assert_eq!(catalog.state(NodeId::ROOT), Some(LoadState::Stub));
    }

    #[tokio::test]
    async fn test_walk_to_columns_and_parameters() {
        let catalog = catalog();
        catalog.databases(LoadPolicy::LOAD);
        catalog.settle().await;
        let hr = catalog.connected_database_node(LoadPolicy::LOAD).node.unwrap();
        catalog.schemas(hr.id, LoadPolicy::LOAD);
        catalog.settle().await;
        let dbo = catalog.default_container(hr.id, LoadPolicy::LOAD).node.unwrap();
        assert_eq!(dbo.name, "dbo");
        catalog.objects(dbo.id, None, LoadPolicy::LOAD);
        catalog.settle().await;

        let employees = catalog.object(dbo.id, "employees", LoadPolicy::LOAD).node.unwrap();
        assert_eq!(employees.object_kind(), Some(ObjectKind::Table));
        catalog.columns(employees.id, LoadPolicy::LOAD);
        catalog.settle().await;
        let columns = catalog.columns(employees.id, LoadPolicy::SKIP);
        assert_eq!(columns.nodes.len(), 2);
        assert!(columns.nodes[0].column().unwrap().is_primary_key);

        let proc_ = &catalog.procedures(dbo.id, LoadPolicy::SKIP).nodes[0];
        catalog.parameters(proc_.id, LoadPolicy::LOAD);
        catalog.settle().await;
        let params: Vec<String> = catalog
            .parameters(proc_.id, LoadPolicy::SKIP)
            .nodes
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(params, vec!["@EmployeeID", "@Active"]);

        let path = catalog.path(employees.id);
        assert_eq!(path.database.as_deref(), Some("Hr"));
        assert_eq!(path.schema.as_deref(), Some("dbo"));
        assert_eq!(catalog.loaded_containers(hr.id).len(), 1);
    }

    #[tokio::test]
    async fn test_database_without_schemas_loads_empty() {
        let catalog = catalog();
        catalog.databases(LoadPolicy::LOAD);
        catalog.settle().await;
        let sales = catalog.database("Sales", LoadPolicy::LOAD).node.unwrap();
        catalog.schemas(sales.id, LoadPolicy::LOAD);
        catalog.settle().await;
        assert_eq!(catalog.state(sales.id), Some(LoadState::Loaded));
        assert!(catalog.schemas(sales.id, LoadPolicy::LOAD).nodes.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_keeps_ids() {
        let catalog = catalog();
        catalog.databases(LoadPolicy::LOAD);
        catalog.settle().await;
        let before = catalog.database("Hr", LoadPolicy::SKIP).node.unwrap();
        catalog.refresh(NodeId::ROOT).unwrap().wait().await;
        let after = catalog.database("Hr", LoadPolicy::SKIP).node.unwrap();
        assert_eq!(before.id, after.id);
    }

    #[tokio::test]
    async fn test_listener_is_weak() {
        let catalog = catalog();
        let counter = Arc::new(Counter::default());
        catalog.add_listener(&counter);
        catalog.databases(LoadPolicy::LOAD);
        catalog.settle().await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        drop(counter);
        let hr = catalog.database("Hr", LoadPolicy::SKIP).node.unwrap();
        catalog.schemas(hr.id, LoadPolicy::LOAD);
        catalog.settle().await;
        assert!(catalog.shared.listeners.lock().is_empty());
    }

    #[test]
    fn test_without_runtime_loads_queue() {
        let catalog = catalog();
        let listing = catalog.databases(LoadPolicy::LOAD);
        assert!(listing.pending.is_some());
        assert_eq!(catalog.state(NodeId::ROOT), Some(LoadState::Loading));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let ran = runtime.block_on(catalog.drain());
        assert_eq!(ran, 1);
        assert_eq!(catalog.databases(LoadPolicy::SKIP).nodes.len(), 2);
    }
}
