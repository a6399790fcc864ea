//! HTTP server for the collection API, built on hyper.
//!
//! [`ShaprServer`] is the composition root: it takes a validated
//! configuration, a document store, hook instances and an optional caller
//! resolver, builds the runtime services once, and serves requests over an
//! http1 accept loop. Caller identity is resolved per request through the
//! pluggable resolver; the default reads the `x-shapr-user` and
//! `x-shapr-roles` headers filled in by the surrounding security layer.

pub mod error;
pub mod handlers;

pub use error::{error_response, json_error, json_response, method_not_allowed, Resp};
pub use handlers::ShaprApi;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::access::Caller;
use crate::config::ShaprSettings;
use crate::crud::CrudService;
use crate::error::Result;
use crate::hooks::{CollectionHooks, HookExecutor, HookRegistry};
use crate::query::QueryService;
use crate::schema::{CollectionRegistry, ShaprConfig};
use crate::store::{DocumentStore, MemoryStore};

/// Resolves the caller identity from an inbound request.
pub type CallerResolver = Arc<dyn Fn(&Request<Incoming>) -> Caller + Send + Sync>;

/// Default resolver: `x-shapr-user` names the principal, `x-shapr-roles` is a
/// comma-separated role list. No user header means an anonymous caller.
pub fn caller_from_headers(req: &Request<Incoming>) -> Caller {
    let user = req
        .headers()
        .get("x-shapr-user")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let roles: Vec<String> = req
        .headers()
        .get("x-shapr-roles")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .map(|role| role.trim().to_string())
                .filter(|role| !role.is_empty())
                .collect()
        })
        .unwrap_or_default();

    match user {
        Some(user) => Caller::authenticated(user, roles),
        None => Caller::anonymous(),
    }
}

/// Builder for the Shapr HTTP server.
pub struct ShaprServer {
    settings: ShaprSettings,
    config: ShaprConfig,
    store: Option<Arc<dyn DocumentStore>>,
    hooks: Vec<Arc<dyn CollectionHooks>>,
    caller_resolver: Option<CallerResolver>,
}

impl ShaprServer {
    pub fn new(config: ShaprConfig) -> Self {
        Self {
            settings: ShaprSettings::default(),
            config,
            store: None,
            hooks: Vec::new(),
            caller_resolver: None,
        }
    }

    pub fn with_settings(mut self, settings: ShaprSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use a specific persistence engine; defaults to the in-memory store.
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Register one hook instance.
    pub fn register_hook(mut self, hook: Arc<dyn CollectionHooks>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Register several hook instances at once.
    pub fn register_hooks(mut self, hooks: impl IntoIterator<Item = Arc<dyn CollectionHooks>>) -> Self {
        self.hooks.extend(hooks);
        self
    }

    pub fn with_caller_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&Request<Incoming>) -> Caller + Send + Sync + 'static,
    {
        self.caller_resolver = Some(Arc::new(resolver));
        self
    }

    /// Validate the configuration and assemble the runtime services. Fails
    /// fast on configuration errors (duplicate slugs and the like).
    pub fn build_api(self) -> Result<ShaprApi> {
        let registry = Arc::new(CollectionRegistry::new(self.config)?);
        let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let hook_registry = Arc::new(HookRegistry::new(self.hooks));
        let hook_count = hook_registry.len();
        let executor = HookExecutor::new(hook_registry);

        let crud = CrudService::new(registry.clone(), store.clone(), executor.clone());
        let query = QueryService::new(registry.clone(), store, executor);
        let resolver: CallerResolver =
            self.caller_resolver.unwrap_or_else(|| Arc::new(caller_from_headers));

        log::info!(
            "shapr api assembled: {} collections, {} hook instances",
            registry.all().len(),
            hook_count
        );

        Ok(ShaprApi::new(
            registry,
            crud,
            query,
            resolver,
            self.settings.server.max_body_bytes,
        ))
    }

    /// Bind and serve until the task is cancelled.
    pub async fn serve(self) -> anyhow::Result<()> {
        let address: SocketAddr =
            format!("{}:{}", self.settings.server.host, self.settings.server.port).parse()?;
        let listener = TcpListener::bind(address).await?;
        self.serve_on(listener).await
    }

    /// Serve on an existing listener (tests bind to port 0 and pass it in).
    pub async fn serve_on(self, listener: TcpListener) -> anyhow::Result<()> {
        let api = Arc::new(self.build_api()?);
        let address = listener.local_addr()?;
        log::info!("Shapr server listening on {}", address);

        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let api = api.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let api = api.clone();
                    async move { Ok::<_, Infallible>(api.handle(req).await) }
                });

                if let Err(error) = http1::Builder::new().serve_connection(io, service).await {
                    log::debug!("connection error: {:?}", error);
                }
            });
        }
    }
}
