//! The orchestration engine: deploy primitives, sequence preprocessing, and
//! the checkpointed execution loop.
//!
//! A caller hands `run()` a `ContextProvider` and a declared `Sequence`. The
//! orchestrator flattens the sequence (expanding dynamic entries against a
//! fresh context snapshot), reads the resume cursor for its chain, then
//! executes the remaining steps strictly in order — regenerating the context
//! before each one, waiting out confirmations, and advancing the cursor
//! after every commit.

pub mod environment;

pub use environment::{Environment, FsEnvironment, MemoryEnvironment};

use crate::client::{DeployClient, Operation, PendingTx, Verifier};
use crate::config::Config;
use crate::contracts::{ContractHandle, Contracts, PartialContracts};
use crate::error::{ChainrunError, Result};
use crate::registry::RegistryEntry;
use crate::sequence::{preprocess_entry, ContextProvider, ProcessedSequence, Sequence};
use crate::types::{Address, ContractRole};
use chrono::Utc;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// RunOptions
// ---------------------------------------------------------------------------

/// Operator controls for one `run()` invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Log and skip a failing step instead of halting on it. A skipped step
    /// is never automatically retried.
    pub force: bool,
    /// Ignore the stored cursor and start from step 0.
    pub restart: bool,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

struct Inner {
    config: Config,
    env: Box<dyn Environment>,
    client: Arc<dyn DeployClient>,
    verifier: Option<Arc<dyn Verifier>>,
}

/// Cheaply cloneable handle to the orchestrator; step contexts carry a clone
/// so that step bodies can reach `deploy`/`submit`.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        env: Box<dyn Environment>,
        client: Arc<dyn DeployClient>,
        verifier: Option<Arc<dyn Verifier>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                env,
                client,
                verifier,
            }),
        }
    }

    /// Durable orchestrator: cursor (and, per config, registry) under
    /// `<root>/deployments/`.
    pub fn durable(
        config: Config,
        root: impl Into<PathBuf>,
        client: Arc<dyn DeployClient>,
        verifier: Option<Arc<dyn Verifier>>,
    ) -> Self {
        let env = FsEnvironment::new(root, config.chain_id, config.persist_registry);
        Self::new(config, Box::new(env), client, verifier)
    }

    /// In-memory orchestrator for deterministic tests and local simulation.
    pub fn in_memory(config: Config, client: Arc<dyn DeployClient>) -> Self {
        Self::new(config, Box::new(MemoryEnvironment::new()), client, None)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The stored resume cursor for this orchestrator's chain.
    pub fn cursor(&self) -> Result<u64> {
        self.inner.env.progress().read(self.inner.config.chain_id)
    }

    // -----------------------------------------------------------------------
    // Registry access
    // -----------------------------------------------------------------------

    /// Whatever the registry currently holds; some roles may be absent.
    /// Sequences whose purpose is to create the missing contracts start here.
    pub fn load_contracts_partial(&self) -> Result<PartialContracts> {
        let doc = self.inner.env.registry().all()?;
        Ok(doc
            .into_iter()
            .map(|(role, entry)| (role, ContractHandle::new(role, entry.address)))
            .collect())
    }

    /// The complete application, or `MissingContracts`.
    pub fn load_contracts(&self) -> Result<Contracts> {
        Contracts::from_partial(self.load_contracts_partial()?)
    }

    /// Registered address for one role, or `ContractNotFound`.
    pub fn address_of(&self, role: ContractRole) -> Result<Address> {
        self.inner
            .env
            .registry()
            .get(role)?
            .map(|entry| entry.address)
            .ok_or(ChainrunError::ContractNotFound {
                role,
                chain_id: self.inner.config.chain_id,
            })
    }

    // -----------------------------------------------------------------------
    // Deploy primitives
    // -----------------------------------------------------------------------

    /// Deploy a plain instance of `role`'s template and register it.
    pub async fn deploy(&self, role: ContractRole, args: Vec<Value>) -> Result<ContractHandle> {
        self.deploy_inner(role, args, false).await
    }

    /// Deploy `role` behind an upgradeable proxy and register it.
    pub async fn deploy_proxy(
        &self,
        role: ContractRole,
        args: Vec<Value>,
    ) -> Result<ContractHandle> {
        self.deploy_inner(role, args, true).await
    }

    async fn deploy_inner(
        &self,
        role: ContractRole,
        args: Vec<Value>,
        proxy: bool,
    ) -> Result<ContractHandle> {
        let config = &self.inner.config;
        if config.verbose {
            info!(role = %role, proxy, "deploying");
        }
        let pending = self
            .inner
            .client
            .create_instance(role, args.clone(), proxy)
            .await
            .map_err(ChainrunError::Client)?;
        let receipt = self
            .inner
            .client
            .await_confirmations(&pending, config.wait_blocks)
            .await
            .map_err(ChainrunError::Client)?;
        let address = receipt.contract_address.ok_or_else(|| {
            ChainrunError::Client(anyhow::anyhow!("no contract address in receipt for {role}"))
        })?;

        self.inner.env.registry().put(
            role,
            RegistryEntry {
                address: address.clone(),
                block_number: Some(receipt.block_number),
                block_hash: Some(receipt.block_hash),
                deployed_at: Some(Utc::now()),
            },
        )?;
        if config.verbose {
            info!(role = %role, address = %address, "registered");
        }

        if config.verify_contracts {
            if let Some(verifier) = &self.inner.verifier {
                if let Err(e) = verifier.verify(&address, role, &args).await {
                    warn!(role = %role, address = %address, error = %e, "source verification failed");
                }
            }
        }

        Ok(ContractHandle::new(role, address))
    }

    /// Submit a call operation through the deploy client. The returned
    /// pending handle is what the execution loop waits on.
    pub async fn submit(&self, op: Operation) -> Result<PendingTx> {
        self.inner
            .client
            .submit(op)
            .await
            .map_err(ChainrunError::Client)
    }

    // -----------------------------------------------------------------------
    // run(): preprocessing then execution
    // -----------------------------------------------------------------------

    pub async fn run<P: ContextProvider>(
        &self,
        provider: &P,
        sequence: Sequence<P::Ctx>,
        opts: RunOptions,
    ) -> Result<()> {
        let processed = self.preprocess(provider, sequence).await?;
        let next = if opts.restart { 0 } else { self.cursor()? };
        self.execute(provider, &processed, next as usize, opts.force)
            .await
    }

    /// Flatten the declared sequence. Each entry sees a fresh context
    /// snapshot, decoupled from the mutations execution will perform.
    async fn preprocess<P: ContextProvider>(
        &self,
        provider: &P,
        sequence: Sequence<P::Ctx>,
    ) -> Result<ProcessedSequence<P::Ctx>> {
        let mut processed = Vec::new();
        for entry in sequence {
            let ctx = provider.generate(self).await?;
            processed.extend(preprocess_entry(&ctx, entry));
        }
        Ok(processed)
    }

    async fn execute<P: ContextProvider>(
        &self,
        provider: &P,
        steps: &ProcessedSequence<P::Ctx>,
        next: usize,
        force: bool,
    ) -> Result<()> {
        let config = &self.inner.config;
        let total = steps.len();
        for (i, step) in steps.iter().enumerate().skip(next) {
            let ctx = provider.generate(self).await?;
            if config.verbose {
                info!(step = i + 1, total, name = step.name(), "executing");
            }
            match step.execute(ctx).await {
                Ok(Some(pending)) => {
                    // A failed confirmation wait halts even under force: the
                    // operation is in flight and skipping it would double the
                    // ambiguity, not bound it.
                    self.inner
                        .client
                        .await_confirmations(&pending, config.wait_blocks)
                        .await
                        .map_err(|e| ChainrunError::StepFailed {
                            index: i,
                            total,
                            name: step.name().to_string(),
                            source: e,
                        })?;
                }
                Ok(None) => {}
                Err(e) if force => {
                    error!(step = i + 1, total, name = step.name(), error = %e, "step failed, skipping (force)");
                }
                Err(e) => {
                    return Err(ChainrunError::StepFailed {
                        index: i,
                        total,
                        name: step.name().to_string(),
                        source: e,
                    });
                }
            }
            self.inner
                .env
                .progress()
                .write(config.chain_id, (i + 1) as u64)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
