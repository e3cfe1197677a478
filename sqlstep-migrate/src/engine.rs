//! Reconciliation engine.
//!
//! The engine diffs the scripts found on disk against the `migrations`
//! table and applies exactly the missing ones, in id order. Every check
//! (sequence, tamper, expected next id) runs before the first write, so a
//! rejected run leaves the database untouched.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::error::{MigrateResult, MigrationError};
use crate::file::{MigrationScript, ScriptLocator};
use crate::gateway::{PersistenceGateway, Statement};
use crate::history::{self, MigrationRecord, SENTINEL_ID};

/// Configuration for the reconciliation engine.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Path to the migrations directory.
    pub migrations_dir: PathBuf,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("./migrations"),
        }
    }
}

impl ReconcilerConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the migrations directory.
    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = dir.into();
        self
    }
}

/// Result of a migration run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Filenames of scripts applied by this run, in order.
    pub applied: Vec<String>,
    /// Filenames of legacy records whose fingerprint was filled in.
    pub backfilled: Vec<String>,
    /// Number of scripts that were already applied and unchanged.
    pub up_to_date: usize,
    /// Total duration in milliseconds.
    pub duration_ms: i64,
}

impl RunReport {
    /// Number of scripts applied.
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Check if the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.backfilled.is_empty()
    }

    /// Get a summary of the run.
    pub fn summary(&self) -> String {
        if self.is_noop() {
            return "Database is up to date".to_string();
        }

        let mut parts = Vec::new();
        if !self.applied.is_empty() {
            parts.push(format!("{} applied", self.applied.len()));
        }
        if !self.backfilled.is_empty() {
            parts.push(format!("{} fingerprints backfilled", self.backfilled.len()));
        }
        format!("{} in {}ms", parts.join(", "), self.duration_ms)
    }
}

/// What a run would do, computed without writing anything.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    /// Scripts to apply, in order.
    pub pending: Vec<MigrationScript>,
    /// Already-applied scripts whose legacy record needs a fingerprint.
    pub backfills: Vec<MigrationScript>,
    /// Number of scripts already applied and unchanged.
    pub up_to_date: usize,
}

impl MigrationPlan {
    /// Check if there's anything to do.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.backfills.is_empty()
    }

    /// Get a summary of the plan.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.pending.is_empty() {
            parts.push(format!("{} pending", self.pending.len()));
        }
        if !self.backfills.is_empty() {
            parts.push(format!("{} to backfill", self.backfills.len()));
        }
        parts.push(format!("{} up to date", self.up_to_date));

        parts.join("; ")
    }
}

/// Applied and pending migrations, without integrity checks.
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Applied migrations (sentinel excluded).
    pub applied: Vec<MigrationRecord>,
    /// Filenames found on disk with no record.
    pub pending: Vec<String>,
    /// Total number of applied migrations.
    pub total_applied: usize,
    /// Total number of pending migrations.
    pub total_pending: usize,
}

/// The migration reconciliation engine.
pub struct Reconciler<G: PersistenceGateway> {
    config: ReconcilerConfig,
    gateway: G,
    locator: ScriptLocator,
    initialized: bool,
}

impl<G: PersistenceGateway> Reconciler<G> {
    /// Create a new engine. Call [`Reconciler::init`] before running.
    pub fn new(config: ReconcilerConfig, gateway: G) -> Self {
        let locator = ScriptLocator::new(&config.migrations_dir);
        Self {
            config,
            gateway,
            locator,
            initialized: false,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Get the gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Whether the tracking table has been bootstrapped.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Bootstrap the tracking table.
    ///
    /// Creates the table and its sentinel row if the table does not exist.
    /// Errors are logged, not returned; the return value is the resulting
    /// readiness, also available from [`Reconciler::is_initialized`].
    pub async fn init(&mut self) -> bool {
        self.initialized = false;

        match self.bootstrap().await {
            Ok(()) => {
                self.initialized = true;
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize migration tracking table");
            }
        }

        self.initialized
    }

    async fn bootstrap(&self) -> MigrateResult<()> {
        let rows = self
            .gateway
            .execute(&history::table_exists())
            .await
            .into_result(MigrationError::persistence)?;

        let exists = match rows.first() {
            Some(row) => row.get_bool("table_exists")?,
            None => false,
        };

        if exists {
            debug!(table = history::MIGRATIONS_TABLE, "Tracking table already exists");
            return Ok(());
        }

        self.gateway
            .execute_in_transaction(&[history::create_table(), history::insert_sentinel()])
            .await
            .into_result(|message| {
                MigrationError::persistence(format!("cannot create tracking table: {}", message))
            })?;

        info!(table = history::MIGRATIONS_TABLE, "Created migration tracking table");
        Ok(())
    }

    /// Apply every missing script.
    ///
    /// Failures are logged here and also returned. Scripts applied before a
    /// failing script stay applied.
    pub async fn run(&self) -> MigrateResult<RunReport> {
        let start = Instant::now();

        match self.run_inner(start).await {
            Ok(report) => {
                if report.is_noop() {
                    info!(up_to_date = report.up_to_date, "No migrations to apply");
                } else {
                    info!(
                        applied = report.applied.len(),
                        backfilled = report.backfilled.len(),
                        duration_ms = report.duration_ms,
                        "Applied {} migration(s)",
                        report.applied.len()
                    );
                }
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Migration run failed");
                Err(e)
            }
        }
    }

    async fn run_inner(&self, start: Instant) -> MigrateResult<RunReport> {
        let plan = self.plan().await?;

        let mut report = RunReport {
            up_to_date: plan.up_to_date,
            ..RunReport::default()
        };

        for script in &plan.backfills {
            self.gateway
                .execute(&history::backfill_fingerprint(script))
                .await
                .into_result(|message| {
                    MigrationError::persistence(format!(
                        "cannot backfill fingerprint of '{}': {}",
                        script.filename, message
                    ))
                })?;

            info!(filename = %script.filename, "Backfilled legacy fingerprint");
            report.backfilled.push(script.filename.clone());
        }

        for script in &plan.pending {
            self.apply_script(script).await?;
            report.applied.push(script.filename.clone());
        }

        report.duration_ms = start.elapsed().as_millis() as i64;
        Ok(report)
    }

    /// Apply one script and record it.
    ///
    /// A transactional script and its history row commit together. A script
    /// opening with the no-transaction marker runs on its own and its row is
    /// written afterwards; a crash between the two leaves the script applied
    /// but unrecorded, which needs manual repair.
    async fn apply_script(&self, script: &MigrationScript) -> MigrateResult<()> {
        let started = Instant::now();
        let body = Statement::batch(script.body.as_str());
        let record = history::insert_record(script);

        if script.is_non_transactional() {
            debug!(filename = %script.filename, "Executing script outside a transaction");

            self.gateway
                .execute(&body)
                .await
                .into_result(|message| MigrationError::execution(&script.filename, message))?;

            self.gateway.execute(&record).await.into_result(|message| {
                warn!(
                    filename = %script.filename,
                    "Script was applied but could not be recorded"
                );
                MigrationError::persistence(format!(
                    "'{}' was applied but not recorded: {}",
                    script.filename, message
                ))
            })?;
        } else {
            debug!(filename = %script.filename, "Executing script in a transaction");

            self.gateway
                .execute_in_transaction(&[body, record])
                .await
                .into_result(|message| MigrationError::execution(&script.filename, message))?;
        }

        info!(
            id = script.id,
            filename = %script.filename,
            duration_ms = started.elapsed().as_millis() as u64,
            "Applied migration"
        );
        Ok(())
    }

    /// Compute what [`Reconciler::run`] would do, without writing anything.
    pub async fn plan(&self) -> MigrateResult<MigrationPlan> {
        self.ensure_initialized()?;

        let scripts = self.load_scripts().await?;
        let records = self.load_records().await?;

        reconcile(scripts, &records)
    }

    /// List applied and pending migrations.
    pub async fn status(&self) -> MigrateResult<MigrationStatus> {
        self.ensure_initialized()?;

        let mut scripts = self.locator.discover().await?;
        scripts.sort_by_key(|s| s.id);

        let applied: Vec<MigrationRecord> = self
            .load_records()
            .await?
            .into_iter()
            .filter(|r| !r.is_sentinel())
            .collect();

        let pending: Vec<String> = scripts
            .into_iter()
            .filter(|s| !applied.iter().any(|r| r.filename == s.filename))
            .map(|s| s.filename)
            .collect();

        Ok(MigrationStatus {
            total_applied: applied.len(),
            total_pending: pending.len(),
            applied,
            pending,
        })
    }

    fn ensure_initialized(&self) -> MigrateResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(MigrationError::NotInitialized)
        }
    }

    /// Discover scripts, sort them by id, and check the ids are contiguous.
    async fn load_scripts(&self) -> MigrateResult<Vec<MigrationScript>> {
        let mut scripts = self.locator.discover().await?;
        scripts.sort_by_key(|s| s.id);
        validate_sequence(&scripts)?;
        Ok(scripts)
    }

    /// Load every history record, sentinel included.
    async fn load_records(&self) -> MigrateResult<Vec<MigrationRecord>> {
        let rows = self
            .gateway
            .execute(&history::select_records())
            .await
            .into_result(|message| {
                MigrationError::persistence(format!("cannot load migration history: {}", message))
            })?;

        rows.iter().map(MigrationRecord::from_row).collect()
    }
}

/// Check that scripts sorted by id form a contiguous sequence.
pub fn validate_sequence(scripts: &[MigrationScript]) -> MigrateResult<()> {
    for pair in scripts.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.id.checked_add(1) != Some(next.id) {
            return Err(MigrationError::SequenceGap {
                filename: next.filename.clone(),
                expected: prev.id.saturating_add(1),
                found: next.id,
            });
        }
    }
    Ok(())
}

/// Diff sorted, validated scripts against persisted records.
///
/// Fails on the first applied script whose fingerprint changed, and on a
/// missing script whose id is not the one after the last applied id.
pub fn reconcile(
    scripts: Vec<MigrationScript>,
    records: &[MigrationRecord],
) -> MigrateResult<MigrationPlan> {
    let by_filename: HashMap<&str, &MigrationRecord> = records
        .iter()
        .filter(|r| !r.is_sentinel())
        .map(|r| (r.filename.as_str(), r))
        .collect();

    let mut last_applied = records.iter().map(|r| r.id).max().unwrap_or(SENTINEL_ID);
    let mut plan = MigrationPlan::default();

    for script in scripts {
        if let Some(record) = by_filename.get(script.filename.as_str()) {
            match record.fingerprint.as_deref() {
                None | Some("") => plan.backfills.push(script),
                Some(stored) if stored != script.fingerprint => {
                    return Err(MigrationError::ImmutableScriptModified {
                        filename: script.filename,
                        stored: stored.to_string(),
                        current: script.fingerprint,
                    });
                }
                Some(_) => plan.up_to_date += 1,
            }
            continue;
        }

        let expected = last_applied.saturating_add(1);
        if script.id != expected {
            return Err(MigrationError::SequenceGap {
                filename: script.filename,
                expected,
                found: script.id,
            });
        }

        last_applied = script.id;
        plan.pending.push(script);
    }

    Ok(plan)
}
